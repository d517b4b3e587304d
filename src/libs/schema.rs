use crate::libs::value::Value;

/// Coarse classification of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    Integer,
    Float,
    Text,
}

impl ColumnCategory {
    /// Classify a declared type name such as `INT`, `decimal(10,2)` or
    /// `INT UNSIGNED`. Anything unrecognised is text.
    pub fn classify(type_name: &str) -> Self {
        let upper = type_name.to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default();
        let word = base
            .split_whitespace()
            .find(|w| !matches!(*w, "UNSIGNED" | "SIGNED" | "ZEROFILL"))
            .unwrap_or_default();

        match word {
            "INT" | "INTEGER" | "BIGINT" | "TINYINT" | "MEDIUMINT" | "SMALLINT" => Self::Integer,
            // the mysql driver reports TINYINT(1) as BOOLEAN
            "BOOL" | "BOOLEAN" | "BIT" => Self::Integer,
            "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" => Self::Float,
            // sqlite reports every floating column as REAL
            "REAL" => Self::Float,
            _ => Self::Text,
        }
    }

    /// Whether a client value may be written to a column of this category.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer | Self::Float => matches!(value, Value::Integer(_) | Value::Float(_)),
            Self::Text => matches!(value, Value::Text(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub category: ColumnCategory,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: &str) -> Self {
        Self {
            name: name.into(),
            category: ColumnCategory::classify(type_name),
        }
    }
}

/// Column metadata of one table, as read from the live schema.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// False for unknown columns and for values whose kind does not match.
    pub fn accepts(&self, column: &str, value: &Value) -> bool {
        self.column(column)
            .is_some_and(|c| c.category.accepts(value))
    }
}
