use crate::libs::value::Value;

/// SQL text plus the values bound to its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// The few places where the supported engines disagree on syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    /// Tail of an INSERT that writes a row made only of column defaults.
    fn default_row(self) -> &'static str {
        match self {
            Dialect::MySql => "() VALUES ()",
            Dialect::Sqlite => "DEFAULT VALUES",
        }
    }
}

/// Quote an identifier with backticks, doubling any embedded backtick.
/// Both MySQL and SQLite accept this form.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub struct QueryBuilder {
    table: String,
    wheres: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    params: Vec<Value>,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: quote_ident(table),
            wheres: vec![],
            limit: None,
            offset: None,
            params: Vec::new(),
        }
    }

    pub fn r#where(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.wheres.push(format!("{} = ?", quote_ident(column)));
        self.params.push(value.into());
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    fn where_clause(&self) -> String {
        if self.wheres.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.wheres.join(" AND "))
        }
    }

    pub fn select(self) -> Statement {
        let mut sql = format!("SELECT * FROM {}{}", self.table, self.where_clause());
        let mut params = self.params;
        if let Some(limit) = self.limit {
            sql += " LIMIT ?";
            params.push(Value::Integer(limit));
        }
        if let Some(offset) = self.offset {
            sql += " OFFSET ?";
            params.push(Value::Integer(offset));
        }
        Statement { sql, params }
    }

    pub fn insert(self, fields: Vec<(String, Value)>, dialect: Dialect) -> Statement {
        if fields.is_empty() {
            return Statement {
                sql: format!("INSERT INTO {} {}", self.table, dialect.default_row()),
                params: Vec::new(),
            };
        }

        let (cols, params): (Vec<String>, Vec<Value>) = fields
            .into_iter()
            .map(|(name, value)| (quote_ident(&name), value))
            .unzip();
        let placeholders = vec!["?"; cols.len()].join(", ");
        Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                cols.join(", "),
                placeholders
            ),
            params,
        }
    }

    /// SET parameters are bound ahead of the WHERE parameters.
    pub fn update(self, fields: Vec<(String, Value)>) -> Statement {
        let where_clause = self.where_clause();
        let mut sets = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len() + self.params.len());
        for (name, value) in fields {
            sets.push(format!("{} = ?", quote_ident(&name)));
            params.push(value);
        }
        params.extend(self.params);
        Statement {
            sql: format!("UPDATE {} SET {}{}", self.table, sets.join(", "), where_clause),
            params,
        }
    }

    pub fn delete(self) -> Statement {
        Statement {
            sql: format!("DELETE FROM {}{}", self.table, self.where_clause()),
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_page() {
        let stmt = QueryBuilder::new("items").limit(5).offset(10).select();
        assert_eq!(stmt.sql, "SELECT * FROM `items` LIMIT ? OFFSET ?");
        assert_eq!(stmt.params, vec![Value::Integer(5), Value::Integer(10)]);
    }

    #[test]
    fn test_select_by_id() {
        let stmt = QueryBuilder::new("items").r#where("id", 3_i64).select();
        assert_eq!(stmt.sql, "SELECT * FROM `items` WHERE `id` = ?");
        assert_eq!(stmt.params, vec![Value::Integer(3)]);
    }

    #[test]
    fn test_insert_binds_every_field() {
        let stmt = QueryBuilder::new("items").insert(
            vec![
                ("price".into(), Value::Float(1.5)),
                ("title".into(), Value::from("pen")),
            ],
            Dialect::MySql,
        );
        assert_eq!(stmt.sql, "INSERT INTO `items` (`price`, `title`) VALUES (?, ?)");
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_insert_defaults_per_dialect() {
        let mysql = QueryBuilder::new("items").insert(vec![], Dialect::MySql);
        assert_eq!(mysql.sql, "INSERT INTO `items` () VALUES ()");
        let sqlite = QueryBuilder::new("items").insert(vec![], Dialect::Sqlite);
        assert_eq!(sqlite.sql, "INSERT INTO `items` DEFAULT VALUES");
    }

    #[test]
    fn test_update_param_order() {
        let stmt = QueryBuilder::new("items")
            .r#where("id", 7_i64)
            .update(vec![("title".into(), Value::from("pencil"))]);
        assert_eq!(stmt.sql, "UPDATE `items` SET `title` = ? WHERE `id` = ?");
        assert_eq!(
            stmt.params,
            vec![Value::Text("pencil".into()), Value::Integer(7)]
        );
    }

    #[test]
    fn test_delete() {
        let stmt = QueryBuilder::new("items").r#where("id", 1_i64).delete();
        assert_eq!(stmt.sql, "DELETE FROM `items` WHERE `id` = ?");
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }
}
