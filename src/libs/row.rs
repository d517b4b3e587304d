use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::MySqlRow;
use sqlx::mysql::types::MySqlTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, TypeInfo};

use crate::libs::query_builder::Dialect;
use crate::libs::schema::{ColumnCategory, TableSchema};
use crate::libs::value::{Record, Value};

/// How one cell is read off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    Integer,
    /// Unsigned integers and BIT(n), which overflow or garble as `i64`.
    Unsigned,
    Float,
    /// Exact numerics travel as their textual representation.
    Decimal,
    Text,
    /// Binary strings, rendered as lossy UTF-8.
    Bytes,
    Year,
    Date,
    DateTime,
    Time,
}

impl Decoding {
    /// `category` comes from the declared column type. `reported` is the
    /// driver's name for the result column and only decides the wire shape.
    pub fn plan(dialect: Dialect, category: ColumnCategory, reported: &str) -> Self {
        let reported = reported.to_ascii_uppercase();
        if dialect == Dialect::MySql {
            // the binary protocol packs these into bytes of their own
            match reported.as_str() {
                "DECIMAL" => return Self::Decimal,
                "BIT" => return Self::Unsigned,
                name if name.ends_with(" UNSIGNED") => return Self::Unsigned,
                "YEAR" => return Self::Year,
                "DATE" => return Self::Date,
                "DATETIME" | "TIMESTAMP" => return Self::DateTime,
                "TIME" => return Self::Time,
                _ => {}
            }
        }
        match category {
            ColumnCategory::Integer => Self::Integer,
            ColumnCategory::Float => Self::Float,
            ColumnCategory::Text if is_binary(&reported) => Self::Bytes,
            ColumnCategory::Text => Self::Text,
        }
    }
}

fn is_binary(reported: &str) -> bool {
    matches!(
        reported,
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "GEOMETRY"
    )
}

/// A result row of a specific backend.
pub trait BackendRow: Row {
    const DIALECT: Dialect;

    /// Decode the cells whose shape only this backend produces.
    fn decode_special(&self, index: usize, decoding: Decoding) -> sqlx::Result<Option<Value>>;
}

impl BackendRow for MySqlRow {
    const DIALECT: Dialect = Dialect::MySql;

    fn decode_special(&self, index: usize, decoding: Decoding) -> sqlx::Result<Option<Value>> {
        let value = match decoding {
            Decoding::Unsigned => self
                .try_get_unchecked::<Option<u64>, _>(index)?
                .map(|n| match i64::try_from(n) {
                    Ok(n) => Value::Integer(n),
                    Err(_) => Value::Float(n as f64),
                }),
            Decoding::Year => self
                .try_get_unchecked::<Option<i64>, _>(index)?
                .map(|year| Value::Text(format!("{year:04}"))),
            Decoding::Date | Decoding::DateTime => {
                let raw: Option<&[u8]> = self.try_get_unchecked(index)?;
                match raw {
                    None => None,
                    // an all-zero date is sent as a bare zero length byte
                    Some([0]) if decoding == Decoding::Date => Some("0000-00-00".to_string()),
                    Some([0]) => Some("0000-00-00 00:00:00".to_string()),
                    Some(_) if decoding == Decoding::Date => Some(
                        self.try_get_unchecked::<NaiveDate, _>(index)?
                            .format("%Y-%m-%d")
                            .to_string(),
                    ),
                    Some(_) => Some(
                        self.try_get_unchecked::<NaiveDateTime, _>(index)?
                            .format("%Y-%m-%d %H:%M:%S%.f")
                            .to_string(),
                    ),
                }
                .map(Value::Text)
            }
            Decoding::Time => self
                .try_get_unchecked::<Option<MySqlTime>, _>(index)?
                .map(|time| Value::Text(format_time(&time))),
            other => return Err(unsupported(index, other)),
        };
        Ok(value)
    }
}

impl BackendRow for SqliteRow {
    const DIALECT: Dialect = Dialect::Sqlite;

    fn decode_special(&self, index: usize, decoding: Decoding) -> sqlx::Result<Option<Value>> {
        Err(unsupported(index, decoding))
    }
}

fn unsupported(index: usize, decoding: Decoding) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: format!("{decoding:?} cells are not produced by this backend").into(),
    }
}

/// `[-]HH:MM:SS[.ffffff]`, hours may exceed 24.
fn format_time(time: &MySqlTime) -> String {
    let sign = if time.is_negative() { "-" } else { "" };
    let mut text = format!(
        "{sign}{:02}:{:02}:{:02}",
        time.hours(),
        time.minutes(),
        time.seconds()
    );
    if time.microseconds() != 0 {
        text += &format!(".{:06}", time.microseconds());
    }
    text
}

/// Turn one result row into a [`Record`]. Each column is decoded by the
/// category of its declared type in `schema`; columns the schema does not
/// know fall back to the type the driver reports.
pub fn materialize<R>(row: &R, schema: &TableSchema) -> sqlx::Result<Record>
where
    R: BackendRow,
    usize: ColumnIndex<R>,
    for<'r> i64: Decode<'r, R::Database>,
    for<'r> f64: Decode<'r, R::Database>,
    for<'r> String: Decode<'r, R::Database>,
    for<'r> Vec<u8>: Decode<'r, R::Database>,
{
    let mut record = Record::new();
    for col in row.columns() {
        let index = col.ordinal();
        let reported = col.type_info().name();
        let category = schema
            .column(col.name())
            .map(|c| c.category)
            .unwrap_or_else(|| ColumnCategory::classify(reported));

        let value = match Decoding::plan(R::DIALECT, category, reported) {
            Decoding::Integer => row
                .try_get_unchecked::<Option<i64>, _>(index)?
                .map(Value::Integer),
            Decoding::Float => row
                .try_get_unchecked::<Option<f64>, _>(index)?
                .map(Value::Float),
            Decoding::Decimal => decode_decimal(row, index)?.map(Value::Float),
            Decoding::Text => row
                .try_get_unchecked::<Option<String>, _>(index)?
                .map(Value::Text),
            Decoding::Bytes => row
                .try_get_unchecked::<Option<Vec<u8>>, _>(index)?
                .map(|bytes| Value::Text(String::from_utf8_lossy(&bytes).into_owned())),
            special => row.decode_special(index, special)?,
        };
        record.insert(col.name().to_string(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}

fn decode_decimal<R>(row: &R, index: usize) -> sqlx::Result<Option<f64>>
where
    R: Row,
    usize: ColumnIndex<R>,
    for<'r> String: Decode<'r, R::Database>,
{
    let text: Option<String> = row.try_get_unchecked(index)?;
    text.map(|t| {
        t.trim().parse::<f64>().map_err(|e| sqlx::Error::ColumnDecode {
            index: index.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::schema::ColumnDescriptor;
    use sqlx::mysql::types::MySqlTimeSign;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> sqlx::SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_materialize_native_types() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY, title TEXT, price FLOAT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO items (title, price) VALUES ('pen', 1.5)")
            .execute(&pool)
            .await
            .unwrap();
        let schema = TableSchema::new(
            "items",
            vec![
                ColumnDescriptor::new("id", "INTEGER"),
                ColumnDescriptor::new("title", "TEXT"),
                ColumnDescriptor::new("price", "FLOAT"),
            ],
        );

        let row = sqlx::query("SELECT * FROM items").fetch_one(&pool).await.unwrap();
        let record = materialize(&row, &schema).unwrap();

        assert_eq!(record["id"], Value::Integer(1));
        assert_eq!(record["title"], Value::Text("pen".into()));
        assert_eq!(record["price"], Value::Float(1.5));
    }

    #[tokio::test]
    async fn test_materialize_follows_declared_type() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE goods (id INTEGER PRIMARY KEY, price DECIMAL(10,2))")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO goods (price) VALUES (2.25)")
            .execute(&pool)
            .await
            .unwrap();
        let schema = TableSchema::new(
            "goods",
            vec![
                ColumnDescriptor::new("id", "INTEGER"),
                ColumnDescriptor::new("price", "DECIMAL(10,2)"),
            ],
        );

        let row = sqlx::query("SELECT * FROM goods").fetch_one(&pool).await.unwrap();
        let record = materialize(&row, &schema).unwrap();

        assert_eq!(record["price"], Value::Float(2.25));
    }

    #[tokio::test]
    async fn test_materialize_nulls() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, score REAL, votes INT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO notes DEFAULT VALUES")
            .execute(&pool)
            .await
            .unwrap();

        // no schema: categories come from the driver
        let empty = TableSchema::new("notes", vec![]);
        let row = sqlx::query("SELECT * FROM notes").fetch_one(&pool).await.unwrap();
        let record = materialize(&row, &empty).unwrap();

        assert_eq!(record.len(), 4);
        assert_eq!(record["body"], Value::Null);
        assert_eq!(record["score"], Value::Null);
        assert_eq!(record["votes"], Value::Null);
    }

    #[test]
    fn test_plan_mysql_wire_shapes() {
        let plan = |category, reported| Decoding::plan(Dialect::MySql, category, reported);
        assert_eq!(plan(ColumnCategory::Float, "DECIMAL"), Decoding::Decimal);
        assert_eq!(plan(ColumnCategory::Text, "DATE"), Decoding::Date);
        assert_eq!(plan(ColumnCategory::Text, "DATETIME"), Decoding::DateTime);
        assert_eq!(plan(ColumnCategory::Text, "TIMESTAMP"), Decoding::DateTime);
        assert_eq!(plan(ColumnCategory::Text, "TIME"), Decoding::Time);
        assert_eq!(plan(ColumnCategory::Text, "YEAR"), Decoding::Year);
        assert_eq!(plan(ColumnCategory::Integer, "BIT"), Decoding::Unsigned);
        assert_eq!(plan(ColumnCategory::Integer, "INT UNSIGNED"), Decoding::Unsigned);
        assert_eq!(plan(ColumnCategory::Integer, "BOOLEAN"), Decoding::Integer);
        assert_eq!(plan(ColumnCategory::Text, "VARBINARY"), Decoding::Bytes);
        assert_eq!(plan(ColumnCategory::Text, "VARCHAR"), Decoding::Text);
    }

    #[test]
    fn test_plan_sqlite_trusts_declared_category() {
        let plan = |category, reported| Decoding::plan(Dialect::Sqlite, category, reported);
        // sqlite stores dates as text and reports unparsable declarations as NULL
        assert_eq!(plan(ColumnCategory::Text, "DATETIME"), Decoding::Text);
        assert_eq!(plan(ColumnCategory::Float, "NULL"), Decoding::Float);
        assert_eq!(plan(ColumnCategory::Float, "NUMERIC"), Decoding::Float);
        assert_eq!(plan(ColumnCategory::Text, "BLOB"), Decoding::Bytes);
    }

    #[test]
    fn test_format_time() {
        let time = MySqlTime::new(MySqlTimeSign::Positive, 3, 4, 5, 0).unwrap();
        assert_eq!(format_time(&time), "03:04:05");
        let long = MySqlTime::new(MySqlTimeSign::Negative, 100, 0, 1, 250).unwrap();
        assert_eq!(format_time(&long), "-100:00:01.000250");
    }
}
