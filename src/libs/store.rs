use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Database, Encode, MySql, Sqlite, Type};

use crate::libs::error::ServeError;
use crate::libs::query_builder::{Dialect, Statement};
use crate::libs::row::materialize;
use crate::libs::schema::{ColumnDescriptor, TableSchema};
use crate::libs::value::{Record, Value};

/// Outcome of a statement that modifies rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// The SQL engine as the gateway sees it: schema metadata plus execution of
/// prebuilt statements. Implementations own one pool shared by all requests.
#[async_trait]
pub trait Store: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn table_exists(&self, table: &str) -> sqlx::Result<bool>;

    async fn table_names(&self) -> sqlx::Result<Vec<String>>;

    async fn table_schema(&self, table: &str) -> sqlx::Result<TableSchema>;

    /// Run a query, decoding each row by the column types in `schema`.
    async fn fetch(&self, statement: &Statement, schema: &TableSchema) -> sqlx::Result<Vec<Record>>;

    async fn execute(&self, statement: &Statement) -> sqlx::Result<Execution>;

    /// Release the pool. Only called once the server has stopped.
    async fn close(&self);
}

/// Open a store for `database_url`, picking the backend from its scheme.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<Arc<dyn Store>, ServeError> {
    if database_url.starts_with("mysql:") {
        Ok(Arc::new(MySqlStore::connect(database_url, max_connections).await?))
    } else if database_url.starts_with("sqlite:") {
        Ok(Arc::new(SqliteStore::connect(database_url, max_connections).await?))
    } else {
        Err(ServeError::UnsupportedUrl(database_url.to_string()))
    }
}

fn bind_params<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &'q [Value],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    &'q str: Encode<'q, DB> + Type<DB>,
    Option<&'q str>: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            Value::Integer(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Null => query.bind(None::<&'q str>),
        };
    }
    query
}

fn describe(table: &str, columns: Vec<(String, String)>) -> TableSchema {
    let columns = columns
        .into_iter()
        .map(|(name, type_name)| ColumnDescriptor::new(name, &type_name))
        .collect();
    TableSchema::new(table, columns)
}

// -------- MySQL --------

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for MySqlStore {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn table_exists(&self, table: &str) -> sqlx::Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?)",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn table_names(&self) -> sqlx::Result<Vec<String>> {
        // information_schema columns come back as binary strings without the cast
        sqlx::query_scalar(
            "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
             WHERE table_schema = DATABASE() ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn table_schema(&self, table: &str) -> sqlx::Result<TableSchema> {
        let columns: Vec<(String, String)> = sqlx::query_as(
            "SELECT CAST(column_name AS CHAR), CAST(data_type AS CHAR) \
             FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(describe(table, columns))
    }

    async fn fetch(&self, statement: &Statement, schema: &TableSchema) -> sqlx::Result<Vec<Record>> {
        let rows = bind_params(sqlx::query::<MySql>(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| materialize(row, schema)).collect()
    }

    async fn execute(&self, statement: &Statement) -> sqlx::Result<Execution> {
        let result = bind_params(sqlx::query::<MySql>(&statement.sql), &statement.params)
            .execute(&self.pool)
            .await?;
        Ok(Execution {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id() as i64,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// -------- SQLite --------

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every connection to :memory: is a separate database
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        } else {
            pool_options = pool_options.max_connections(max_connections);
        }
        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// A private in-memory database, mostly useful for tests and demos.
    pub async fn in_memory() -> sqlx::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn table_exists(&self, table: &str) -> sqlx::Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn table_names(&self) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn table_schema(&self, table: &str) -> sqlx::Result<TableSchema> {
        let columns: Vec<(String, String)> =
            sqlx::query_as("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;
        Ok(describe(table, columns))
    }

    async fn fetch(&self, statement: &Statement, schema: &TableSchema) -> sqlx::Result<Vec<Record>> {
        let rows = bind_params(sqlx::query::<Sqlite>(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| materialize(row, schema)).collect()
    }

    async fn execute(&self, statement: &Statement) -> sqlx::Result<Execution> {
        let result = bind_params(sqlx::query::<Sqlite>(&statement.sql), &statement.params)
            .execute(&self.pool)
            .await?;
        Ok(Execution {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_rowid(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
