use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::libs::error::{GatewayError, GatewayResult};
use crate::libs::parser::{Page, parse_body, parse_id};
use crate::libs::query_builder::QueryBuilder;
use crate::libs::response::{
    Created, Deleted, Envelope, RecordList, SingleRecord, TableList, Updated,
};
use crate::libs::schema::TableSchema;
use crate::libs::store::Store;
use crate::libs::value::Value;

/// Name of the server-managed primary key column.
pub const ID_COLUMN: &str = "id";

/// The table operations. Cheap to clone; every clone shares one store.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn Store>,
}

impl Gateway {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // -------- Table existence --------
    pub async fn ensure_table(&self, table: &str) -> GatewayResult<()> {
        let exists = self
            .store
            .table_exists(table)
            .await
            .map_err(GatewayError::database("failed to check table existence"))?;
        if exists {
            Ok(())
        } else {
            debug!(table, "unknown table");
            Err(GatewayError::unknown_table())
        }
    }

    // -------- List tables --------
    pub async fn list_tables(&self) -> GatewayResult<Envelope<TableList>> {
        let tables = self
            .store
            .table_names()
            .await
            .map_err(GatewayError::database("failed to list tables"))?;
        Ok(Envelope::new(TableList { tables }))
    }

    // -------- List records --------
    pub async fn list_records(&self, table: &str, page: Page) -> GatewayResult<Envelope<RecordList>> {
        debug!(table, limit = page.limit, offset = page.offset, "listing records");
        let statement = QueryBuilder::new(table)
            .limit(page.limit)
            .offset(page.offset)
            .select();
        let schema = self.table_schema(table).await?;
        let records = self
            .store
            .fetch(&statement, &schema)
            .await
            .map_err(GatewayError::database("failed to query records"))?;
        Ok(Envelope::new(RecordList { records }))
    }

    // -------- Fetch one record --------
    pub async fn fetch_record(&self, table: &str, id: &str) -> GatewayResult<Envelope<SingleRecord>> {
        let id = parse_id(id)?;
        debug!(table, id, "fetching record");
        let statement = QueryBuilder::new(table).r#where(ID_COLUMN, id).select();
        let schema = self.table_schema(table).await?;
        let record = self
            .store
            .fetch(&statement, &schema)
            .await
            .map_err(GatewayError::database("failed to get record"))?
            .into_iter()
            .next()
            .ok_or_else(GatewayError::record_not_found)?;
        Ok(Envelope::new(SingleRecord { record }))
    }

    // -------- Create record --------
    pub async fn create_record(&self, table: &str, body: &[u8]) -> GatewayResult<Envelope<Created>> {
        let mut fields = parse_body(body)?;
        // the server assigns ids
        fields.remove(ID_COLUMN);

        let schema = self.table_schema(table).await?;
        let fields = validate_fields(&schema, fields)?;
        debug!(table, fields = fields.len(), "creating record");

        let statement = QueryBuilder::new(table).insert(fields, self.store.dialect());
        let outcome = self
            .store
            .execute(&statement)
            .await
            .map_err(GatewayError::database("failed to create record"))?;
        Ok(Envelope::new(Created {
            id: outcome.last_insert_id,
        }))
    }

    // -------- Update record --------
    pub async fn update_record(
        &self,
        table: &str,
        id: &str,
        body: &[u8],
    ) -> GatewayResult<Envelope<Updated>> {
        let mut fields = parse_body(body)?;
        let id = parse_id(id)?;
        match fields.remove(ID_COLUMN) {
            None | Some(JsonValue::Null) => {}
            Some(_) => return Err(GatewayError::bad_request("id field cannot be updated")),
        }

        let schema = self.table_schema(table).await?;
        let fields = validate_fields(&schema, fields)?;
        if fields.is_empty() {
            return Err(GatewayError::bad_request("nothing to update"));
        }
        debug!(table, id, fields = fields.len(), "updating record");

        let statement = QueryBuilder::new(table).r#where(ID_COLUMN, id).update(fields);
        let outcome = self
            .store
            .execute(&statement)
            .await
            .map_err(GatewayError::database("failed to update record"))?;
        if outcome.rows_affected == 0 {
            return Err(GatewayError::record_not_found());
        }
        Ok(Envelope::new(Updated {
            updated: outcome.rows_affected,
        }))
    }

    // -------- Delete record --------
    pub async fn delete_record(&self, table: &str, id: &str) -> GatewayResult<Deleted> {
        let id = parse_id(id)?;
        debug!(table, id, "deleting record");
        let statement = QueryBuilder::new(table).r#where(ID_COLUMN, id).delete();
        let outcome = self
            .store
            .execute(&statement)
            .await
            .map_err(GatewayError::database("failed to delete record"))?;
        Ok(Deleted {
            deleted: outcome.rows_affected,
        })
    }

    async fn table_schema(&self, table: &str) -> GatewayResult<TableSchema> {
        self.store
            .table_schema(table)
            .await
            .map_err(GatewayError::database("failed to get column types"))
    }
}

/// Check every field against the column it targets, stopping at the first
/// that is unknown or of the wrong kind.
fn validate_fields(
    schema: &TableSchema,
    fields: Map<String, JsonValue>,
) -> GatewayResult<Vec<(String, Value)>> {
    fields
        .into_iter()
        .map(|(name, json)| {
            match Value::from_json(json).filter(|value| schema.accepts(&name, value)) {
                Some(value) => Ok((name, value)),
                None => Err(GatewayError::invalid_field(&name)),
            }
        })
        .collect()
}
