//! # Request Router
//!
//! Maps method + path onto one of the table operations. Every request goes
//! through the same fallback handler so that the table existence check runs
//! before method dispatch, for any verb.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::libs::error::{GatewayError, GatewayResult};
use crate::libs::gateway::Gateway;
use crate::libs::parser::Page;

/// `/{table}/{id}` split into its two segments; either may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub table: &'a str,
    pub id: &'a str,
}

impl<'a> Target<'a> {
    /// Segments past the id are ignored.
    pub fn parse(path: &'a str) -> Self {
        let mut parts = path.trim_matches('/').split('/');
        Self {
            table: parts.next().unwrap_or_default(),
            id: parts.next().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListTables,
    ListRecords,
    FetchRecord,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
}

/// Pick the operation for a method and target. Table existence is not
/// checked here.
pub fn resolve(method: &Method, target: &Target<'_>) -> GatewayResult<Operation> {
    let has_table = !target.table.is_empty();
    let has_id = !target.id.is_empty();

    let operation = match *method {
        Method::GET if !has_table => Some(Operation::ListTables),
        Method::GET if !has_id => Some(Operation::ListRecords),
        Method::GET => Some(Operation::FetchRecord),
        Method::PUT => (has_table && !has_id).then_some(Operation::CreateRecord),
        Method::POST => (has_table && has_id).then_some(Operation::UpdateRecord),
        Method::DELETE => (has_table && has_id).then_some(Operation::DeleteRecord),
        _ => return Err(GatewayError::MethodNotAllowed),
    };
    operation.ok_or_else(|| GatewayError::bad_request("invalid request"))
}

/// Entry point for every request.
pub async fn dispatch(
    State(gateway): State<Gateway>,
    method: Method,
    uri: Uri,
    query: Option<Query<HashMap<String, String>>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let body = body.map_err(GatewayError::from);
    match route(&gateway, &method, uri.path(), &query, body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn route(
    gateway: &Gateway,
    method: &Method,
    path: &str,
    query: &HashMap<String, String>,
    body: GatewayResult<Bytes>,
) -> GatewayResult<Response> {
    let target = Target::parse(path);
    if !target.table.is_empty() {
        gateway.ensure_table(target.table).await?;
    }

    let Target { table, id } = target;
    let response = match resolve(method, &target)? {
        Operation::ListTables => Json(gateway.list_tables().await?).into_response(),
        Operation::ListRecords => {
            Json(gateway.list_records(table, Page::from_query(query)).await?).into_response()
        }
        Operation::FetchRecord => Json(gateway.fetch_record(table, id).await?).into_response(),
        Operation::CreateRecord => Json(gateway.create_record(table, &body?).await?).into_response(),
        Operation::UpdateRecord => {
            Json(gateway.update_record(table, id, &body?).await?).into_response()
        }
        Operation::DeleteRecord => Json(gateway.delete_record(table, id).await?).into_response(),
    };
    Ok(response)
}
