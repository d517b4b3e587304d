//! # Request Input Parsing
//!
//! Query parameters, id segments and JSON bodies.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::libs::error::{GatewayError, GatewayResult};

/// Default limit if not specified
pub const DEFAULT_LIMIT: i64 = 5;

/// Default offset if not specified
pub const DEFAULT_OFFSET: i64 = 0;

/// Pagination window of a record listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl Page {
    /// Read `limit` and `offset`. Anything that is not a non-negative
    /// integer falls back to the default instead of failing the request.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        Self {
            limit: parse_count(params.get("limit")).unwrap_or(DEFAULT_LIMIT),
            offset: parse_count(params.get("offset")).unwrap_or(DEFAULT_OFFSET),
        }
    }
}

fn parse_count(value: Option<&String>) -> Option<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n >= 0)
}

/// Parse the id path segment
pub fn parse_id(segment: &str) -> GatewayResult<i64> {
    segment
        .parse()
        .map_err(|_| GatewayError::bad_request("invalid id"))
}

/// Decode a request body that must be a JSON object
pub fn parse_body(body: &[u8]) -> GatewayResult<Map<String, JsonValue>> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting request body");
        GatewayError::bad_request("failed to decode JSON data")
    })
}
