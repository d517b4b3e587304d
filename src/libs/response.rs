//! # Response Formatting
//!
//! Every successful body is `{"response": ...}` except deletion, which stays
//! flat for compatibility with existing clients.

use serde::Serialize;

use crate::libs::value::Record;

/// The `{"response": ...}` wrapper
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub response: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(response: T) -> Self {
        Self { response }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordList {
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleRecord {
    pub record: Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Updated {
    pub updated: u64,
}

/// Delete response, not wrapped in an envelope
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}
