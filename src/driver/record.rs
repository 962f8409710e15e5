//! Result rows.
//!
//! Rows keep their wire values (`Value`); shaping them into user-level
//! records belongs to the embedding host.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_stream::Iter;

use crate::bolt::message::SuccessMessage;
use crate::bolt::packstream::Value;

use super::connection::PullOutcome;

/// One result row: column names shared across the result, values owned
/// by the row.
#[derive(Debug, Clone)]
pub struct Record {
    keys: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(keys: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Value> {
        let index = self.keys.iter().position(|k| k == key)?;
        self.values.get(index)
    }

    /// Key/value view of the row.
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// A fully pulled result: rows plus the terminal SUCCESS summary.
#[derive(Debug)]
pub struct QueryResult {
    keys: Arc<Vec<String>>,
    records: Vec<Record>,
    summary: SuccessMessage,
}

impl QueryResult {
    pub fn new(keys: Vec<String>, outcome: PullOutcome) -> Self {
        let keys = Arc::new(keys);
        let records = outcome
            .records
            .into_iter()
            .map(|r| Record::new(Arc::clone(&keys), r.values))
            .collect();
        Self {
            keys,
            records,
            summary: outcome.summary,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> &SuccessMessage {
        &self.summary
    }

    pub fn bookmark(&self) -> Option<&str> {
        self.summary.bookmark()
    }

    /// First value of the first row, for single-cell queries.
    pub fn single_value(&self) -> Option<&Value> {
        self.records.first().and_then(|r| r.get(0))
    }

    /// Consume into a `Stream` of records.
    pub fn into_stream(self) -> Iter<std::vec::IntoIter<Record>> {
        tokio_stream::iter(self.records)
    }
}

impl IntoIterator for QueryResult {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
