pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::raw::RawRecord;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("no matching record in {0}")]
    NotFound(String),
    #[error("refusing {0} without a filter")]
    Unfiltered(&'static str),
    #[error("cancelled")]
    Cancelled,
}

/// Row selection: a conjunction of column equalities, an optional column
/// projection and an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    eq: Vec<(String, String)>,
    columns: Option<String>,
    order: Option<(String, bool)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.eq.push((column.to_string(), value.to_string()));
        self
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.eq.is_empty()
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        self.eq
            .iter()
            .all(|(col, val)| record.text(col).as_deref() == Some(val.as_str()))
    }

    /// PostgREST query parameters for this filter.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .eq
            .iter()
            .map(|(col, val)| (col.clone(), format!("eq.{val}")))
            .collect();
        if let Some(columns) = &self.columns {
            query.push(("select".into(), columns.clone()));
        }
        if let Some((col, asc)) = &self.order {
            let dir = if *asc { "asc" } else { "desc" };
            query.push(("order".into(), format!("{col}.{dir}")));
        }
        query
    }
}

/// Table access on the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<RawRecord>, BackendError>;
    async fn insert(&self, table: &str, record: RawRecord) -> Result<RawRecord, BackendError>;
    /// Returns the first updated row; no match is `NotFound`.
    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: RawRecord,
    ) -> Result<RawRecord, BackendError>;
    /// Removing nothing is `NotFound`.
    async fn remove(&self, table: &str, filter: &Filter) -> Result<(), BackendError>;
}

/// Binary objects in the CV bucket. Paths are relative to the bucket and
/// start with the owning user's id.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<RawRecord>, BackendError>;
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), BackendError>;
    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError>;
    async fn remove(&self, path: &str) -> Result<(), BackendError>;
    fn public_url(&self, path: &str) -> String;
    async fn bucket_exists(&self) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_renders_postgrest_query() {
        let filter = Filter::new()
            .eq("project_id", "p1")
            .columns("*")
            .order_by("created_at", false);
        assert_eq!(
            filter.to_query(),
            vec![
                ("project_id".to_string(), "eq.p1".to_string()),
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn filter_matches_all_conditions() {
        let record = RawRecord::new().with("id", "t1").with("status", "todo");
        assert!(Filter::by_id("t1").matches(&record));
        assert!(Filter::by_id("t1").eq("status", "todo").matches(&record));
        assert!(!Filter::by_id("t1").eq("status", "done").matches(&record));
        assert!(Filter::new().matches(&record));
    }

    #[test]
    fn status_error_carries_backend_message() {
        let err = BackendError::Status {
            status: 403,
            message: "permission denied for table tickets".into(),
        };
        assert_eq!(
            err.to_string(),
            "permission denied for table tickets (HTTP 403)"
        );
    }
}
