//! In-memory stand-ins for the backend, the object store and the
//! notification sink, shared by the unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, BackendError, Filter, ObjectStore};
use crate::model::raw::RawRecord;
use crate::services::{ActionContext, Level, Notification, Notifier, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Select(String),
    Insert(String, RawRecord),
    Update(String, Filter, RawRecord),
    Remove(String, Filter),
}

/// Table store that records every call. `failing` makes every call return a
/// backend rejection; `hanging` makes every call wait forever.
#[derive(Default)]
pub struct MockBackend {
    tables: Mutex<HashMap<String, Vec<RawRecord>>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
    failing: Option<String>,
    hanging: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failing: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hanging: true,
            ..Self::default()
        }
    }

    pub fn seed(self, table: &str, rows: Vec<RawRecord>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<RawRecord> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    async fn gate(&self, call: Call) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if self.hanging {
            futures::future::pending::<()>().await;
        }
        if let Some(message) = &self.failing {
            return Err(BackendError::Status {
                status: 400,
                message: message.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<RawRecord>, BackendError> {
        self.gate(Call::Select(table.to_string())).await?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    async fn insert(&self, table: &str, record: RawRecord) -> Result<RawRecord, BackendError> {
        self.gate(Call::Insert(table.to_string(), record.clone())).await?;
        let mut row = record;
        if row.text("id").is_none() {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            row.insert("id", format!("{table}-{next}"));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: RawRecord,
    ) -> Result<RawRecord, BackendError> {
        self.gate(Call::Update(table.to_string(), filter.clone(), patch.clone()))
            .await?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| filter.matches(r)))
            .ok_or_else(|| BackendError::NotFound(table.to_string()))?;
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(&patch) {
            for (k, v) in fields {
                row.insert(&k, v);
            }
        }
        Ok(row.clone())
    }

    async fn remove(&self, table: &str, filter: &Filter) -> Result<(), BackendError> {
        self.gate(Call::Remove(table.to_string(), filter.clone())).await?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        if rows.len() == before {
            return Err(BackendError::NotFound(table.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BucketState {
    Present,
    Missing,
    Unreachable,
}

pub struct MockStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    bucket: Mutex<BucketState>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            bucket: Mutex::new(BucketState::Present),
        }
    }

    pub fn set_bucket(&self, state: BucketState) {
        *self.bucket.lock().unwrap() = state;
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    fn reachable(&self) -> Result<(), BackendError> {
        match *self.bucket.lock().unwrap() {
            BucketState::Present => Ok(()),
            BucketState::Missing => Err(BackendError::Status {
                status: 400,
                message: "Bucket not found".into(),
            }),
            BucketState::Unreachable => Err(BackendError::Decode("connection refused".into())),
        }
    }
}

#[async_trait]
impl ObjectStore for MockStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<RawRecord>, BackendError> {
        self.reachable()?;
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(path, bytes)| {
                let name = path.strip_prefix(&dir)?;
                let metadata = serde_json::json!({ "size": bytes.len() });
                Some(RawRecord::new().with("name", name).with("metadata", metadata))
            })
            .collect())
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), BackendError> {
        self.reachable()?;
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        self.reachable()?;
        self.object(path)
            .ok_or_else(|| BackendError::NotFound(path.to_string()))
    }

    async fn remove(&self, path: &str) -> Result<(), BackendError> {
        self.reachable()?;
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/public/cvs/{path}")
    }

    async fn bucket_exists(&self) -> Result<bool, BackendError> {
        match *self.bucket.lock().unwrap() {
            BucketState::Present => Ok(true),
            BucketState::Missing => Ok(false),
            BucketState::Unreachable => Err(BackendError::Decode("connection refused".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<Notification> {
        self.of(Level::Failure)
    }

    pub fn successes(&self) -> Vec<Notification> {
        self.of(Level::Success)
    }

    fn of(&self, level: Level) -> Vec<Notification> {
        self.all().into_iter().filter(|n| n.level == level).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub storage: Arc<MockStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: ActionContext,
}

pub fn harness(backend: MockBackend) -> Harness {
    let backend = Arc::new(backend);
    let storage = Arc::new(MockStorage::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = ActionContext::new(
        backend.clone(),
        storage.clone(),
        Session::new("user-1", None),
        notifier.clone(),
        CancellationToken::new(),
    );
    Harness {
        backend,
        storage,
        notifier,
        ctx,
    }
}
