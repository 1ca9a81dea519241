use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{Backend, BackendError, Filter, ObjectStore};
use crate::model::raw::RawRecord;

/// PostgREST tables plus the storage REST API of a hosted project.
pub struct RestBackend {
    base_url: String,
    anon_key: String,
    bearer: String,
    bucket: String,
    client: reqwest::Client,
}

impl RestBackend {
    /// Requests are signed with the session's access token, or the anon key
    /// when there is no session. Every request gives up after `timeout`.
    pub fn new(
        base_url: &str,
        anon_key: String,
        access_token: Option<String>,
        bucket: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let bearer = access_token.unwrap_or_else(|| anon_key.clone());
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            bearer,
            bucket,
            client,
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_path(path)
        )
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Pulls a human-readable message out of an error body. PostgREST uses
/// `message`, the storage API `error` or `message`, auth `error_description`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "error", "msg"]
        .iter()
        .find_map(|k| value.get(k).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(String::from)
}

async fn check(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string()
    });
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn rows(resp: Response) -> Result<Vec<RawRecord>, BackendError> {
    let value: Value = resp
        .json()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))?;
    match value {
        Value::Array(items) => Ok(items.into_iter().filter_map(RawRecord::from_value).collect()),
        Value::Object(map) => Ok(vec![RawRecord::from(map)]),
        other => Err(BackendError::Decode(format!("expected rows, got {other}"))),
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<RawRecord>, BackendError> {
        debug!(table, ?filter, "select");
        let mut query = filter.to_query();
        if !query.iter().any(|(k, _)| k == "select") {
            query.push(("select".into(), "*".into()));
        }
        let resp = self
            .authed(self.client.get(self.table_url(table)))
            .query(&query)
            .send()
            .await?;
        rows(check(resp).await?).await
    }

    async fn insert(&self, table: &str, record: RawRecord) -> Result<RawRecord, BackendError> {
        debug!(table, "insert");
        let resp = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        rows(check(resp).await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode(format!("insert into {table} returned no row")))
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: RawRecord,
    ) -> Result<RawRecord, BackendError> {
        debug!(table, ?filter, "update");
        if filter.is_empty() {
            return Err(BackendError::Unfiltered("update"));
        }
        let resp = self
            .authed(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&filter.to_query())
            .json(&patch)
            .send()
            .await?;
        rows(check(resp).await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(table.to_string()))
    }

    async fn remove(&self, table: &str, filter: &Filter) -> Result<(), BackendError> {
        debug!(table, ?filter, "delete");
        if filter.is_empty() {
            return Err(BackendError::Unfiltered("delete"));
        }
        let resp = self
            .authed(self.client.delete(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&filter.to_query())
            .send()
            .await?;
        // A delete that matches nothing, or that row-level security hides,
        // still answers 2xx with an empty array.
        let removed = rows(check(resp).await?).await?;
        if removed.is_empty() {
            return Err(BackendError::NotFound(table.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for RestBackend {
    async fn list(&self, prefix: &str) -> Result<Vec<RawRecord>, BackendError> {
        debug!(bucket = %self.bucket, prefix, "list objects");
        let body = serde_json::json!({
            "prefix": prefix,
            "limit": 100,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let resp = self.authed(self.client.post(url)).json(&body).send().await?;
        rows(check(resp).await?).await
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        debug!(bucket = %self.bucket, path, size = bytes.len(), "upload object");
        let resp = self
            .authed(self.client.post(self.object_url(path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        debug!(bucket = %self.bucket, path, "download object");
        let resp = self.authed(self.client.get(self.object_url(path))).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path.to_string()));
        }
        let bytes = check(resp).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn remove(&self, path: &str) -> Result<(), BackendError> {
        debug!(bucket = %self.bucket, path, "remove object");
        let resp = self
            .authed(self.client.delete(self.object_url(path)))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_path(path)
        )
    }

    async fn bucket_exists(&self) -> Result<bool, BackendError> {
        let url = format!("{}/storage/v1/bucket/{}", self.base_url, self.bucket);
        let resp = self.authed(self.client.get(url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        match check(resp).await {
            Ok(_) => Ok(true),
            // The storage API reports a missing bucket as a 400 with a
            // "not found" message.
            Err(BackendError::Status { message, .. })
                if message.to_ascii_lowercase().contains("not found") =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn backend() -> RestBackend {
        RestBackend::new("https://demo.example.co/", "anon".into(), None, "cvs".into(), TIMEOUT)
            .unwrap()
    }

    #[test]
    fn anon_key_signs_without_session() {
        let b = backend();
        assert_eq!(b.bearer, "anon");
        let b = RestBackend::new("https://x", "anon".into(), Some("jwt".into()), "cvs".into(), TIMEOUT)
            .unwrap();
        assert_eq!(b.bearer, "jwt");
    }

    #[test]
    fn urls_drop_trailing_slash() {
        let b = backend();
        assert_eq!(b.table_url("tickets"), "https://demo.example.co/rest/v1/tickets");
    }

    #[test]
    fn object_paths_are_encoded_per_segment() {
        let b = backend();
        assert_eq!(
            b.object_url("u1/My CV.pdf"),
            "https://demo.example.co/storage/v1/object/cvs/u1/My%20CV.pdf"
        );
        assert_eq!(
            b.public_url("u1/cv.pdf"),
            "https://demo.example.co/storage/v1/object/public/cvs/u1/cv.pdf"
        );
    }

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"code":"42501","message":"permission denied"}"#),
            Some("permission denied".into())
        );
        assert_eq!(
            error_message(r#"{"statusCode":"404","error":"Bucket not found"}"#),
            Some("Bucket not found".into())
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
        assert_eq!(error_message(r#"{"message":""}"#), None);
    }
}
