use std::fmt;

use tracing::{info, warn};

use crate::backend::ObjectStore;

/// Why CV storage cannot be used right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// The bucket does not exist.
    Missing,
    /// The storage API could not be reached or answered with an error.
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketStatus {
    Checking,
    Ready,
    Unavailable(Unavailable),
}

impl BucketStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, BucketStatus::Ready)
    }

    /// Text for the persistent banner shown while uploads are disabled.
    pub fn banner(&self) -> Option<String> {
        match self {
            BucketStatus::Unavailable(reason) => {
                Some(format!("CV storage unavailable: {reason}. Press r to re-check."))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::Missing => f.write_str("bucket not set up"),
            Unavailable::Unreachable(e) => write!(f, "could not reach storage ({e})"),
        }
    }
}

/// Asks the store whether the CV bucket exists. A missing bucket and a
/// failed probe both mean "unavailable"; no retry is attempted.
pub async fn check_bucket(storage: &dyn ObjectStore) -> BucketStatus {
    match storage.bucket_exists().await {
        Ok(true) => {
            info!("CV bucket ready");
            BucketStatus::Ready
        }
        Ok(false) => {
            warn!("CV bucket missing");
            BucketStatus::Unavailable(Unavailable::Missing)
        }
        Err(e) => {
            warn!(error = %e, "CV bucket probe failed");
            BucketStatus::Unavailable(Unavailable::Unreachable(e.to_string()))
        }
    }
}

/// Gate for CV upload/download. Starts in `Checking` and only moves on
/// an explicit refresh.
#[derive(Debug, Clone)]
pub struct BucketMonitor {
    status: BucketStatus,
}

impl Default for BucketMonitor {
    fn default() -> Self {
        Self {
            status: BucketStatus::Checking,
        }
    }
}

impl BucketMonitor {
    pub fn status(&self) -> &BucketStatus {
        &self.status
    }

    pub fn begin_check(&mut self) {
        self.status = BucketStatus::Checking;
    }

    pub fn finish(&mut self, status: BucketStatus) {
        self.status = status;
    }

    pub async fn refresh(&mut self, storage: &dyn ObjectStore) -> &BucketStatus {
        self.begin_check();
        let status = check_bucket(storage).await;
        self.finish(status);
        &self.status
    }
}
