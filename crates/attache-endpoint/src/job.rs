//! Jobs describe what the endpoint should serve

use std::collections::HashMap;

use attache_core::Meta;
use attache_store::{App, StoreResult};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Request parameters, query and routing params merged
pub type Params = HashMap<String, String>;

const SHA_LENGTH: usize = 16;

/// Errors raised while building or checking a job
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("no SHA given")]
    NoShaGiven,

    /// Carries the SHA the client sent
    #[error("{0}")]
    IncorrectSha(String),

    #[error("missing parameter {0}")]
    MissingParam(String),
}

/// A unit of work the endpoint turns into a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Serve stored content as is
    Fetch { uid: String },
}

impl Job {
    pub fn fetch(uid: impl Into<String>) -> Self {
        Job::Fetch { uid: uid.into() }
    }

    /// Fetch job for the `uid` param, checking the `sha` param when the app verifies urls
    pub fn from_params(params: &Params, app: &App) -> Result<Self, JobError> {
        let uid = params
            .get("uid")
            .ok_or_else(|| JobError::MissingParam("uid".to_string()))?;
        let job = Job::fetch(uid.as_str());

        if app.verify_urls() {
            job.validate_sha(app.secret(), params.get("sha").map(String::as_str))?;
        }
        Ok(job)
    }

    pub fn uid(&self) -> &str {
        match self {
            Job::Fetch { uid } => uid,
        }
    }

    /// Stable textual form of the job
    pub fn signature(&self) -> String {
        match self {
            Job::Fetch { uid } => format!("f:{}", uid),
        }
    }

    /// Short SHA proving the job was issued by someone holding `secret`
    pub fn sha(&self, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.update(self.signature().as_bytes());
        let mut sha = hex::encode(hasher.finalize());
        sha.truncate(SHA_LENGTH);
        sha
    }

    pub fn validate_sha(&self, secret: &str, given: Option<&str>) -> Result<(), JobError> {
        match given {
            None | Some("") => Err(JobError::NoShaGiven),
            Some(given) if constant_time_compare(given, &self.sha(secret)) => Ok(()),
            Some(given) => Err(JobError::IncorrectSha(given.to_string())),
        }
    }

    /// Entity tag for responses to this job
    pub fn etag(&self) -> String {
        let digest = hex::encode(Sha256::digest(self.signature().as_bytes()));
        format!("\"{}\"", &digest[..SHA_LENGTH])
    }

    /// Run the job against the app's data store
    pub fn apply(&self, app: &App) -> StoreResult<Option<(Bytes, Meta)>> {
        match self {
            Job::Fetch { uid } => app.datastore().read(uid),
        }
    }
}

/// Constant-time comparison so SHA checks leak no timing
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
