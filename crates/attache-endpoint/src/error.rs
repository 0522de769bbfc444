//! Endpoint error handling
//!
//! Every error renders as a plain text response.

use attache_store::StoreError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::job::JobError;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("couldn't find any routing parameters in {0}")]
    NoRoutingParams(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EndpointError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EndpointError::Job(_) => StatusCode::BAD_REQUEST,
            EndpointError::Store(StoreError::BadUid(_)) => StatusCode::BAD_REQUEST,
            EndpointError::Store(_)
            | EndpointError::NoRoutingParams(_)
            | EndpointError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client
    pub fn body(&self) -> String {
        match self {
            EndpointError::Job(JobError::NoShaGiven) => {
                "You need to give a SHA parameter".to_string()
            }
            EndpointError::Job(JobError::IncorrectSha(given)) => {
                format!("The SHA parameter you gave ({}) is incorrect", given)
            }
            EndpointError::Job(JobError::MissingParam(name)) => {
                format!("You need to give a {} parameter", name)
            }
            EndpointError::Store(StoreError::BadUid(uid)) => format!("Bad uid {}", uid),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for EndpointError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Endpoint failed");
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain")],
            self.body(),
        )
            .into_response()
    }
}

pub type EndpointResult<T> = Result<T, EndpointError>;
