//! Turning a job into an HTTP response

use attache_core::NAME_KEY;
use attache_store::App;
use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::EndpointResult;
use crate::job::Job;

/// Served content never changes under a uid
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Run `job` for `app`, honouring conditional request headers.
///
/// `If-None-Match` is only considered once the content is known to exist.
pub fn respond(job: &Job, app: &App, headers: &HeaderMap) -> EndpointResult<Response> {
    let Some((data, meta)) = job.apply(app)? else {
        debug!(uid = %job.uid(), app = %app.name(), "Nothing stored under uid");
        return Ok((
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "Not found",
        )
            .into_response());
    };

    let etag = job.etag();
    if etag_matches(headers, &etag) {
        debug!(uid = %job.uid(), "Not modified");
        return Ok((
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, etag),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
        )
            .into_response());
    }

    let name = meta
        .get(NAME_KEY)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| job.uid());
    let content_type = mime_guess::from_path(name).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, data.len().to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            (header::ETAG, etag),
        ],
        Body::from(data),
    )
        .into_response())
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}
