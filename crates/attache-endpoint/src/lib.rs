//! # attache-endpoint
//!
//! HTTP serving of stored content.
//!
//! A [`RoutedEndpoint`] turns request params into a [`Job`] and the job into a
//! response with caching headers. Requests that need a signed url are checked
//! against the app secret.

pub mod endpoint;
pub mod error;
pub mod job;
pub mod response;

pub use endpoint::{RequestEnv, RoutedEndpoint, ROUTING_KEYS};
pub use error::{EndpointError, EndpointResult};
pub use job::{Job, JobError, Params};
pub use response::{respond, CACHE_CONTROL};
