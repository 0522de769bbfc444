//! Routed endpoint
//!
//! Builds a [`Job`] from request params with a caller supplied block and
//! serves it. Routing params are read from the request context, where the
//! router that mounted the endpoint left them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use attache_store::App;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{debug, instrument};

use crate::error::{EndpointError, EndpointResult};
use crate::job::{Job, JobError, Params};
use crate::response::respond;

/// Context keys routers store routing params under, in lookup order
pub const ROUTING_KEYS: [&str; 5] = [
    "routing_args",
    "path_parameters",
    "router.params",
    "usher.params",
    "endpoint.params",
];

/// What the endpoint sees of a request
#[derive(Debug, Clone, Default)]
pub struct RequestEnv {
    pub query: Params,
    pub context: HashMap<String, Params>,
}

impl RequestEnv {
    pub fn new(query: Params) -> Self {
        Self {
            query,
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, params: Params) -> Self {
        self.context.insert(key.into(), params);
        self
    }

    pub fn routing_params(&self) -> EndpointResult<&Params> {
        ROUTING_KEYS
            .iter()
            .find_map(|key| self.context.get(*key))
            .ok_or_else(|| {
                let mut keys: Vec<&str> = self.context.keys().map(String::as_str).collect();
                keys.sort_unstable();
                EndpointError::NoRoutingParams(format!("context with keys {:?}", keys))
            })
    }

    /// Query params overlaid with routing params
    pub fn params(&self) -> EndpointResult<Params> {
        let mut params = self.query.clone();
        params.extend(
            self.routing_params()?
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(params)
    }
}

type JobBuilder = dyn Fn(&Params, &App) -> Result<Job, JobError> + Send + Sync;

pub struct RoutedEndpoint {
    app: Arc<App>,
    block: Box<JobBuilder>,
}

impl RoutedEndpoint {
    pub fn new<F>(app: Arc<App>, block: F) -> Self
    where
        F: Fn(&Params, &App) -> Result<Job, JobError> + Send + Sync + 'static,
    {
        Self {
            app,
            block: Box::new(block),
        }
    }

    /// Endpoint serving stored content by its `uid` param
    pub fn fetching(app: Arc<App>) -> Self {
        Self::new(app, Job::from_params)
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Handle a request; blocks on data store I/O
    #[instrument(skip(self, env, headers), fields(app = %self.app.name()))]
    pub fn call(&self, env: &RequestEnv, headers: &HeaderMap) -> Response {
        self.try_call(env, headers)
            .unwrap_or_else(IntoResponse::into_response)
    }

    fn try_call(&self, env: &RequestEnv, headers: &HeaderMap) -> EndpointResult<Response> {
        let params = env.params()?;
        let job = (self.block)(&params, &self.app)?;
        debug!(job = ?job, "Serving job");
        respond(&job, &self.app, headers)
    }

    /// Router serving the endpoint at `path`, e.g. `/media/*uid`
    pub fn router(self, path: &str) -> Router {
        Router::new()
            .route(path, get(serve))
            .with_state(Arc::new(self))
    }
}

impl fmt::Debug for RoutedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<RoutedEndpoint for app {:?} >", self.app.name())
    }
}

async fn serve(
    State(endpoint): State<Arc<RoutedEndpoint>>,
    path: Option<Path<Params>>,
    Query(query): Query<Params>,
    headers: HeaderMap,
) -> Response {
    let mut env = RequestEnv::new(query);
    if let Some(Path(path_params)) = path {
        env = env.with_context("path_parameters", path_params);
    }

    match tokio::task::spawn_blocking(move || endpoint.call(&env, &headers)).await {
        Ok(response) => response,
        Err(e) => EndpointError::Internal(e.to_string()).into_response(),
    }
}
