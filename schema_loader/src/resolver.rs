use crate::error::{ResolveError, Result};
use crate::expand::TypeSelector;
use crate::fetcher::SchemaSource;
use crate::file::SchemaProgram;
use crate::ticket::{LatestRequest, Ticket};
use schema_types::TypeNode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/* A resolved type together with the program it came from */
#[derive(Debug, Clone)]
pub struct Resolved {
    pub node: TypeNode,
    pub program: Arc<SchemaProgram>,
}

/* Fetches, parses and caches schema programs per endpoint */
pub struct SchemaResolver<S> {
    source: S,
    cache: Mutex<HashMap<String, Arc<SchemaProgram>>>,
}

impl<S: SchemaSource> SchemaResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /* Parsed program for an endpoint, from cache when available */
    pub async fn program(&self, endpoint: &str) -> Result<Arc<SchemaProgram>> {
        if let Some(program) = self.cached(endpoint) {
            tracing::debug!(endpoint, "schema cache hit");
            return Ok(program);
        }

        let fetched = self
            .source
            .fetch(endpoint)
            .await
            .map_err(|e| ResolveError::from_fetch(endpoint, e))?;
        let program = SchemaProgram::from_yaml(&fetched.content)
            .map_err(|e| ResolveError::from_parse(endpoint, e))?;
        tracing::debug!(
            endpoint,
            location = %fetched.location,
            package = program.package(),
            "schema loaded"
        );

        let program = Arc::new(program);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(endpoint.to_string(), program.clone());
        }
        Ok(program)
    }

    pub async fn resolve(&self, endpoint: &str, selector: &TypeSelector) -> Result<Resolved> {
        let program = self.program(endpoint).await?;
        let node = program.select(selector)?;
        tracing::debug!(endpoint, ?selector, "type resolved");
        Ok(Resolved { node, program })
    }

    /* Resolve on behalf of a request that may be superseded while in flight */
    pub async fn resolve_latest(
        &self,
        latest: &LatestRequest,
        ticket: Ticket,
        endpoint: &str,
        selector: &TypeSelector,
    ) -> Result<Resolved> {
        let result = self.resolve(endpoint, selector).await;
        if !latest.is_current(ticket) {
            tracing::debug!(endpoint, ticket = ticket.id(), "dropping superseded resolution");
            return Err(ResolveError::Superseded);
        }
        result
    }

    /* Forget a cached program so the next mount fetches it again */
    pub fn invalidate(&self, endpoint: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.remove(endpoint);
        }
    }

    pub fn is_cached(&self, endpoint: &str) -> bool {
        self.cached(endpoint).is_some()
    }

    fn cached(&self, endpoint: &str) -> Option<Arc<SchemaProgram>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(endpoint).cloned())
    }
}
