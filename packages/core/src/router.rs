//! Router: dispatch requests to handlers based on path prefixes.
//!
//! Routes are kept in a prefix trie. The deepest registered template above
//! a request path wins, and the handler receives the path relative to that
//! template.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use crate::path_trie::PathTrie;
use crate::{Context, HandlerBox, Request, RequestHandler, ResourceError, ResourcePath, Response};

/// Maps route templates to handlers.
///
/// A router is built once at startup and then shared (usually behind an
/// `Arc`, see [`crate::InternalConnectionFactory`]). It implements
/// [`RequestHandler`] itself, so routers can be nested.
///
/// # Example
///
/// ```rust,ignore
/// let mut router = Router::new();
/// router.add_route("/users", MemoryBackend::new())?;
/// router.add_route("/email", EmailService::new(TracingSink))?;
///
/// // A read of /users/andy123 reaches the backend as a read of /andy123.
/// ```
#[derive(Default)]
pub struct Router {
    routes: PathTrie<HandlerBox>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for the route template `pattern`.
    ///
    /// Fails with `BadRequest` for an invalid template and with `Conflict`
    /// if the template is already registered.
    pub fn add_route<H>(&mut self, pattern: &str, handler: H) -> Result<(), ResourceError>
    where
        H: RequestHandler + 'static,
    {
        self.add_route_boxed(pattern, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn add_route_boxed(
        &mut self,
        pattern: &str,
        handler: HandlerBox,
    ) -> Result<(), ResourceError> {
        let template = ResourcePath::parse_template(pattern)?;
        if self.routes.contains_value(&template) {
            return Err(ResourceError::conflict(format!(
                "A route is already registered for {}",
                template
            )));
        }
        tracing::debug!(route = %template, "registered route");
        self.routes.insert(&template, handler);
        Ok(())
    }

    /// Remove the handler registered at exactly `pattern`.
    pub fn remove_route(&mut self, pattern: &str) -> Result<HandlerBox, ResourceError> {
        let template = ResourcePath::parse_template(pattern)?;
        self.routes
            .remove(&template)
            .ok_or_else(|| ResourceError::not_found(format!("No route registered for {}", template)))
    }

    /// Registered templates in sorted order.
    pub fn routes(&self) -> Vec<ResourcePath> {
        self.routes.paths()
    }

    /// Find the handler for `path` and the path relative to its template.
    pub fn resolve(&self, path: &ResourcePath) -> Result<(HandlerBox, ResourcePath), ResourceError> {
        self.routes
            .find_ancestor(path)
            .map(|(handler, suffix)| (handler.clone(), suffix))
            .ok_or_else(|| ResourceError::not_found(format!("No route for path {}", path)))
    }

    /// Forward `request` to the matching handler and return its result
    /// unchanged.
    pub async fn dispatch(
        &self,
        context: &Context,
        request: Request,
    ) -> Result<Response, ResourceError> {
        let request_type = request.request_type();
        let span = tracing::info_span!(
            "dispatch",
            context = %context.id(),
            request = %request_type,
            path = %request.path(),
        );

        async move {
            let (handler, relative) = match self.resolve(request.path()) {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(error = %e, "no route");
                    return Err(e);
                }
            };

            let result = handler.handle(context, request.with_path(relative)).await;
            match &result {
                Ok(_) => tracing::debug!("request completed"),
                Err(e) => tracing::debug!(code = e.code(), error = %e, "request failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl RequestHandler for Router {
    async fn handle(&self, context: &Context, request: Request) -> Result<Response, ResourceError> {
        self.dispatch(context, request).await
    }
}
