//! The resource handler seam.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Request, ResourceError, Response};

/// Per-request context handed to every handler.
///
/// Carries an id for correlating log lines; nested dispatches keep a link to
/// the context they were issued from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    id: Uuid,
    parent: Option<Uuid>,
}

impl Context {
    /// A fresh context with no parent.
    pub fn root() -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: None,
        }
    }

    /// A fresh context whose parent is `self`.
    pub fn child(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: Some(self.id),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::root()
    }
}

/// Answers requests for the resources exposed at one path.
///
/// Paths in requests are relative to where the handler is mounted: a
/// collection mounted at `/users` sees `/andy123` for `/users/andy123`, and
/// the root path for requests addressed to the collection itself.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn RequestHandler>`.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, context: &Context, request: Request) -> Result<Response, ResourceError>;
}

/// A shared, type-erased handler.
pub type HandlerBox = Arc<dyn RequestHandler>;

#[async_trait]
impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    async fn handle(&self, context: &Context, request: Request) -> Result<Response, ResourceError> {
        (**self).handle(context, request).await
    }
}

#[async_trait]
impl<T: RequestHandler + ?Sized> RequestHandler for Box<T> {
    async fn handle(&self, context: &Context, request: Request) -> Result<Response, ResourceError> {
        (**self).handle(context, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, ActionResponse};
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl RequestHandler for Echo {
        async fn handle(
            &self,
            _context: &Context,
            request: Request,
        ) -> Result<Response, ResourceError> {
            Ok(ActionResponse::new(json!({"path": request.path().to_string()})).into())
        }
    }

    #[tokio::test]
    async fn object_safety_works() {
        let handler: HandlerBox = Arc::new(Echo);
        let response = handler
            .handle(&Context::root(), Request::read(path!("/a/b")))
            .await
            .unwrap();
        assert_eq!(response.into_action().unwrap().content["path"], "/a/b");
    }

    #[tokio::test]
    async fn boxed_handlers_delegate() {
        let handler: Box<dyn RequestHandler> = Box::new(Echo);
        assert!(handler
            .handle(&Context::root(), Request::read(path!("/x")))
            .await
            .is_ok());
    }

    #[test]
    fn child_context_links_parent() {
        let root = Context::root();
        let child = root.child();
        assert_eq!(child.parent(), Some(root.id()));
        assert_ne!(child.id(), root.id());
    }
}
