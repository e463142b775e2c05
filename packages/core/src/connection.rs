//! Connections: the caller-side entry point into a handler tree.
//!
//! Callers obtain a [`Connection`] from a [`ConnectionFactory`] and issue
//! requests through it without knowing where the handler lives. Every call
//! completes exactly once, either inline (`handle` and the typed helpers) or
//! through a [`Promise`] returned by [`Connection::submit`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::patch::PatchOperation;
use crate::{
    ActionResponse, Context, HandlerBox, QueryResponse, Request, RequestHandler, ResourceError,
    ResourcePath, ResourceResponse, Response,
};

/// Produces connections into a handler tree.
pub trait ConnectionFactory: Send + Sync {
    fn connection(&self) -> Result<Connection, ResourceError>;
}

/// A factory whose connections dispatch in-process into a handler,
/// normally a [`crate::Router`].
#[derive(Clone)]
pub struct InternalConnectionFactory {
    handler: HandlerBox,
}

impl InternalConnectionFactory {
    pub fn new(handler: HandlerBox) -> Self {
        Self { handler }
    }

    /// The handler connections dispatch into.
    pub fn handler(&self) -> &HandlerBox {
        &self.handler
    }
}

impl ConnectionFactory for InternalConnectionFactory {
    fn connection(&self) -> Result<Connection, ResourceError> {
        Ok(Connection {
            handler: self.handler.clone(),
        })
    }
}

/// A handle for issuing requests.
#[derive(Clone)]
pub struct Connection {
    handler: HandlerBox,
}

impl Connection {
    /// Issue a request and wait for its result.
    pub async fn handle(
        &self,
        context: &Context,
        request: Request,
    ) -> Result<Response, ResourceError> {
        self.handler.handle(context, request).await
    }

    /// Issue a request on a background task and return its deferred result.
    ///
    /// Must be called from within a tokio runtime; outside of one the promise
    /// resolves immediately to an `Internal` error.
    pub fn submit(&self, context: &Context, request: Request) -> Promise {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                return Promise::resolved(Err(ResourceError::internal(format!(
                    "cannot submit request outside of an async runtime: {}",
                    e
                ))))
            }
        };

        let (tx, rx) = oneshot::channel();
        let handler = self.handler.clone();
        let context = context.clone();
        runtime.spawn(async move {
            let result = handler.handle(&context, request).await;
            // The caller may have dropped the promise; nothing to report then.
            let _ = tx.send(result);
        });
        Promise::pending(rx)
    }

    pub async fn create(
        &self,
        context: &Context,
        collection: &str,
        new_resource_id: Option<&str>,
        content: Value,
    ) -> Result<ResourceResponse, ResourceError> {
        let request = Request::create(
            ResourcePath::parse(collection)?,
            new_resource_id.map(str::to_string),
            content,
        );
        self.handle(context, request).await?.into_resource()
    }

    pub async fn read(
        &self,
        context: &Context,
        path: &str,
    ) -> Result<ResourceResponse, ResourceError> {
        let request = Request::read(ResourcePath::parse(path)?);
        self.handle(context, request).await?.into_resource()
    }

    pub async fn update(
        &self,
        context: &Context,
        path: &str,
        content: Value,
        revision: Option<&str>,
    ) -> Result<ResourceResponse, ResourceError> {
        let request = Request::update(
            ResourcePath::parse(path)?,
            content,
            revision.map(str::to_string),
        );
        self.handle(context, request).await?.into_resource()
    }

    pub async fn patch(
        &self,
        context: &Context,
        path: &str,
        operations: Vec<PatchOperation>,
        revision: Option<&str>,
    ) -> Result<ResourceResponse, ResourceError> {
        let request = Request::patch(
            ResourcePath::parse(path)?,
            operations,
            revision.map(str::to_string),
        );
        self.handle(context, request).await?.into_resource()
    }

    pub async fn delete(
        &self,
        context: &Context,
        path: &str,
        revision: Option<&str>,
    ) -> Result<ResourceResponse, ResourceError> {
        let request = Request::delete(ResourcePath::parse(path)?, revision.map(str::to_string));
        self.handle(context, request).await?.into_resource()
    }

    pub async fn action(
        &self,
        context: &Context,
        path: &str,
        action: &str,
        content: Value,
    ) -> Result<ActionResponse, ResourceError> {
        let request = Request::action(ResourcePath::parse(path)?, action, content);
        self.handle(context, request).await?.into_action()
    }

    /// Query every resource of a collection. Build a [`Request::Query`] and
    /// use [`Connection::handle`] for filters and paging.
    pub async fn query(
        &self,
        context: &Context,
        collection: &str,
    ) -> Result<QueryResponse, ResourceError> {
        let request = Request::query(ResourcePath::parse(collection)?);
        self.handle(context, request).await?.into_query()
    }
}

enum PromiseState {
    Ready(Option<Result<Response, ResourceError>>),
    Pending(oneshot::Receiver<Result<Response, ResourceError>>),
}

/// The deferred result of a submitted request.
///
/// Resolves exactly once. If the task running the request goes away without
/// completing it, the promise resolves to an `Internal` error.
pub struct Promise {
    state: PromiseState,
}

impl Promise {
    /// An already completed promise.
    pub fn resolved(result: Result<Response, ResourceError>) -> Self {
        Self {
            state: PromiseState::Ready(Some(result)),
        }
    }

    fn pending(rx: oneshot::Receiver<Result<Response, ResourceError>>) -> Self {
        Self {
            state: PromiseState::Pending(rx),
        }
    }
}

impl Future for Promise {
    type Output = Result<Response, ResourceError>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            PromiseState::Ready(result) => Poll::Ready(result.take().unwrap_or_else(|| {
                Err(ResourceError::internal("promise polled after completion"))
            })),
            PromiseState::Pending(rx) => Pin::new(rx).poll(cx).map(|received| {
                received.unwrap_or_else(|_| {
                    Err(ResourceError::internal(
                        "request task ended before producing a result",
                    ))
                })
            }),
        }
    }
}
