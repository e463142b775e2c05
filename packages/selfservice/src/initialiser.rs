//! Wires the resource providers behind a router and seeds demo data.

use std::sync::Arc;

use crest_core::{ConnectionFactory, Context, InternalConnectionFactory, ResourceError, Router};
use crest_memory_backend::MemoryBackend;

use crate::config::Config;
use crate::demo;
use crate::email::{EmailService, EmailSink, TracingSink};

/// Routing table: the user collection and the e-mail singleton.
pub fn build_router<S>(config: &Config, sink: S) -> Result<Router, ResourceError>
where
    S: EmailSink + 'static,
{
    let mut router = Router::new();
    router.add_route(
        &config.users_path,
        MemoryBackend::with_config(config.memory.clone()),
    )?;
    router.add_route(&config.email_path, EmailService::new(sink))?;
    Ok(router)
}

/// Build the router with a logging e-mail sink, seed the demo users if
/// configured, and return a factory for connections into it.
pub async fn initialise(config: &Config) -> Result<InternalConnectionFactory, ResourceError> {
    initialise_with_sink(config, TracingSink).await
}

pub async fn initialise_with_sink<S>(
    config: &Config,
    sink: S,
) -> Result<InternalConnectionFactory, ResourceError>
where
    S: EmailSink + 'static,
{
    let router = build_router(config, sink)?;
    for route in router.routes() {
        tracing::info!(route = %route, "route ready");
    }

    let factory = InternalConnectionFactory::new(Arc::new(router));
    if config.seed_demo_data {
        let connection = factory.connection()?;
        demo::create_demo_data(&connection, &Context::root(), &config.users_path).await?;
    }
    Ok(factory)
}
