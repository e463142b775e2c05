//! Demo users seeded into the user collection at startup.

use serde_json::{json, Value};

use crest_core::{Connection, Context, ErrorKind, ResourceError, ResourceResponse};
use crest_memory_backend::INITIAL_REVISION;

/// One seeded user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoUser {
    pub id: &'static str,
    pub name: &'static str,
    pub mail: &'static str,
}

impl DemoUser {
    /// `{ "_id", "name", "mail", "_rev" }`
    pub fn to_document(&self) -> Value {
        json!({
            "_id": self.id,
            "name": self.name,
            "mail": self.mail,
            "_rev": INITIAL_REVISION,
        })
    }
}

pub const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        id: "andy123",
        name: "Andy",
        mail: "andy@email.com",
    },
    DemoUser {
        id: "peter123",
        name: "Peter",
        mail: "peter@email.com",
    },
    DemoUser {
        id: "hannah123",
        name: "Hannah",
        mail: "hannah@email.com",
    },
];

/// Create every demo user under `users_path`.
///
/// Only succeeds on a fresh collection: the first user that already exists
/// fails the whole call with `Conflict`.
pub async fn create_demo_data(
    connection: &Connection,
    context: &Context,
    users_path: &str,
) -> Result<Vec<ResourceResponse>, ResourceError> {
    let mut created = Vec::with_capacity(DEMO_USERS.len());
    for user in &DEMO_USERS {
        let response = connection
            .create(&context.child(), users_path, Some(user.id), user.to_document())
            .await?;
        created.push(response);
    }
    tracing::info!(count = created.len(), path = users_path, "seeded demo users");
    Ok(created)
}

/// Like [`create_demo_data`], but users that already exist are skipped.
/// Returns how many users were created.
pub async fn seed_tolerating_conflicts(
    connection: &Connection,
    context: &Context,
    users_path: &str,
) -> Result<usize, ResourceError> {
    let mut created = 0;
    for user in &DEMO_USERS {
        match connection
            .create(&context.child(), users_path, Some(user.id), user.to_document())
            .await
        {
            Ok(_) => created += 1,
            Err(e) if e.is(ErrorKind::Conflict) => {
                tracing::warn!(id = user.id, "demo user already present, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crest_core::{ConnectionFactory, InternalConnectionFactory, Router};
    use crest_memory_backend::MemoryBackend;

    fn connection() -> Connection {
        let mut router = Router::new();
        router.add_route("/users", MemoryBackend::new()).unwrap();
        InternalConnectionFactory::new(Arc::new(router))
            .connection()
            .unwrap()
    }

    #[tokio::test]
    async fn seeds_three_users() {
        let conn = connection();
        let created = create_demo_data(&conn, &Context::root(), "/users")
            .await
            .unwrap();
        let ids: Vec<&str> = created.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["andy123", "peter123", "hannah123"]);
        assert!(created
            .iter()
            .all(|r| r.revision.as_deref() == Some(INITIAL_REVISION)));
    }

    #[tokio::test]
    async fn reseeding_conflicts() {
        let conn = connection();
        create_demo_data(&conn, &Context::root(), "/users")
            .await
            .unwrap();
        let err = create_demo_data(&conn, &Context::root(), "/users")
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert!(err.message.contains("andy123"));
    }

    #[tokio::test]
    async fn tolerant_seeding_skips_existing() {
        let conn = connection();
        conn.create(
            &Context::root(),
            "/users",
            Some("peter123"),
            DEMO_USERS[1].to_document(),
        )
        .await
        .unwrap();

        let created = seed_tolerating_conflicts(&conn, &Context::root(), "/users")
            .await
            .unwrap();
        assert_eq!(created, 2);
        assert_eq!(
            seed_tolerating_conflicts(&conn, &Context::root(), "/users")
                .await
                .unwrap(),
            0
        );
    }

    #[test]
    fn document_shape() {
        assert_eq!(
            DEMO_USERS[0].to_document(),
            json!({"_id": "andy123", "name": "Andy", "mail": "andy@email.com", "_rev": "1.0"})
        );
    }
}
