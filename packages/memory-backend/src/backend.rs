//! The in-memory collection store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crest_core::{
    apply_patch, Context, PatchOperation, QueryFilter, QueryResponse, Request, RequestHandler,
    ResourceError, ResourcePath, ResourceResponse, Response,
};

use crate::document::{format_revision, StoredDocument, FIELD_ID, FIELD_REVISION};

/// Options for a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoryBackendConfig {
    /// Check revision preconditions on update, patch and delete. When off,
    /// supplied revisions are ignored.
    pub enforce_revisions: bool,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            enforce_revisions: true,
        }
    }
}

/// An in-memory keyed document collection.
///
/// Mount it on a router; requests arrive with paths relative to the mount
/// point, so `/` addresses the collection and `/<id>` one document.
///
/// Each document lives in a concurrent map entry. Mutations of one id hold
/// that entry's lock for their whole read-check-write sequence, so they are
/// serialized, while different ids proceed independently.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: DashMap<String, StoredDocument>,
    config: MemoryBackendConfig,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryBackendConfig) -> Self {
        Self {
            documents: DashMap::new(),
            config,
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn create(
        &self,
        path: &ResourcePath,
        new_resource_id: Option<String>,
        content: Value,
    ) -> Result<ResourceResponse, ResourceError> {
        let id = match path.len() {
            0 => new_resource_id
                .or_else(|| content.get(FIELD_ID).and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            1 => path[0].clone(),
            _ => return Err(not_found(path)),
        };
        validate_id(&id)?;
        let document = StoredDocument::from_content(content)?;

        match self.documents.entry(id) {
            Entry::Occupied(entry) => Err(ResourceError::conflict(format!(
                "Resource '{}' already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                let response = document.to_response(entry.key());
                tracing::debug!(id = %entry.key(), "created resource");
                entry.insert(document);
                Ok(response)
            }
        }
    }

    pub fn read(&self, path: &ResourcePath) -> Result<ResourceResponse, ResourceError> {
        let id = resource_id(path, "read")?;
        self.documents
            .get(id)
            .map(|document| document.to_response(id))
            .ok_or_else(|| not_found(path))
    }

    pub fn update(
        &self,
        path: &ResourcePath,
        content: Value,
        revision: Option<&str>,
    ) -> Result<ResourceResponse, ResourceError> {
        let id = resource_id(path, "update")?;
        let mut document = self.documents.get_mut(id).ok_or_else(|| not_found(path))?;
        self.check_revision(id, &document, revision)?;
        document.replace(content)?;
        tracing::debug!(id, revision = %document.revision_tag(), "updated resource");
        Ok(document.to_response(id))
    }

    /// Apply `operations` to one document. Either all of them take effect
    /// or, on the first failing operation, none do.
    pub fn patch(
        &self,
        path: &ResourcePath,
        operations: &[PatchOperation],
        revision: Option<&str>,
    ) -> Result<ResourceResponse, ResourceError> {
        let id = resource_id(path, "patch")?;
        for op in operations {
            if let Some(field) = op
                .top_level_fields()
                .into_iter()
                .find(|f| f == FIELD_ID || f == FIELD_REVISION)
            {
                return Err(ResourceError::bad_request(format!(
                    "Field {} cannot be patched",
                    field
                )));
            }
        }

        let mut document = self.documents.get_mut(id).ok_or_else(|| not_found(path))?;
        self.check_revision(id, &document, revision)?;
        let patched = apply_patch(&Value::Object(document.content.clone()), operations)?;
        document.replace(patched)?;
        tracing::debug!(id, revision = %document.revision_tag(), "patched resource");
        Ok(document.to_response(id))
    }

    pub fn delete(
        &self,
        path: &ResourcePath,
        revision: Option<&str>,
    ) -> Result<ResourceResponse, ResourceError> {
        let id = resource_id(path, "delete")?;
        match self.documents.entry(id.to_string()) {
            Entry::Vacant(_) => Err(not_found(path)),
            Entry::Occupied(entry) => {
                self.check_revision(id, entry.get(), revision)?;
                let (id, document) = entry.remove_entry();
                tracing::debug!(id = %id, "deleted resource");
                Ok(document.to_response(&id))
            }
        }
    }

    /// Documents sorted by id, filtered then paged.
    pub fn query(
        &self,
        path: &ResourcePath,
        filter: Option<&QueryFilter>,
        page_size: Option<usize>,
        offset: usize,
    ) -> Result<QueryResponse, ResourceError> {
        if !path.is_empty() {
            return Err(ResourceError::not_supported(format!(
                "Query of {} is not supported, only the collection can be queried",
                path
            )));
        }

        let mut matches: Vec<ResourceResponse> = self
            .documents
            .iter()
            .map(|entry| entry.value().to_response(entry.key()))
            .filter(|response| match filter {
                Some(filter) => response.content.pointer(&filter.field) == Some(&filter.equals),
                None => true,
            })
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));

        let total_results = matches.len();
        let resources: Vec<ResourceResponse> = matches
            .into_iter()
            .skip(offset)
            .take(page_size.unwrap_or(usize::MAX))
            .collect();
        let remaining_results = total_results.saturating_sub(offset + resources.len());

        Ok(QueryResponse {
            resources,
            total_results,
            remaining_results,
        })
    }

    fn check_revision(
        &self,
        id: &str,
        document: &StoredDocument,
        expected: Option<&str>,
    ) -> Result<(), ResourceError> {
        if !self.config.enforce_revisions {
            return Ok(());
        }
        match expected {
            None | Some("*") => Ok(()),
            Some(expected) if expected == format_revision(document.revision) => Ok(()),
            Some(expected) => Err(ResourceError::precondition_failed(format!(
                "Expected revision {} of resource '{}' but it is at revision {}",
                expected,
                id,
                document.revision_tag()
            ))),
        }
    }
}

#[async_trait]
impl RequestHandler for MemoryBackend {
    async fn handle(&self, _context: &Context, request: Request) -> Result<Response, ResourceError> {
        match request {
            Request::Create {
                path,
                new_resource_id,
                content,
            } => self.create(&path, new_resource_id, content).map(Into::into),
            Request::Read { path } => self.read(&path).map(Into::into),
            Request::Update {
                path,
                content,
                revision,
            } => self
                .update(&path, content, revision.as_deref())
                .map(Into::into),
            Request::Patch {
                path,
                operations,
                revision,
            } => self
                .patch(&path, &operations, revision.as_deref())
                .map(Into::into),
            Request::Delete { path, revision } => {
                self.delete(&path, revision.as_deref()).map(Into::into)
            }
            Request::Query {
                path,
                filter,
                page_size,
                paged_results_offset,
            } => self
                .query(&path, filter.as_ref(), page_size, paged_results_offset)
                .map(Into::into),
            Request::Action { action, .. } => Err(ResourceError::not_supported(format!(
                "Unknown action {}",
                action
            ))),
        }
    }
}

/// The id a single-document request addresses.
fn resource_id<'a>(path: &'a ResourcePath, operation: &str) -> Result<&'a str, ResourceError> {
    match path.len() {
        0 => Err(ResourceError::not_supported(format!(
            "Cannot {} the collection itself, address a resource id",
            operation
        ))),
        1 => Ok(path[0].as_str()),
        _ => Err(not_found(path)),
    }
}

/// Ids must be addressable as a single path component.
fn validate_id(id: &str) -> Result<(), ResourceError> {
    ResourcePath::try_from_components(vec![id.to_string()])
        .map(|_| ())
        .map_err(|_| {
            ResourceError::bad_request(format!(
                "Invalid resource id '{}', ids must be non-empty and must not contain '/'",
                id
            ))
        })
}

fn not_found(path: &ResourcePath) -> ResourceError {
    ResourceError::not_found(format!(
        "Resource '{}' not found",
        path.components.join("/")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crest_core::{path, ErrorKind};
    use serde_json::json;

    fn user(name: &str) -> Value {
        json!({"name": name, "mail": format!("{}@email.com", name.to_lowercase())})
    }

    fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend
            .create(&ResourcePath::root(), Some("andy123".to_string()), user("Andy"))
            .unwrap();
        backend
    }

    #[test]
    fn create_then_read() {
        let backend = seeded();
        let andy = backend.read(&path!("/andy123")).unwrap();
        assert_eq!(andy.id, "andy123");
        assert_eq!(andy.revision.as_deref(), Some("1.0"));
        assert_eq!(
            andy.content,
            json!({"_id": "andy123", "_rev": "1.0", "name": "Andy", "mail": "andy@email.com"})
        );
    }

    #[test]
    fn duplicate_create_conflicts() {
        let backend = seeded();
        let err = backend
            .create(&ResourcePath::root(), Some("andy123".to_string()), user("Other"))
            .unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert!(err.message.contains("andy123"));
        assert_eq!(backend.read(&path!("/andy123")).unwrap().content["name"], "Andy");
    }

    #[test]
    fn create_id_resolution() {
        let backend = MemoryBackend::new();
        let from_content = backend
            .create(&ResourcePath::root(), None, json!({"_id": "peter123"}))
            .unwrap();
        assert_eq!(from_content.id, "peter123");

        let from_path = backend.create(&path!("/hannah123"), None, json!({})).unwrap();
        assert_eq!(from_path.id, "hannah123");

        let generated = backend.create(&ResourcePath::root(), None, json!({})).unwrap();
        assert!(Uuid::parse_str(&generated.id).is_ok());
        assert_eq!(backend.len(), 3);
    }

    #[test]
    fn unaddressable_ids_are_rejected() {
        let backend = MemoryBackend::new();

        let empty = backend
            .create(&ResourcePath::root(), Some(String::new()), user("Empty"))
            .unwrap_err();
        assert!(empty.is(ErrorKind::BadRequest));

        let slash = backend
            .create(&ResourcePath::root(), None, json!({"_id": "a/b", "name": "Slash"}))
            .unwrap_err();
        assert!(slash.is(ErrorKind::BadRequest));
        assert!(slash.message.contains("a/b"));

        let slash = backend
            .create(&ResourcePath::root(), Some("x/y".to_string()), user("Slash"))
            .unwrap_err();
        assert!(slash.is(ErrorKind::BadRequest));

        assert!(backend.is_empty());
        let listed = backend.query(&ResourcePath::root(), None, None, 0).unwrap();
        assert_eq!(listed.total_results, 0);
    }

    #[test]
    fn deep_paths_name_the_whole_path() {
        let backend = seeded();
        let err = backend.read(&path!("/andy123/name")).unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
        assert_eq!(err.message, "Resource 'andy123/name' not found");

        let err = backend.read(&path!("/nobody")).unwrap_err();
        assert_eq!(err.message, "Resource 'nobody' not found");
    }

    #[test]
    fn absent_identity_is_not_found() {
        let backend = seeded();
        let missing = path!("/nobody");
        assert!(backend.read(&missing).unwrap_err().is(ErrorKind::NotFound));
        assert!(backend
            .update(&missing, json!({}), None)
            .unwrap_err()
            .is(ErrorKind::NotFound));
        assert!(backend
            .patch(&missing, &[PatchOperation::remove("/name")], None)
            .unwrap_err()
            .is(ErrorKind::NotFound));
        assert!(backend.delete(&missing, None).unwrap_err().is(ErrorKind::NotFound));
    }

    #[test]
    fn update_advances_revision_and_checks_precondition() {
        let backend = seeded();
        let updated = backend
            .update(&path!("/andy123"), user("Andrew"), Some("1.0"))
            .unwrap();
        assert_eq!(updated.revision.as_deref(), Some("2.0"));
        assert_eq!(updated.content["name"], "Andrew");

        let err = backend
            .update(&path!("/andy123"), user("Stale"), Some("1.0"))
            .unwrap_err();
        assert!(err.is(ErrorKind::PreconditionFailed));

        let any = backend
            .update(&path!("/andy123"), user("Whoever"), Some("*"))
            .unwrap();
        assert_eq!(any.revision.as_deref(), Some("3.0"));
    }

    #[test]
    fn revisions_can_be_ignored() {
        let backend = MemoryBackend::with_config(MemoryBackendConfig {
            enforce_revisions: false,
        });
        backend.create(&path!("/x"), None, json!({})).unwrap();
        assert!(backend.update(&path!("/x"), json!({}), Some("42.0")).is_ok());
    }

    #[test]
    fn patch_is_atomic() {
        let backend = seeded();
        let err = backend
            .patch(
                &path!("/andy123"),
                &[
                    PatchOperation::replace("/name", json!("Changed")),
                    PatchOperation::increment("/mail", json!(1)),
                ],
                None,
            )
            .unwrap_err();
        assert!(err.is(ErrorKind::BadRequest));

        let andy = backend.read(&path!("/andy123")).unwrap();
        assert_eq!(andy.content["name"], "Andy");
        assert_eq!(andy.revision.as_deref(), Some("1.0"));

        let patched = backend
            .patch(
                &path!("/andy123"),
                &[PatchOperation::replace("/name", json!("Andrew"))],
                Some("1.0"),
            )
            .unwrap();
        assert_eq!(patched.content["name"], "Andrew");
        assert_eq!(patched.revision.as_deref(), Some("2.0"));
    }

    #[test]
    fn reserved_fields_cannot_be_patched() {
        let backend = seeded();
        let err = backend
            .patch(
                &path!("/andy123"),
                &[PatchOperation::replace("/_rev", json!("99.0"))],
                None,
            )
            .unwrap_err();
        assert!(err.is(ErrorKind::BadRequest));
        assert!(err.message.contains("_rev"));
    }

    #[test]
    fn delete_honours_precondition() {
        let backend = seeded();
        let err = backend.delete(&path!("/andy123"), Some("7.0")).unwrap_err();
        assert!(err.is(ErrorKind::PreconditionFailed));

        let deleted = backend.delete(&path!("/andy123"), Some("1.0")).unwrap();
        assert_eq!(deleted.content["name"], "Andy");
        assert!(backend.is_empty());
    }

    #[test]
    fn query_filters_and_pages() {
        let backend = MemoryBackend::new();
        for (id, name) in [("c", "Carol"), ("a", "Andy"), ("b", "Bob"), ("d", "Andy")] {
            backend
                .create(&ResourcePath::root(), Some(id.to_string()), user(name))
                .unwrap();
        }

        let all = backend.query(&ResourcePath::root(), None, None, 0).unwrap();
        let ids: Vec<&str> = all.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);

        let page = backend.query(&ResourcePath::root(), None, Some(2), 1).unwrap();
        let ids: Vec<&str> = page.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(page.total_results, 4);
        assert_eq!(page.remaining_results, 1);

        let filter = QueryFilter {
            field: "/name".to_string(),
            equals: json!("Andy"),
        };
        let andys = backend
            .query(&ResourcePath::root(), Some(&filter), None, 0)
            .unwrap();
        assert_eq!(andys.total_results, 2);
    }

    #[tokio::test]
    async fn handler_rejects_actions_and_collection_reads() {
        let backend = seeded();
        let context = Context::root();

        let err = backend
            .handle(&context, Request::action(ResourcePath::root(), "send", json!({})))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotSupported));
        assert!(err.message.contains("send"));

        let err = backend
            .handle(&context, Request::read(ResourcePath::root()))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotSupported));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_of_one_id_admit_exactly_one() {
        let backend = Arc::new(MemoryBackend::new());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let backend = backend.clone();
            tasks.push(tokio::spawn(async move {
                backend
                    .handle(
                        &Context::root(),
                        Request::create(
                            ResourcePath::root(),
                            Some("same".to_string()),
                            json!({"n": i}),
                        ),
                    )
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) if e.is(ErrorKind::Conflict) => conflicts += 1,
                Err(e) => panic!("unexpected error {}", e),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_serialized() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .create(&path!("/counter"), None, json!({"count": 0}))
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let backend = backend.clone();
            tasks.push(tokio::spawn(async move {
                backend.patch(
                    &path!("/counter"),
                    &[PatchOperation::increment("/count", json!(1))],
                    None,
                )
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let counter = backend.read(&path!("/counter")).unwrap();
        assert_eq!(counter.content["count"], 32);
        assert_eq!(counter.revision.as_deref(), Some("33.0"));
    }
}
