//! Route table storage: values keyed by path, looked up by longest prefix.

use std::collections::BTreeMap;

use crate::ResourcePath;

/// Values stored at paths, one node per path component.
///
/// ```rust
/// use crest_core::{PathTrie, path};
///
/// let mut routes: PathTrie<&str> = PathTrie::new();
/// routes.insert(&path!("users"), "collection");
/// routes.insert(&path!("users/admins"), "admins");
///
/// let (handler, rest) = routes.find_ancestor(&path!("users/andy123")).unwrap();
/// assert_eq!(*handler, "collection");
/// assert_eq!(rest, path!("andy123"));
/// ```
#[derive(Debug, Clone)]
pub struct PathTrie<T> {
    value: Option<T>,
    children: BTreeMap<String, PathTrie<T>>,
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

impl<T> PathTrie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, path: &ResourcePath) -> Option<&PathTrie<T>> {
        path.iter()
            .try_fold(self, |node, component| node.children.get(component))
    }

    /// Store `value` at `path`, handing back whatever was there.
    pub fn insert(&mut self, path: &ResourcePath, value: T) -> Option<T> {
        let node = path.iter().fold(self, |node, component| {
            node.children.entry(component.clone()).or_default()
        });
        node.value.replace(value)
    }

    /// Take the value stored exactly at `path`. Deeper values stay put.
    pub fn remove(&mut self, path: &ResourcePath) -> Option<T> {
        let mut node = self;
        for component in path.iter() {
            node = node.children.get_mut(component)?;
        }
        node.value.take()
    }

    pub fn get(&self, path: &ResourcePath) -> Option<&T> {
        self.node(path)?.value.as_ref()
    }

    pub fn contains_value(&self, path: &ResourcePath) -> bool {
        self.get(path).is_some()
    }

    /// The value stored at the deepest prefix of `path`, with the rest of
    /// `path` below that prefix.
    pub fn find_ancestor(&self, path: &ResourcePath) -> Option<(&T, ResourcePath)> {
        let mut node = self;
        let mut best = self.value.as_ref().map(|value| (value, 0));

        for (depth, component) in path.iter().enumerate() {
            let Some(child) = node.children.get(component) else {
                break;
            };
            node = child;
            if let Some(value) = &node.value {
                best = Some((value, depth + 1));
            }
        }

        best.map(|(value, depth)| {
            let rest = ResourcePath {
                components: path.components[depth..].to_vec(),
            };
            (value, rest)
        })
    }

    /// Every path holding a value, parents before children, siblings sorted.
    pub fn paths(&self) -> Vec<ResourcePath> {
        let mut found = Vec::new();
        self.collect_paths(ResourcePath::root(), &mut found);
        found
    }

    fn collect_paths(&self, here: ResourcePath, found: &mut Vec<ResourcePath>) {
        if self.value.is_some() {
            found.push(here.clone());
        }
        for (component, child) in &self.children {
            child.collect_paths(here.child(component.clone()), found);
        }
    }
}
