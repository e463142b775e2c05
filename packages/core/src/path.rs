//! Resource paths and route templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors related to path parsing and validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A template component is not a valid identifier.
    #[error("invalid path component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    #[error("invalid path: {message}")]
    InvalidPath { message: String },
}

/// A path addressing a resource, e.g. `/users/andy123`.
///
/// Components are arbitrary non-empty strings so that resource identifiers
/// (UUIDs, e-mail style ids, numbers) can appear in them. Route templates are
/// stricter, see [`ResourcePath::parse_template`].
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourcePath {
    pub components: Vec<String>,
}

impl ResourcePath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path string.
    ///
    /// Components are separated by `/`. Empty components are ignored, which
    /// normalizes leading, trailing and doubled slashes.
    ///
    /// ```rust
    /// use crest_core::ResourcePath;
    ///
    /// let path = ResourcePath::parse("/users/andy123").unwrap();
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(path, ResourcePath::parse("users/andy123/").unwrap());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let components = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ResourcePath { components })
    }

    /// Parse a route template.
    ///
    /// Every component must be a Unicode identifier (UAX#31) or a numeric
    /// string. The root template (`""` or `"/"`) is allowed.
    pub fn parse_template(s: &str) -> Result<Self, PathError> {
        let path = Self::parse(s)?;
        for (i, component) in path.components.iter().enumerate() {
            Self::validate_template_component(component, i)?;
        }
        Ok(path)
    }

    /// Try to create a path from components.
    pub fn try_from_components(components: Vec<String>) -> Result<Self, PathError> {
        for (position, component) in components.iter().enumerate() {
            if component.is_empty() || component.contains('/') {
                return Err(PathError::InvalidComponent {
                    component: component.clone(),
                    position,
                    message: "components must be non-empty and must not contain '/'".to_string(),
                });
            }
        }
        Ok(ResourcePath { components })
    }

    fn validate_template_component(component: &str, position: usize) -> Result<(), PathError> {
        if component.chars().all(|c| c.is_ascii_digit()) {
            return Ok(());
        }

        let mut chars = component.chars();
        let Some(first) = chars.next() else {
            return Err(PathError::InvalidComponent {
                component: component.to_string(),
                position,
                message: "empty component".to_string(),
            });
        };

        let valid_start = unicode_ident::is_xid_start(first)
            || (first == '_'
                && chars
                    .clone()
                    .next()
                    .is_some_and(unicode_ident::is_xid_continue));

        if !valid_start {
            return Err(PathError::InvalidComponent {
                component: component.to_string(),
                position,
                message: "must start with a letter or underscore followed by letter/digit"
                    .to_string(),
            });
        }

        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(PathError::InvalidComponent {
                    component: component.to_string(),
                    position,
                    message: format!("invalid character '{}' in identifier", c),
                });
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Last component, usually a resource id.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// The path without its last component.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.is_empty() {
            return None;
        }
        Some(ResourcePath {
            components: self.components[..self.len() - 1].to_vec(),
        })
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &ResourcePath) -> ResourcePath {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        ResourcePath { components }
    }

    /// Append a single component (e.g. a resource id).
    #[must_use]
    pub fn child(&self, component: impl Into<String>) -> ResourcePath {
        let mut components = self.components.clone();
        components.push(component.into());
        ResourcePath { components }
    }

    pub fn has_prefix(&self, prefix: &ResourcePath) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &ResourcePath) -> Option<ResourcePath> {
        if self.has_prefix(prefix) {
            Some(ResourcePath {
                components: self.components[prefix.components.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.components.join("/"))
    }
}

impl FromStr for ResourcePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::ops::Index<usize> for ResourcePath {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

impl Serialize for ResourcePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourcePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ResourcePath::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro for creating paths from literals.
///
/// ```rust
/// use crest_core::path;
///
/// let p = path!("/users/andy123");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::ResourcePath::parse($s).expect("invalid path literal")
    };
}
