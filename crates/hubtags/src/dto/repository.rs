use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace used when a repository is given without one, e.g. `alpine`.
pub const DEFAULT_NAMESPACE: &str = "library";

lazy_static! {
    static ref NAME_COMPONENT_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").unwrap();
}

/// A repository on the registry, e.g. `library/alpine`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub namespace: String,
    pub repository: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryRefError {
    #[error("repository name is empty")]
    Empty,
    #[error("invalid name component: '{0}'")]
    InvalidName(String),
    #[error("malformed repository, expected `repository` or `namespace/repository`")]
    Malformed,
}

impl RepositoryRef {
    /// Create a reference, falling back to [`DEFAULT_NAMESPACE`] when `namespace` is `None`.
    pub fn new(repository: &str, namespace: Option<&str>) -> Result<Self, RepositoryRefError> {
        let repository = repository.trim();
        if repository.is_empty() {
            return Err(RepositoryRefError::Empty);
        }

        let namespace = namespace
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE);

        validate_component(namespace)?;
        validate_component(repository)?;

        Ok(Self {
            namespace: namespace.to_string(),
            repository: repository.to_string(),
        })
    }

    /// Parse `repository` or `namespace/repository`, using `default_namespace` for the former.
    pub fn parse_with_default(val: &str, default_namespace: &str) -> Result<Self, RepositoryRefError> {
        let splits: Vec<&str> = val.trim().split('/').collect();
        match splits.as_slice() {
            [repository] => Self::new(repository, Some(default_namespace)),
            [namespace, repository] => {
                if namespace.is_empty() {
                    return Err(RepositoryRefError::Malformed);
                }
                Self::new(repository, Some(namespace))
            },
            _ => Err(RepositoryRefError::Malformed),
        }
    }

    /// Returns a copy with a different namespace.
    pub fn with_namespace(&self, namespace: &str) -> Result<Self, RepositoryRefError> {
        Self::new(&self.repository, Some(namespace))
    }
}

fn validate_component(component: &str) -> Result<(), RepositoryRefError> {
    if NAME_COMPONENT_REGEX.is_match(component) {
        Ok(())
    } else {
        Err(RepositoryRefError::InvalidName(component.into()))
    }
}

impl FromStr for RepositoryRef {
    type Err = RepositoryRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default(s, DEFAULT_NAMESPACE)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_repository_uses_default_namespace() {
        let r: RepositoryRef = "alpine".parse().unwrap();
        assert_eq!(r.namespace, "library");
        assert_eq!(r.repository, "alpine");
        assert_eq!(r.to_string(), "library/alpine");
    }

    #[test]
    fn namespaced_repository() {
        let r: RepositoryRef = "bitnami/redis".parse().unwrap();
        assert_eq!(r.namespace, "bitnami");
        assert_eq!(r.repository, "redis");
    }

    #[test]
    fn custom_default_namespace() {
        let r = RepositoryRef::parse_with_default("nginx", "myorg").unwrap();
        assert_eq!(r.to_string(), "myorg/nginx");
    }

    #[test]
    fn empty_namespace_argument_falls_back() {
        let r = RepositoryRef::new("nginx", Some("  ")).unwrap();
        assert_eq!(r.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<RepositoryRef>(), Err(RepositoryRefError::Empty));
        assert_eq!("a/b/c".parse::<RepositoryRef>(), Err(RepositoryRefError::Malformed));
        assert_eq!("/redis".parse::<RepositoryRef>(), Err(RepositoryRefError::Malformed));
        assert_eq!(
            "Library/alpine".parse::<RepositoryRef>(),
            Err(RepositoryRefError::InvalidName("Library".into()))
        );
        assert_eq!(
            "my-.repo".parse::<RepositoryRef>(),
            Err(RepositoryRefError::InvalidName("my-.repo".into()))
        );
    }

    #[test]
    fn separators_inside_names_are_allowed() {
        assert!("my-org/some_repo.v2".parse::<RepositoryRef>().is_ok());
        assert!("my__org/a--b".parse::<RepositoryRef>().is_ok());
    }
}
