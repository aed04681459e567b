//! Shared domain types for the loader pipeline

use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};

/// A single schema-less document decoded from one input line.
///
/// Contents are opaque to the loader; the backend indexes them by `_id`.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A named load destination: collection name, source file, and batch size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTarget {
    /// Destination collection name
    pub collection: String,

    /// Line-delimited JSON source file
    pub source: PathBuf,

    /// Documents per insert batch
    pub batch_size: usize,
}

impl CollectionTarget {
    /// Create a target with an explicit source path
    pub fn new(
        collection: impl Into<String>,
        source: impl Into<PathBuf>,
        batch_size: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            source: source.into(),
            batch_size,
        }
    }

    /// Parse a target spec from the command line.
    ///
    /// A bare name resolves to `<data_dir>/<name>.json`; `name=path` names the
    /// source file explicitly.
    pub fn parse(spec: &str, data_dir: &Path, batch_size: usize) -> Result<Self> {
        let (name, source) = match spec.split_once('=') {
            Some((name, path)) => {
                let path = path.trim();
                if path.is_empty() {
                    return Err(LoadError::invalid_target(spec, "source path is empty"));
                }
                (name.trim(), PathBuf::from(path))
            },
            None => {
                let name = spec.trim();
                (name, data_dir.join(format!("{name}.json")))
            },
        };

        let target = Self::new(name, source, batch_size);
        target.validate()?;
        Ok(target)
    }

    /// Validate the target before any work is attempted
    pub fn validate(&self) -> Result<()> {
        if self.collection.is_empty() {
            return Err(LoadError::invalid_target(
                &self.collection,
                "collection name is empty",
            ));
        }

        if self.collection.contains('$') {
            return Err(LoadError::invalid_target(
                &self.collection,
                "collection name must not contain '$'",
            ));
        }

        if self.collection.starts_with("system.") {
            return Err(LoadError::invalid_target(
                &self.collection,
                "collection name must not start with 'system.'",
            ));
        }

        if self.batch_size == 0 {
            return Err(LoadError::config("batch size must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name_resolves_under_data_dir() {
        let target = CollectionTarget::parse("movies", Path::new("./data"), 50).unwrap();

        assert_eq!(target.collection, "movies");
        assert_eq!(target.source, PathBuf::from("./data/movies.json"));
        assert_eq!(target.batch_size, 50);
    }

    #[test]
    fn test_parse_explicit_source_path() {
        let target =
            CollectionTarget::parse("comments=/tmp/mflix/comments.jsonl", Path::new("./data"), 25)
                .unwrap();

        assert_eq!(target.collection, "comments");
        assert_eq!(target.source, PathBuf::from("/tmp/mflix/comments.jsonl"));
        assert_eq!(target.batch_size, 25);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let target =
            CollectionTarget::parse(" users = ./users.json ", Path::new("."), 10).unwrap();

        assert_eq!(target.collection, "users");
        assert_eq!(target.source, PathBuf::from("./users.json"));
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        let result = CollectionTarget::parse("", Path::new("."), 50);
        assert!(matches!(result, Err(LoadError::InvalidTarget { .. })));

        let result = CollectionTarget::parse("=file.json", Path::new("."), 50);
        assert!(matches!(result, Err(LoadError::InvalidTarget { .. })));
    }

    #[test]
    fn test_parse_rejects_empty_path() {
        let result = CollectionTarget::parse("movies=", Path::new("."), 50);
        assert!(matches!(result, Err(LoadError::InvalidTarget { .. })));
    }

    #[test]
    fn test_validate_rejects_reserved_names() {
        let target = CollectionTarget::new("system.users", "./users.json", 50);
        assert!(matches!(
            target.validate(),
            Err(LoadError::InvalidTarget { .. })
        ));

        let target = CollectionTarget::new("mo$vies", "./movies.json", 50);
        assert!(matches!(
            target.validate(),
            Err(LoadError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let target = CollectionTarget::new("movies", "./movies.json", 0);
        assert!(matches!(target.validate(), Err(LoadError::Config(_))));
    }
}
