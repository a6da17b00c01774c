//! Config Path Composition
//!
//! Maps project/environment/key coordinates onto store paths. Every
//! user-supplied segment is validated here so that no input can add, remove
//! or rename levels of the tree.

use crate::error::{CcmError, CcmResult};

/// Store path separator
pub const SEPARATOR: char = '/';

/// Root segment all configuration lives under
pub const DEFAULT_ROOT: &str = "configs";

/// Validated `[project, environment]` or `[project, environment, key]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// Path of an environment node
    pub fn environment(project: &str, environment: &str) -> CcmResult<Self> {
        Self::from_segments(&[project, environment])
    }

    /// Path of a single key node
    pub fn key(project: &str, environment: &str, key: &str) -> CcmResult<Self> {
        Self::from_segments(&[project, environment, key])
    }

    fn from_segments(segments: &[&str]) -> CcmResult<Self> {
        let segments = segments
            .iter()
            .map(|segment| validate_segment(segment).map(|_| segment.to_string()))
            .collect::<CcmResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Compose the absolute store path below `root`
    pub fn store_path(&self, root: &str) -> String {
        let mut path = String::with_capacity(
            1 + root.len() + self.segments.iter().map(|s| s.len() + 1).sum::<usize>(),
        );
        path.push(SEPARATOR);
        path.push_str(root);
        for segment in &self.segments {
            path.push(SEPARATOR);
            path.push_str(segment);
        }
        path
    }
}

/// Check that a single segment names exactly one node
pub fn validate_segment(segment: &str) -> CcmResult<()> {
    let reason = if segment.is_empty() {
        "segment must not be empty"
    } else if segment.contains(SEPARATOR) {
        "segment must not contain '/'"
    } else if segment == "." || segment == ".." {
        "relative segments are not allowed"
    } else if segment.contains('\0') {
        "segment must not contain NUL"
    } else {
        return Ok(());
    };

    Err(CcmError::InvalidSegment {
        segment: segment.to_string(),
        reason,
    })
}

/// Append a child name to an absolute path
pub fn join(parent: &str, child: &str) -> String {
    if parent == "/" {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Parent of an absolute path (`/` for top-level nodes)
pub fn parent(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Proper ancestors of an absolute path, outermost first, excluding `/`
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices(SEPARATOR)
        .map(|(idx, _)| idx)
        .filter(|&idx| idx > 0)
        .map(move |idx| &path[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_path_composition() {
        let env = ConfigPath::environment("billing", "prod").unwrap();
        assert_eq!(env.store_path(DEFAULT_ROOT), "/configs/billing/prod");

        let key = ConfigPath::key("billing", "prod", "timeout").unwrap();
        assert_eq!(key.store_path(DEFAULT_ROOT), "/configs/billing/prod/timeout");
        assert_eq!(key.segments().len(), 3);
    }

    #[test]
    fn test_rejects_separator_injection() {
        let err = ConfigPath::key("billing", "prod/../staging", "timeout").unwrap_err();
        match err {
            CcmError::InvalidSegment { segment, .. } => assert_eq!(segment, "prod/../staging"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_empty_and_relative_segments() {
        assert!(ConfigPath::environment("", "prod").is_err());
        assert!(ConfigPath::environment("billing", "..").is_err());
        assert!(ConfigPath::key("billing", "prod", ".").is_err());
        assert!(ConfigPath::key("billing", "prod", "a\0b").is_err());
    }

    #[test]
    fn test_dotted_keys_are_plain_segments() {
        let key = ConfigPath::key("myapp", "dev", "app.endpoint.url").unwrap();
        assert_eq!(key.store_path("configs"), "/configs/myapp/dev/app.endpoint.url");
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join("/", "configs"), "/configs");
        assert_eq!(join("/configs/billing", "prod"), "/configs/billing/prod");
        assert_eq!(parent("/configs/billing/prod"), "/configs/billing");
        assert_eq!(parent("/configs"), "/");
    }

    #[test]
    fn test_ancestors() {
        let found: Vec<&str> = ancestors("/configs/billing/prod/timeout").collect();
        assert_eq!(found, vec!["/configs", "/configs/billing", "/configs/billing/prod"]);
        assert_eq!(ancestors("/configs").count(), 0);
    }
}
