//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Validate a pattern string and compile it into a `PathPattern`
//! - Test a request path against a compiled pattern
//! - Split a matched path into servlet path and path info
//!
//! # Pattern Syntax
//! ```text
//! ""          root       matches exactly "/"
//! "/"         default    matches every path
//! "/*"        prefix     matches every path
//! "/a/b/*"    prefix     matches "/a/b" and "/a/b/..."
//! "*.ext"     extension  last path segment ends with ".ext"
//! "/a/b"      path       matches "/a/b" and "/a/b/..."
//! ```
//!
//! # Design Decisions
//! - No regex: every kind is a prefix/suffix/equality check
//! - Path matching is case-sensitive
//! - Compilation is pure and cheap; the registry defers it until activation

use thiserror::Error;

/// A pattern that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern '{pattern}': {reason}")]
pub struct InvalidPatternError {
    pub pattern: String,
    pub reason: &'static str,
}

impl InvalidPatternError {
    fn new(pattern: &str, reason: &'static str) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    Root,
    Default,
    /// Prefix without the trailing "/*"; empty for "/*".
    Prefix(String),
    /// Extension including the leading dot.
    Extension(String),
    /// Plain path: the path itself and everything below it.
    Path(String),
}

/// How a matched path splits into the part that selected the handler and
/// the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub servlet_path: String,
    pub path_info: Option<String>,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    kind: PatternKind,
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn compile(pattern: &str) -> Result<Self, InvalidPatternError> {
        if pattern.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(InvalidPatternError::new(pattern, "contains whitespace or control characters"));
        }

        let kind = if pattern.is_empty() {
            PatternKind::Root
        } else if pattern == "/" {
            PatternKind::Default
        } else if let Some(ext) = pattern.strip_prefix("*.") {
            if ext.is_empty() {
                return Err(InvalidPatternError::new(pattern, "empty extension"));
            }
            if ext.contains(['/', '.', '*']) {
                return Err(InvalidPatternError::new(pattern, "extension must be a single segment"));
            }
            PatternKind::Extension(format!(".{ext}"))
        } else if !pattern.starts_with('/') {
            return Err(InvalidPatternError::new(pattern, "must start with '/' or '*.'"));
        } else if let Some(prefix) = pattern.strip_suffix("/*") {
            if prefix.contains('*') {
                return Err(InvalidPatternError::new(pattern, "wildcard only allowed as trailing '/*'"));
            }
            PatternKind::Prefix(prefix.to_string())
        } else if pattern.contains('*') {
            return Err(InvalidPatternError::new(pattern, "wildcard only allowed as trailing '/*'"));
        } else {
            PatternKind::Path(pattern.to_string())
        };

        Ok(Self {
            source: pattern.to_string(),
            kind,
        })
    }

    /// The pattern string this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `path` is served by this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match &self.kind {
            PatternKind::Root => path == "/",
            PatternKind::Default => true,
            PatternKind::Prefix(base) | PatternKind::Path(base) => under(base, path),
            PatternKind::Extension(ext) => {
                let last = path.rsplit('/').next().unwrap_or(path);
                last.len() > ext.len() && last.ends_with(ext.as_str())
            }
        }
    }

    /// Match and split `path`, or `None` if it does not match.
    pub fn resolve(&self, path: &str) -> Option<PathMatch> {
        if !self.matches(path) {
            return None;
        }

        let split = match &self.kind {
            PatternKind::Root => PathMatch {
                servlet_path: String::new(),
                path_info: Some("/".to_string()),
            },
            PatternKind::Prefix(base) | PatternKind::Path(base) => {
                let rest = &path[base.len()..];
                PathMatch {
                    servlet_path: base.clone(),
                    path_info: (!rest.is_empty()).then(|| rest.to_string()),
                }
            }
            PatternKind::Default | PatternKind::Extension(_) => PathMatch {
                servlet_path: path.to_string(),
                path_info: None,
            },
        };
        Some(split)
    }
}

/// True if `path` is `base` or lies below `base/`.
fn under(base: &str, path: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(p: &str) -> PathPattern {
        PathPattern::compile(p).unwrap()
    }

    #[test]
    fn test_path_matcher() {
        let p = compile("/api/v1");
        assert!(p.matches("/api/v1"));
        assert!(p.matches("/api/v1/"));
        assert!(p.matches("/api/v1/users"));
        assert!(!p.matches("/api/v10"));
        assert!(!p.matches("/api"));
        assert!(!p.matches("/API/v1")); // Case sensitive

        let split = p.resolve("/api/v1").unwrap();
        assert_eq!(split.servlet_path, "/api/v1");
        assert_eq!(split.path_info, None);

        let split = p.resolve("/api/v1/users/7").unwrap();
        assert_eq!(split.servlet_path, "/api/v1");
        assert_eq!(split.path_info.as_deref(), Some("/users/7"));
    }

    #[test]
    fn test_prefix_matcher() {
        let p = compile("/api/*");
        assert!(p.matches("/api"));
        assert!(p.matches("/api/"));
        assert!(p.matches("/api/users/1"));
        assert!(!p.matches("/apis"));
        assert!(!p.matches("/images"));

        let split = p.resolve("/api/users/1").unwrap();
        assert_eq!(split.servlet_path, "/api");
        assert_eq!(split.path_info.as_deref(), Some("/users/1"));

        let split = p.resolve("/api").unwrap();
        assert_eq!(split.path_info, None);
    }

    #[test]
    fn test_catch_all_matchers() {
        let all = compile("/*");
        assert!(all.matches("/"));
        assert!(all.matches("/anything/at/all"));
        let split = all.resolve("/x/y").unwrap();
        assert_eq!(split.servlet_path, "");
        assert_eq!(split.path_info.as_deref(), Some("/x/y"));

        let default = compile("/");
        assert!(default.matches("/x"));
        let split = default.resolve("/x").unwrap();
        assert_eq!(split.servlet_path, "/x");
        assert_eq!(split.path_info, None);
    }

    #[test]
    fn test_root_matcher() {
        let p = compile("");
        assert!(p.matches("/"));
        assert!(!p.matches("/a"));
        let split = p.resolve("/").unwrap();
        assert_eq!(split.servlet_path, "");
        assert_eq!(split.path_info.as_deref(), Some("/"));
    }

    #[test]
    fn test_extension_matcher() {
        let p = compile("*.jsp");
        assert!(p.matches("/index.jsp"));
        assert!(p.matches("/a/b/page.jsp"));
        assert!(!p.matches("/a.jsp/page"));
        assert!(!p.matches("/a/.jsp"));
        assert!(!p.matches("/page.jspx"));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["api", "/a/*/b", "/a*", "*.", "*.a/b", "*.tar.gz", "/a b", "**"] {
            let err = PathPattern::compile(bad).unwrap_err();
            assert_eq!(err.pattern, bad);
        }
    }
}
