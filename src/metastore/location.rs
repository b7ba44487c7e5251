//! Storage-location rewriting.
//!
//! Every entity the orchestrator writes has its location passed through a
//! [`LocationTransform`]. The individual rewrite steps are exposed as free
//! functions so each can be exercised on its own.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{MetastoreError, MetastoreResult};

/// Prefix of Databricks File System locations.
pub const DBFS_PREFIX: &str = "dbfs:/";

/// `scheme://host/path...`
static STRUCTURED_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<host>[^/]+)(?P<path>/.*)?$")
        .expect("valid location regex")
});

/// A location split into its scheme, authority and path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedLocation<'a> {
    scheme: &'a str,
    host: &'a str,
    /// Path without the leading `/`; may be empty.
    path: &'a str,
}

fn parse_location(location: &str) -> MetastoreResult<ParsedLocation<'_>> {
    let caps = STRUCTURED_LOCATION
        .captures(location)
        .ok_or_else(|| MetastoreError::InvalidLocation(location.to_string()))?;

    let span = |name: &str| caps.name(name).map_or("", |m| m.as_str());
    Ok(ParsedLocation {
        scheme: span("scheme"),
        host: span("host"),
        path: span("path").trim_start_matches('/'),
    })
}

/// Translate a DBFS path to an object-store path rooted at `dbfs_root`.
///
/// Only the leading `dbfs:/` is replaced. Locations with any other prefix,
/// or an empty `dbfs_root`, are returned unchanged.
pub fn handle_dbfs_location(location: &str, dbfs_root: &str) -> String {
    if !dbfs_root.is_empty() && location.starts_with(DBFS_PREFIX) {
        location.replacen(DBFS_PREFIX, dbfs_root, 1)
    } else {
        location.to_string()
    }
}

/// Replace the branch segment of `scheme://repository/branch/path`.
pub fn replace_branch_name(location: &str, branch: &str) -> MetastoreResult<String> {
    let parsed = parse_location(location)?;
    let (current, rest) = match parsed.path.split_once('/') {
        Some((current, rest)) => (current, Some(rest)),
        None => (parsed.path, None),
    };
    if current.is_empty() {
        return Err(MetastoreError::InvalidLocation(location.to_string()));
    }

    let mut out = format!("{}://{}/{}", parsed.scheme, parsed.host, branch);
    if let Some(rest) = rest {
        out.push('/');
        out.push_str(rest);
    }
    Ok(out)
}

/// Re-root `scheme://repository/branch/path` under `prefix`.
///
/// Produces `{prefix}/{repository}/{branch}/{path}`.
pub fn symlink_location(location: &str, prefix: &str) -> MetastoreResult<String> {
    let parsed = parse_location(location)?;
    if parsed.path.is_empty() {
        return Err(MetastoreError::InvalidLocation(location.to_string()));
    }
    Ok(format!(
        "{}/{}/{}",
        prefix.trim_end_matches('/'),
        parsed.host,
        parsed.path
    ))
}

/// Address an external `scheme://bucket/key` location inside `repository`
/// at `branch`, the way imported objects are laid out.
pub fn import_location(location: &str, repository: &str, branch: &str) -> MetastoreResult<String> {
    let parsed = parse_location(location)?;
    let mut out = format!(
        "{}://{}/{}/{}",
        parsed.scheme, repository, branch, parsed.host
    );
    if !parsed.path.is_empty() {
        out.push('/');
        out.push_str(parsed.path);
    }
    Ok(out)
}

/// How locations are rewritten while copying entities between catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LocationTransform {
    /// Leave locations untouched.
    #[default]
    Identity,
    /// DBFS rewrite, then branch substitution. An empty branch skips the
    /// substitution.
    Branch {
        /// Replacement root for `dbfs:/` locations; empty disables.
        dbfs_root: String,
        /// Target branch.
        branch: String,
    },
    /// DBFS rewrite, then re-address into a repository as imported data.
    Import {
        /// Replacement root for `dbfs:/` locations; empty disables.
        dbfs_root: String,
        /// Destination repository.
        repository: String,
        /// Destination branch.
        branch: String,
    },
    /// Re-root under a symlink prefix.
    Symlink {
        /// Location prefix of the symlink tree.
        prefix: String,
    },
}

impl LocationTransform {
    /// No rewriting.
    pub fn identity() -> Self {
        Self::Identity
    }

    /// DBFS rewrite followed by branch substitution.
    pub fn branch(dbfs_root: impl Into<String>, branch: impl Into<String>) -> Self {
        Self::Branch {
            dbfs_root: dbfs_root.into(),
            branch: branch.into(),
        }
    }

    /// DBFS rewrite followed by the import rewrite.
    pub fn import(
        dbfs_root: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self::Import {
            dbfs_root: dbfs_root.into(),
            repository: repository.into(),
            branch: branch.into(),
        }
    }

    /// Symlink rewrite.
    pub fn symlink(prefix: impl Into<String>) -> Self {
        Self::Symlink {
            prefix: prefix.into(),
        }
    }

    /// Rewrite a location. Empty locations stay empty.
    pub fn apply(&self, location: &str) -> MetastoreResult<String> {
        if location.is_empty() {
            return Ok(String::new());
        }

        match self {
            Self::Identity => Ok(location.to_string()),
            Self::Branch { dbfs_root, branch } => {
                let location = handle_dbfs_location(location, dbfs_root);
                if branch.is_empty() {
                    Ok(location)
                } else {
                    replace_branch_name(&location, branch)
                }
            }
            Self::Import {
                dbfs_root,
                repository,
                branch,
            } => {
                let location = handle_dbfs_location(location, dbfs_root);
                import_location(&location, repository, branch)
            }
            Self::Symlink { prefix } => symlink_location(location, prefix),
        }
    }
}
