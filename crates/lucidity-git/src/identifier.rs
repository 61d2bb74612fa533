//! Workspace identifier resolution.
//!
//! Callers hand us whatever they think names a repository: a checkout on disk,
//! an SSH or HTTPS clone URL, `github.com/owner/repo`, or just `owner/repo`.
//! Any of the remote forms may carry a trailing `@branch`.
//!
//! | input | url |
//! |---|---|
//! | `git@github.com:owner/repo.git[@branch]` | used verbatim |
//! | `https://github.com/owner/repo.git[@branch]` | used verbatim |
//! | `github.com/owner/repo[@branch]` | `git@github.com:owner/repo.git` |
//! | `owner/repo[@branch]` | `git@github.com:owner/repo.git` |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use lucidity_exec::{is_valid_branch_name, is_valid_repo_name};

/// Hosts accepted as the first segment of `host/owner/repo`
pub const KNOWN_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

/// Host assumed for bare `owner/repo` shorthand
pub const DEFAULT_HOST: &str = "github.com";

/// A remote repository to clone into the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSpec {
    /// Clone URL handed to git
    pub url: String,
    /// Cache directory name (final path segment without `.git`)
    pub name: String,
    pub branch: Option<String>,
}

/// Result of interpreting a workspace identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedWorkspace {
    /// An existing directory on this machine
    Local { path: PathBuf },
    Remote(RemoteSpec),
    Unresolvable,
}

impl ResolvedWorkspace {
    pub fn is_remote(&self) -> bool {
        matches!(self, ResolvedWorkspace::Remote(_))
    }
}

/// Interpret a caller-supplied workspace string.
pub fn resolve(identifier: &str) -> ResolvedWorkspace {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return ResolvedWorkspace::Unresolvable;
    }

    if Path::new(identifier).is_dir() {
        return ResolvedWorkspace::Local {
            path: PathBuf::from(identifier),
        };
    }

    let (location, branch) = split_branch(identifier);
    if let Some(branch) = branch {
        debug!(branch, "Detected branch specification");
    }

    match remote_url(location) {
        Some(url) => {
            let name = repo_name_from_url(&url);
            if !is_valid_repo_name(&name) {
                debug!(identifier, name = %name, "Rejected unsafe repository name");
                return ResolvedWorkspace::Unresolvable;
            }
            debug!(identifier, url = %url, name = %name, "Resolved remote repository");
            ResolvedWorkspace::Remote(RemoteSpec {
                url,
                name,
                branch: branch.map(str::to_string),
            })
        }
        None => ResolvedWorkspace::Unresolvable,
    }
}

/// Whether an identifier is shaped like a filesystem path rather than a
/// remote reference.
pub fn looks_like_local_path(identifier: &str) -> bool {
    let identifier = identifier.trim();
    identifier.starts_with('/')
        || identifier.starts_with("./")
        || identifier.starts_with("../")
        || identifier.starts_with("~/")
        || identifier.starts_with('\\')
        || has_drive_prefix(identifier)
}

fn has_drive_prefix(identifier: &str) -> bool {
    let bytes = identifier.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Split an optional trailing `@branch` off an identifier.
///
/// The candidate must satisfy the branch grammar; otherwise the identifier is
/// returned whole and no branch is assumed.
fn split_branch(identifier: &str) -> (&str, Option<&str>) {
    let at = if identifier.starts_with("git@") {
        // The first `@` separates user from host
        identifier[4..].find('@').map(|i| i + 4)
    } else {
        match (identifier.rfind('@'), authority_end(identifier)) {
            // `@` inside `https://user@host/` is userinfo
            (Some(at), Some(end)) if at < end => None,
            (at, _) => at,
        }
    };

    match at {
        Some(at) => {
            let branch = &identifier[at + 1..];
            if is_valid_branch_name(branch) {
                (&identifier[..at], Some(branch))
            } else {
                (identifier, None)
            }
        }
        None => (identifier, None),
    }
}

/// End offset of the `scheme://authority` part of an http(s) URL
fn authority_end(identifier: &str) -> Option<usize> {
    let scheme_len = http_scheme_len(identifier)?;
    let rest = &identifier[scheme_len..];
    Some(scheme_len + rest.find('/').unwrap_or(rest.len()))
}

fn http_scheme_len(identifier: &str) -> Option<usize> {
    ["https://", "http://"]
        .iter()
        .find(|scheme| identifier.starts_with(*scheme))
        .map(|scheme| scheme.len())
}

fn remote_url(location: &str) -> Option<String> {
    if location.starts_with("git@") {
        debug!(location, "Detected SSH git URL format");
        return Some(location.to_string());
    }

    if http_scheme_len(location).is_some() {
        debug!(location, "Detected HTTPS git URL format");
        return Some(location.to_string());
    }

    if location.starts_with('/') || !location.contains('/') {
        return None;
    }

    let parts: Vec<&str> = location.split('/').collect();
    let (host, owner, repo) = if parts.len() >= 3 && KNOWN_HOSTS.contains(&parts[0]) {
        (parts[0], parts[1], parts[2])
    } else if parts.len() == 2 && !parts[0].starts_with('.') {
        (DEFAULT_HOST, parts[0], parts[1])
    } else {
        return None;
    };

    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if !is_valid_repo_name(owner) || !is_valid_repo_name(repo) {
        return None;
    }

    let url = format!("git@{}:{}/{}.git", host, owner, repo);
    debug!(location, url = %url, "Rewrote host path to SSH URL");
    Some(url)
}

/// Final path segment of a clone URL, minus any `.git` suffix.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    trimmed
        .replace(':', "/")
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("repo")
        .to_string()
}
