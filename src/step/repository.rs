//! Repository references
//!
//! A repository is either remote, and cloned inside the guest, or local,
//! and bind-mounted into the guest as-is. Local repositories are trusted to
//! already be at the wanted branch and commit.

use crate::infrastructure::Mount;
use crate::step::{GuestPaths, RepoConfig, StepError};
use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"://+").expect("valid scheme separator pattern"));

const FILE_SCHEME: &str = "file://";

/// Placeholder printed instead of a command that carries credentials
pub const MASKED: &str = "*****";

/// Host path of a local repository reference (`/abs/path` or
/// `file:///abs/path`), `None` for remote URLs
#[must_use]
pub fn local_path(url: &str) -> Option<&str> {
    if let Some(path) = url.strip_prefix(FILE_SCHEME) {
        Some(path)
    } else if url.starts_with('/') {
        Some(url)
    } else {
        None
    }
}

/// Splits a repository URL into `(owner, name)`, dropping a trailing
/// `.git`; local references have no owner
#[must_use]
pub fn repo_properties(url: &str) -> (Option<String>, String) {
    if let Some(path) = local_path(url) {
        return (None, last_segment(path).to_string());
    }

    let trimmed = url.trim_end_matches('/');
    let mut segments = trimmed.rsplit('/');
    let name = segments.next().unwrap_or(trimmed);
    let name = name.strip_suffix(".git").unwrap_or(name).to_string();
    // scp-like URLs (git@host:owner/name) carry the owner after the colon
    let owner = segments
        .next()
        .map(|owner| owner.rsplit(':').next().unwrap_or(owner).to_string())
        .filter(|owner| !owner.is_empty());

    (owner, name)
}

fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Clone URL with `user:token@` spliced in after the scheme separator
/// when both credentials are configured
#[must_use]
pub fn authenticated_url(repo: &RepoConfig) -> String {
    let url = &repo.git_repo;
    let Some((user, token)) = repo.credentials() else {
        return url.clone();
    };
    match SCHEME_SEPARATOR.find(url) {
        Some(separator) => format!(
            "{}{user}:{token}@{}",
            &url[..separator.end()],
            &url[separator.end()..]
        ),
        None => {
            tracing::warn!(repo = %url, "Repository URL has no scheme, credentials not applied");
            url.clone()
        }
    }
}

/// Builds `git clone <url> --branch <branch> --single-branch <name>`
///
/// # Errors
///
/// Returns [`StepError::MissingKey`] when neither `branch` nor the
/// configured `git_branch` is available.
pub fn clone_command(repo: &RepoConfig, branch: Option<&str>) -> Result<Vec<String>, StepError> {
    let branch = branch
        .or(repo.git_branch.as_deref())
        .ok_or_else(|| StepError::MissingKey {
            key: "git_branch".to_string(),
        })?;
    let (_, name) = repo_properties(&repo.git_repo);

    Ok(vec![
        "git".to_string(),
        "clone".to_string(),
        authenticated_url(repo),
        "--branch".to_string(),
        branch.to_string(),
        "--single-branch".to_string(),
        name,
    ])
}

/// Bind mount of a local repository to a guest-root subpath of the same
/// basename; `None` for remote URLs
#[must_use]
pub fn local_mount(repo: &RepoConfig, guest: &GuestPaths) -> Option<Mount> {
    let path = local_path(&repo.git_repo)?.trim_end_matches('/');
    let name = last_segment(path);
    Some(Mount::read_write(path, guest.root_subpath(&[name])))
}

/// Repository URL safe to publish: credentials embedded in the URL removed
#[must_use]
pub fn public_url(url: &str) -> String {
    match SCHEME_SEPARATOR.find(url) {
        Some(separator) => {
            let rest = &url[separator.end()..];
            let host_start = match (rest.find('@'), rest.find('/')) {
                (Some(at), Some(slash)) if at < slash => at + 1,
                (Some(at), None) => at + 1,
                _ => 0,
            };
            format!("{}{}", &url[..separator.end()], &rest[host_start..])
        }
        None => url.to_string(),
    }
}

/// Page for opening a pull request from `branch`, for GitHub-hosted
/// repositories
#[must_use]
pub fn pull_request_url(url: &str, branch: &str) -> Option<String> {
    let public = public_url(url);
    let rest = public
        .strip_prefix("https://github.com/")
        .or_else(|| public.strip_prefix("http://github.com/"))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    Some(format!("https://github.com/{rest}/compare/{branch}?expand=1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_credentials_are_spliced_after_scheme() {
        let repo = RepoConfig::new("https://example.com/o/r.git")
            .with_branch("master")
            .with_credentials("u", "t");
        let command = clone_command(&repo, None).unwrap();
        assert_eq!(
            command,
            vec![
                "git",
                "clone",
                "https://u:t@example.com/o/r.git",
                "--branch",
                "master",
                "--single-branch",
                "r"
            ]
        );
    }

    #[test]
    fn test_url_unchanged_without_credentials() {
        let repo = RepoConfig::new("https://example.com/o/r.git");
        assert_eq!(authenticated_url(&repo), "https://example.com/o/r.git");

        let mut half = repo.clone();
        half.git_user_name = Some("u".to_string());
        assert_eq!(authenticated_url(&half), "https://example.com/o/r.git");
    }

    #[test]
    fn test_branch_override_wins() {
        let repo = RepoConfig::new("https://example.com/o/r").with_branch("dev");
        let command = clone_command(&repo, Some("master")).unwrap();
        assert_eq!(command[4], "master");
        assert_eq!(command[6], "r");
    }

    #[test]
    fn test_missing_branch() {
        let repo = RepoConfig::new("https://example.com/o/r");
        assert_eq!(
            clone_command(&repo, None).unwrap_err(),
            StepError::MissingKey {
                key: "git_branch".to_string()
            }
        );
    }

    #[test]
    fn test_repo_properties() {
        assert_eq!(
            repo_properties("https://github.com/googleapis/googleapis.git"),
            (Some("googleapis".to_string()), "googleapis".to_string())
        );
        assert_eq!(
            repo_properties("git@github.com:acme/tools.git"),
            (Some("acme".to_string()), "tools".to_string())
        );
        assert_eq!(repo_properties("/abs/path/repo"), (None, "repo".to_string()));
        assert_eq!(
            repo_properties("file:///abs/path/repo"),
            (None, "repo".to_string())
        );
    }

    #[test]
    fn test_local_repos_are_mounted() {
        let guest = GuestPaths::new("/artmanflow");

        for url in ["/abs/path/repo", "file:///abs/path/repo/"] {
            let repo = RepoConfig::new(url);
            assert_eq!(
                local_mount(&repo, &guest),
                Some(Mount::read_write(
                    url.trim_start_matches("file://").trim_end_matches('/'),
                    "/artmanflow/repo"
                ))
            );
        }
    }

    #[test]
    fn test_remote_repos_are_not_mounted() {
        let guest = GuestPaths::new("/artmanflow");
        let repo = RepoConfig::new("https://github.com/googleapis/artman.git").with_branch("master");
        assert_eq!(local_mount(&repo, &guest), None);
        assert_eq!(clone_command(&repo, None).unwrap().last().unwrap(), "artman");
    }

    #[test]
    fn test_public_and_pull_request_urls() {
        assert_eq!(
            public_url("https://u:t@github.com/acme/java.git"),
            "https://github.com/acme/java.git"
        );
        assert_eq!(public_url("https://github.com/a@b/c"), "https://github.com/a@b/c");
        assert_eq!(
            pull_request_url("https://github.com/acme/java.git", "java-src-stage-1"),
            Some("https://github.com/acme/java/compare/java-src-stage-1?expand=1".to_string())
        );
        assert_eq!(pull_request_url("https://gitlab.com/acme/java.git", "b"), None);
    }
}
