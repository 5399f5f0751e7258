//! URL/host parsing rules for remote-URL construction and canonical
//! repository identification (spec §6.3 / §4.6).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid URL: could not determine host")]
    InvalidURL,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ssh,
    Https,
}

/// `ssh` iff the URL starts with `git@` or `ssh://`; otherwise `https`.
pub fn determine_protocol(url: &str) -> Protocol {
    if url.starts_with("git@") || url.starts_with("ssh://") {
        Protocol::Ssh
    } else {
        Protocol::Https
    }
}

/// Strip a trailing `.git` suffix. If the URL contains `@` AND `:`, split
/// on `:` and take the host from the part before the `:` (the
/// `user@host` segment). Otherwise, if it starts with `http`, split on
/// `/` and take the third segment (index 2, the authority). Otherwise
/// empty.
pub fn extract_host_from_url(url: &str) -> String {
    let url = url.strip_suffix(".git").unwrap_or(url);
    if url.contains('@') && url.contains(':') {
        let before_colon = url.split(':').next().unwrap_or("");
        before_colon
            .split('@')
            .nth(1)
            .unwrap_or("")
            .to_string()
    } else if url.starts_with("http") {
        url.split('/').nth(2).unwrap_or("").to_string()
    } else {
        String::new()
    }
}

/// Last `/`-separated segment of a repository name (e.g. `org/name` ->
/// `name`), with a trailing `.git` stripped.
fn short_repo_name(repo_name: &str) -> &str {
    let repo_name = repo_name.strip_suffix(".git").unwrap_or(repo_name);
    repo_name.rsplit('/').next().unwrap_or(repo_name)
}

/// Build a remote URL for `remote`/`repo_name` on the same host as
/// `origin_url`, preserving `origin_url`'s protocol.
pub fn construct_remote_url(origin_url: &str, remote: &str, repo_name: &str) -> Result<String, UrlError> {
    let host = extract_host_from_url(origin_url);
    if host.is_empty() {
        return Err(UrlError::InvalidURL);
    }
    let short = short_repo_name(repo_name);
    Ok(match determine_protocol(origin_url) {
        Protocol::Https => format!("https://{host}/{remote}/{short}.git"),
        Protocol::Ssh => format!("git@{host}:{remote}/{short}.git"),
    })
}

/// Canonical repository identifier in host/org/name form (e.g.
/// `github.com/user/repo`), derived from an origin remote URL.
pub fn canonical_repo_id(origin_url: &str) -> String {
    let host = extract_host_from_url(origin_url);
    let stripped = origin_url.strip_suffix(".git").unwrap_or(origin_url);
    let path = if stripped.contains('@') && stripped.contains(':') {
        stripped.split_once(':').map(|(_, p)| p).unwrap_or("")
    } else if let Some(idx) = stripped.find("://") {
        let rest = &stripped[idx + 3..];
        rest.split_once('/').map(|(_, p)| p).unwrap_or("")
    } else {
        stripped
    };
    if host.is_empty() {
        return stripped.trim_start_matches('/').to_string();
    }
    format!("{host}/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_host_ssh_scp_style() {
        assert_eq!(
            extract_host_from_url("git@github.com:user/repo.git"),
            "github.com"
        );
    }

    #[test]
    fn extract_host_https() {
        assert_eq!(
            extract_host_from_url("https://github.com/user/repo.git"),
            "github.com"
        );
    }

    #[test]
    fn extract_host_unrecognized_is_empty() {
        assert_eq!(extract_host_from_url("not-a-url"), "");
    }

    #[test]
    fn determine_protocol_matches_spec() {
        assert_eq!(determine_protocol("git@host:org/repo.git"), Protocol::Ssh);
        assert_eq!(determine_protocol("ssh://host/org/repo.git"), Protocol::Ssh);
        assert_eq!(determine_protocol("https://host/org/repo.git"), Protocol::Https);
    }

    #[test]
    fn construct_remote_url_https() {
        let url = construct_remote_url("https://github.com/user/repo.git", "upstream", "user/repo").unwrap();
        assert_eq!(url, "https://github.com/upstream/repo.git");
    }

    #[test]
    fn construct_remote_url_ssh() {
        let url = construct_remote_url("git@github.com:user/repo.git", "upstream", "user/repo").unwrap();
        assert_eq!(url, "git@github.com:upstream/repo.git");
    }

    #[test]
    fn construct_remote_url_empty_host_is_invalid() {
        assert_eq!(
            construct_remote_url("not-a-url", "upstream", "user/repo"),
            Err(UrlError::InvalidURL)
        );
    }

    #[test]
    fn host_extraction_is_left_inverse_of_construction() {
        let built = construct_remote_url("https://example.com/user/repo.git", "origin", "user/repo").unwrap();
        assert_eq!(extract_host_from_url(&built), "example.com");
    }

    #[test]
    fn canonical_repo_id_from_https() {
        assert_eq!(
            canonical_repo_id("https://github.com/user/repo.git"),
            "github.com/user/repo"
        );
    }

    #[test]
    fn canonical_repo_id_from_ssh() {
        assert_eq!(
            canonical_repo_id("git@github.com:user/repo.git"),
            "github.com/user/repo"
        );
    }
}
