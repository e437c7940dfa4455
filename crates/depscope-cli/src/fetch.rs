//! Retrieval collaborator: fetch a remote binary package index.
//!
//! Blocking HTTP via `ureq` — the CLI has no async runtime. The core only
//! ever sees the fetched byte buffer; no retry happens here.

use anyhow::{Context, Result};
use depscope_core::manifest::INDEX_MEMBER;

/// Build the full index URL from a repository base URL, appending a
/// trailing slash if missing.
pub fn index_url(repo_url: &str) -> String {
    let mut url = repo_url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(INDEX_MEMBER);
    url.push_str(".tar.gz");
    url
}

/// Fetch the index archive bytes from a repository base URL.
pub fn fetch_index(repo_url: &str) -> Result<Vec<u8>> {
    let url = index_url(repo_url);
    tracing::info!(%url, "fetching package index");
    let mut response = ureq::get(&url)
        .call()
        .with_context(|| format!("failed to fetch {url}"))?;
    response
        .body_mut()
        .read_to_vec()
        .with_context(|| format!("failed to read index body from {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_url_appends_slash_and_archive_name() {
        assert_eq!(
            index_url("https://dl.example.org/alpine/v3.18/main/x86_64"),
            "https://dl.example.org/alpine/v3.18/main/x86_64/APKINDEX.tar.gz"
        );
        assert_eq!(
            index_url("https://dl.example.org/repo/"),
            "https://dl.example.org/repo/APKINDEX.tar.gz"
        );
    }
}
