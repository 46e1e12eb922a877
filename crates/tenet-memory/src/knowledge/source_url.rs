// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Url normalization for knowledge source deduplication.

use url::Url;

/// Query parameters that identify a click, not a document.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src"];

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Canonical form of a document url.
///
/// Drops the fragment and tracking parameters and strips a trailing slash
/// from the path. Scheme and host come out lowercased. Input that does not
/// parse is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_string();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_and_tracking() {
        assert_eq!(
            normalize_url("https://Example.com/docs/intro/?utm_source=x&utm_medium=y"),
            "https://example.com/docs/intro"
        );
    }

    #[test]
    fn keeps_meaningful_query_params() {
        assert_eq!(
            normalize_url("https://example.com/search?q=rust&fbclid=abc&page=2#top"),
            "https://example.com/search?q=rust&page=2"
        );
    }

    #[test]
    fn variants_of_one_document_agree() {
        let a = normalize_url("https://example.com/post");
        let b = normalize_url(" https://example.com/post/?ref=twitter ");
        let c = normalize_url("https://example.com/post#comments");
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn root_path_is_kept() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn unparseable_input_is_trimmed() {
        assert_eq!(normalize_url("  notes/local-file/  "), "notes/local-file");
    }
}
