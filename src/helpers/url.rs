//! URL helper functions

use crate::config::BlogConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &BlogConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/post/hello/") // -> "https://example.com/blog/post/hello/"
/// ```
pub fn full_url_for(config: &BlogConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Site-relative path of a post's detail page
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", encode_url(uid))
}

/// Site-relative path of page `n` (1-based) of the pagination feed
pub fn feed_page_path(n: usize) -> String {
    format!("posts/page/{}.json", n)
}

/// Encode a URL path segment
pub fn encode_url(segment: &str) -> String {
    percent_encoding::utf8_percent_encode(segment, percent_encoding::NON_ALPHANUMERIC)
        .to_string()
        // keep CMS slugs readable
        .replace("%2D", "-")
        .replace("%5F", "_")
}

/// Whether a uid can be used as a single directory name in the output tree
pub fn is_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid.len() <= 200
        && uid
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}
