//! HTML helper functions

/// Generate an image tag
///
/// # Examples
/// ```ignore
/// image_tag("https://images.cdn/banner.png", Some("banner")) // -> <img src="..." alt="banner">
/// ```
pub fn image_tag(src: &str, alt: Option<&str>) -> String {
    format!(
        r#"<img src="{}" alt="{}">"#,
        html_escape(src),
        html_escape(alt.unwrap_or(""))
    )
}

/// Generate an anchor tag; external targets open in a new tab
pub fn link_open_tag(href: &str, target: Option<&str>) -> String {
    match target {
        Some(target) => format!(
            r#"<a href="{}" target="{}" rel="noopener">"#,
            html_escape(href),
            html_escape(target)
        ),
        None => format!(r#"<a href="{}">"#, html_escape(href)),
    }
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tag() {
        assert_eq!(
            image_tag("https://cdn/x.png?a=1&b=2", Some("banner")),
            r#"<img src="https://cdn/x.png?a=1&amp;b=2" alt="banner">"#
        );
        assert!(image_tag("/a.png", None).contains(r#"alt="""#));
    }

    #[test]
    fn test_link_open_tag() {
        assert_eq!(link_open_tag("/post/a/", None), r#"<a href="/post/a/">"#);
        assert!(link_open_tag("https://x.dev", Some("_blank")).contains("noopener"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }
}
