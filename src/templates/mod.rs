//! Built-in theme templates using Tera template engine
//!
//! Templates and assets are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

use crate::listing::FeedItem;

/// Stylesheet copied to `css/style.css`
pub const STYLE_CSS: &str = include_str!("theme/style.css");

/// Load-more script copied to `js/load-more.js`
pub const LOAD_MORE_JS: &str = include_str!("theme/load-more.js");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("home.html", include_str!("theme/home.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Listing page
    pub fn render_home(
        &self,
        base: &BaseData,
        posts: &[FeedItem],
        next_page: Option<&str>,
    ) -> Result<String> {
        let mut context = base.context();
        context.insert("posts", posts);
        context.insert("next_page", &next_page);
        self.render("home.html", &context)
    }

    /// Post detail page
    pub fn render_post(&self, base: &BaseData, post: &PostPageData) -> Result<String> {
        let mut context = base.context();
        context.insert("post", post);
        self.render("post.html", &context)
    }

    /// Fallback placeholder while a post is generated on demand
    pub fn render_loading(&self, base: &BaseData, refresh_secs: u32) -> Result<String> {
        let mut context = base.context();
        context.insert("refresh_secs", &refresh_secs);
        self.render("loading.html", &context)
    }

    pub fn render_not_found(&self, base: &BaseData) -> Result<String> {
        self.render("not_found.html", &base.context())
    }
}

/// Write the theme assets into the output directory
pub fn write_assets(public_dir: &Path) -> Result<()> {
    let css_dir = public_dir.join("css");
    let js_dir = public_dir.join("js");
    fs::create_dir_all(&css_dir)?;
    fs::create_dir_all(&js_dir)?;
    fs::write(css_dir.join("style.css"), STYLE_CSS)?;
    fs::write(js_dir.join("load-more.js"), LOAD_MORE_JS)?;
    Ok(())
}

/// Data structures for template context

/// Variables every page sees: `site` and the translations `t`
#[derive(Debug, Clone, Serialize)]
pub struct BaseData {
    pub site: SiteData,
    pub t: HashMap<String, String>,
}

impl BaseData {
    fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("t", &self.t);
        context
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub root: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub title: String,
    /// Absolute URL, used as the canonical link
    pub url: String,
    pub banner_url: String,
    pub banner_alt: String,
    pub publication_date: String,
    pub datetime: String,
    pub author: String,
    pub reading_time: usize,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub body_html: String,
}
