//! Generator module - fetches CMS content and writes the static site

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::{self, CacheDb, CacheEntry, CurrentPost};
use crate::cms::{CmsClient, Document, PageSource, SearchResponse};
use crate::config::MissingPostPolicy;
use crate::content::{as_html, reading_time, PostDetail};
use crate::helpers::{
    date_xml, feed_page_path, full_url_for, is_safe_uid, post_path, to_cms_timestamp, Helpers,
};
use crate::listing::{FeedItem, FeedPage, PaginationState};
use crate::templates::{self, BaseData, PostPageData, SectionData, SiteData, TemplateRenderer};
use crate::Blog;

/// Seconds between reloads of the fallback placeholder
const LOADING_REFRESH_SECS: u32 = 1;

/// Result of building one post page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The page was written
    Written(CacheEntry),
    /// The CMS has no such post and the policy says to skip it
    Missing,
}

/// Counters reported after a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub listed_posts: usize,
    pub feed_pages: usize,
    pub posts_written: usize,
    pub posts_unchanged: usize,
    pub posts_missing: usize,
    pub posts_deleted: usize,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    client: CmsClient,
    helpers: Helpers,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let client = CmsClient::new(&blog.config.cms)?;
        let helpers = Helpers::new(blog.config.clone(), blog.i18n.clone())?;
        let renderer = TemplateRenderer::new()?;

        Ok(Self {
            blog: blog.clone(),
            client,
            helpers,
            renderer,
        })
    }

    pub fn public_dir(&self) -> &Path {
        &self.blog.public_dir
    }

    /// Output file of a post page
    pub fn post_output_path(&self, uid: &str) -> PathBuf {
        self.blog.public_dir.join(post_relative_path(uid))
    }

    /// Generate the entire site
    ///
    /// A page that fails to build does not stop the others; the error
    /// returned at the end names every failed page.
    pub async fn generate(&self, force: bool) -> Result<GenerateReport> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)?;
        templates::write_assets(public_dir)?;
        fs::write(public_dir.join("404.html"), self.render_not_found()?)?;

        let mut report = GenerateReport::default();
        let mut failures: Vec<String> = Vec::new();

        // Listing page and its feed
        match self.generate_listing().await {
            Ok((listed, feed_pages)) => {
                report.listed_posts = listed;
                report.feed_pages = feed_pages;
            }
            Err(e) => {
                tracing::error!("Failed to generate listing: {:#}", e);
                failures.push("index".to_string());
            }
        }

        // Post pages
        let documents = self.client.all_posts().await?;
        let current = current_posts(&documents);
        tracing::info!("Found {} posts in the CMS", current.len());

        let config_hash = cache::hash_config(&self.blog.config)?;
        let old_cache = CacheDb::load(&self.blog.base_dir);
        let changes = cache::detect_changes(&old_cache, config_hash, &current, public_dir, force);
        tracing::info!("Changes detected: {}", changes.summary());

        let mut new_cache = CacheDb::new(config_hash);

        for (uid, output_path) in &changes.deleted_posts {
            remove_post_output(public_dir, output_path)?;
            tracing::info!("Removed deleted post: {}", uid);
            report.posts_deleted += 1;
        }

        for uid in &changes.unchanged_posts {
            if let Some(entry) = old_cache.posts.get(uid) {
                new_cache.insert(uid, entry.clone());
            }
            report.posts_unchanged += 1;
        }

        for uid in &changes.changed_posts {
            match self.generate_post(uid).await {
                Ok(PostOutcome::Written(entry)) => {
                    new_cache.insert(uid, entry);
                    report.posts_written += 1;
                }
                Ok(PostOutcome::Missing) => {
                    report.posts_missing += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to generate post {}: {:#}", uid, e);
                    failures.push(format!("post/{}", uid));
                }
            }
        }

        new_cache.save(&self.blog.base_dir)?;

        if !failures.is_empty() {
            anyhow::bail!(
                "Failed to generate {} page(s): {}",
                failures.len(),
                failures.join(", ")
            );
        }

        Ok(report)
    }

    /// Fetch the first listing page and write `index.html` plus the feed
    ///
    /// Returns the number of posts on the listing and of feed pages written.
    pub async fn generate_listing(&self) -> Result<(usize, usize)> {
        let first = self.client.listing_page().await?;
        self.write_listing(&first, &self.client).await
    }

    /// Write the listing from its first page, following cursors through `source`
    ///
    /// Every feed page is fetched before anything is written, so a failed
    /// walk leaves the previous listing in place.
    pub async fn write_listing<S: PageSource>(
        &self,
        first: &SearchResponse<Document>,
        source: &S,
    ) -> Result<(usize, usize)> {
        let public_dir = &self.blog.public_dir;
        let mut state = PaginationState::from_page(first, &self.helpers);
        let listed = state.posts().len();

        let mut pages = Vec::new();
        let mut start = listed;
        while state.has_more() {
            state.load_more(source, &self.helpers).await?;
            // Feed pages are numbered from 2; the listing itself is page 1
            let page_number = pages.len() + 2;
            let next = state.has_more().then(|| self.helpers.feed_url(page_number + 1));
            pages.push(FeedPage::new(&state.posts()[start..], next, &self.helpers));
            start = state.posts().len();
        }

        let next = (!pages.is_empty()).then(|| self.helpers.feed_url(2));
        let items = self.feed_items(&state.posts()[..listed]);
        let html = self
            .renderer
            .render_home(&self.base_data(), &items, next.as_deref())?;
        let feed = pages
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let feed_dir = public_dir.join("posts").join("page");
        if feed_dir.exists() {
            fs::remove_dir_all(&feed_dir)?;
        }
        for (i, json) in feed.iter().enumerate() {
            let output_path = public_dir.join(feed_page_path(i + 2));
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_path, json)?;
            tracing::debug!("Generated: {:?}", output_path);
        }

        fs::write(public_dir.join("index.html"), html)?;
        tracing::debug!("Generated: index.html");

        Ok((listed, pages.len()))
    }

    /// Fetch one post and write its page
    pub async fn generate_post(&self, uid: &str) -> Result<PostOutcome> {
        match self.client.get_post(uid).await {
            Ok(doc) => Ok(PostOutcome::Written(self.write_post(&doc)?)),
            Err(e) if e.is_not_found() => match self.blog.config.missing_post {
                MissingPostPolicy::NotFound => {
                    tracing::warn!("Skipping post {}: not found in the CMS", uid);
                    Ok(PostOutcome::Missing)
                }
                MissingPostPolicy::Error => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Render a fetched post document to its output file
    pub fn write_post(&self, doc: &Document) -> Result<CacheEntry> {
        let post = PostDetail::from_document(doc)?;
        if !is_safe_uid(&post.uid) {
            anyhow::bail!("Document {} has an unusable uid {:?}", doc.id, post.uid);
        }

        let html = self.render_post(&post)?;
        let relative = post_relative_path(&post.uid);
        let output_path = self.blog.public_dir.join(&relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);

        Ok(CacheEntry {
            last_publication_date: doc
                .last_publication_date
                .as_ref()
                .map(to_cms_timestamp),
            output_path: relative,
        })
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let data = PostPageData {
            title: post.title.clone(),
            url: full_url_for(&self.blog.config, &post_path(&post.uid)),
            banner_url: post.banner.url.clone(),
            banner_alt: post
                .banner
                .alt
                .clone()
                .unwrap_or_else(|| self.helpers.t("banner_alt")),
            publication_date: self.helpers.date(post.publication_date.as_ref()),
            datetime: post
                .publication_date
                .as_ref()
                .map(date_xml)
                .unwrap_or_default(),
            author: post.author.clone(),
            reading_time: reading_time(&post.content, self.blog.config.words_per_minute),
            sections: post
                .content
                .iter()
                .map(|block| SectionData {
                    heading: block.heading.clone(),
                    body_html: as_html(&block.body),
                })
                .collect(),
        };

        self.renderer.render_post(&self.base_data(), &data)
    }

    /// Fallback placeholder; renders nothing post-specific
    pub fn render_loading(&self) -> Result<String> {
        self.renderer
            .render_loading(&self.base_data(), LOADING_REFRESH_SECS)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render_not_found(&self.base_data())
    }

    fn feed_items(&self, posts: &[crate::content::PostSummary]) -> Vec<FeedItem> {
        posts
            .iter()
            .map(|p| FeedItem::from_summary(p, &self.helpers))
            .collect()
    }

    /// Build site data for templates
    fn base_data(&self) -> BaseData {
        let config = &self.blog.config;
        BaseData {
            site: SiteData {
                title: config.title.clone(),
                language: self.helpers.i18n().language().to_string(),
                root: self.helpers.url_for(""),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            t: self.helpers.i18n().get_all_translations(),
        }
    }
}

/// Output path of a post page, relative to the public dir
fn post_relative_path(uid: &str) -> String {
    format!("post/{}/index.html", uid)
}

/// Posts that can be generated, with their change markers
fn current_posts(documents: &[Document]) -> Vec<CurrentPost> {
    documents
        .iter()
        .filter_map(|doc| {
            let uid = doc.uid.as_deref()?;
            if !is_safe_uid(uid) {
                tracing::warn!("Skipping document {} with unusable uid {:?}", doc.id, uid);
                return None;
            }
            Some(CurrentPost {
                uid: uid.to_string(),
                last_publication_date: doc
                    .last_publication_date
                    .as_ref()
                    .map(to_cms_timestamp),
            })
        })
        .collect()
}

/// Delete a stale post page and its directory
fn remove_post_output(public_dir: &Path, output_path: &str) -> Result<()> {
    let path = public_dir.join(output_path);
    if path.exists() {
        fs::remove_file(&path)?;
    }
    if let Some(parent) = path.parent() {
        if parent != public_dir && parent.exists() && fs::read_dir(parent)?.next().is_none() {
            fs::remove_dir(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::fake::{self, FakeCms};
    use crate::error::CmsError;
    use std::collections::HashMap;

    fn blog(dir: &Path) -> Blog {
        Blog::new(dir).unwrap()
    }

    fn doc(uid: &str) -> Document {
        serde_json::from_value(serde_json::json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-25T19:25:28+0000",
            "data": {
                "title": format!("Post {}", uid),
                "subtitle": "Subtitle",
                "author": "Joseph Oliveira",
                "banner": {"url": "https://images.cdn/banner.png"},
                "content": [
                    {"heading": "Proin et varius", "body": [
                        {"type": "paragraph", "text": "Nullam dolor sapien", "spans": []}
                    ]}
                ]
            }
        }))
        .unwrap()
    }

    fn page(uids: &[&str], next: Option<&str>) -> SearchResponse<Document> {
        SearchResponse {
            page: 1,
            results_per_page: 1,
            results_size: uids.len(),
            total_results_size: 0,
            total_pages: 0,
            next_page: next.map(str::to_string),
            prev_page: None,
            results: uids.iter().map(|u| doc(u)).collect(),
        }
    }

    struct FakeSource(HashMap<String, SearchResponse<Document>>);

    impl PageSource for FakeSource {
        async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse<Document>, CmsError> {
            self.0.get(cursor).cloned().ok_or(CmsError::Status {
                url: cursor.to_string(),
                status: 500,
            })
        }
    }

    #[tokio::test]
    async fn test_write_listing_and_feed() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        fs::create_dir_all(&blog.public_dir).unwrap();
        let generator = Generator::new(&blog).unwrap();

        let source = FakeSource(HashMap::from([
            ("c2".to_string(), page(&["b"], Some("c3"))),
            ("c3".to_string(), page(&["c"], None)),
        ]));

        let (listed, feed_pages) = generator
            .write_listing(&page(&["a"], Some("c2")), &source)
            .await
            .unwrap();
        assert_eq!((listed, feed_pages), (1, 2));

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(index.contains("Post a"));
        assert!(index.contains("15 Mar 2021"));
        assert!(index.contains(r#"data-next-page="/posts/page/2.json""#));

        let page2: FeedPage = serde_json::from_str(
            &fs::read_to_string(blog.public_dir.join("posts/page/2.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(page2.results.len(), 1);
        assert_eq!(page2.results[0].uid, "b");
        assert_eq!(page2.next_page.as_deref(), Some("/posts/page/3.json"));

        let page3: FeedPage = serde_json::from_str(
            &fs::read_to_string(blog.public_dir.join("posts/page/3.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(page3.results[0].uid, "c");
        assert_eq!(page3.next_page, None);
    }

    #[tokio::test]
    async fn test_single_page_listing_has_no_control() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        fs::create_dir_all(&blog.public_dir).unwrap();
        let generator = Generator::new(&blog).unwrap();

        let (_, feed_pages) = generator
            .write_listing(&page(&["a"], None), &FakeSource(HashMap::new()))
            .await
            .unwrap();
        assert_eq!(feed_pages, 0);

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(!index.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_failed_feed_page_fails_listing() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        fs::create_dir_all(&blog.public_dir).unwrap();
        let generator = Generator::new(&blog).unwrap();

        let result = generator
            .write_listing(&page(&["a"], Some("broken")), &FakeSource(HashMap::new()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failed_feed_walk_keeps_previous_listing() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        fs::create_dir_all(blog.public_dir.join("posts/page")).unwrap();
        fs::write(blog.public_dir.join("index.html"), "previous index").unwrap();
        fs::write(blog.public_dir.join("posts/page/2.json"), "previous feed").unwrap();
        let generator = Generator::new(&blog).unwrap();

        let result = generator
            .write_listing(&page(&["a"], Some("c2")), &FakeSource(HashMap::new()))
            .await;
        assert!(result.is_err());

        assert_eq!(
            fs::read_to_string(blog.public_dir.join("index.html")).unwrap(),
            "previous index"
        );
        assert_eq!(
            fs::read_to_string(blog.public_dir.join("posts/page/2.json")).unwrap(),
            "previous feed"
        );
    }

    fn blog_for(dir: &Path, cms: &FakeCms, policy: MissingPostPolicy) -> Blog {
        let mut blog = blog(dir);
        blog.config.cms = cms.config();
        blog.config.missing_post = policy;
        blog
    }

    #[tokio::test]
    async fn test_generate_post_from_cms() {
        let dir = tempfile::tempdir().unwrap();
        let cms = FakeCms::start(vec![fake::post("a")]).await;
        let generator =
            Generator::new(&blog_for(dir.path(), &cms, MissingPostPolicy::NotFound)).unwrap();

        let outcome = generator.generate_post("a").await.unwrap();
        assert!(matches!(
            outcome,
            PostOutcome::Written(ref e) if e.output_path == "post/a/index.html"
        ));
        assert!(generator.post_output_path("a").exists());
    }

    #[tokio::test]
    async fn test_missing_post_is_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let cms = FakeCms::start(vec![fake::post("a")]).await;
        let generator =
            Generator::new(&blog_for(dir.path(), &cms, MissingPostPolicy::NotFound)).unwrap();

        let outcome = generator.generate_post("gone").await.unwrap();
        assert_eq!(outcome, PostOutcome::Missing);
        assert!(!generator.post_output_path("gone").exists());
    }

    #[tokio::test]
    async fn test_missing_post_fails_under_error_policy() {
        let dir = tempfile::tempdir().unwrap();
        let cms = FakeCms::start(vec![fake::post("a")]).await;
        let generator =
            Generator::new(&blog_for(dir.path(), &cms, MissingPostPolicy::Error)).unwrap();

        let err = generator.generate_post("gone").await.unwrap_err();
        let cms_err = err.downcast_ref::<CmsError>().unwrap();
        assert!(cms_err.is_not_found());
    }

    #[tokio::test]
    async fn test_generate_site_then_reuse_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cms = FakeCms::start(vec![fake::post("a"), fake::post("b"), fake::post("c")]).await;
        let blog = blog_for(dir.path(), &cms, MissingPostPolicy::NotFound);
        let generator = Generator::new(&blog).unwrap();

        let report = generator.generate(false).await.unwrap();
        assert_eq!(report.listed_posts, 1);
        assert_eq!(report.feed_pages, 2);
        assert_eq!(report.posts_written, 3);
        for path in ["index.html", "404.html", "posts/page/2.json", "posts/page/3.json"] {
            assert!(blog.public_dir.join(path).exists(), "{} missing", path);
        }
        for uid in ["a", "b", "c"] {
            assert!(generator.post_output_path(uid).exists());
        }

        let report = generator.generate(false).await.unwrap();
        assert_eq!(report.posts_written, 0);
        assert_eq!(report.posts_unchanged, 3);
    }

    #[test]
    fn test_write_post() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let generator = Generator::new(&blog).unwrap();

        let entry = generator.write_post(&doc("como-utilizar-hooks")).unwrap();
        assert_eq!(entry.output_path, "post/como-utilizar-hooks/index.html");
        assert_eq!(
            entry.last_publication_date.as_deref(),
            Some("2021-03-25T19:25:28+0000")
        );

        let html = fs::read_to_string(generator.post_output_path("como-utilizar-hooks")).unwrap();
        assert!(html.contains("<title>Post como-utilizar-hooks</title>"));
        assert!(html.contains("15 Mar 2021"));
        // 3 heading words + 3 body words
        assert!(html.contains("1 min"));
        assert!(html.contains("<p>Nullam dolor sapien</p>"));
        assert!(html.contains(r#"alt="banner""#));
    }

    #[test]
    fn test_write_post_rejects_unsafe_uid() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path())).unwrap();
        assert!(generator.write_post(&doc("../escape")).is_err());
    }

    #[test]
    fn test_loading_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path())).unwrap();
        let html = generator.render_loading().unwrap();
        assert!(html.contains("Carregando..."));
        assert!(!html.contains("min</span>"));
    }

    #[test]
    fn test_current_posts_skips_unusable() {
        let mut no_uid = doc("x");
        no_uid.uid = None;
        let docs = vec![doc("a"), no_uid, doc("a/b")];
        let current = current_posts(&docs);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].uid, "a");
    }

    #[test]
    fn test_remove_post_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("post/gone")).unwrap();
        fs::write(dir.path().join("post/gone/index.html"), "x").unwrap();

        remove_post_output(dir.path(), "post/gone/index.html").unwrap();
        assert!(!dir.path().join("post/gone").exists());
        assert!(dir.path().join("post").exists());
    }
}
