//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Generate the static site (with incremental support)
pub async fn run(blog: &Blog, force: bool) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let report = generator.generate(force).await?;

    tracing::info!(
        "Listing: {} posts, {} feed pages",
        report.listed_posts,
        report.feed_pages
    );
    tracing::info!(
        "Posts: {} written, {} unchanged, {} missing, {} deleted",
        report.posts_written,
        report.posts_unchanged,
        report.posts_missing,
        report.posts_deleted
    );

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
