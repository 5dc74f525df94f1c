//! List posts from the CMS, page by page

use anyhow::Result;

use crate::cms::CmsClient;
use crate::content::PostSummary;
use crate::helpers::Helpers;
use crate::listing::PaginationState;
use crate::Blog;

/// How many listing pages to walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Pages(usize),
    All,
}

impl PageLimit {
    fn allows(self, loaded: usize) -> bool {
        match self {
            PageLimit::Pages(n) => loaded < n,
            PageLimit::All => true,
        }
    }
}

/// List posts the way the listing page would load them
pub async fn run(blog: &Blog, limit: PageLimit) -> Result<()> {
    let client = CmsClient::new(&blog.config.cms)?;
    let helpers = Helpers::new(blog.config.clone(), blog.i18n.clone())?;

    let first = client.listing_page().await?;
    let mut state = PaginationState::from_page(&first, &helpers);
    print_posts(state.posts());

    let mut loaded = 1;
    while limit.allows(loaded) && state.has_more() {
        let printed = state.posts().len();
        tokio::select! {
            result = state.load_more(&client, &helpers) => {
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted.");
                break;
            }
        }
        print_posts(&state.posts()[printed..]);
        loaded += 1;
    }

    println!(
        "Posts ({}) in {} page(s){}",
        state.posts().len(),
        loaded,
        if state.has_more() { ", more available" } else { "" }
    );

    Ok(())
}

fn print_posts(posts: &[PostSummary]) {
    for post in posts {
        println!("  {} - {} [{}]", post.formatted_date, post.title, post.uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit() {
        assert!(PageLimit::Pages(2).allows(1));
        assert!(!PageLimit::Pages(2).allows(2));
        assert!(!PageLimit::Pages(1).allows(1));
        assert!(PageLimit::All.allows(1000));
    }
}
