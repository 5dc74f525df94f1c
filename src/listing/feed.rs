//! Static pagination feed read by the load-more script

use serde::{Deserialize, Serialize};

use crate::content::PostSummary;
use crate::helpers::Helpers;

/// One listing entry, already formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub publication_date: String,
}

impl FeedItem {
    pub fn from_summary(post: &PostSummary, helpers: &Helpers) -> Self {
        Self {
            uid: post.uid.clone(),
            href: helpers.post_url(&post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            publication_date: post.formatted_date.clone(),
        }
    }
}

/// A page of the feed, in the same envelope shape as a CMS page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub results: Vec<FeedItem>,
    pub next_page: Option<String>,
}

impl FeedPage {
    pub fn new(posts: &[PostSummary], next_page: Option<String>, helpers: &Helpers) -> Self {
        Self {
            results: posts
                .iter()
                .map(|p| FeedItem::from_summary(p, helpers))
                .collect(),
            next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlogConfig;
    use crate::i18n::I18n;

    #[test]
    fn test_feed_page_shape() {
        let mut config = BlogConfig::default();
        config.root = "/blog/".to_string();
        let helpers = Helpers::new(config, I18n::new("pt-BR")).unwrap();

        let post = PostSummary {
            uid: "criando-um-app".to_string(),
            publication_date: None,
            formatted_date: "19 Abr 2021".to_string(),
            title: "Criando um app".to_string(),
            subtitle: "Tudo sobre como criar".to_string(),
            author: "Danilo Vieira".to_string(),
        };

        let page = FeedPage::new(&[post], Some("/blog/posts/page/3.json".to_string()), &helpers);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["next_page"], "/blog/posts/page/3.json");
        assert_eq!(json["results"][0]["href"], "/blog/post/criando-um-app/");
        assert_eq!(json["results"][0]["publication_date"], "19 Abr 2021");

        let last = FeedPage::new(&[], None, &helpers);
        assert!(serde_json::to_value(&last).unwrap()["next_page"].is_null());
    }
}
