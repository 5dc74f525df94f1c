//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Blog Configuration

# Site
title: Blog
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://example.com
root: /

# Directory
public_dir: public

# Reading
words_per_minute: 200
## What a post path without a CMS document becomes: not_found or error
missing_post: not_found

# CMS
cms:
  endpoint: https://example.cdn.prismic.io/api/v2
  ## Prefer the CMS_BLOG_ACCESS_TOKEN environment variable
  access_token:
  ## Content ref; the master ref is used when empty
  ref:
  document_type: posts
  ## Posts on the listing page and on each "load more" page
  page_size: 1
  fetch:
    - posts.slug
    - posts.title
    - posts.subtitle
    - posts.author
    - posts.banner
    - posts.content
  orderings:
  timeout_secs: 30

# Preview server
server:
  ## Generate posts missing from the build on first request
  fallback: true
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("languages"))?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, DEFAULT_CONFIG)?;

    fs::write(target_dir.join(".gitignore"), "public/\n.cms-blog-cache/\n")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlogConfig;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let config = BlogConfig::load(dir.path().join(CONFIG_FILE)).unwrap();
        let defaults = BlogConfig::default();
        assert_eq!(config.language, defaults.language);
        assert_eq!(config.cms.page_size, defaults.cms.page_size);
        assert_eq!(config.cms.fetch, defaults.cms.fetch);
        assert!(config.server.fallback);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "title: Mine\n").unwrap();
        assert!(init_site(dir.path()).is_err());
        let content = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "title: Mine\n");
    }
}
