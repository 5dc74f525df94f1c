//! Content module - post models, rich text and derived values

mod post;
pub mod reading_time;
pub mod richtext;

pub use post::{Banner, ContentBlock, PostDetail, PostSummary};
pub use reading_time::reading_time;
pub use richtext::{as_html, RichTextBlock};
