//! Post models built from CMS documents

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use super::richtext::RichTextBlock;
use crate::cms::Document;
use crate::helpers::Helpers;

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// Unique identifier, used in the post URL
    pub uid: String,

    /// Raw first publication date
    #[serde(skip)]
    pub publication_date: Option<DateTime<FixedOffset>>,

    /// Display date, e.g. "05 Mar 2021"
    pub formatted_date: String,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Build a summary; documents without a uid cannot be linked and yield `None`
    pub fn from_document(doc: &Document, helpers: &Helpers) -> Option<Self> {
        let Some(uid) = doc.uid.clone().filter(|u| !u.is_empty()) else {
            tracing::warn!("Skipping document {} without uid", doc.id);
            return None;
        };

        let fields = SummaryFields::deserialize(&doc.data).unwrap_or_else(|e| {
            tracing::warn!("Document {} has unexpected fields: {}", doc.id, e);
            SummaryFields::default()
        });

        Some(Self {
            uid,
            publication_date: doc.first_publication_date,
            formatted_date: helpers.date(doc.first_publication_date.as_ref()),
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
        })
    }

    /// Summaries for a page of documents, in arrival order
    pub fn from_documents(docs: &[Document], helpers: &Helpers) -> Vec<Self> {
        docs.iter()
            .filter_map(|doc| Self::from_document(doc, helpers))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryFields {
    #[serde(deserialize_with = "text_field")]
    title: String,
    #[serde(deserialize_with = "text_field")]
    subtitle: String,
    #[serde(deserialize_with = "text_field")]
    author: String,
}

/// Banner image of a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

/// One section of a post: a heading and its rich-text body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    #[serde(deserialize_with = "text_field")]
    pub heading: String,
    #[serde(deserialize_with = "nullable")]
    pub body: Vec<RichTextBlock>,
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailFields {
    #[serde(deserialize_with = "text_field")]
    title: String,
    #[serde(deserialize_with = "banner_field")]
    banner: Banner,
    #[serde(deserialize_with = "text_field")]
    author: String,
    #[serde(deserialize_with = "nullable")]
    content: Vec<ContentBlock>,
}

impl PostDetail {
    /// Interpret a document's data as a post
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields = DetailFields::deserialize(&doc.data)?;
        Ok(Self {
            uid: doc.uid.clone().unwrap_or_default(),
            publication_date: doc.first_publication_date,
            title: fields.title,
            banner: fields.banner,
            author: fields.author,
            content: fields.content,
        })
    }
}

/// Text fields arrive either as plain strings or as rich-text arrays
fn text_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrRich {
        Text(String),
        Rich(Vec<RichTextBlock>),
    }

    Ok(match Option::<TextOrRich>::deserialize(deserializer)? {
        Some(TextOrRich::Text(s)) => s,
        Some(TextOrRich::Rich(blocks)) => super::richtext::as_text(&blocks),
        None => String::new(),
    })
}

/// An empty image field comes back as `{}` or null
fn banner_field<'de, D>(deserializer: D) -> Result<Banner, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Banner>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
