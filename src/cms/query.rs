//! Search queries and their URL encoding

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is in query parameters (RFC 3986 unreserved)
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A search predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `at(path, "value")`: exact match on a field
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Predicate syntax, e.g. `[at(document.type, "posts")]`
    pub fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                format!(r#"[at({}, "{}")]"#, path, value)
            }
        }
    }
}

/// A document search against the CMS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    predicates: Vec<Predicate>,
    page_size: Option<usize>,
    fetch: Vec<String>,
    orderings: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents of one custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::new().predicate(Predicate::at("document.type", doc_type))
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Restrict the returned fields, e.g. `posts.title`
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn orderings(mut self, orderings: Option<String>) -> Self {
        self.orderings = orderings.filter(|o| !o.trim().is_empty());
        self
    }

    /// The `q` parameter: all predicates wrapped in one bracket pair
    pub fn predicates_param(&self) -> String {
        let inner: String = self.predicates.iter().map(Predicate::to_query).collect();
        format!("[{}]", inner)
    }

    /// Full search URL under `endpoint`
    pub fn to_url(&self, endpoint: &str, reference: &str, access_token: Option<&str>) -> String {
        let mut params = vec![("ref", reference.to_string())];

        if !self.predicates.is_empty() {
            params.push(("q", self.predicates_param()));
        }
        if let Some(page_size) = self.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(orderings) = &self.orderings {
            params.push(("orderings", orderings.clone()));
        }
        if let Some(token) = access_token {
            params.push(("access_token", token.to_string()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_param(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}/documents/search?{}",
            endpoint.trim_end_matches('/'),
            query
        )
    }
}

/// Percent-encode a query parameter value
pub fn encode_param(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}
