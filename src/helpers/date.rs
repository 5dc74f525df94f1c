//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset};
use chrono_tz::Tz;

use crate::i18n::I18n;

/// Timestamp layout used by the CMS, e.g. `2021-03-25T19:25:28+0000`
const CMS_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a CMS timestamp, accepting RFC 3339 as well
pub fn parse_cms_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    DateTime::parse_from_str(s, CMS_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
}

/// Render a timestamp back into the CMS layout
pub fn to_cms_timestamp(date: &DateTime<FixedOffset>) -> String {
    date.format(CMS_TIMESTAMP_FORMAT).to_string()
}

/// Format a publication date as `dd MMM yyyy` in the handler's language
///
/// # Examples
/// ```ignore
/// format_publication_date(Some(&date), &I18n::new("pt-BR"), tz) // -> "05 Mar 2021"
/// ```
pub fn format_publication_date(
    date: Option<&DateTime<FixedOffset>>,
    i18n: &I18n,
    tz: Tz,
) -> String {
    let Some(date) = date else {
        return String::new();
    };

    let local = date.with_timezone(&tz);
    format!(
        "{:02} {} {:04}",
        local.day(),
        i18n.month_abbr(local.month()),
        local.year()
    )
}

/// Format a date in ISO 8601 / XML format, for `datetime` attributes
pub fn date_xml(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Serde adapter for nullable CMS timestamps
///
/// Unparseable values become `None` with a warning instead of failing the
/// whole response.
pub mod cms_timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&super::to_cms_timestamp(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            let parsed = super::parse_cms_timestamp(&s);
            if parsed.is_none() {
                tracing::warn!("Ignoring unparseable timestamp {:?}", s);
            }
            parsed
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sao_paulo() -> Tz {
        "America/Sao_Paulo".parse().unwrap()
    }

    #[test]
    fn test_parse_cms_timestamp() {
        let date = parse_cms_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(date.year(), 2021);
        assert_eq!(date.month(), 3);
        assert_eq!(date.day(), 25);

        assert!(parse_cms_timestamp("2021-03-25T19:25:28Z").is_some());
        assert!(parse_cms_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_publication_date_pt_br() {
        let i18n = I18n::new("pt-BR");
        let date = parse_cms_timestamp("2021-03-05T12:00:00+0000").unwrap();
        assert_eq!(
            format_publication_date(Some(&date), &i18n, sao_paulo()),
            "05 Mar 2021"
        );

        let date = parse_cms_timestamp("2021-04-19T15:00:00+0000").unwrap();
        assert_eq!(
            format_publication_date(Some(&date), &i18n, sao_paulo()),
            "19 Abr 2021"
        );
    }

    #[test]
    fn test_format_uses_display_timezone() {
        let i18n = I18n::new("pt-BR");
        // 01:00 UTC on the 1st is still the previous evening in São Paulo
        let date = parse_cms_timestamp("2021-09-01T01:00:00+0000").unwrap();
        assert_eq!(
            format_publication_date(Some(&date), &i18n, sao_paulo()),
            "31 Ago 2021"
        );
        assert_eq!(
            format_publication_date(Some(&date), &i18n, chrono_tz::UTC),
            "01 Set 2021"
        );
    }

    #[test]
    fn test_missing_date_is_empty() {
        let i18n = I18n::new("pt-BR");
        assert_eq!(format_publication_date(None, &i18n, sao_paulo()), "");
    }

    #[test]
    fn test_round_trip_layout() {
        let date = parse_cms_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(to_cms_timestamp(&date), "2021-03-25T19:25:28+0000");
        assert_eq!(date_xml(&date), "2021-03-25T19:25:28+00:00");
    }
}
