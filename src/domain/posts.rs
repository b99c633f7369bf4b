//! Markdown documents with YAML front-matter: posts and static pages.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::domain::error::DomainError;

const FRONT_MATTER_DELIMITER: &str = "---";

/// Accepted `date` formats, tried in order.
pub const POST_DATE_FORMATS: [&str; 3] = ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub date: NaiveDate,
    pub slug: String,
    pub summary: String,
    pub content_html: String,
    pub tags: Vec<String>,
}

impl Post {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub content_html: String,
}

/// Validated post metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostFrontMatter {
    pub title: String,
    pub date: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
}

/// Validated page metadata. Pages only carry a title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageFrontMatter {
    pub title: String,
}

/// A markdown document split into its raw front-matter and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    pub front_matter: &'a str,
    pub body: &'a str,
}

/// Split a document at the first two `---` delimiters.
///
/// Anything before the first delimiter is discarded; everything after the
/// second one, further delimiters included, is body.
pub fn split_front_matter(raw: &str) -> Result<SplitDocument<'_>, DomainError> {
    let mut parts = raw.splitn(3, FRONT_MATTER_DELIMITER);
    let _preamble = parts.next();
    match (parts.next(), parts.next()) {
        (Some(front_matter), Some(body)) => Ok(SplitDocument { front_matter, body }),
        _ => Err(DomainError::MissingFrontMatter),
    }
}

pub fn parse_post_front_matter(raw: &str) -> Result<PostFrontMatter, DomainError> {
    let meta: PostFrontMatter =
        serde_yaml::from_str(raw).map_err(|err| DomainError::front_matter(err.to_string()))?;

    if meta.slug.trim().is_empty() {
        return Err(DomainError::validation("front-matter `slug` must not be empty"));
    }

    Ok(meta)
}

pub fn parse_page_front_matter(raw: &str) -> Result<PageFrontMatter, DomainError> {
    serde_yaml::from_str(raw).map_err(|err| DomainError::front_matter(err.to_string()))
}

/// Parse a post date using the first matching entry of [`POST_DATE_FORMATS`].
pub fn parse_post_date(value: &str) -> Result<NaiveDate, DomainError> {
    let trimmed = value.trim();
    POST_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DomainError::InvalidDate {
            value: trimmed.to_string(),
        })
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};

    struct StringOrList;

    impl<'de> Visitor<'de> for StringOrList {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut tags = Vec::new();
            while let Some(tag) = seq.next_element::<String>()? {
                tags.push(tag);
            }
            Ok(tags)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrList)
}
