use chrono::{DateTime, NaiveDate, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// A single post as returned by the Graph API `me/media` edge.
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct MediaItem {
    pub id: String,
    #[builder(setter(into, strip_option), default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub media_url: String,
    pub permalink: String,
    /// ISO-8601 publication time, e.g. `2025-01-15T10:30:00+0000`.
    pub timestamp: String,
}

impl MediaItem {
    /// The caption, with a missing caption treated as empty.
    pub fn caption_or_empty(&self) -> &str {
        self.caption.as_deref().unwrap_or_default()
    }

    /// Parses the publication time.
    ///
    /// The Graph API writes offsets without a colon (`+0000`), which RFC 3339
    /// doesn't allow, so both forms are accepted.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .or_else(|_| DateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%z"))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

/// Which posts make it into the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    /// Case-insensitive substring that must appear in the caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag: Option<String>,
    /// First day (UTC) to include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last day (UTC) to include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Maximum number of posts kept after filtering.
    #[serde(default = "default_max_count")]
    pub max_count: NonZeroUsize,
}

/// Posts kept when no `max_count` is configured.
pub const DEFAULT_MAX_COUNT: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

fn default_max_count() -> NonZeroUsize {
    DEFAULT_MAX_COUNT
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            hashtag: None,
            start_date: None,
            end_date: None,
            max_count: DEFAULT_MAX_COUNT,
        }
    }
}

impl FeedFilter {
    /// The hashtag without any leading `#` or `%`, if one is set.
    ///
    /// Matching uses the raw value; this is for naming things after the tag.
    pub fn bare_hashtag(&self) -> Option<&str> {
        self.hashtag
            .as_deref()
            .map(|tag| tag.trim().trim_start_matches(['#', '%']))
            .filter(|tag| !tag.is_empty())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn media_deserializes_from_graph_payload() {
        let item: MediaItem = serde_json::from_str(
            r#"{
                "id": "17895695668004550",
                "media_url": "https://example.com/image.jpg",
                "permalink": "https://www.instagram.com/p/ABC123/",
                "timestamp": "2025-01-15T10:30:00+0000"
            }"#,
        )
        .expect("can deserialize media");
        assert_eq!(item.caption, None);
        assert_eq!(item.caption_or_empty(), "");
        assert_eq!(
            item.published_at(),
            Some("2025-01-15T10:30:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }

    #[test]
    fn published_at_accepts_rfc3339() {
        let item = MediaItemBuilder::default()
            .id("1")
            .media_url("x")
            .permalink("p")
            .timestamp("2025-01-15T19:30:00+09:00")
            .build()
            .unwrap();
        assert_eq!(
            item.published_at(),
            Some("2025-01-15T10:30:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }

    #[test]
    fn garbage_timestamps_do_not_parse() {
        let item = MediaItemBuilder::default()
            .id("1")
            .media_url("x")
            .permalink("p")
            .timestamp("t")
            .build()
            .unwrap();
        assert_eq!(item.published_at(), None);
    }

    #[test]
    fn filter_defaults_to_a_hundred_posts() {
        let filter: FeedFilter = toml::from_str("").expect("can parse empty filter");
        assert_eq!(filter.max_count.get(), 100);
        assert_eq!(filter, FeedFilter::default());
    }

    #[test]
    fn filter_parses_dates() {
        let filter: FeedFilter = toml::from_str(
            r##"
hashtag = "#travel"
start_date = "2025-01-01"
end_date = "2025-01-31"
max_count = 5
"##,
        )
        .expect("can parse filter");
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(filter.bare_hashtag(), Some("travel"));
    }

    #[test]
    fn zero_max_count_is_rejected() {
        assert!(toml::from_str::<FeedFilter>("max_count = 0").is_err());
    }
}
