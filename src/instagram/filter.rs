//! Narrowing a feed down to the posts that belong in the book.
//!
//! Filtering is a pure function of its inputs: timestamps are compared as data,
//! never against the wall clock, and the input order is kept as-is.

use super::{FeedFilter, MediaItem};
use chrono::{DateTime, NaiveTime, Utc};

/// Apply `filter` to `items`, keeping at most `filter.max_count` matches.
///
/// The count limit is applied after the hashtag and date checks, so asking for
/// ten `#travel` posts yields ten `#travel` posts if the feed has them.
pub fn apply(items: &[MediaItem], filter: &FeedFilter) -> Vec<MediaItem> {
    let hashtag = filter
        .hashtag
        .as_deref()
        .filter(|tag| !tag.is_empty())
        .map(str::to_lowercase);
    let start = filter
        .start_date
        .map(|day| day.and_time(NaiveTime::MIN).and_utc());
    let end = filter
        .end_date
        .and_then(|day| day.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc());

    items
        .iter()
        .filter(|item| matches_hashtag(item, hashtag.as_deref()))
        .filter(|item| within_range(item, start, end))
        .take(filter.max_count.get())
        .cloned()
        .collect()
}

fn matches_hashtag(item: &MediaItem, hashtag: Option<&str>) -> bool {
    match hashtag {
        Some(tag) => item.caption_or_empty().to_lowercase().contains(tag),
        None => true,
    }
}

fn within_range(
    item: &MediaItem,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    // an unparseable timestamp can't be shown to fall outside the range
    let Some(published) = item.published_at() else {
        log::debug!(
            "post {} has unparseable timestamp `{}`; keeping it",
            item.id,
            item.timestamp
        );
        return true;
    };
    start.map_or(true, |start| published >= start) && end.map_or(true, |end| published <= end)
}
