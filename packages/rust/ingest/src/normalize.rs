//! Candidate normalization.

use whatson_shared::{Candidate, IngestOptions, RawEvent};

/// Normalize a raw adapter record into a [`Candidate`].
///
/// Returns `None` when the record lacks a title, a date, or an identity key
/// (`original_url`); such records are counted and skipped, never stored.
/// A missing city falls back to the configured default, and a missing summary
/// is derived from the description's leading characters.
pub fn normalize(raw: RawEvent, source: &str, opts: &IngestOptions) -> Option<Candidate> {
    let title = raw.title.map(|t| t.trim().to_string())?;
    let date = raw.date?;
    let original_url = raw.original_url.map(|u| u.trim().to_string())?;
    if title.is_empty() || original_url.is_empty() {
        return None;
    }

    let summary = raw
        .summary
        .or_else(|| raw.description.as_deref().map(|d| truncate_chars(d, opts.summary_max_chars)));

    Some(Candidate {
        title,
        date,
        time: raw.time,
        venue_name: raw.venue_name,
        venue_address: raw.venue_address,
        city: raw.city.unwrap_or_else(|| opts.default_city.clone()),
        description: raw.description,
        summary,
        category: raw.category,
        tags: raw.tags,
        image_url: raw.image_url,
        poster_url: raw.poster_url,
        source: source.to_string(),
        original_url,
    })
}

/// Truncate to at most `max` characters, never splitting a code point.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw(title: &str, url: &str) -> RawEvent {
        RawEvent {
            title: Some(title.into()),
            date: Some(Utc::now()),
            original_url: Some(url.into()),
            ..RawEvent::default()
        }
    }

    #[test]
    fn required_fields_are_enforced() {
        let opts = IngestOptions::default();

        assert!(normalize(raw("Jazz Night", "https://x/e/1"), "Eventfinda", &opts).is_some());

        let mut missing_title = raw("", "https://x/e/1");
        missing_title.title = None;
        assert!(normalize(missing_title, "Eventfinda", &opts).is_none());
        assert!(normalize(raw("  ", "https://x/e/1"), "Eventfinda", &opts).is_none());

        let mut missing_date = raw("Jazz Night", "https://x/e/1");
        missing_date.date = None;
        assert!(normalize(missing_date, "Eventfinda", &opts).is_none());

        let mut missing_url = raw("Jazz Night", "");
        missing_url.original_url = None;
        assert!(normalize(missing_url, "Eventfinda", &opts).is_none());
        assert!(normalize(raw("Jazz Night", "   "), "Eventfinda", &opts).is_none());
    }

    #[test]
    fn city_defaults_when_absent() {
        let opts = IngestOptions::default();
        let candidate = normalize(raw("Jazz Night", "https://x/e/1"), "Eventfinda", &opts).unwrap();
        assert_eq!(candidate.city, "Sydney");

        let mut with_city = raw("Jazz Night", "https://x/e/2");
        with_city.city = Some("Melbourne".into());
        let candidate = normalize(with_city, "Eventfinda", &opts).unwrap();
        assert_eq!(candidate.city, "Melbourne");
    }

    #[test]
    fn summary_derived_from_description() {
        let opts = IngestOptions {
            summary_max_chars: 10,
            ..IngestOptions::default()
        };

        let mut with_desc = raw("Jazz Night", "https://x/e/1");
        with_desc.description = Some("A long description of the event".into());
        let candidate = normalize(with_desc, "Eventfinda", &opts).unwrap();
        assert_eq!(candidate.summary.as_deref(), Some("A long des"));

        // Explicit summary wins over derivation
        let mut with_summary = raw("Jazz Night", "https://x/e/2");
        with_summary.description = Some("A long description".into());
        with_summary.summary = Some("Short".into());
        let candidate = normalize(with_summary, "Eventfinda", &opts).unwrap();
        assert_eq!(candidate.summary.as_deref(), Some("Short"));
    }

    #[test]
    fn summary_truncation_respects_char_boundaries() {
        let opts = IngestOptions {
            summary_max_chars: 3,
            ..IngestOptions::default()
        };
        let mut raw = raw("Jazz Night", "https://x/e/1");
        raw.description = Some("日本語のイベント".into());
        let candidate = normalize(raw, "Eventfinda", &opts).unwrap();
        assert_eq!(candidate.summary.as_deref(), Some("日本語"));
    }

    #[test]
    fn source_is_stamped() {
        let opts = IngestOptions::default();
        let candidate = normalize(raw("Jazz Night", "https://x/e/1"), "Eventbrite", &opts).unwrap();
        assert_eq!(candidate.source, "Eventbrite");
    }
}
