//! Eventfinda listing adapter.

use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use whatson_shared::{RawEvent, Result, WhatsonError};

use crate::date::{clean_text, extract_time, parse_event_date};
use crate::{BoxFuture, SourceAdapter};

const DEFAULT_LISTING_URL: &str = "https://www.eventfinda.com.au/whatson/sydney";

/// Scrapes the Eventfinda what's-on listing page.
pub struct EventfindaAdapter {
    listing_url: String,
}

impl EventfindaAdapter {
    pub fn new(listing_url: Option<String>) -> Self {
        Self {
            listing_url: listing_url.unwrap_or_else(|| DEFAULT_LISTING_URL.into()),
        }
    }
}

impl SourceAdapter for EventfindaAdapter {
    fn name(&self) -> &str {
        "Eventfinda"
    }

    fn fetch<'a>(&'a self, client: &'a Client) -> BoxFuture<'a, Result<Vec<RawEvent>>> {
        Box::pin(async move {
            let response = client
                .get(&self.listing_url)
                .send()
                .await
                .map_err(|e| WhatsonError::Network(e.to_string()))?
                .error_for_status()
                .map_err(|e| WhatsonError::Network(e.to_string()))?;

            let body = response
                .text()
                .await
                .map_err(|e| WhatsonError::Network(e.to_string()))?;

            // Html is !Send, so parsing happens after the last await
            let events = parse_listing(&body, &self.listing_url);
            tracing::debug!(source = self.name(), count = events.len(), "parsed listing");
            Ok(events)
        })
    }
}

/// Parse the listing page into raw events. Items missing a title or date
/// string are skipped.
fn parse_listing(html: &str, listing_url: &str) -> Vec<RawEvent> {
    let doc = Html::parse_document(html);
    let item_sel = Selector::parse(".event-item").unwrap();
    let title_sel = Selector::parse(".event-title").unwrap();
    let date_sel = Selector::parse(".event-date").unwrap();
    let venue_sel = Selector::parse(".event-venue").unwrap();
    let desc_sel = Selector::parse(".event-description").unwrap();
    let link_sel = Selector::parse("a").unwrap();
    let img_sel = Selector::parse("img").unwrap();

    let now = chrono::Utc::now();
    let mut events = Vec::new();

    for item in doc.select(&item_sel) {
        let title = item
            .select(&title_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()));
        let date_str = item
            .select(&date_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()));

        let (Some(title), Some(date_str)) = (title, date_str) else {
            continue;
        };
        if title.is_empty() || date_str.is_empty() {
            continue;
        }

        let date = parse_event_date(&date_str, now);
        if date.is_none() {
            tracing::warn!(source = "Eventfinda", %title, %date_str, "unparseable date, skipping");
            continue;
        }

        let venue_name = item
            .select(&venue_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        let description = item
            .select(&desc_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        let original_url = item
            .select(&link_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| absolute_url(listing_url, href));
        let image_url = item
            .select(&img_sel)
            .next()
            .and_then(|el| el.value().attr("src"))
            .map(String::from);

        events.push(RawEvent {
            title: Some(title),
            date,
            time: extract_time(&date_str).or_else(|| Some("TBA".into())),
            venue_name,
            description,
            image_url,
            original_url,
            ..RawEvent::default()
        });
    }

    events
}

/// Resolve a possibly-relative href against the listing URL.
fn absolute_url(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
