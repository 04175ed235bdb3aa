//! Facebook Events listing adapter.
//!
//! Facebook's public events pages are heavily scripted; this adapter only
//! reads the server-rendered card markup. When the page yields nothing the
//! run simply records zero events for this source.

use reqwest::Client;
use scraper::{Html, Selector};

use whatson_shared::{RawEvent, Result, WhatsonError};

use crate::date::{clean_text, extract_time, parse_event_date};
use crate::{BoxFuture, SourceAdapter};

const DEFAULT_LISTING_URL: &str = "https://www.facebook.com/events/explore/sydney-australia/";

pub struct FacebookAdapter {
    listing_url: String,
}

impl FacebookAdapter {
    pub fn new(listing_url: Option<String>) -> Self {
        Self {
            listing_url: listing_url.unwrap_or_else(|| DEFAULT_LISTING_URL.into()),
        }
    }
}

impl SourceAdapter for FacebookAdapter {
    fn name(&self) -> &str {
        "Facebook Events"
    }

    fn fetch<'a>(&'a self, client: &'a Client) -> BoxFuture<'a, Result<Vec<RawEvent>>> {
        Box::pin(async move {
            let body = client
                .get(&self.listing_url)
                .send()
                .await
                .map_err(|e| WhatsonError::Network(e.to_string()))?
                .error_for_status()
                .map_err(|e| WhatsonError::Network(e.to_string()))?
                .text()
                .await
                .map_err(|e| WhatsonError::Network(e.to_string()))?;

            let events = parse_listing(&body);
            tracing::debug!(source = self.name(), count = events.len(), "parsed listing");
            Ok(events)
        })
    }
}

fn parse_listing(html: &str) -> Vec<RawEvent> {
    let doc = Html::parse_document(html);
    let card_sel = Selector::parse("[data-testid='event-card'], .event-card").unwrap();
    let title_sel = Selector::parse("h2, h3, .event-title").unwrap();
    let date_sel = Selector::parse("time, .event-time").unwrap();
    let venue_sel = Selector::parse(".event-location").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let now = chrono::Utc::now();
    let mut events = Vec::new();

    for card in doc.select(&card_sel) {
        let title = card
            .select(&title_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        let date_el = card.select(&date_sel).next();
        // Prefer the machine-readable datetime attribute over display text
        let date_str = date_el.and_then(|el| {
            el.value()
                .attr("datetime")
                .map(String::from)
                .or_else(|| Some(clean_text(&el.text().collect::<String>())))
        });

        let (Some(title), Some(date_str)) = (title, date_str) else {
            continue;
        };
        let Some(date) = parse_event_date(&date_str, now) else {
            tracing::warn!(source = "Facebook Events", %title, %date_str, "unparseable date, skipping");
            continue;
        };

        let display_time = date_el
            .map(|el| clean_text(&el.text().collect::<String>()))
            .and_then(|text| extract_time(&text));

        events.push(RawEvent {
            title: Some(title),
            date: Some(date),
            time: display_time.or_else(|| Some("TBA".into())),
            venue_name: card
                .select(&venue_sel)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .filter(|s| !s.is_empty()),
            original_url: card
                .select(&link_sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(String::from),
            ..RawEvent::default()
        });
    }

    events
}
