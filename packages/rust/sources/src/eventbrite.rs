//! Eventbrite listing adapter.

use reqwest::Client;
use scraper::{Html, Selector};

use whatson_shared::{RawEvent, Result, WhatsonError};

use crate::date::{clean_text, extract_time, parse_event_date};
use crate::{BoxFuture, SourceAdapter};

const DEFAULT_LISTING_URL: &str = "https://www.eventbrite.com.au/d/australia--sydney/events/";

/// Scrapes the Eventbrite search listing for a city.
pub struct EventbriteAdapter {
    listing_url: String,
}

impl EventbriteAdapter {
    pub fn new(listing_url: Option<String>) -> Self {
        Self {
            listing_url: listing_url.unwrap_or_else(|| DEFAULT_LISTING_URL.into()),
        }
    }
}

impl SourceAdapter for EventbriteAdapter {
    fn name(&self) -> &str {
        "Eventbrite"
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
    let card_sel = Selector::parse(".event-card, .search-event-card").unwrap();
    let title_sel = Selector::parse(".event-card__title, h3").unwrap();
    let date_sel = Selector::parse(".event-card__date").unwrap();
    let venue_sel = Selector::parse(".event-card__venue").unwrap();
    let desc_sel = Selector::parse(".event-card__description").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();
    let img_sel = Selector::parse("img").unwrap();

    let now = chrono::Utc::now();
    let mut events = Vec::new();

    for card in doc.select(&card_sel) {
        let title = card
            .select(&title_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        let date_str = card
            .select(&date_sel)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()));

        let (Some(title), Some(date_str)) = (title, date_str) else {
            continue;
        };
        let Some(date) = parse_event_date(&date_str, now) else {
            tracing::warn!(source = "Eventbrite", %title, %date_str, "unparseable date, skipping");
            continue;
        };

        events.push(RawEvent {
            title: Some(title),
            date: Some(date),
            time: extract_time(&date_str).or_else(|| Some("TBA".into())),
            venue_name: card
                .select(&venue_sel)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .filter(|s| !s.is_empty()),
            description: card
                .select(&desc_sel)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .filter(|s| !s.is_empty()),
            image_url: card
                .select(&img_sel)
                .next()
                .and_then(|el| el.value().attr("src"))
                .map(String::from),
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
