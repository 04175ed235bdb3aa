//! Deterministic fixture adapter.
//!
//! Produces a fixed set of events dated relative to the current time, so a
//! demo catalog always has upcoming entries. No network access. Also usable
//! in tests via [`FixtureAdapter::with_events`].

use chrono::{Duration, Utc};
use reqwest::Client;

use whatson_shared::{RawEvent, Result};

use crate::{BoxFuture, SourceAdapter};

pub struct FixtureAdapter {
    events: Vec<RawEvent>,
}

impl FixtureAdapter {
    /// The built-in demo catalog.
    pub fn new() -> Self {
        let now = Utc::now();
        let demo = |days: i64,
                    title: &str,
                    time: &str,
                    venue: &str,
                    address: &str,
                    description: &str,
                    category: &[&str],
                    url: &str| RawEvent {
            title: Some(title.into()),
            date: Some(now + Duration::days(days)),
            time: Some(time.into()),
            venue_name: Some(venue.into()),
            venue_address: Some(address.into()),
            city: Some("Sydney".into()),
            description: Some(description.into()),
            category: category.iter().map(|c| c.to_string()).collect(),
            original_url: Some(url.into()),
            ..RawEvent::default()
        };

        Self {
            events: vec![
                demo(
                    5,
                    "Sydney Music Festival",
                    "6:00 PM",
                    "Sydney Opera House",
                    "Bennelong Point, Sydney NSW 2000",
                    "A spectacular music festival featuring top artists from around the world. \
                     Join us for an unforgettable evening of live performances.",
                    &["Music", "Festival"],
                    "https://www.eventbrite.com.au/e/sydney-music-festival",
                ),
                demo(
                    8,
                    "Sydney Food & Wine Expo",
                    "11:00 AM",
                    "Royal Hall of Industries",
                    "1 Driver Ave, Moore Park NSW 2021",
                    "Discover the finest food and wine from local producers and international \
                     vendors. Tastings, cooking demonstrations, and more.",
                    &["Food & Drink", "Expo"],
                    "https://www.eventbrite.com.au/e/sydney-food-wine-expo",
                ),
                demo(
                    12,
                    "Tech Innovation Summit Sydney",
                    "9:00 AM",
                    "International Convention Centre",
                    "14 Darling Dr, Sydney NSW 2000",
                    "Join industry leaders and innovators for a day of talks, workshops, and \
                     networking in the tech space.",
                    &["Technology", "Conference"],
                    "https://www.eventbrite.com.au/e/tech-innovation-summit-sydney",
                ),
                demo(
                    3,
                    "Yoga in the Park",
                    "7:00 AM",
                    "Centennial Park",
                    "1 Grand Drive, Centennial Park NSW 2021",
                    "Start your weekend with a free yoga session in the beautiful Centennial \
                     Park. All levels welcome.",
                    &["Health & Wellness", "Yoga"],
                    "https://www.facebook.com/events/yoga-centennial-park",
                ),
                demo(
                    7,
                    "Sydney Comedy Night",
                    "8:00 PM",
                    "Comedy Store Sydney",
                    "123 Entertainment Quarter, Sydney NSW 2000",
                    "An evening of laughter with top comedians from Australia and around the \
                     world. Stand-up comedy at its finest.",
                    &["Comedy", "Entertainment"],
                    "https://www.eventfinda.com.au/event/sydney-comedy-night",
                ),
                demo(
                    20,
                    "Sydney Marathon",
                    "6:00 AM",
                    "Sydney Harbour Bridge",
                    "Sydney Harbour Bridge, Sydney NSW 2000",
                    "Join thousands of runners for the annual Sydney Marathon. Full marathon, \
                     half marathon, and 10K options available.",
                    &["Sports", "Running"],
                    "https://www.eventfinda.com.au/event/sydney-marathon",
                ),
            ],
        }
    }

    /// Adapter yielding exactly the given events. Test constructor.
    pub fn with_events(events: Vec<RawEvent>) -> Self {
        Self { events }
    }
}

impl Default for FixtureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for FixtureAdapter {
    fn name(&self) -> &str {
        "Fixture"
    }

    fn fetch<'a>(&'a self, _client: &'a Client) -> BoxFuture<'a, Result<Vec<RawEvent>>> {
        Box::pin(async move { Ok(self.events.clone()) })
    }
}
