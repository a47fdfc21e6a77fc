//! Feed view: a pure mapping from fetched listings to a renderable view,
//! plus a thin text adapter.
//!
//! A listing appears in the feed iff its close time is strictly in the
//! future and its first media entry has a non-empty URL. The two cases that
//! leave nothing to show render distinct placeholder messages.

use chrono::{DateTime, Utc};

use crate::model::Listing;

pub const MSG_NO_LISTINGS: &str = "No listings available.";
pub const MSG_NO_VALID_LISTINGS: &str = "No valid listings available.";
pub const MSG_LOAD_FAILED: &str = "Failed to load listings.";

/// What the feed shows, independent of any output device.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    /// The fetch returned no listings at all.
    Empty,
    /// Listings came back, but none survived the validity filter.
    NoValidListings,
    Cards(Vec<ListingCard>),
}

/// Summary card for one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub image_alt: String,
    pub ends_at: DateTime<Utc>,
    pub highest_bid: Option<f64>,
    pub seller: String,
}

/// Build the feed view from fetched listings at time `now`.
pub fn build_feed(listings: &[Listing], now: DateTime<Utc>) -> FeedView {
    if listings.is_empty() {
        return FeedView::Empty;
    }

    let cards: Vec<ListingCard> = listings
        .iter()
        .filter(|listing| listing.is_open(now))
        .filter_map(|listing| {
            let media = listing.primary_media()?;
            Some(ListingCard {
                id: listing.id.clone(),
                title: listing.title.clone(),
                image_url: media.url.clone(),
                image_alt: media
                    .alt
                    .clone()
                    .filter(|alt| !alt.is_empty())
                    .unwrap_or_else(|| "Listing image".to_string()),
                ends_at: listing.ends_at,
                highest_bid: listing.current_high_bid(),
                seller: listing
                    .seller
                    .as_ref()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
        })
        .collect();

    if cards.is_empty() {
        FeedView::NoValidListings
    } else {
        FeedView::Cards(cards)
    }
}

/// Render the feed view as terminal text.
pub fn render_feed(view: &FeedView) -> String {
    match view {
        FeedView::Empty => MSG_NO_LISTINGS.to_string(),
        FeedView::NoValidListings => MSG_NO_VALID_LISTINGS.to_string(),
        FeedView::Cards(cards) => {
            let mut out = String::new();
            for card in cards {
                let bid_line = match card.highest_bid {
                    Some(amount) => format!("{} USD", amount),
                    None => "No bids yet".to_string(),
                };
                out.push_str(&format!(
                    "{}  [{}]\n  Ends: {}   Highest bid: {}\n  Seller: {}\n  Image: {} ({})\n\n",
                    card.title,
                    card.id,
                    card.ends_at.format("%Y-%m-%d %H:%M UTC"),
                    bid_line,
                    card.seller,
                    card.image_url,
                    card.image_alt,
                ));
            }
            out.push_str(&format!(
                "{} listing(s). Use 'show <id>' to open one, 'bid <id> <amount>' to bid.",
                cards.len()
            ));
            out
        }
    }
}
