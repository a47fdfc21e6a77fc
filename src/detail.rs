//! Listing detail view: fetch one listing, build a declarative view of it,
//! and validate bid input before anything touches the network.
//!
//! Page lifecycle: `Loading -> Loaded` or `Loading -> Error`. A submitted
//! bid re-enters `Loading` (the whole listing is re-fetched and re-rendered;
//! there is no incremental update). `Error` is terminal until a reload.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::api::ApiClient;
use crate::model::{Listing, Media};

pub const MSG_LISTING_NOT_FOUND: &str = "Listing not found.";
pub const MSG_DETAIL_FAILED: &str = "Failed to load listing details.";

/// Terminal states of the detail page.
#[derive(Debug, Clone)]
pub enum DetailPage {
    Loaded(DetailView),
    Error(String),
}

/// One row of the bid-history table, in server-returned order.
#[derive(Debug, Clone, PartialEq)]
pub struct BidRow {
    pub amount: f64,
    pub bidder: String,
    pub created: DateTime<Utc>,
}

/// Declarative description of the detail page for one listing.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub seller: String,
    /// Primary image plus thumbnail strip; `primary` indexes into `gallery`.
    pub gallery: Vec<Media>,
    pub primary: usize,
    pub ends_at: DateTime<Utc>,
    pub remaining: String,
    pub ended: bool,
    pub bids: Vec<BidRow>,
}

impl DetailView {
    /// The currently selected image, or the default placeholder.
    pub fn primary_image(&self) -> (&str, &str) {
        match self.gallery.get(self.primary) {
            Some(media) => (
                media.url.as_str(),
                media.alt.as_deref().unwrap_or("Listing image"),
            ),
            None => ("/images/default-image.jpg", "Default image"),
        }
    }

    /// Swap the primary image to another gallery entry (thumbnail click).
    /// Out-of-range indexes leave the selection unchanged.
    pub fn select_image(&mut self, index: usize) {
        if index < self.gallery.len() {
            self.primary = index;
        }
    }
}

/// Build the detail view from a fetched listing at time `now`.
pub fn build_detail(listing: &Listing, now: DateTime<Utc>) -> DetailView {
    DetailView {
        id: listing.id.clone(),
        title: listing.title.clone(),
        description: listing
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description provided.".to_string()),
        seller: listing
            .seller
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "Unknown Seller".to_string()),
        gallery: listing.media.clone(),
        primary: 0,
        ends_at: listing.ends_at,
        remaining: format_remaining(listing.ends_at, now),
        ended: !listing.is_open(now),
        bids: listing
            .bids
            .iter()
            .map(|bid| BidRow {
                amount: bid.amount,
                bidder: bid
                    .bidder
                    .as_ref()
                    .map(|b| b.name.clone())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                created: bid.created,
            })
            .collect(),
    }
}

/// Fetch a listing and resolve the page state. A missing id and a failed
/// fetch both land in `Error`, with the fetch diagnostic on stderr.
pub fn load_detail(api: &ApiClient, id: &str, now: DateTime<Utc>) -> DetailPage {
    if id.trim().is_empty() {
        return DetailPage::Error(MSG_LISTING_NOT_FOUND.to_string());
    }

    match api.read_listing(id) {
        Ok(listing) => DetailPage::Loaded(build_detail(&listing, now)),
        Err(e) => {
            eprintln!("Error fetching listing: {}", e);
            DetailPage::Error(MSG_DETAIL_FAILED.to_string())
        }
    }
}

/// Human-readable time remaining until `ends_at`.
pub fn format_remaining(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = ends_at - now;
    if delta <= chrono::Duration::zero() {
        return "Ended".to_string();
    }

    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes.max(1))
    }
}

/// Validate a bid amount typed by the user. Rejects anything that is not a
/// positive finite number, before any network call is made.
pub fn parse_bid_amount(input: &str) -> Result<f64> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("Please enter a valid bid amount greater than 0."))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(anyhow!("Please enter a valid bid amount greater than 0."));
    }
    Ok(amount)
}

/// Render the detail page as terminal text.
pub fn render_detail(page: &DetailPage) -> String {
    let view = match page {
        DetailPage::Error(message) => return message.clone(),
        DetailPage::Loaded(view) => view,
    };

    let (image_url, image_alt) = view.primary_image();
    let mut out = String::new();
    out.push_str(&format!("{}\n", view.title));
    out.push_str(&format!("Seller: {}\n", view.seller));
    out.push_str(&format!(
        "Time left: {}{}\n",
        view.remaining,
        if view.ended { " (bidding closed)" } else { "" }
    ));
    out.push_str(&format!("Image: {} ({})\n", image_url, image_alt));
    if view.gallery.len() > 1 {
        out.push_str("Gallery:\n");
        for (i, media) in view.gallery.iter().enumerate() {
            let marker = if i == view.primary { "*" } else { " " };
            out.push_str(&format!(" {} [{}] {}\n", marker, i, media.url));
        }
    }
    out.push_str(&format!("\n{}\n\nBid history:\n", view.description));
    if view.bids.is_empty() {
        out.push_str("  No bids available.\n");
    } else {
        for bid in &view.bids {
            out.push_str(&format!(
                "  {} USD  by {}  at {}\n",
                bid.amount,
                bid.bidder,
                bid.created.format("%Y-%m-%d %H:%M UTC")
            ));
        }
    }
    out
}
