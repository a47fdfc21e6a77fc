//! Wire types for the remote auction API.
//!
//! The API wraps every payload in a `{ data, meta }` envelope. The client
//! treats listings and bids as read-only snapshots; the authoritative copy
//! lives server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response envelope used by every endpoint. Pagination metadata rides in a
/// sibling `meta` object the client has no use for; serde drops it.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// An image reference with optional alt text.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Media {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Partial profile reference embedded in listings and bids.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileRef {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
}

/// A monetary offer against a listing. Append-only from the client's view.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Bid {
    pub amount: f64,
    #[serde(default)]
    pub bidder: Option<ProfileRef>,
    pub created: DateTime<Utc>,
}

/// An auction item with a close time, media, and bid history.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "endsAt")]
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub seller: Option<ProfileRef>,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default, rename = "highestBid")]
    pub highest_bid: Option<f64>,
}

impl Listing {
    /// The listing is still open for bidding at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.ends_at > now
    }

    /// First media entry with a non-empty URL, if any.
    pub fn primary_media(&self) -> Option<&Media> {
        self.media.first().filter(|m| !m.url.trim().is_empty())
    }

    /// Highest bid amount, preferring the server-provided summary field and
    /// falling back to the embedded bid history.
    pub fn current_high_bid(&self) -> Option<f64> {
        self.highest_bid.or_else(|| {
            self.bids
                .iter()
                .map(|b| b.amount)
                .fold(None, |acc, amount| match acc {
                    Some(best) if best >= amount => Some(best),
                    _ => Some(amount),
                })
        })
    }
}

/// Payload of the profile credits sub-resource.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditsData {
    pub credits: i64,
}
