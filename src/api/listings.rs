//! Listing resource client: read, search, create, and bid.

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::model::{Envelope, Listing, Media};

/// Payload for creating a listing. `ends_at` is passed through as the
/// ISO-8601 text the user supplied; the server validates it.
#[derive(Debug, Clone, Serialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    #[serde(rename = "endsAt")]
    pub ends_at: String,
    pub tags: Vec<String>,
    pub media: Vec<Media>,
}

impl<'a> ApiClient<'a> {
    /// Fetch one listing with its seller and bid history embedded.
    pub fn read_listing(&self, id: &str) -> Result<Listing> {
        if id.trim().is_empty() {
            return Err(ApiError::MissingParameter("listing ID").into());
        }

        let options = RequestOptions::get()
            .with_query("_seller", "true")
            .with_query("_bids", "true");
        let resp = self.request(&format!("/auction/listings/{}", id), options)?;

        if !resp.ok() {
            return Err(ApiError::FetchFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<Listing> = serde_json::from_value(resp.body)?;
        Ok(envelope.data)
    }

    /// Fetch a page of listings, optionally narrowed to a tag. Pagination
    /// parameters are always forwarded to the endpoint.
    pub fn read_listings(&self, limit: u32, page: u32, tag: Option<&str>) -> Result<Vec<Listing>> {
        let mut options = RequestOptions::get()
            .with_query("limit", &limit.to_string())
            .with_query("page", &page.to_string())
            .with_query("_bids", "true")
            .with_query("_seller", "true");
        if let Some(tag) = tag {
            options = options.with_query("_tag", tag);
        }

        let resp = self.request("/auction/listings", options)?;
        if !resp.ok() {
            return Err(ApiError::FetchFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<Vec<Listing>> = serde_json::from_value(resp.body)?;
        Ok(envelope.data)
    }

    /// Fetch the listings owned by the current user. The username comes from
    /// the persisted profile; there is deliberately no username parameter.
    pub fn read_listings_by_user(&self, limit: u32, page: u32) -> Result<Vec<Listing>> {
        let username = self.store().profile_name().ok_or(ApiError::MissingUser)?;

        let options = RequestOptions::get()
            .with_query("limit", &limit.to_string())
            .with_query("page", &page.to_string());
        let resp = self.request(&format!("/auction/profiles/{}/listings", username), options)?;

        if !resp.ok() {
            return Err(ApiError::FetchFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<Vec<Listing>> = serde_json::from_value(resp.body)?;
        Ok(envelope.data)
    }

    /// Search listings by free-text query, with bids and seller embedded.
    /// The transport URL-encodes the query value.
    pub fn search_listings(&self, query: &str) -> Result<Vec<Listing>> {
        let options = RequestOptions::get()
            .with_query("q", query)
            .with_query("_bids", "true")
            .with_query("_seller", "true");
        let resp = self.request("/auction/listings/search", options)?;

        if !resp.ok() {
            return Err(ApiError::FetchFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<Vec<Listing>> = serde_json::from_value(resp.body)?;
        Ok(envelope.data)
    }

    /// Create a new auction listing and return the created resource.
    pub fn create_listing(&self, listing: &NewListing) -> Result<Listing> {
        let resp = self.request(
            "/auction/listings",
            RequestOptions::post(serde_json::to_value(listing)?),
        )?;

        if !resp.ok() {
            return Err(ApiError::CreateFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<Listing> = serde_json::from_value(resp.body)?;
        Ok(envelope.data)
    }

    /// Place a bid on a listing. Amount validation happens at the view layer
    /// before this call; the server enforces the real bidding rules.
    pub fn place_bid(&self, listing_id: &str, amount: f64) -> Result<Listing> {
        if listing_id.trim().is_empty() {
            return Err(ApiError::MissingParameter("listing ID").into());
        }

        let resp = self.request(
            &format!("/auction/listings/{}/bids", listing_id),
            RequestOptions::post(json!({ "amount": amount })),
        )?;

        if !resp.ok() {
            return Err(ApiError::BidFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<Listing> = serde_json::from_value(resp.body)?;
        Ok(envelope.data)
    }
}
