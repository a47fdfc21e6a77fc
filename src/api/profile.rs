//! Profile resource client: credits and avatar updates.

use anyhow::Result;
use serde_json::json;

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::model::{CreditsData, Envelope};
use crate::session::KEY_PROFILE;

impl<'a> ApiClient<'a> {
    /// Fetch the credit balance of a user.
    pub fn fetch_user_credits(&self, username: &str) -> Result<i64> {
        if username.trim().is_empty() {
            return Err(ApiError::MissingParameter("username").into());
        }

        let resp = self.request(
            &format!("/auction/profiles/{}/credits", username),
            RequestOptions::get(),
        )?;

        if !resp.ok() {
            return Err(ApiError::FetchFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        let envelope: Envelope<CreditsData> = serde_json::from_value(resp.body)?;
        Ok(envelope.data.credits)
    }

    /// Update the current user's avatar and return the updated profile data.
    /// The username is resolved from the persisted profile, and the cached
    /// profile's avatar is refreshed on success.
    pub fn update_avatar(&self, avatar_url: &str) -> Result<serde_json::Value> {
        let username = self.store().profile_name().ok_or(ApiError::MissingUser)?;

        let payload = json!({
            "avatar": {
                "url": avatar_url,
                "alt": "User profile avatar"
            }
        });

        let resp = self.request(
            &format!("/auction/profiles/{}", username),
            RequestOptions::put(payload),
        )?;

        if !resp.ok() {
            return Err(ApiError::UpdateFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        // Keep the cached profile's avatar in sync with the server's copy.
        if let Some(mut profile) = self.store().profile() {
            profile["data"]["avatar"] = resp.body["data"]["avatar"].clone();
            self.store()
                .set(KEY_PROFILE, &serde_json::to_string(&profile)?)?;
        }

        Ok(resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::session::{MemoryStore, SessionStore};

    #[test]
    fn test_fetch_user_credits() {
        let store = MemoryStore::new();
        let transport =
            ScriptedTransport::replying(200, json!({ "data": { "credits": 850 } }));
        let api = ApiClient::new("https://api.example", &store, &transport);

        let credits = api.fetch_user_credits("ada").unwrap();
        assert_eq!(credits, 850);
        assert!(transport
            .last_request()
            .url
            .ends_with("/auction/profiles/ada/credits"));
    }

    #[test]
    fn test_fetch_user_credits_non_success() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::replying(403, serde_json::Value::Null);
        let api = ApiClient::new("https://api.example", &store, &transport);

        let err = api.fetch_user_credits("ada").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::FetchFailed { status: 403, .. })
        ));
    }

    #[test]
    fn test_update_avatar_requires_stored_profile() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::replying(200, serde_json::Value::Null);
        let api = ApiClient::new("https://api.example", &store, &transport);

        let err = api.update_avatar("https://img.example/a.jpg").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::MissingUser)
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_update_avatar_puts_payload_and_refreshes_cache() {
        let store = MemoryStore::new();
        store
            .set(
                KEY_PROFILE,
                r#"{ "data": { "name": "ada", "avatar": { "url": "https://img.example/old.jpg" } } }"#,
            )
            .unwrap();
        let transport = ScriptedTransport::replying(
            200,
            json!({ "data": { "name": "ada", "avatar": { "url": "https://img.example/new.jpg", "alt": "User profile avatar" } } }),
        );
        let api = ApiClient::new("https://api.example", &store, &transport);

        api.update_avatar("https://img.example/new.jpg").unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.method, "PUT");
        assert!(sent.url.ends_with("/auction/profiles/ada"));
        let body = sent.body.unwrap();
        assert_eq!(body["avatar"]["url"], "https://img.example/new.jpg");

        let cached = store.profile().unwrap();
        assert_eq!(cached["data"]["avatar"]["url"], "https://img.example/new.jpg");
    }

    #[test]
    fn test_update_avatar_non_success_is_update_failed() {
        let store = MemoryStore::new();
        store
            .set(KEY_PROFILE, r#"{ "data": { "name": "ada" } }"#)
            .unwrap();
        let transport = ScriptedTransport::replying(
            400,
            json!({ "errors": [{ "message": "Invalid image URL" }] }),
        );
        let api = ApiClient::new("https://api.example", &store, &transport);

        let err = api.update_avatar("not-a-url").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::UpdateFailed { status: 400, .. })
        ));
    }
}
