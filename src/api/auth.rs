//! Login, registration, API key provisioning, and logout.

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::model::Media;
use crate::session::{KEY_API_KEY, KEY_PROFILE, KEY_TOKEN};

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload. Optional fields are omitted from the request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterDetails {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
}

/// Result of an auth flow. The parsed body is returned on both paths; `ok`
/// tells success from failure.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub ok: bool,
    pub message: String,
    pub body: Value,
}

impl<'a> ApiClient<'a> {
    /// Log in and, on success, persist the session: token, the full profile
    /// payload, and an API key (the configured one when present, otherwise
    /// one provisioned from the API). A failed login persists nothing.
    pub fn login(
        &self,
        credentials: &Credentials,
        configured_key: Option<&str>,
    ) -> Result<AuthOutcome> {
        let resp = self.request_public(
            "/auth/login",
            RequestOptions::post(serde_json::to_value(credentials)?),
        )?;

        if !resp.ok() {
            return Ok(AuthOutcome {
                ok: false,
                message: format!("Login failed: {}", resp.server_message()),
                body: resp.body,
            });
        }

        let token = resp.body["data"]["accessToken"]
            .as_str()
            .ok_or_else(|| anyhow!("login response is missing an access token"))?
            .to_string();

        // Resolve the key before persisting anything: a provisioning
        // failure must not leave a half-built session behind.
        let api_key = match configured_key {
            Some(key) => key.to_string(),
            None => self.create_api_key(&token)?,
        };

        self.store().set(KEY_TOKEN, &token)?;
        self.store()
            .set(KEY_PROFILE, &serde_json::to_string(&resp.body)?)?;
        self.store().set(KEY_API_KEY, &api_key)?;

        Ok(AuthOutcome {
            ok: true,
            message: "You have been logged in.".to_string(),
            body: resp.body,
        })
    }

    /// Register a new account. Never persists a session; a separate login
    /// step is required afterward.
    pub fn register(&self, details: &RegisterDetails) -> Result<AuthOutcome> {
        let resp = self.request_public(
            "/auth/register",
            RequestOptions::post(serde_json::to_value(details)?),
        )?;

        if resp.ok() {
            Ok(AuthOutcome {
                ok: true,
                message: "You have been registered.".to_string(),
                body: resp.body,
            })
        } else {
            Ok(AuthOutcome {
                ok: false,
                message: format!("Registration failed: {}", resp.server_message()),
                body: resp.body,
            })
        }
    }

    /// Provision an API key using the given bearer token. The token is
    /// passed explicitly so provisioning can run before the session is
    /// persisted.
    pub fn create_api_key(&self, token: &str) -> Result<String> {
        let resp = self.request(
            "/auth/create-api-key",
            RequestOptions::post(json!({}))
                .with_header("Authorization", &format!("Bearer {}", token)),
        )?;

        if !resp.ok() {
            return Err(ApiError::FetchFailed {
                status: resp.status,
                message: resp.server_message(),
            }
            .into());
        }

        resp.body["data"]["key"]
            .as_str()
            .map(|key| key.to_string())
            .ok_or_else(|| anyhow!("create-api-key response is missing a key"))
    }

    /// Drop the persisted session (token, profile, API key).
    pub fn logout(&self) -> Result<()> {
        self.store().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::ApiResponse;
    use crate::session::{MemoryStore, SessionStore};

    fn login_body() -> Value {
        json!({
            "data": {
                "name": "ada",
                "email": "ada@example.com",
                "accessToken": "tok-abc",
                "credits": 1000
            }
        })
    }

    #[test]
    fn test_login_success_persists_three_keys() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::replying(200, login_body());
        let api = ApiClient::new("https://api.example", &store, &transport);

        let outcome = api
            .login(
                &Credentials {
                    email: "ada@example.com".to_string(),
                    password: "pw".to_string(),
                },
                Some("cfg-key"),
            )
            .unwrap();

        assert!(outcome.ok);
        assert_eq!(store.token(), Some("tok-abc".to_string()));
        assert_eq!(store.api_key(), Some("cfg-key".to_string()));
        assert_eq!(store.profile_name(), Some("ada".to_string()));
        // Only one request: the configured key skips provisioning
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_login_without_configured_key_provisions_one() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::new(vec![
            ApiResponse {
                status: 200,
                body: login_body(),
            },
            ApiResponse {
                status: 201,
                body: json!({ "data": { "key": "provisioned-key" } }),
            },
        ]);
        let api = ApiClient::new("https://api.example", &store, &transport);

        let outcome = api
            .login(
                &Credentials {
                    email: "ada@example.com".to_string(),
                    password: "pw".to_string(),
                },
                None,
            )
            .unwrap();

        assert!(outcome.ok);
        assert_eq!(store.api_key(), Some("provisioned-key".to_string()));
        assert_eq!(transport.request_count(), 2);
        // The provisioning call carried the fresh bearer token
        let sent = transport.last_request();
        assert!(sent.url.ends_with("/auth/create-api-key"));
        assert_eq!(
            crate::api::testing::header(&sent, "Authorization"),
            Some("Bearer tok-abc")
        );
    }

    #[test]
    fn test_login_persists_nothing_when_provisioning_fails() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::new(vec![
            ApiResponse {
                status: 200,
                body: login_body(),
            },
            ApiResponse {
                status: 500,
                body: json!({ "message": "Internal server error" }),
            },
        ]);
        let api = ApiClient::new("https://api.example", &store, &transport);

        let err = api
            .login(
                &Credentials {
                    email: "ada@example.com".to_string(),
                    password: "pw".to_string(),
                },
                None,
            )
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::FetchFailed { status: 500, .. })
        ));
        assert_eq!(store.token(), None);
        assert_eq!(store.api_key(), None);
        assert_eq!(store.get(crate::session::KEY_PROFILE), None);
        assert!(!crate::session::is_authenticated(&store));
    }

    #[test]
    fn test_login_failure_persists_nothing() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::replying(
            401,
            json!({ "errors": [{ "message": "Invalid email or password" }] }),
        );
        let api = ApiClient::new("https://api.example", &store, &transport);

        let outcome = api
            .login(
                &Credentials {
                    email: "ada@example.com".to_string(),
                    password: "wrong".to_string(),
                },
                Some("cfg-key"),
            )
            .unwrap();

        assert!(!outcome.ok);
        assert!(outcome.message.contains("Invalid email or password"));
        assert_eq!(store.token(), None);
        assert_eq!(store.api_key(), None);
        assert_eq!(store.get(crate::session::KEY_PROFILE), None);
    }

    #[test]
    fn test_register_never_persists() {
        let store = MemoryStore::new();
        let transport =
            ScriptedTransport::replying(201, json!({ "data": { "name": "ada" } }));
        let api = ApiClient::new("https://api.example", &store, &transport);

        let outcome = api
            .register(&RegisterDetails {
                name: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "pw".to_string(),
                bio: None,
                banner: None,
                avatar: None,
            })
            .unwrap();

        assert!(outcome.ok);
        assert_eq!(store.token(), None);

        // Optional fields are omitted from the body entirely
        let body = transport.last_request().body.unwrap();
        assert_eq!(body["name"], "ada");
        assert!(body.get("bio").is_none());
        assert!(body.get("avatar").is_none());
    }

    #[test]
    fn test_register_failure_surfaces_server_message() {
        let store = MemoryStore::new();
        let transport = ScriptedTransport::replying(
            400,
            json!({ "errors": [{ "message": "Profile already exists" }] }),
        );
        let api = ApiClient::new("https://api.example", &store, &transport);

        let outcome = api
            .register(&RegisterDetails {
                name: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "pw".to_string(),
                bio: Some("hi".to_string()),
                banner: None,
                avatar: None,
            })
            .unwrap();

        assert!(!outcome.ok);
        assert!(outcome.message.contains("Profile already exists"));
    }

    #[test]
    fn test_logout_clears_session() {
        let store = MemoryStore::new();
        store.set(KEY_TOKEN, "t").unwrap();
        store.set(KEY_API_KEY, "k").unwrap();
        let transport = ScriptedTransport::replying(200, Value::Null);
        let api = ApiClient::new("https://api.example", &store, &transport);

        api.logout().unwrap();
        assert!(!crate::session::is_authenticated(&store));
        assert_eq!(store.api_key(), None);
    }
}
