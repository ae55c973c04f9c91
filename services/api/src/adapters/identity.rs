//! services/api/src/adapters/identity.rs
//!
//! Resolves session tokens against the external identity provider's
//! `GET {auth_url}/user` endpoint. Implements the `IdentityService` port.

use async_trait::async_trait;
use jokesmith_core::ports::{IdentityService, PortError, PortResult};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct HttpIdentityAdapter {
    http: reqwest::Client,
    user_endpoint: String,
    api_key: String,
}

impl HttpIdentityAdapter {
    pub fn new(http: reqwest::Client, auth_url: &str, api_key: &str) -> Self {
        Self {
            http,
            user_endpoint: format!("{}/user", auth_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ProviderUser {
    id: Uuid,
}

#[async_trait]
impl IdentityService for HttpIdentityAdapter {
    async fn resolve_caller(&self, token: &str) -> PortResult<Option<Uuid>> {
        let response = self
            .http
            .get(&self.user_endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Identity provider unreachable: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Identity provider rejected the session token");
                Ok(None)
            }
            status if status.is_success() => {
                let user = response.json::<ProviderUser>().await.map_err(|e| {
                    PortError::Unexpected(format!("Malformed identity provider response: {}", e))
                })?;
                Ok(Some(user.id))
            }
            status => Err(PortError::Unexpected(format!(
                "Identity provider returned {}",
                status
            ))),
        }
    }
}
