//! Thin client for the REST surface.

use serde::{Deserialize, Serialize};

use gamerhub_common::wire::CommunitySummary;

use crate::error::SdkError;

#[derive(Debug, Serialize)]
struct RegisterUserBody<'a> {
    username: &'a str,
}

/// A registered user as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
}

/// A user profile with their community memberships.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub communities: Vec<String>,
}

/// REST client for user registration and community listings.
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    /// Register a new user. The backend validates the username and assigns
    /// the id.
    pub async fn register_user(&self, username: &str) -> Result<RegisteredUser, SdkError> {
        let url = format!("{}/api/v1/users", self.api_url);
        let user = self
            .client
            .post(&url)
            .json(&RegisterUserBody { username })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(user)
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<UserProfile, SdkError> {
        let url = format!("{}/api/v1/users/{}", self.api_url, user_id);
        let profile = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(profile)
    }

    /// Every known community with member counts, sorted by slug.
    pub async fn list_communities(&self) -> Result<Vec<CommunitySummary>, SdkError> {
        let url = format!("{}/api/v1/communities", self.api_url);
        let communities = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(communities)
    }
}
