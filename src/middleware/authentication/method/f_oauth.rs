use crate::configuration::Settings;
use crate::db;
use crate::forms;
use crate::middleware::authentication::get_header;
use crate::models;
use actix_web::{dev::ServiceRequest, web, HttpMessage};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Users resolved by the auth service, keyed by bearer token.
pub struct OAuthCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedUser>>,
}

struct CachedUser {
    user: models::User,
    expires_at: Instant,
}

impl OAuthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, token: &str) -> Option<models::User> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                Some(entry) if entry.expires_at > now => return Some(entry.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // expired, drop it
        self.entries.write().await.remove(token);
        None
    }

    pub async fn insert(&self, token: String, user: models::User) {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(token, CachedUser { user, expires_at });
    }
}

fn try_extract_token(authentication: &str) -> Result<String, String> {
    match authentication.split_once(' ') {
        Some(("Bearer", token)) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(("Bearer", _)) => {
            tracing::error!("Bearer token is missing");
            Err("Authentication required".to_string())
        }
        _ => Err("Bearer missing scheme".to_string()),
    }
}

#[tracing::instrument(name = "Authenticate with bearer token", skip(req))]
pub async fn try_oauth(req: &mut ServiceRequest) -> Result<bool, String> {
    let Some(authentication) = get_header::<String>(req, "authorization")? else {
        return Ok(false);
    };

    let token = try_extract_token(&authentication)?;
    let settings = req
        .app_data::<web::Data<Settings>>()
        .ok_or_else(|| "settings are not configured".to_string())?;
    let http_client = req
        .app_data::<web::Data<reqwest::Client>>()
        .ok_or_else(|| "auth client is not configured".to_string())?;
    let cache = req
        .app_data::<web::Data<OAuthCache>>()
        .ok_or_else(|| "auth cache is not configured".to_string())?;

    let mut user = match cache.get(&token).await {
        Some(user) => user,
        None => {
            let user = fetch_user(http_client.get_ref(), settings.auth_url.as_str(), &token).await?;
            // assignment and the admin roster read the local profile copy
            if let Some(pg_pool) = req.app_data::<web::Data<PgPool>>() {
                if let Err(err) = db::profile::upsert(pg_pool.get_ref(), &user).await {
                    tracing::warn!("Profile of {} not refreshed: {}", user.id, err);
                }
            }
            cache.insert(token.clone(), user.clone()).await;
            user
        }
    };

    // kept for calls made on the user's behalf, e.g. storage uploads
    user.access_token = Some(token);
    tracing::debug!("authenticated {} with role {}", user.id, user.role);

    if req.extensions_mut().insert(Arc::new(user)).is_some() {
        return Err("user already logged".to_string());
    }

    Ok(true)
}

pub async fn fetch_user(
    client: &reqwest::Client,
    auth_url: &str,
    token: &str,
) -> Result<models::User, String> {
    let resp = client
        .get(auth_url)
        .bearer_auth(token)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|err| {
            tracing::error!(target: "auth", error = %err, "OAuth request failed");
            "No response from OAuth server".to_string()
        })?;

    if !resp.status().is_success() {
        return Err("401 Unauthorized".to_string());
    }

    resp.json::<forms::UserForm>()
        .await
        .map_err(|_err| "can't parse the response body".to_string())?
        .try_into()
}
