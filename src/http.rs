//! Thin blocking HTTP client used to reach document hosts.
//!
//! The bearer token lives in an [`AuthContext`] handed to the client at
//! construction. Login and logout update that context; every request reads it
//! at send time, so a client built before login picks the token up afterwards.

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Arc<RwLock<Option<String>>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, token: impl Into<String>) {
        match self.token.write() {
            Ok(mut guard) => {
                *guard = Some(token.into());
                info!("Auth token attached");
            }
            Err(_) => warn!("Skipping login: auth context lock poisoned"),
        }
    }

    pub fn logout(&self) {
        match self.token.write() {
            Ok(mut guard) => {
                *guard = None;
                info!("Auth token cleared");
            }
            Err(_) => warn!("Skipping logout: auth context lock poisoned"),
        }
    }

    pub fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    auth: AuthContext,
    base_url: Option<Url>,
}

impl ApiClient {
    pub fn new(auth: AuthContext, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid API base URL {raw}")))
            .transpose()?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            auth,
            base_url,
        })
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Resolve an absolute URL, or a path relative to the configured base URL.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(err) => match &self.base_url {
                Some(base) => base
                    .join(target)
                    .with_context(|| format!("resolving {target} against {base}")),
                None => Err(err).with_context(|| format!("invalid document URL {target}")),
            },
        }
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        let request = self.http.get(url);
        match self.auth.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
