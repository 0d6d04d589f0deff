//! Egress proxy pool
//!
//! A run acquires one endpoint up front and serializes it twice: once as a
//! browser launch descriptor and once as an HTTP client proxy URL.

use crate::config::ProxyConfig;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// One egress proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Proxy descriptor handed to the browser at launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProxy {
    pub server: String,
    pub username: String,
    pub password: String,
}

impl ProxyEndpoint {
    /// Browser shape: `{protocol}://{host}:{port}` plus separate credentials
    pub fn browser_proxy(&self) -> BrowserProxy {
        BrowserProxy {
            server: format!("{}://{}:{}", self.protocol, self.host, self.port),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// HTTP client shape: `{protocol}://{user}:{pass}@{host}:{port}`
    ///
    /// Credentials are percent-encoded, and omitted when the username is empty.
    pub fn http_proxy_url(&self) -> Result<String> {
        let invalid = |what: &str| HarvestError::Proxy(format!("invalid proxy {}: {}", self.host, what));

        let mut url = Url::parse(&format!("{}://{}:{}", self.protocol, self.host, self.port))
            .map_err(|e| invalid(&e.to_string()))?;
        if !self.username.is_empty() {
            url.set_username(&self.username)
                .map_err(|_| invalid("cannot carry a username"))?;
            url.set_password(Some(&self.password))
                .map_err(|_| invalid("cannot carry a password"))?;
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Builds the reqwest proxy for this endpoint
    pub fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        reqwest::Proxy::all(self.http_proxy_url()?)
            .map_err(|e| HarvestError::Proxy(format!("invalid proxy {}: {}", self.host, e)))
    }
}

/// Source of egress proxies
#[async_trait]
pub trait ProxyPool: Send + Sync {
    /// Acquires one endpoint for the run
    async fn acquire(&self) -> Result<ProxyEndpoint>;
}

/// Pool backed by the endpoints listed in the configuration
#[derive(Debug)]
pub struct StaticProxyPool {
    endpoints: Vec<ProxyEndpoint>,
    next: AtomicUsize,
}

impl StaticProxyPool {
    /// Builds a pool from the first `pool-size` configured endpoints
    pub fn from_config(config: &ProxyConfig) -> Self {
        let endpoints = config
            .endpoints
            .iter()
            .take(config.pool_size as usize)
            .map(|entry| ProxyEndpoint {
                protocol: entry.protocol.clone(),
                host: entry.host.clone(),
                port: entry.port,
                username: entry.username.clone(),
                password: entry.password.clone(),
            })
            .collect();

        Self {
            endpoints,
            next: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[async_trait]
impl ProxyPool for StaticProxyPool {
    async fn acquire(&self) -> Result<ProxyEndpoint> {
        if self.endpoints.is_empty() {
            return Err(HarvestError::Proxy("proxy pool is empty".to_string()));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        let endpoint = self.endpoints[index].clone();
        tracing::info!(host = %endpoint.host, port = endpoint.port, "Acquired proxy endpoint");
        Ok(endpoint)
    }
}
