//! Store connection configuration and pool fingerprinting.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded::{byte_serialize, Serializer};
use url::Url;

use crate::error::{ConfigError, Result};

/// Loopback address `localhost` is normalised to when fingerprinting.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Canonical pool key derived from a [`StoreConfig`].
///
/// Two configs share a pool entry exactly when their fingerprints are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection settings for one store pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store host name or address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Store port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pool name; connections with different names never share a handle.
    #[serde(default = "default_pool")]
    pub pool: String,
    /// Driver options. Part of the fingerprint.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    27017
}

fn default_pool() -> String {
    "default".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            pool: default_pool(),
            options: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, port: u16, pool: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            pool: pool.into(),
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Parse a connection string such as
    /// `docstore://localhost:27017/reports?replicaSet=rs0&w=majority`.
    ///
    /// The first path segment names the pool; query pairs become options.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or has no host.
    #[allow(clippy::result_large_err)]
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(ConfigError::Url)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingField { field: "host" })?
            .to_string();
        let port = url.port().unwrap_or_else(default_port);
        let pool = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .map_or_else(default_pool, str::to_string);
        let options = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            host,
            port,
            pool,
            options,
        })
    }

    /// Host with `localhost` replaced by the loopback address.
    #[must_use]
    pub fn normalized_host(&self) -> &str {
        if self.host.eq_ignore_ascii_case("localhost") {
            LOOPBACK_HOST
        } else {
            &self.host
        }
    }

    /// Canonical key: normalised host, port, pool name and the options in
    /// key order.
    ///
    /// Host, pool and every option key and value are form-urlencoded, so a
    /// separator inside a value can never be read as the start of another
    /// option.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let host: String = byte_serialize(self.normalized_host().as_bytes()).collect();
        let pool: String = byte_serialize(self.pool.as_bytes()).collect();
        let mut key = format!("{host}:{}/{pool}", self.port);
        if !self.options.is_empty() {
            let query = Serializer::new(String::new())
                .extend_pairs(&self.options)
                .finish();
            key.push('?');
            key.push_str(&query);
        }
        Fingerprint(key)
    }

    #[allow(clippy::result_large_err)]
    pub(crate) fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "store.host" }.into());
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.port",
                reason: "must be > 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
