//! Cache-fronted lookups of users, channels and streams.
//!
//! Every lookup checks its own [`TtlCache`] first and only contacts the
//! upstream API on a miss. Failures (transport, status, decode, ambiguous
//! user) are returned without touching the cache, so the next request
//! retries upstream.

use crate::{
    cache::{DEFAULT_CAPACITY, TtlCache},
    error::{FacadeError, Result},
    metrics,
    twitch::{
        client::Upstream,
        models::{Channel, Stream, StreamResponse, User, UsersResponse},
    },
};
use serde::de::Error as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

/// Per-resource cache lifetimes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlPolicy {
    pub user: Duration,
    pub channel: Duration,
    pub stream: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            user: Duration::from_secs(60),
            channel: Duration::from_secs(60),
            stream: Duration::from_secs(5),
        }
    }
}

/// Resident entry counts per store
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CacheSizes {
    pub users: usize,
    pub channels: usize,
    pub streams: usize,
}

/// Resolves Twitch resources through per-type caches
#[derive(Clone)]
pub struct Resolver {
    upstream: Arc<dyn Upstream>,
    ttl: TtlPolicy,
    users: TtlCache<User>,
    channels: TtlCache<Channel>,
    /// `None` caches an offline stream
    streams: TtlCache<Option<Stream>>,
}

impl Resolver {
    pub fn new(upstream: Arc<dyn Upstream>, ttl: TtlPolicy, capacity: usize) -> Self {
        Self {
            upstream,
            ttl,
            users: TtlCache::new(capacity),
            channels: TtlCache::new(capacity),
            streams: TtlCache::new(capacity),
        }
    }

    /// Resolver with the default TTL policy and capacity
    pub fn with_defaults(upstream: Arc<dyn Upstream>) -> Self {
        Self::new(upstream, TtlPolicy::default(), DEFAULT_CAPACITY)
    }

    /// Look up a user by login name (already trimmed, case-sensitive).
    ///
    /// # Errors
    /// [`FacadeError::NoUniqueUser`] unless upstream returns exactly one
    /// user; upstream and decode failures otherwise.
    pub async fn user_by_name(&self, login: &str) -> Result<User> {
        if let Some(user) = self.users.get(login) {
            metrics::record_cache_lookup("user", true);
            return Ok(user);
        }
        metrics::record_cache_lookup("user", false);

        let body = self
            .upstream
            .fetch(&format!("users?login={}", encode(login)))
            .await?;
        let response: UsersResponse = serde_json::from_slice(&body)?;

        let matches = response.users.len();
        let user = match <[User; 1]>::try_from(response.users) {
            Ok([user]) => user,
            Err(_) => {
                return Err(FacadeError::NoUniqueUser {
                    login: login.to_string(),
                    matches,
                });
            }
        };

        if user.id.trim().is_empty() {
            return Err(FacadeError::Decode(serde_json::Error::custom(format!(
                "user record for login '{login}' has an empty _id"
            ))));
        }

        debug!("Resolved login {} to user id {}", login, user.id);
        self.users.put(login, user.clone(), self.ttl.user);
        Ok(user)
    }

    /// Look up the channel belonging to `user_id`.
    pub async fn channel_by_user(&self, user_id: &str) -> Result<Channel> {
        if let Some(channel) = self.channels.get(user_id) {
            metrics::record_cache_lookup("channel", true);
            return Ok(channel);
        }
        metrics::record_cache_lookup("channel", false);

        let body = self
            .upstream
            .fetch(&format!("channels/{}", encode(user_id)))
            .await?;
        let channel: Channel = serde_json::from_slice(&body)?;

        self.channels.put(user_id, channel.clone(), self.ttl.channel);
        Ok(channel)
    }

    /// Look up the live stream of `user_id`; `Ok(None)` means offline.
    pub async fn stream_by_user(&self, user_id: &str) -> Result<Option<Stream>> {
        if let Some(stream) = self.streams.get(user_id) {
            metrics::record_cache_lookup("stream", true);
            return Ok(stream);
        }
        metrics::record_cache_lookup("stream", false);

        let body = self
            .upstream
            .fetch(&format!("streams/{}", encode(user_id)))
            .await?;
        let response: StreamResponse = serde_json::from_slice(&body)?;

        self.streams
            .put(user_id, response.stream.clone(), self.ttl.stream);
        Ok(response.stream)
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ttl
    }

    /// Drop expired entries from every store. Returns the total removed.
    pub fn purge_expired(&self) -> usize {
        self.users.purge_expired() + self.channels.purge_expired() + self.streams.purge_expired()
    }

    pub fn cache_sizes(&self) -> CacheSizes {
        CacheSizes {
            users: self.users.len(),
            channels: self.channels.len(),
            streams: self.streams.len(),
        }
    }
}

/// Form-encode a single query value or path segment.
fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
