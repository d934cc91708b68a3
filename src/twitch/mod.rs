//! Twitch Kraken API access: wire models, the upstream client and the
//! cache-fronted resolvers built on top of it.

pub mod client;
pub mod models;
pub mod resolver;

pub use client::{KrakenClient, Upstream};
pub use models::{Channel, Stream, User};
pub use resolver::{CacheSizes, Resolver, TtlPolicy};
