//! # Phone Match Core
//!
//! Shared, runtime-free logic for phone-match: cache keys and match records,
//! the keyed cache store, the in-flight tracker, the module status machine,
//! and the durable storage trait.
//!
//! This crate contains no tokio or other async runtime dependency. Every
//! operation here is synchronous and deterministic given a [`clock::Clock`];
//! the async orchestration lives in the `phone-match` crate.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `CacheKey`, `MatchRecordEntry`, `MatchedEntity` |
//! | [`actions`] | `MatcherAction`, the single vocabulary of state changes |
//! | [`cache`] | Keyed cache store: record, evict, expiry policy |
//! | [`matching`] | In-flight matching tracker |
//! | [`status`] | Module lifecycle status machine |
//! | [`state`] | Combined state and the cache/in-flight query filter |
//! | [`clock`] | Wall-clock abstraction |
//! | [`store`] | Durable key-value storage trait and in-memory backend |

pub mod actions;
pub mod cache;
pub mod clock;
pub mod matching;
pub mod models;
pub mod state;
pub mod status;
pub mod store;
