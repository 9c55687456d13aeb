//! throttle-topology — replica discovery through the Vitess vtctld API.
//!
//! Fetches `<api>/keyspace/<keyspace>/tablets/<shard>` and keeps the
//! `REPLICA` tablets, which are the hosts lag collection should sample.
//!
//! Every call is a single attempt bounded by a short timeout. Retries,
//! backoff and caching belong to the caller.

pub mod client;
pub mod error;
pub mod tablet;

pub use client::{api_url, resolve_replicas, resolve_tablets, TopologyClient, DEFAULT_TIMEOUT};
pub use error::{TopologyError, TopologyResult};
pub use tablet::{filter_replicas, parse_tablets, Tablet, TabletRole};
