//! Expiring cache that bounds load on origin sites.
//!
//! One entry per content source; a source is fetched at most once per TTL
//! window no matter how many requests arrive for it.

mod ttl;

pub use ttl::TtlCache;
