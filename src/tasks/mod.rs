//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - TTL Reclaimer: Removes expired cache entries at configured intervals

mod reclaimer;

pub use reclaimer::Reclaimer;
