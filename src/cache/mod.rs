//! In-process caching of derived content.
//!
//! Parsed posts are expensive to rebuild on every request, so they are held
//! as a single immutable snapshot that expires after a configurable TTL and
//! can be dropped on demand by the admin surface.

mod lock;
mod store;

pub use store::SnapshotStore;
