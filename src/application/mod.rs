//! Application services: content loading, rendering, stats, the live feed and admin auth.

pub mod blog;
pub mod content;
pub mod dashboard;
pub mod error;
pub mod live;
pub mod page;
pub mod render;
pub mod repos;
pub mod session;
pub mod syndication;
