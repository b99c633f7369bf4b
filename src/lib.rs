//! driftlog: a small self-hosted blog with markdown content, a live feed, and an admin panel.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
