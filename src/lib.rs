//! Content service for a touchscreen information kiosk.
//!
//! The kiosk front-end is a single-page application; this crate is the part
//! that lives behind it: a partitioned local store for points of interest,
//! news, media, albums, marker icons, feed configs and settings, a walking
//! route synthesizer for the map page, the RSS retrieval chain that feeds
//! the news ticker, and the HTTP surface the front-end talks to.

pub mod config;
pub mod feeds;
pub mod logging;
pub mod route;
pub mod server;
pub mod session;
pub mod store;
