//! Visual-state integrity monitoring for a single page context.
//!
//! A page that rewrites its visible content while its tab is hidden is
//! caught by comparing a fresh capture against the last baseline when the
//! tab is revealed: the tile diff classifies which regions changed beyond
//! noise, the schedule controller decides when to capture and when the
//! baseline refreshes, and the overlay/notification boundaries surface
//! the result.

pub mod baseline;
pub mod capture;
pub mod config;
pub mod diff;
#[cfg(feature = "debug-dump")]
pub mod dump;
pub mod logger;
pub mod notify;
pub mod overlay;
pub mod schedule;
pub mod status;
pub mod timer;
pub mod types;
