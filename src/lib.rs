//! PAYDA client library
//!
//! Data layer of the PAYDA donation and coupon matching platform: REST access
//! to the backend, derived dashboard views, change polling and notifications.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod api;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod errors;
pub mod models;
pub mod notifications;
pub mod preferences;
pub mod reference;

pub use api::{HttpBackend, PaydaBackend};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardSession};
pub use errors::ClientError;
