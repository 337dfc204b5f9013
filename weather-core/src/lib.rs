//! Core library for the weather gateway, server and CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The gateway abstraction over weather providers
//! - Normalization of provider payloads into one canonical record
//! - The bounded search history log and its client-side cache
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod config;
pub mod error;
pub mod history;
pub mod local_store;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod remote;

pub use config::{Config, ProviderConfig};
pub use error::{GatewayError, HistoryError};
pub use history::{LocalHistory, RecencyLog, merge_remote_and_local};
pub use model::{
    CompassPoint, Coordinates, IconRef, NewSearch, SearchHistoryEntry, WeatherQuery, WeatherRecord,
};
pub use normalize::normalize;
pub use provider::{ProviderId, WeatherProvider};
