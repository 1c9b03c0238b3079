//! Core types for genrelay.
//!
//! The extractor builds a [`TelemetryRecord`] from scraped display text, the
//! publisher relays its serialized [`GeneratorPayload`] line to a broker, and
//! downstream consumers judge its freshness with [`health`]. Nothing in this
//! crate touches a browser or a socket.

pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod parse;
pub mod payload;
pub mod record;

pub use error::{ConfigError, ParseError, PayloadError};
pub use payload::{GeneratorPayload, GeneratorReading};
pub use record::{RecordBuilder, TelemetryRecord};
