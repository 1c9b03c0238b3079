//! Publisher half of genrelay: relay one opaque payload line to one MQTT
//! topic and confirm the broker acknowledged it.

pub mod cli;
pub mod error;
pub mod input;
pub mod publish;

pub use error::PublishError;
pub use input::read_payload;
pub use publish::{publish_once, PublishOptions, PublishReceipt, PublishTarget};
