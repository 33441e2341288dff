//! Configuration model for swaybar
//!
//! This crate decodes the compositor's `get_bar_config` reply and merges it
//! onto the bar's built-in defaults. It also owns the geometry constants the
//! renderer lays workspace boxes out with.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_bar_config, parse_color, parse_font, parse_position, RawBarConfig, RawColors};
