use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse bar config reply: {source}")]
    #[diagnostic(code(swaybar::config::parse_error))]
    ParseError {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid color {value:?} for {key}: {reason}")]
    #[diagnostic(
        code(swaybar::config::invalid_color),
        help("colors are written as #RRGGBB or #RRGGBBAA")
    )]
    InvalidColor {
        /// Configuration key the color was read from
        key: String,
        value: String,
        reason: String,
    },
}
