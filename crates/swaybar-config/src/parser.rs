//! Bar config reply parser
//!
//! The compositor answers `get_bar_config` with a JSON object whose keys are
//! all optional. Parsing happens in two steps: [`parse_bar_config`] decodes
//! the reply into a [`RawBarConfig`] that remembers which keys were present,
//! then [`BarConfig::apply`] overwrites only those fields of the defaults.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::*;

/// Bar config reply with every key optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawBarConfig {
    pub id: Option<String>,
    pub tray_output: Option<String>,
    pub mode: Option<String>,
    pub hidden_state: Option<String>,
    pub position: Option<String>,
    pub status_command: Option<String>,
    pub font: Option<String>,
    pub bar_height: Option<i32>,
    pub workspace_buttons: Option<bool>,
    pub strip_workspace_numbers: Option<bool>,
    pub binding_mode_indicator: Option<bool>,
    pub verbose: Option<bool>,
    pub colors: Option<RawColors>,
}

/// The `colors` sub-object of a bar config reply
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawColors {
    pub background: Option<String>,
    pub statusline: Option<String>,
    pub separator: Option<String>,
    pub focused_workspace_border: Option<String>,
    pub focused_workspace_bg: Option<String>,
    pub focused_workspace_text: Option<String>,
    pub active_workspace_border: Option<String>,
    pub active_workspace_bg: Option<String>,
    pub active_workspace_text: Option<String>,
    pub inactive_workspace_border: Option<String>,
    pub inactive_workspace_bg: Option<String>,
    pub inactive_workspace_text: Option<String>,
    pub urgent_workspace_border: Option<String>,
    pub urgent_workspace_bg: Option<String>,
    pub urgent_workspace_text: Option<String>,
    pub binding_mode_border: Option<String>,
    pub binding_mode_bg: Option<String>,
    pub binding_mode_text: Option<String>,
}

/// Decode a `get_bar_config` reply
pub fn parse_bar_config(json: &str) -> Result<RawBarConfig, ConfigError> {
    serde_json::from_str(json).map_err(|source| ConfigError::ParseError { source })
}

impl FromStr for Rgba {
    type Err = String;

    /// Parse `#RRGGBB` (opaque) or `#RRGGBBAA`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| "color must start with '#'".to_string())?;

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("color contains non-hexadecimal digits".to_string());
        }

        let value = match hex.len() {
            6 | 8 => u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?,
            n => return Err(format!("expected 6 or 8 hex digits, found {}", n)),
        };

        if hex.len() == 6 {
            Ok(Rgba((value << 8) | 0xFF))
        } else {
            Ok(Rgba(value))
        }
    }
}

/// Parse the color stored under `key`
pub fn parse_color(key: &str, value: &str) -> Result<Rgba, ConfigError> {
    value.parse().map_err(|reason| ConfigError::InvalidColor {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Map a position name onto a screen edge; unknown names mean bottom
pub fn parse_position(position: &str) -> Position {
    match position {
        "top" => Position::Top,
        "bottom" => Position::Bottom,
        "left" => Position::Left,
        "right" => Position::Right,
        _ => Position::Bottom,
    }
}

/// Extract the pango font description from a font spec
///
/// Only `pango:`-prefixed specs are understood. Anything else (X core font
/// names, mostly) yields `None` and the current font stays in effect.
pub fn parse_font(font: &str) -> Option<&str> {
    font.strip_prefix("pango:")
}

fn override_color(field: &mut Rgba, key: &str, value: &Option<String>) -> Result<(), ConfigError> {
    if let Some(value) = value {
        *field = parse_color(key, value)?;
    }
    Ok(())
}

impl RawColors {
    /// Overwrite every color in `colors` whose key is present
    pub fn apply_to(&self, colors: &mut BarColors) -> Result<(), ConfigError> {
        override_color(&mut colors.background, "background", &self.background)?;
        override_color(&mut colors.statusline, "statusline", &self.statusline)?;
        override_color(&mut colors.separator, "separator", &self.separator)?;

        let focused = &mut colors.focused_workspace;
        override_color(&mut focused.border, "focused_workspace_border", &self.focused_workspace_border)?;
        override_color(&mut focused.background, "focused_workspace_bg", &self.focused_workspace_bg)?;
        override_color(&mut focused.text, "focused_workspace_text", &self.focused_workspace_text)?;

        let active = &mut colors.active_workspace;
        override_color(&mut active.border, "active_workspace_border", &self.active_workspace_border)?;
        override_color(&mut active.background, "active_workspace_bg", &self.active_workspace_bg)?;
        override_color(&mut active.text, "active_workspace_text", &self.active_workspace_text)?;

        let inactive = &mut colors.inactive_workspace;
        override_color(&mut inactive.border, "inactive_workspace_border", &self.inactive_workspace_border)?;
        override_color(&mut inactive.background, "inactive_workspace_bg", &self.inactive_workspace_bg)?;
        override_color(&mut inactive.text, "inactive_workspace_text", &self.inactive_workspace_text)?;

        let urgent = &mut colors.urgent_workspace;
        override_color(&mut urgent.border, "urgent_workspace_border", &self.urgent_workspace_border)?;
        override_color(&mut urgent.background, "urgent_workspace_bg", &self.urgent_workspace_bg)?;
        override_color(&mut urgent.text, "urgent_workspace_text", &self.urgent_workspace_text)?;

        let binding = &mut colors.binding_mode;
        override_color(&mut binding.border, "binding_mode_border", &self.binding_mode_border)?;
        override_color(&mut binding.background, "binding_mode_bg", &self.binding_mode_bg)?;
        override_color(&mut binding.text, "binding_mode_text", &self.binding_mode_text)?;

        Ok(())
    }
}

impl BarConfig {
    /// Merge a decoded reply onto this config
    ///
    /// Keys absent from `raw` keep their current value. A malformed color
    /// aborts the merge with [`ConfigError::InvalidColor`].
    pub fn apply(&mut self, raw: &RawBarConfig) -> Result<(), ConfigError> {
        if raw.id.is_some() {
            self.id = raw.id.clone();
        }
        if raw.tray_output.is_some() {
            self.tray_output = raw.tray_output.clone();
        }
        if raw.mode.is_some() {
            self.mode = raw.mode.clone();
        }
        if raw.hidden_state.is_some() {
            self.hidden_state = raw.hidden_state.clone();
        }
        if let Some(position) = &raw.position {
            self.position = parse_position(position);
        }
        if raw.status_command.is_some() {
            self.status_command = raw.status_command.clone();
        }
        if let Some(font) = &raw.font {
            match parse_font(font) {
                Some(description) => self.font = description.to_string(),
                None => tracing::debug!(font = %font, "Ignoring font without pango: prefix"),
            }
        }
        if raw.bar_height.is_some() {
            self.bar_height = raw.bar_height;
        }
        if let Some(value) = raw.workspace_buttons {
            self.workspace_buttons = value;
        }
        if let Some(value) = raw.strip_workspace_numbers {
            self.strip_workspace_numbers = value;
        }
        if let Some(value) = raw.binding_mode_indicator {
            self.binding_mode_indicator = value;
        }
        if let Some(value) = raw.verbose {
            self.verbose = value;
        }
        if let Some(colors) = &raw.colors {
            colors.apply_to(&mut self.colors)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_json(json: &str) -> Result<BarConfig, ConfigError> {
        let raw = parse_bar_config(json)?;
        let mut config = BarConfig::default();
        config.apply(&raw)?;
        Ok(config)
    }

    #[test]
    fn test_parse_six_digit_color_appends_alpha() {
        assert_eq!(parse_color("background", "#112233").unwrap(), Rgba(0x112233FF));
        assert_eq!(parse_color("background", "#000000").unwrap(), Rgba(0x000000FF));
        assert_eq!(parse_color("background", "#ffFFff").unwrap(), Rgba(0xFFFFFFFF));
    }

    #[test]
    fn test_parse_eight_digit_color_keeps_alpha() {
        assert_eq!(parse_color("background", "#11223344").unwrap(), Rgba(0x11223344));
        assert_eq!(parse_color("background", "#00000000").unwrap(), Rgba(0x00000000));
        assert_eq!(parse_color("background", "#4C789980").unwrap(), Rgba(0x4C789980));
    }

    #[test]
    fn test_color_without_hash_rejected() {
        for value in ["112233", "", "red", " #112233", "0x112233"] {
            let err = parse_color("statusline", value).unwrap_err();
            match &err {
                ConfigError::InvalidColor { key, value: found, .. } => {
                    assert_eq!(key, "statusline");
                    assert_eq!(found, value);
                }
                other => panic!("Expected InvalidColor error, got: {:?}", other),
            }
            assert!(
                err.to_string().contains("statusline"),
                "Error message should name the key: {}",
                err
            );
        }
    }

    #[test]
    fn test_color_with_bad_digits_rejected() {
        assert!(parse_color("separator", "#12345").is_err());
        assert!(parse_color("separator", "#1234567").is_err());
        assert!(parse_color("separator", "#11223g").is_err());
        assert!(parse_color("separator", "#").is_err());
        assert!(parse_color("separator", "#+12345").is_err());
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("top"), Position::Top);
        assert_eq!(parse_position("bottom"), Position::Bottom);
        assert_eq!(parse_position("left"), Position::Left);
        assert_eq!(parse_position("right"), Position::Right);
    }

    #[test]
    fn test_unknown_position_is_bottom() {
        for name in ["", "Top", "center", "up", " left"] {
            assert_eq!(parse_position(name), Position::Bottom, "position {:?}", name);
        }
    }

    #[test]
    fn test_parse_font() {
        assert_eq!(parse_font("pango:DejaVu Sans Mono 10"), Some("DejaVu Sans Mono 10"));
        assert_eq!(parse_font("pango:"), Some(""));
        assert_eq!(parse_font("-misc-fixed-medium-r-normal--13-120-75-75-C-70-iso10646-1"), None);
        assert_eq!(parse_font("Pango:Sans 10"), None);
    }

    #[test]
    fn test_empty_reply_keeps_defaults() {
        let config = apply_json("{}").unwrap();
        assert_eq!(config, BarConfig::default());
    }

    #[test]
    fn test_position_and_single_color_override() {
        let config = apply_json(r##"{"position":"left","colors":{"background":"#112233"}}"##).unwrap();

        assert_eq!(config.position, Position::Left);
        assert_eq!(config.colors.background, Rgba(0x112233FF));

        let defaults = BarColors::default();
        assert_eq!(config.colors.statusline, defaults.statusline);
        assert_eq!(config.colors.separator, defaults.separator);
        assert_eq!(config.colors.focused_workspace, defaults.focused_workspace);
        assert_eq!(config.colors.active_workspace, defaults.active_workspace);
        assert_eq!(config.colors.inactive_workspace, defaults.inactive_workspace);
        assert_eq!(config.colors.urgent_workspace, defaults.urgent_workspace);
        assert_eq!(config.colors.binding_mode, defaults.binding_mode);
    }

    #[test]
    fn test_all_color_keys_recognized() {
        let json = r##"{"colors": {
            "background": "#010101",
            "statusline": "#020202",
            "separator": "#030303",
            "focused_workspace_border": "#040404",
            "focused_workspace_bg": "#050505",
            "focused_workspace_text": "#060606",
            "active_workspace_border": "#070707",
            "active_workspace_bg": "#080808",
            "active_workspace_text": "#090909",
            "inactive_workspace_border": "#0a0a0a",
            "inactive_workspace_bg": "#0b0b0b",
            "inactive_workspace_text": "#0c0c0c",
            "urgent_workspace_border": "#0d0d0d",
            "urgent_workspace_bg": "#0e0e0e",
            "urgent_workspace_text": "#0f0f0f",
            "binding_mode_border": "#101010",
            "binding_mode_bg": "#111111",
            "binding_mode_text": "#12121280"
        }}"##;

        let colors = apply_json(json).unwrap().colors;
        assert_eq!(colors.background, Rgba(0x010101FF));
        assert_eq!(colors.statusline, Rgba(0x020202FF));
        assert_eq!(colors.separator, Rgba(0x030303FF));
        assert_eq!(colors.focused_workspace.border, Rgba(0x040404FF));
        assert_eq!(colors.focused_workspace.background, Rgba(0x050505FF));
        assert_eq!(colors.focused_workspace.text, Rgba(0x060606FF));
        assert_eq!(colors.active_workspace.border, Rgba(0x070707FF));
        assert_eq!(colors.active_workspace.background, Rgba(0x080808FF));
        assert_eq!(colors.active_workspace.text, Rgba(0x090909FF));
        assert_eq!(colors.inactive_workspace.border, Rgba(0x0A0A0AFF));
        assert_eq!(colors.inactive_workspace.background, Rgba(0x0B0B0BFF));
        assert_eq!(colors.inactive_workspace.text, Rgba(0x0C0C0CFF));
        assert_eq!(colors.urgent_workspace.border, Rgba(0x0D0D0DFF));
        assert_eq!(colors.urgent_workspace.background, Rgba(0x0E0E0EFF));
        assert_eq!(colors.urgent_workspace.text, Rgba(0x0F0F0FFF));
        assert_eq!(colors.binding_mode.border, Rgba(0x101010FF));
        assert_eq!(colors.binding_mode.background, Rgba(0x111111FF));
        assert_eq!(colors.binding_mode.text, Rgba(0x12121280));
    }

    #[test]
    fn test_malformed_color_is_an_error() {
        let err = apply_json(r#"{"colors":{"urgent_workspace_bg":"900000"}}"#).unwrap_err();
        match err {
            ConfigError::InvalidColor { key, value, .. } => {
                assert_eq!(key, "urgent_workspace_bg");
                assert_eq!(value, "900000");
            }
            other => panic!("Expected InvalidColor error, got: {:?}", other),
        }
    }

    #[test]
    fn test_scalar_fields_decoded() {
        let json = r#"{
            "id": "bar-0",
            "tray_output": "none",
            "mode": "dock",
            "hidden_state": "hide",
            "position": "top",
            "status_command": "while date; do sleep 1; done",
            "font": "pango:Fira Sans 11",
            "bar_height": 22,
            "workspace_buttons": false,
            "strip_workspace_numbers": true,
            "binding_mode_indicator": false,
            "verbose": true
        }"#;

        let config = apply_json(json).unwrap();
        assert_eq!(config.id.as_deref(), Some("bar-0"));
        assert_eq!(config.tray_output.as_deref(), Some("none"));
        assert_eq!(config.mode.as_deref(), Some("dock"));
        assert_eq!(config.hidden_state.as_deref(), Some("hide"));
        assert_eq!(config.position, Position::Top);
        assert_eq!(config.status_command.as_deref(), Some("while date; do sleep 1; done"));
        assert_eq!(config.font, "Fira Sans 11");
        assert_eq!(config.bar_height, Some(22));
        assert!(!config.workspace_buttons);
        assert!(config.strip_workspace_numbers);
        assert!(!config.binding_mode_indicator);
        assert!(config.verbose);
    }

    #[test]
    fn test_font_without_prefix_is_dropped() {
        let config = apply_json(r#"{"font":"fixed"}"#).unwrap();
        assert_eq!(config.font, DEFAULT_FONT);
    }

    #[test]
    fn test_null_values_are_absent() {
        let config = apply_json(r#"{"status_command":null,"colors":null,"position":null}"#).unwrap();
        assert_eq!(config, BarConfig::default());
    }

    #[test]
    fn test_reply_that_is_not_json_fails() {
        let err = parse_bar_config("not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
