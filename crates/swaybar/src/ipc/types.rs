//! Message types and reply payloads
//!
//! The reply structs keep only the fields the bar reads. Every field has a
//! serde default so a sparse object from an older or newer sway still
//! decodes.

use serde::Deserialize;

use super::IpcEvent;

/// Request types the bar sends
///
/// Only the subset of the protocol the bar needs is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    GetWorkspaces,
    Subscribe,
    GetOutputs,
    GetBarConfig,
}

impl MessageType {
    /// Numeric type written into the frame header
    pub fn code(self) -> u32 {
        match self {
            Self::GetWorkspaces => 1,
            Self::Subscribe => 2,
            Self::GetOutputs => 3,
            Self::GetBarConfig => 6,
        }
    }
}

/// Reply to a request, as read off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message type from the frame header (echoes the request)
    pub message_type: u32,
    pub payload: String,
}

/// One framed message read from the connection
///
/// After subscribing, event frames can show up at any time, including while
/// a reply to an unrelated request is awaited. Readers dispatch on this tag
/// rather than on when the frame arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcMessage {
    Reply(Reply),
    Event(IpcEvent),
}

/// One element of the `get_outputs` reply
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputReply {
    pub name: String,
    pub active: bool,
}

/// One element of the `get_workspaces` reply
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceReply {
    pub num: i32,
    pub name: String,
    pub visible: bool,
    pub focused: bool,
    pub urgent: bool,
    pub output: String,
}

/// The `subscribe` reply
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubscribeReply {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes() {
        assert_eq!(MessageType::GetWorkspaces.code(), 1);
        assert_eq!(MessageType::Subscribe.code(), 2);
        assert_eq!(MessageType::GetOutputs.code(), 3);
        assert_eq!(MessageType::GetBarConfig.code(), 6);
    }

    #[test]
    fn test_workspace_reply_decodes_sway_object() {
        let json = r#"{
            "num": 2,
            "name": "2",
            "visible": true,
            "focused": false,
            "urgent": false,
            "rect": {"x": 0, "y": 0, "width": 1920, "height": 1080},
            "output": "eDP-1"
        }"#;

        let ws: WorkspaceReply = serde_json::from_str(json).unwrap();
        assert_eq!(ws.num, 2);
        assert_eq!(ws.name, "2");
        assert!(ws.visible);
        assert!(!ws.focused);
        assert!(!ws.urgent);
        assert_eq!(ws.output, "eDP-1");
    }

    #[test]
    fn test_named_workspace_has_negative_num() {
        let ws: WorkspaceReply =
            serde_json::from_str(r#"{"num": -1, "name": "web", "output": "DP-2"}"#).unwrap();
        assert_eq!(ws.num, -1);
        assert_eq!(ws.name, "web");
        assert!(!ws.focused);
    }

    #[test]
    fn test_output_reply_ignores_extra_fields() {
        let outputs: Vec<OutputReply> = serde_json::from_str(
            r#"[{"name": "eDP-1", "active": true, "current_workspace": "1"}, {"name": "HDMI-A-1"}]"#,
        )
        .unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].name, "eDP-1");
        assert!(outputs[0].active);
        assert_eq!(outputs[1].name, "HDMI-A-1");
        assert!(!outputs[1].active);
    }

    #[test]
    fn test_subscribe_reply() {
        let reply: SubscribeReply = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(reply.success);
        let reply: SubscribeReply = serde_json::from_str("{}").unwrap();
        assert!(!reply.success);
    }
}
