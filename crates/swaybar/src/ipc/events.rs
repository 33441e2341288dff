//! IPC event types
//!
//! Sway marks event frames by setting the high bit of the message type; the
//! remaining bits select the event class. The bar subscribes to the
//! `workspace` class only, but classes it never asked for are still decoded
//! (as [`EventType::Other`]) so a misbehaving peer cannot desynchronise the
//! stream.

use serde::Deserialize;

/// Bit set in the message type of every event frame
pub const EVENT_BIT: u32 = 0x8000_0000;

/// Event classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Workspace focus, creation, removal or urgency changed
    Workspace,
    /// Any other class, identified by its number
    Other(u32),
}

impl EventType {
    /// Decode a frame's message type; `None` if it is not an event
    pub fn from_code(code: u32) -> Option<Self> {
        if code & EVENT_BIT == 0 {
            return None;
        }

        match code & !EVENT_BIT {
            0 => Some(Self::Workspace),
            other => Some(Self::Other(other)),
        }
    }

    /// Message type of this event class, high bit included
    pub fn code(self) -> u32 {
        match self {
            Self::Workspace => EVENT_BIT,
            Self::Other(class) => EVENT_BIT | class,
        }
    }

    /// Name used in a subscribe request
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Workspace => Some("workspace"),
            Self::Other(_) => None,
        }
    }
}

/// An event received on a subscribed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcEvent {
    pub event: EventType,
    pub payload: String,
}

#[derive(Deserialize)]
struct ChangeField {
    change: Option<String>,
}

impl IpcEvent {
    /// The event's `change` field (e.g. "focus", "init"), if any
    ///
    /// Only used for logging; the bar refreshes on every workspace event
    /// regardless of what changed.
    pub fn change(&self) -> Option<String> {
        serde_json::from_str::<ChangeField>(&self.payload)
            .ok()
            .and_then(|field| field.change)
    }
}
