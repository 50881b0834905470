use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_core::ObjectKind;
use serde::Deserialize;
use serde::Serialize;

const TAG_CONTENT_CHANGED: u8 = 1;
const TAG_SELECTION_CHANGED: u8 = 2;
const TAG_OBJECT_CLICKED: u8 = 3;
const TAG_OBJECT_DELETED: u8 = 4;
const TAG_OBJECTS_DEACTIVATED: u8 = 5;
const TAG_STATUS: u8 = 6;

/// Named channels the surface posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    ContentChanged,
    SelectionChanged,
    ObjectClicked,
    ObjectDeleted,
    ObjectsDeactivated,
    Status,
}

impl Channel {
    pub const ALL: [Self; 6] = [
        Self::ContentChanged,
        Self::SelectionChanged,
        Self::ObjectClicked,
        Self::ObjectDeleted,
        Self::ObjectsDeactivated,
        Self::Status,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentChanged => "content-changed",
            Self::SelectionChanged => "selection-changed",
            Self::ObjectClicked => "object-clicked",
            Self::ObjectDeleted => "object-deleted",
            Self::ObjectsDeactivated => "objects-deactivated",
            Self::Status => "status",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.as_str() == value)
    }

    fn tag(self) -> u8 {
        match self {
            Self::ContentChanged => TAG_CONTENT_CHANGED,
            Self::SelectionChanged => TAG_SELECTION_CHANGED,
            Self::ObjectClicked => TAG_OBJECT_CLICKED,
            Self::ObjectDeleted => TAG_OBJECT_DELETED,
            Self::ObjectsDeactivated => TAG_OBJECTS_DEACTIVATED,
            Self::Status => TAG_STATUS,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.tag() == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectClickedPayload {
    pub kind: ObjectKind,
    pub properties: serde_json::Value,
}

/// A typed message on one of the event channels.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ContentChanged,
    SelectionChanged(FormattingSnapshot),
    ObjectClicked(ObjectClickedPayload),
    ObjectDeleted,
    ObjectsDeactivated,
    Status(StatusPayload),
}

impl EditorEvent {
    pub fn channel(&self) -> Channel {
        match self {
            Self::ContentChanged => Channel::ContentChanged,
            Self::SelectionChanged(_) => Channel::SelectionChanged,
            Self::ObjectClicked(_) => Channel::ObjectClicked,
            Self::ObjectDeleted => Channel::ObjectDeleted,
            Self::ObjectsDeactivated => Channel::ObjectsDeactivated,
            Self::Status(_) => Channel::Status,
        }
    }

    /// JSON payload as handlers receive it.
    pub fn payload(&self) -> serde_json::Value {
        let encoded = match self {
            Self::ContentChanged => Ok(serde_json::Value::from("changed")),
            Self::ObjectDeleted => Ok(serde_json::Value::from("deleted")),
            Self::ObjectsDeactivated => Ok(serde_json::Value::from("deactivated")),
            Self::SelectionChanged(snapshot) => serde_json::to_value(snapshot),
            Self::ObjectClicked(payload) => serde_json::to_value(payload),
            Self::Status(payload) => serde_json::to_value(payload),
        };
        encoded.unwrap_or(serde_json::Value::Null)
    }

    /// Rebuilds an event from a channel name and JSON payload, as posted by
    /// surface scripts.
    pub fn from_parts(channel: &str, payload: serde_json::Value) -> EditorResult<Self> {
        let Some(channel) = Channel::from_name(channel) else {
            return Err(EditorError::invalid_argument(
                "ipc.channel_unknown",
                format!("unknown channel `{channel}`"),
            ));
        };
        let decode_error = |error: serde_json::Error| {
            EditorError::invalid_argument(
                "ipc.payload_invalid",
                format!("invalid `{}` payload: {error}", channel.as_str()),
            )
        };
        Ok(match channel {
            Channel::ContentChanged => Self::ContentChanged,
            Channel::ObjectDeleted => Self::ObjectDeleted,
            Channel::ObjectsDeactivated => Self::ObjectsDeactivated,
            Channel::SelectionChanged => {
                Self::SelectionChanged(serde_json::from_value(payload).map_err(decode_error)?)
            }
            Channel::ObjectClicked => {
                Self::ObjectClicked(serde_json::from_value(payload).map_err(decode_error)?)
            }
            Channel::Status => Self::Status(serde_json::from_value(payload).map_err(decode_error)?),
        })
    }

    /// Channel tag byte followed by the JSON payload.
    pub fn to_payload_bytes(&self) -> EditorResult<Vec<u8>> {
        let json = serde_json::to_vec(&self.payload()).map_err(|error| {
            EditorError::invalid_argument("ipc.payload_encoding", error.to_string())
        })?;
        let mut out = Vec::with_capacity(1 + json.len());
        out.push(self.channel().tag());
        out.extend_from_slice(&json);
        Ok(out)
    }

    pub fn from_payload_bytes(bytes: &[u8]) -> EditorResult<Self> {
        let Some((tag, json)) = bytes.split_first() else {
            return Err(EditorError::invalid_argument(
                "ipc.message_empty",
                "event payload is empty",
            ));
        };
        let Some(channel) = Channel::from_tag(*tag) else {
            return Err(EditorError::invalid_argument(
                "ipc.message_tag_unknown",
                format!("unknown event tag `{tag}`"),
            ));
        };
        let payload = serde_json::from_slice(json).map_err(|error| {
            EditorError::invalid_argument("ipc.payload_invalid", error.to_string())
        })?;
        Self::from_parts(channel.as_str(), payload)
    }
}
