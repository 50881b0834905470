//! Event channels between the rendering surface and its host.

use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_core::ObjectKind;
use std::sync::mpsc;
use std::time::Duration;

mod event;

pub use event::Channel;
pub use event::EditorEvent;
pub use event::ObjectClickedPayload;
pub use event::StatusPayload;

const DEFAULT_MAX_MESSAGE_BYTES: usize = 256 * 1024;
const FRAME_PREFIX_BYTES: usize = 4;

/// Which side of the bridge an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Host,
    Surface,
}

impl EndpointRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Surface => "surface",
        }
    }

    pub fn from_role_name(value: &str) -> Option<Self> {
        match value {
            "host" => Some(Self::Host),
            "surface" => Some(Self::Surface),
            _ => None,
        }
    }
}

/// Limits applied to one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub role: EndpointRole,
    pub max_message_bytes: usize,
}

impl ChannelConfig {
    pub fn hardened(role: EndpointRole) -> EditorResult<Self> {
        let config = Self {
            role,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditorResult<()> {
        if self.max_message_bytes == 0 {
            return Err(EditorError::invalid_argument(
                "ipc.max_message_bytes_invalid",
                "channel max_message_bytes must be greater than zero",
            ));
        }
        if self.max_message_bytes > 16 * 1024 * 1024 {
            return Err(EditorError::invalid_argument(
                "ipc.max_message_bytes_too_large",
                "channel max_message_bytes exceeds hard limit (16 MiB)",
            ));
        }
        Ok(())
    }
}

/// In-process endpoint carrying framed event messages.
#[derive(Debug)]
pub struct LocalEndpoint {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
    config: ChannelConfig,
}

impl LocalEndpoint {
    pub fn role(&self) -> EndpointRole {
        self.config.role
    }

    pub fn send(&self, payload: &[u8]) -> EditorResult<()> {
        let frame = encode_frame(payload, self.config.max_message_bytes)?;
        self.tx.send(frame).map_err(|error| {
            EditorError::invalid_argument(
                "ipc.send_failed",
                format!(
                    "failed to send message from {} endpoint: {error}",
                    self.config.role.as_str()
                ),
            )
        })
    }

    pub fn recv_timeout(&self, timeout: Duration) -> EditorResult<Vec<u8>> {
        let frame = self.rx.recv_timeout(timeout).map_err(|error| {
            EditorError::invalid_argument(
                "ipc.recv_failed",
                format!(
                    "failed to receive message for {} endpoint: {error}",
                    self.config.role.as_str()
                ),
            )
        })?;
        decode_frame(&frame, self.config.max_message_bytes)
    }

    pub fn send_event(&self, event: &EditorEvent) -> EditorResult<()> {
        self.send(&event.to_payload_bytes()?)
    }

    pub fn recv_event(&self, timeout: Duration) -> EditorResult<EditorEvent> {
        EditorEvent::from_payload_bytes(&self.recv_timeout(timeout)?)
    }

    /// Every event already queued, without blocking.
    pub fn drain_events(&self) -> EditorResult<Vec<EditorEvent>> {
        let mut out = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            let payload = decode_frame(&frame, self.config.max_message_bytes)?;
            out.push(EditorEvent::from_payload_bytes(&payload)?);
        }
        Ok(out)
    }
}

/// Creates a connected host/surface endpoint pair.
pub fn local_channel_pair(
    left: ChannelConfig,
    right: ChannelConfig,
) -> EditorResult<(LocalEndpoint, LocalEndpoint)> {
    left.validate()?;
    right.validate()?;

    let (left_to_right_tx, left_to_right_rx) = mpsc::channel();
    let (right_to_left_tx, right_to_left_rx) = mpsc::channel();

    Ok((
        LocalEndpoint {
            tx: left_to_right_tx,
            rx: right_to_left_rx,
            config: left,
        },
        LocalEndpoint {
            tx: right_to_left_tx,
            rx: left_to_right_rx,
            config: right,
        },
    ))
}

/// Encodes a payload as a length-prefixed frame.
pub fn encode_frame(payload: &[u8], max_message_bytes: usize) -> EditorResult<Vec<u8>> {
    if payload.len() > max_message_bytes {
        return Err(EditorError::invalid_argument(
            "ipc.message_too_large",
            format!(
                "payload exceeds max_message_bytes ({} > {})",
                payload.len(),
                max_message_bytes
            ),
        ));
    }

    let len = u32::try_from(payload.len()).map_err(|_| {
        EditorError::invalid_argument(
            "ipc.message_too_large",
            "payload length does not fit in 32-bit frame prefix",
        )
    })?;

    let mut out = Vec::with_capacity(FRAME_PREFIX_BYTES + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Decodes a length-prefixed frame and validates payload size.
pub fn decode_frame(frame: &[u8], max_message_bytes: usize) -> EditorResult<Vec<u8>> {
    let Some((prefix, payload)) = frame.split_first_chunk::<FRAME_PREFIX_BYTES>() else {
        return Err(EditorError::invalid_argument(
            "ipc.frame_too_short",
            "frame is shorter than the 4-byte length prefix",
        ));
    };

    let payload_len = u32::from_be_bytes(*prefix) as usize;
    if payload_len > max_message_bytes {
        return Err(EditorError::invalid_argument(
            "ipc.message_too_large",
            format!("decoded payload exceeds max_message_bytes ({payload_len} > {max_message_bytes})"),
        ));
    }
    if payload.len() != payload_len {
        return Err(EditorError::invalid_argument(
            "ipc.frame_length_mismatch",
            format!(
                "frame length mismatch: expected {payload_len} payload bytes, got {}",
                payload.len()
            ),
        ));
    }

    Ok(payload.to_vec())
}

/// Builds a `selection-changed` event.
pub fn selection_changed(snapshot: FormattingSnapshot) -> EditorEvent {
    EditorEvent::SelectionChanged(snapshot)
}

/// Builds an `object-clicked` event.
pub fn object_clicked(kind: ObjectKind, properties: serde_json::Value) -> EditorEvent {
    EditorEvent::ObjectClicked(ObjectClickedPayload { kind, properties })
}

/// Builds a `status` event from an error.
pub fn status(error: &EditorError) -> EditorEvent {
    EditorEvent::Status(StatusPayload {
        code: error.code.to_owned(),
        message: error.message.clone(),
    })
}
