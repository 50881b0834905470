use lm_core::EditorResult;
use lm_ipc::Channel;
use lm_ipc::ChannelConfig;
use lm_ipc::EditorEvent;
use lm_ipc::EndpointRole;
use lm_ipc::LocalEndpoint;
use lm_ipc::local_channel_pair;
use std::collections::HashMap;
use tracing::debug;
use tracing::warn;

type Handler = Box<dyn FnMut(&serde_json::Value)>;

/// Fans surface events out to channel handlers, a connected host endpoint
/// and an outbox the owner drains.
#[derive(Default)]
pub struct EventBridge {
    handlers: HashMap<Channel, Vec<Handler>>,
    host: Option<LocalEndpoint>,
    outbox: Vec<EditorEvent>,
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("channels", &self.handlers.keys().collect::<Vec<_>>())
            .field("connected", &self.host.is_some())
            .field("queued", &self.outbox.len())
            .finish()
    }
}

impl EventBridge {
    pub fn on_message(&mut self, channel: Channel, handler: impl FnMut(&serde_json::Value) + 'static) {
        self.handlers.entry(channel).or_default().push(Box::new(handler));
    }

    /// Opens the framed host channel. A previous endpoint is dropped.
    pub fn connect(&mut self, max_message_bytes: usize) -> EditorResult<LocalEndpoint> {
        let host = ChannelConfig {
            role: EndpointRole::Host,
            max_message_bytes,
        };
        let surface = ChannelConfig {
            role: EndpointRole::Surface,
            max_message_bytes,
        };
        let (host, surface) = local_channel_pair(host, surface)?;
        self.host = Some(surface);
        Ok(host)
    }

    pub fn is_connected(&self) -> bool {
        self.host.is_some()
    }

    pub fn deliver(&mut self, event: EditorEvent) {
        let channel = event.channel();
        debug!(channel = channel.as_str(), "event");
        if let Some(handlers) = self.handlers.get_mut(&channel) {
            let payload = event.payload();
            for handler in handlers {
                handler(&payload);
            }
        }
        if let Some(host) = &self.host {
            if let Err(error) = host.send_event(&event) {
                warn!(channel = channel.as_str(), %error, "host endpoint rejected event");
            }
        }
        self.outbox.push(event);
    }

    /// Rebuilds a typed event from a script's `postToHost` call.
    pub fn post(&mut self, channel: &str, payload: serde_json::Value) -> EditorResult<()> {
        let event = EditorEvent::from_parts(channel, payload)?;
        self.deliver(event);
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.outbox)
    }
}
