//! Event interpretation: message id -> session mutations.
//!
//! Dispatch is data-driven: a registry of [`EventHandler`] trait objects
//! keyed by reply id or unsolicited event name. New event kinds are added by
//! registering a handler, not by growing a conditional chain.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use weerelay_proto::wire::Message;
use weerelay_proto::{RelayError, Result};

use crate::session::SessionMutation;

/// One event kind's extraction rule.
pub trait EventHandler: Send + Sync {
    /// The reply id or unsolicited event name this handler consumes.
    fn event(&self) -> &'static str;

    /// Extract the mutations carried by `msg`. A malformed payload is a
    /// `Decode` error; the message is dropped and the stream continues.
    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>>;
}

/// Registry and dispatcher for event handlers.
#[derive(Default)]
pub struct EventRegistry {
    handlers: HashMap<&'static str, Arc<dyn EventHandler>>,
}

impl EventRegistry {
    pub fn new() -> EventRegistry {
        EventRegistry {
            handlers: HashMap::new(),
        }
    }

    /// A registry with every built-in handler installed.
    pub fn with_builtin() -> EventRegistry {
        let mut reg = EventRegistry::new();
        handlers::register_builtin(&mut reg);
        reg
    }

    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(handler.event(), handler);
    }

    pub fn known_events(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.handlers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Map a decoded message onto session mutations.
    ///
    /// An id with no registered handler is `UnknownEvent`: non-fatal, the
    /// caller logs and drops the message.
    pub fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let handler = self
            .handlers
            .get(msg.id.as_str())
            .ok_or_else(|| RelayError::UnknownEvent(msg.id.clone()))?;
        handler.interpret(msg)
    }
}
