//! The hub: handshake, authentication, and routing.
//!
//! Every inbound message goes through the same pipeline, stopping at the
//! first failure:
//!
//! 1. envelope validation (silent on failure)
//! 2. connection lookup; an unknown frame may only send `CONNECT`
//! 3. token check against the token issued to *that* frame
//! 4. enrichment: `source`, `token` and `viaHub` are overwritten by the hub
//! 5. self-addressing guard
//! 6. dispatch by `type`; only `PUBLISH` is routed
//!
//! Each call to [`Hub::handle`] sends at most one message.

use crate::chrome::Chrome;
use crate::config::HubSettings;
use crate::error::Rejection;
use crate::frames::FrameRef;
use crate::message::{AppId, Envelope, MessageType, Token};
use crate::token::{TokenSource, UuidTokens};
use crate::validate::{ShapeValidator, Validator};
use serde_json::Value;
use std::collections::HashMap;

/// Fire-and-forget delivery of one message to one frame.
pub trait Postman {
    fn post(&mut self, message: Envelope, destination: FrameRef);
}

/// What the hub knows about a connected frame. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    app_id: AppId,
    token: Token,
}

impl Connection {
    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake completed; a `CONNACK` went back to the sender.
    Connected { app_id: AppId },
    /// An enriched `PUBLISH` was handed to the postman for `to`.
    Routed { to: FrameRef },
    /// Authenticated message of a type the hub does not route.
    Ignored { kind: MessageType },
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }
}

pub struct Hub<C, P, V = ShapeValidator, T = UuidTokens> {
    chrome: C,
    postman: P,
    validator: V,
    tokens: T,
    settings: HubSettings,
    connections: HashMap<FrameRef, Connection>,
}

impl<C, P> Hub<C, P>
where
    C: Chrome,
    P: Postman,
{
    pub fn new(chrome: C, postman: P) -> Self {
        Self {
            chrome,
            postman,
            validator: ShapeValidator,
            tokens: UuidTokens,
            settings: HubSettings::default(),
            connections: HashMap::new(),
        }
    }
}

impl<C, P, V, T> Hub<C, P, V, T> {
    pub fn with_validator<V2: Validator>(self, validator: V2) -> Hub<C, P, V2, T> {
        Hub {
            chrome: self.chrome,
            postman: self.postman,
            validator,
            tokens: self.tokens,
            settings: self.settings,
            connections: self.connections,
        }
    }

    pub fn with_tokens<T2: TokenSource>(self, tokens: T2) -> Hub<C, P, V, T2> {
        Hub {
            chrome: self.chrome,
            postman: self.postman,
            validator: self.validator,
            tokens,
            settings: self.settings,
            connections: self.connections,
        }
    }

    pub fn with_settings(mut self, settings: HubSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn connection(&self, frame: FrameRef) -> Option<&Connection> {
        self.connections.get(&frame)
    }

    pub fn is_connected(&self, frame: FrameRef) -> bool {
        self.connections.contains_key(&frame)
    }

    /// Number of connected frames.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drop the connection of a destroyed frame.
    ///
    /// This is the only way a frame leaves the connected state; no inbound
    /// message can do it.
    pub fn forget(&mut self, frame: FrameRef) -> Option<Connection> {
        let connection = self.connections.remove(&frame)?;
        tracing::debug!(%frame, app = %connection.app_id, "connection dropped");
        Some(connection)
    }

    pub fn chrome(&self) -> &C {
        &self.chrome
    }

    pub fn chrome_mut(&mut self) -> &mut C {
        &mut self.chrome
    }

    pub fn postman(&self) -> &P {
        &self.postman
    }

    pub fn postman_mut(&mut self) -> &mut P {
        &mut self.postman
    }

    fn dump(&self, envelope: &Envelope) -> String {
        if self.settings.dump_messages {
            format!("\n{}", envelope.dump())
        } else {
            String::new()
        }
    }
}

impl<C, P, V, T> Hub<C, P, V, T>
where
    C: Chrome,
    P: Postman,
    V: Validator,
    T: TokenSource,
{
    /// Handle one message received from `source`.
    pub fn handle(&mut self, source: FrameRef, message: Value) -> Outcome {
        match self.process(source, message) {
            Ok(outcome) => outcome,
            Err(rejection) => Outcome::Rejected(rejection),
        }
    }

    fn process(&mut self, source: FrameRef, message: Value) -> Result<Outcome, Rejection> {
        if !self.validator.is_valid_envelope(&message) {
            tracing::trace!(frame = %source, "dropping malformed envelope");
            return Err(Rejection::MalformedEnvelope);
        }
        let Some(mut envelope) = Envelope::from_value(message) else {
            tracing::trace!(frame = %source, "dropping non-object message");
            return Err(Rejection::MalformedEnvelope);
        };
        let kind = envelope
            .kind()
            .unwrap_or_else(|| MessageType::Other(String::new()));

        let Some(connection) = self.connections.get(&source).cloned() else {
            return self.connect(source, kind);
        };

        if envelope.token() != Some(connection.token.as_str()) {
            tracing::warn!(
                frame = %source,
                app = %connection.app_id,
                "Token seems invalid, discarding message!{}",
                self.dump(&envelope)
            );
            return Err(Rejection::BadToken);
        }

        envelope.set_source(&connection.app_id);
        envelope.set_token(&connection.token);
        envelope.set_via_hub();

        if envelope.target() == Some(connection.app_id.as_str()) {
            tracing::warn!(
                frame = %source,
                app = %connection.app_id,
                "Source and destination match, discarding message!{}",
                self.dump(&envelope)
            );
            return Err(Rejection::SelfAddressed {
                app_id: connection.app_id,
            });
        }

        match kind {
            MessageType::Publish => self.publish(source, envelope),
            kind => {
                tracing::debug!(
                    frame = %source,
                    app = %connection.app_id,
                    %kind,
                    target = envelope.target().unwrap_or_default(),
                    "no routing for message type"
                );
                Ok(Outcome::Ignored { kind })
            }
        }
    }

    fn connect(&mut self, source: FrameRef, kind: MessageType) -> Result<Outcome, Rejection> {
        if kind != MessageType::Connect {
            tracing::warn!(
                frame = %source,
                %kind,
                "frame sent a message without being connected"
            );
            return Err(Rejection::NotConnected {
                kind: kind.as_str().to_string(),
            });
        }
        let Some(app_id) = self.chrome.app_id_by_frame(source) else {
            tracing::warn!(frame = %source, "CONNECT from a frame the chrome does not know");
            return Err(Rejection::UnknownApp);
        };
        let token = self.tokens.generate();
        tracing::debug!(frame = %source, app = %app_id, "CONNECT");

        self.postman.post(Envelope::connack(&app_id, &token), source);
        self.connections.insert(
            source,
            Connection {
                app_id: app_id.clone(),
                token,
            },
        );
        Ok(Outcome::Connected { app_id })
    }

    fn publish(&mut self, source: FrameRef, envelope: Envelope) -> Result<Outcome, Rejection> {
        if !self.validator.is_valid_publish(&envelope) {
            tracing::warn!(
                frame = %source,
                "Message incomplete for a PUBLISH command!{}",
                self.dump(&envelope)
            );
            return Err(Rejection::MalformedPublish);
        }
        let target = AppId::from(envelope.target().unwrap_or_default());
        let Some(destination) = self.chrome.frame_by_app_id(&target, source) else {
            tracing::warn!(
                frame = %source,
                source = envelope.source().unwrap_or_default(),
                %target,
                "no frame to deliver PUBLISH to, discarding message"
            );
            return Err(Rejection::UnresolvedTarget {
                target: target.to_string(),
            });
        };
        tracing::debug!(
            source = envelope.source().unwrap_or_default(),
            %target,
            to = %destination,
            "Routing PUBLISH"
        );
        self.postman.post(envelope, destination);
        Ok(Outcome::Routed { to: destination })
    }
}

#[cfg(all(test, feature = "telemetry"))]
mod tests {
    use super::*;
    use crate::chrome::Directory;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Outbox(Vec<(FrameRef, Envelope)>);

    impl Postman for Outbox {
        fn post(&mut self, message: Envelope, destination: FrameRef) {
            self.0.push((destination, message));
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn ignored_type_trace_does_not_leak_the_token() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        let mut directory = Directory::new();
        let f1 = directory.attach("A1").frame;
        let _f2 = directory.attach("A2");
        let mut hub = Hub::new(directory, Outbox::default());

        let token = tracing::subscriber::with_default(subscriber, || {
            hub.handle(f1, json!({ "type": "CONNECT" }));
            let token = hub.connection(f1).unwrap().token().as_str().to_string();
            let outcome = hub.handle(
                f1,
                json!({ "type": "SUBSCRIBE", "target": "A2", "token": token }),
            );
            assert!(matches!(outcome, Outcome::Ignored { .. }));
            token
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("SUBSCRIBE"), "{logs}");
        assert!(logs.contains("A2"), "{logs}");
        assert!(!logs.contains(&token), "{logs}");
    }
}
