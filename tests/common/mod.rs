#![allow(dead_code)]

use frame_hub::{Directory, Envelope, FrameRef, Hub, Postman, Token, TokenSource, Validator};
use serde_json::Value;

/// Postman that records every delivery instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingPostman {
    pub sent: Vec<(FrameRef, Envelope)>,
}

impl Postman for RecordingPostman {
    fn post(&mut self, message: Envelope, destination: FrameRef) {
        self.sent.push((destination, message));
    }
}

impl RecordingPostman {
    pub fn to(&self, frame: FrameRef) -> Vec<Value> {
        self.sent
            .iter()
            .filter(|(dest, _)| *dest == frame)
            .map(|(_, msg)| msg.clone().into_value())
            .collect()
    }
}

/// Deterministic tokens: T1, T2, ...
#[derive(Debug, Default)]
pub struct SequentialTokens {
    next: u32,
}

impl TokenSource for SequentialTokens {
    fn generate(&mut self) -> Token {
        self.next += 1;
        Token::new(format!("T{}", self.next))
    }
}

pub type TestHub<V = frame_hub::ShapeValidator> =
    Hub<Directory, RecordingPostman, V, SequentialTokens>;

/// Hub with three attached frames (A1, A2, A3), none connected yet.
pub struct Fixture<V = frame_hub::ShapeValidator> {
    pub hub: TestHub<V>,
    pub f1: FrameRef,
    pub f2: FrameRef,
    pub f3: FrameRef,
}

pub fn fixture() -> Fixture {
    let mut directory = Directory::new();
    let f1 = directory.attach("A1").frame;
    let f2 = directory.attach("A2").frame;
    let f3 = directory.attach("A3").frame;
    let hub = Hub::new(directory, RecordingPostman::default())
        .with_tokens(SequentialTokens::default());
    Fixture { hub, f1, f2, f3 }
}

impl<V: Validator> Fixture<V> {
    /// Run the handshake for `frame` and return its token.
    pub fn connect(&mut self, frame: FrameRef) -> String {
        self.hub.handle(frame, serde_json::json!({ "type": "CONNECT" }));
        self.hub
            .connection(frame)
            .expect("connected")
            .token()
            .as_str()
            .to_string()
    }

    pub fn sent_count(&self) -> usize {
        self.hub.postman().sent.len()
    }
}
