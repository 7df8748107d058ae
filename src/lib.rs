//! # frame_hub
//!
//! A **trust-mediating message hub** for isolated embedded applications
//! ("frames"):
//!
//! - Frames never address each other directly; every message passes through the hub
//! - A **CONNECT / CONNACK handshake** issues each frame a private session token
//! - The hub, not the sender, decides **who sent a message**
//!
//! The goal is to be the small, boring piece in the middle that every frame has to
//! trust, and that gives a misbehaving frame nothing to work with.
//!
//! ---
//!
//! ## How it works
//!
//! The host receives every frame's messages on one inbound channel, tagged with the
//! frame they came from. For each message the hub:
//!
//! 1. Checks the envelope shape. Garbage is dropped without a word.
//! 2. Looks the frame up. An unknown frame may only send `CONNECT`; the hub asks the
//!    [`chrome`] which application lives there, generates a token, and replies
//!    `{ "type": "CONNACK", "viaHub": true, "target": <appId>, "token": <token> }`.
//! 3. Checks `token` against the token issued to **that frame**. A token copied into
//!    another frame is worthless.
//! 4. Overwrites `source` (the frame's app id), `token`, and sets `viaHub: true`.
//! 5. Refuses messages addressed to the sender itself.
//! 6. Routes `PUBLISH` to the frame the chrome resolves for `target`. Any other type
//!    is traced and ignored.
//!
//! At most one message leaves the hub per message that enters it.
//!
//! ### Most important gotchas (read this first)
//!
//! - **Rejections are quiet:** nothing is sent back to a frame whose message was
//!   dropped. Look at the `warn` logs, or at the [`Outcome`] returned by
//!   [`Hub::handle`].
//! - **No disconnect message:** a frame stays connected until the host tells the hub
//!   the frame is gone ([`Hub::forget`]). [`host::FrameHandle`] does that on drop.
//! - **Frame handles are generation-checked:** a [`FrameRef`] from a destroyed
//!   frame never matches the frame that later reuses its slot.
//! - **No rate limiting:** a frame that keeps sending rejected messages is never
//!   cut off.
//! - **Never log to stdout** in hosts that relay over stdio. [`telemetry`] writes to
//!   stderr.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`hub`] — the connection registry, handshake and routing pipeline.
//! - [`message`] — envelope, message types, app ids and tokens.
//! - [`frames`] — generation-checked frame handles.
//! - [`chrome`] — the frame ⇄ application mapping and the in-memory [`Directory`].
//! - [`validate`] / [`token`] — shape checks and token generation.
//! - [`config`] — TOML configuration with an embedded default.
//! - [`host`] — tokio inbound channel, per-frame mailboxes, event loop (feature `tokio`).
//! - [`telemetry`] — stderr logging setup (feature `telemetry`).
//!
//! ---
//!
//! ## Quick start: synchronous hub
//!
//! Bring your own send primitive by implementing [`Postman`]:
//!
//! ```rust
//! use frame_hub::{Directory, Envelope, FrameRef, Hub, Outcome, Postman};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Outbox(Vec<(FrameRef, Envelope)>);
//!
//! impl Postman for Outbox {
//!     fn post(&mut self, message: Envelope, destination: FrameRef) {
//!         self.0.push((destination, message));
//!     }
//! }
//!
//! let mut directory = Directory::new();
//! let f1 = directory.attach("A1").frame;
//! let f2 = directory.attach("A2").frame;
//! let mut hub = Hub::new(directory, Outbox::default());
//!
//! // Handshake.
//! assert!(matches!(hub.handle(f1, json!({ "type": "CONNECT" })), Outcome::Connected { .. }));
//! let token = hub.postman().0[0].1.token().unwrap().to_string();
//!
//! // Routed publish.
//! let outcome = hub.handle(
//!     f1,
//!     json!({ "type": "PUBLISH", "target": "A2", "token": token, "payload": {} }),
//! );
//! assert_eq!(outcome, Outcome::Routed { to: f2 });
//! assert_eq!(hub.postman().0[1].1.source(), Some("A1"));
//! ```
//!
//! ---
//!
//! ## Quick start: async host (feature `tokio`)
//!
//! ```no_run
//! use frame_hub::host::Host;
//! use frame_hub::HubConfig;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = HubConfig::default();
//!     let mut host = Host::new(&config);
//!     let mut a1 = host.attach("A1");
//!     let mut a2 = host.attach("A2");
//!     let hub = tokio::spawn(host.run());
//!
//!     a1.post(json!({ "type": "CONNECT" })).unwrap();
//!     let ack = a1.recv().await.unwrap();
//!     let token = ack["token"].clone();
//!
//!     a2.post(json!({ "type": "CONNECT" })).unwrap();
//!     a2.recv().await.unwrap();
//!
//!     a1.post(json!({ "type": "PUBLISH", "target": "A2", "token": token, "text": "hi" }))
//!         .unwrap();
//!     let msg = a2.recv().await.unwrap();
//!     assert_eq!(msg["source"], "A1");
//!
//!     drop((a1, a2));
//!     let _hub = hub.await.unwrap();
//! }
//! ```
//!
//! ---
//!
//! ## Configuration
//!
//! ```toml
//! [hub]
//! dump_messages = true   # pretty-print rejected messages in warnings
//!
//! [log]
//! filter = "frame_hub=debug"
//!
//! [routes]
//! blocked = [["ads", "wallet"]]
//! ```
//!
//! Load with [`HubConfig::load`]; keys you leave out keep their embedded defaults.
//!
//! ---
//!
//! ## API re-exports
//!
//! The most common entry points are re-exported at the crate root: [`Hub`],
//! [`Outcome`], [`Postman`], [`Chrome`], [`Directory`], [`Envelope`], [`FrameRef`],
//! [`HubConfig`] and [`Rejection`].

pub mod chrome;
pub mod config;
pub mod error;
pub mod frames;
#[cfg(feature = "tokio")]
pub mod host;
pub mod hub;
pub mod message;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod token;
pub mod validate;

// -------- Hub re-exports --------

#[doc(inline)]
pub use hub::{Connection, Hub, Outcome, Postman};
#[doc(inline)]
pub use message::{AppId, Envelope, MessageType, Token};
#[doc(inline)]
pub use frames::FrameRef;

// -------- Collaborator re-exports --------

#[doc(inline)]
pub use chrome::{Attached, Chrome, Directory};
#[doc(inline)]
pub use token::{TokenSource, UuidTokens};
#[doc(inline)]
pub use validate::{ShapeValidator, Validator};

// -------- Config / errors --------

#[doc(inline)]
pub use config::HubConfig;
#[doc(inline)]
pub use error::{ConfigError, Rejection};

#[cfg(feature = "telemetry")]
#[doc(inline)]
pub use telemetry::init_logging;
