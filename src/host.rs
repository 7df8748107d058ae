//! Async host: one inbound channel, one mailbox per frame.
//!
//! Frames never talk to each other directly. A [`FrameHandle`] can only push
//! messages into the host's single inbound channel (stamped with its own
//! [`FrameRef`], so it cannot claim to be another frame) and read its own
//! mailbox. The [`event_loop`] drains the inbound channel and applies each event
//! to the hub strictly one at a time.
//!
//! Dropping a [`FrameHandle`] destroys the frame: the host detaches it from the
//! directory, closes its mailbox and drops its hub connection.

use crate::chrome::Directory;
use crate::config::HubConfig;
use crate::error::HostClosed;
use crate::frames::FrameRef;
use crate::hub::{Hub, Postman};
use crate::message::{AppId, Envelope};
use crate::token::{TokenSource, UuidTokens};
use crate::validate::{ShapeValidator, Validator};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Hub specialised to the in-memory directory and channel mailboxes.
pub type HostHub<V = ShapeValidator, T = UuidTokens> = Hub<Directory, Mailboxes, V, T>;

/// Events accepted by the host loop.
#[derive(Debug)]
pub enum Inbound {
    /// A frame sent `data`; `source` is stamped by the frame's handle.
    Message { source: FrameRef, data: Value },
    /// Create a frame for `app_id` and reply with its handle parts.
    Attach {
        app_id: AppId,
        reply: oneshot::Sender<(FrameRef, mpsc::UnboundedReceiver<Value>)>,
    },
    /// The frame was destroyed.
    Detach(FrameRef),
}

/// Channel-backed send primitive: one unbounded mailbox per frame.
#[derive(Debug, Default)]
pub struct Mailboxes {
    boxes: HashMap<FrameRef, mpsc::UnboundedSender<Value>>,
}

impl Mailboxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or replace) the mailbox of `frame`.
    pub fn open(&mut self, frame: FrameRef) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.boxes.insert(frame, tx);
        rx
    }

    pub fn close(&mut self, frame: FrameRef) -> bool {
        self.boxes.remove(&frame).is_some()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl Postman for Mailboxes {
    fn post(&mut self, message: Envelope, destination: FrameRef) {
        match self.boxes.get(&destination) {
            Some(tx) => {
                if tx.send(message.into_value()).is_err() {
                    tracing::debug!(frame = %destination, "mailbox closed, message dropped");
                }
            }
            None => tracing::debug!(frame = %destination, "no mailbox, message dropped"),
        }
    }
}

/// A frame's view of the host: send into the hub, read its own mailbox.
#[derive(Debug)]
pub struct FrameHandle {
    frame: FrameRef,
    inbound: mpsc::UnboundedSender<Inbound>,
    mailbox: mpsc::UnboundedReceiver<Value>,
}

impl FrameHandle {
    pub fn frame(&self) -> FrameRef {
        self.frame
    }

    /// Hand a message to the hub, as this frame.
    pub fn post(&self, data: Value) -> Result<(), HostClosed> {
        self.inbound
            .send(Inbound::Message {
                source: self.frame,
                data,
            })
            .map_err(|_| HostClosed)
    }

    /// Next message delivered to this frame; `None` once the mailbox closed.
    pub async fn recv(&mut self) -> Option<Value> {
        self.mailbox.recv().await
    }

    /// Non-blocking variant of [`FrameHandle::recv`].
    pub fn try_recv(&mut self) -> Option<Value> {
        self.mailbox.try_recv().ok()
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        // The loop may already be gone; nothing left to clean up then.
        let _ = self.inbound.send(Inbound::Detach(self.frame));
    }
}

/// Cloneable handle for attaching frames while the loop runs.
#[derive(Debug, Clone)]
pub struct HostHandle {
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl HostHandle {
    pub async fn attach(&self, app_id: impl Into<AppId>) -> Result<FrameHandle, HostClosed> {
        let (reply, response) = oneshot::channel();
        self.inbound
            .send(Inbound::Attach {
                app_id: app_id.into(),
                reply,
            })
            .map_err(|_| HostClosed)?;
        let (frame, mailbox) = response.await.map_err(|_| HostClosed)?;
        Ok(FrameHandle {
            frame,
            inbound: self.inbound.clone(),
            mailbox,
        })
    }
}

/// Owns the hub and the inbound channel.
pub struct Host<V = ShapeValidator, T = UuidTokens> {
    hub: HostHub<V, T>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
}

impl Host {
    /// Host with the default validator and UUID tokens.
    pub fn new(config: &HubConfig) -> Self {
        let hub = Hub::new(Directory::from_routes(&config.routes), Mailboxes::new())
            .with_settings(config.hub.clone());
        Self::from_hub(hub)
    }
}

impl<V, T> Host<V, T>
where
    V: Validator,
    T: TokenSource,
{
    pub fn from_hub(hub: HostHub<V, T>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            hub,
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn handle(&self) -> HostHandle {
        HostHandle {
            inbound: self.inbound_tx.clone(),
        }
    }

    pub fn hub(&self) -> &HostHub<V, T> {
        &self.hub
    }

    pub fn hub_mut(&mut self) -> &mut HostHub<V, T> {
        &mut self.hub
    }

    /// Attach a frame before the loop starts.
    pub fn attach(&mut self, app_id: impl Into<AppId>) -> FrameHandle {
        let (frame, mailbox) = attach_frame(&mut self.hub, app_id.into());
        FrameHandle {
            frame,
            inbound: self.inbound_tx.clone(),
            mailbox,
        }
    }

    /// Run until every [`FrameHandle`] and [`HostHandle`] is gone, then hand
    /// the hub back.
    pub async fn run(self) -> HostHub<V, T> {
        let Host {
            mut hub,
            inbound_tx,
            mut inbound_rx,
        } = self;
        drop(inbound_tx);
        event_loop(&mut hub, &mut inbound_rx).await;
        hub
    }
}

/// Apply inbound events to `hub` in arrival order until the channel closes.
pub async fn event_loop<V, T>(
    hub: &mut HostHub<V, T>,
    inbound: &mut mpsc::UnboundedReceiver<Inbound>,
) where
    V: Validator,
    T: TokenSource,
{
    while let Some(event) = inbound.recv().await {
        apply(hub, event);
    }
    tracing::debug!(connections = hub.len(), "inbound channel closed, host loop stopping");
}

/// Apply a single event.
pub fn apply<V, T>(hub: &mut HostHub<V, T>, event: Inbound)
where
    V: Validator,
    T: TokenSource,
{
    match event {
        Inbound::Message { source, data } => {
            let outcome = hub.handle(source, data);
            tracing::trace!(frame = %source, ?outcome, "handled");
        }
        Inbound::Attach { app_id, reply } => {
            let (frame, mailbox) = attach_frame(hub, app_id);
            if reply.send((frame, mailbox)).is_err() {
                detach_frame(hub, frame);
            }
        }
        Inbound::Detach(frame) => detach_frame(hub, frame),
    }
}

fn attach_frame<V, T>(
    hub: &mut HostHub<V, T>,
    app_id: AppId,
) -> (FrameRef, mpsc::UnboundedReceiver<Value>) {
    let attached = hub.chrome_mut().attach(app_id);
    if let Some(previous) = attached.replaced {
        detach_frame(hub, previous);
    }
    let frame = attached.frame;
    let mailbox = hub.postman_mut().open(frame);
    (frame, mailbox)
}

fn detach_frame<V, T>(hub: &mut HostHub<V, T>, frame: FrameRef) {
    hub.chrome_mut().detach(frame);
    hub.postman_mut().close(frame);
    hub.forget(frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_to_unknown_mailbox_is_dropped_quietly() {
        let mut boxes = Mailboxes::new();
        let mut dir = Directory::new();
        let frame = dir.attach("A1").frame;
        boxes.post(Envelope::from_value(json!({ "type": "X" })).unwrap(), frame);
        assert!(boxes.is_empty());
    }

    #[test]
    fn closed_mailbox_stops_delivery() {
        let mut boxes = Mailboxes::new();
        let mut dir = Directory::new();
        let frame = dir.attach("A1").frame;
        let mut rx = boxes.open(frame);
        assert!(boxes.close(frame));
        boxes.post(Envelope::from_value(json!({ "type": "X" })).unwrap(), frame);
        assert!(rx.try_recv().is_err());
    }
}
