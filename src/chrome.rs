//! The chrome: who lives in which frame.
//!
//! The hub never decides identity or routing policy on its own. It asks a
//! [`Chrome`] to name the application occupying a frame, and to resolve a
//! target application back to a frame on behalf of a given sender.
//! [`Directory`] is the in-memory implementation used by [`crate::host`].

use crate::config::RouteSettings;
use crate::frames::{FrameRef, FrameTable};
use crate::message::AppId;
use std::collections::{HashMap, HashSet};

/// Frame ⇄ application mapping consulted by the hub.
pub trait Chrome {
    /// Application occupying `frame`, if the chrome knows the frame.
    fn app_id_by_frame(&self, frame: FrameRef) -> Option<AppId>;

    /// Frame that should receive messages for `app_id` sent from `from`.
    ///
    /// `from` lets the implementation apply sender-aware policy; returning
    /// `None` means there is no deliverable frame for this sender.
    fn frame_by_app_id(&self, app_id: &AppId, from: FrameRef) -> Option<FrameRef>;
}

/// Result of [`Directory::attach`].
#[must_use = "a replaced frame still has its hub connection until it is forgotten"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attached {
    pub frame: FrameRef,
    /// Frame that held the same application before, now detached.
    pub replaced: Option<FrameRef>,
}

/// In-memory chrome: one frame per application, plus blocked routes.
#[derive(Debug, Default)]
pub struct Directory {
    frames: FrameTable<AppId>,
    by_app: HashMap<AppId, FrameRef>,
    blocked: HashSet<(AppId, AppId)>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-loaded with the blocked routes from configuration.
    pub fn from_routes(routes: &RouteSettings) -> Self {
        let mut directory = Self::new();
        for [from, to] in &routes.blocked {
            directory.block(from.as_str(), to.as_str());
        }
        directory
    }

    /// Register a new frame for `app_id`.
    ///
    /// An application occupies at most one frame. A previous frame for the
    /// same application is detached and reported in [`Attached::replaced`];
    /// the caller owns dropping its hub connection with [`crate::Hub::forget`].
    pub fn attach(&mut self, app_id: impl Into<AppId>) -> Attached {
        let app_id = app_id.into();
        let replaced = self
            .by_app
            .get(&app_id)
            .copied()
            .and_then(|previous| self.detach(previous).map(|_| previous));
        let frame = self.frames.insert(app_id.clone());
        tracing::debug!(%frame, app = %app_id, "frame attached");
        self.by_app.insert(app_id, frame);
        Attached { frame, replaced }
    }

    /// Forget `frame`. Returns the application it held, `None` if stale.
    pub fn detach(&mut self, frame: FrameRef) -> Option<AppId> {
        let app_id = self.frames.remove(frame)?;
        if self.by_app.get(&app_id) == Some(&frame) {
            self.by_app.remove(&app_id);
        }
        tracing::debug!(%frame, app = %app_id, "frame detached");
        Some(app_id)
    }

    pub fn frame_of(&self, app_id: &AppId) -> Option<FrameRef> {
        self.by_app.get(app_id).copied()
    }

    /// Refuse delivery of messages from `from` to `to`.
    pub fn block(&mut self, from: impl Into<AppId>, to: impl Into<AppId>) {
        self.blocked.insert((from.into(), to.into()));
    }

    pub fn unblock(&mut self, from: impl Into<AppId>, to: impl Into<AppId>) -> bool {
        self.blocked.remove(&(from.into(), to.into()))
    }

    pub fn is_blocked(&self, from: &AppId, to: &AppId) -> bool {
        self.blocked.contains(&(from.clone(), to.clone()))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Chrome for Directory {
    fn app_id_by_frame(&self, frame: FrameRef) -> Option<AppId> {
        self.frames.get(frame).cloned()
    }

    fn frame_by_app_id(&self, app_id: &AppId, from: FrameRef) -> Option<FrameRef> {
        // Route policy is keyed by the sender's app; a frame the directory no
        // longer knows has no app and gets no route.
        let Some(sender) = self.frames.get(from) else {
            tracing::debug!(%from, to = %app_id, "route from unknown frame");
            return None;
        };
        if self.is_blocked(sender, app_id) {
            tracing::debug!(from = %sender, to = %app_id, "route blocked");
            return None;
        }
        self.frame_of(app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_resolves_both_ways() {
        let mut dir = Directory::new();
        let a1 = dir.attach("A1").frame;
        let a2 = dir.attach("A2").frame;
        assert_eq!(dir.app_id_by_frame(a1), Some(AppId::from("A1")));
        assert_eq!(dir.frame_by_app_id(&AppId::from("A2"), a1), Some(a2));
    }

    #[test]
    fn reattach_replaces_previous_frame() {
        let mut dir = Directory::new();
        let old = dir.attach("A1").frame;
        let attached = dir.attach("A1");
        let new = attached.frame;
        assert_eq!(attached.replaced, Some(old));
        assert_ne!(old, new);
        assert_eq!(dir.app_id_by_frame(old), None);
        assert_eq!(dir.frame_of(&AppId::from("A1")), Some(new));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn blocked_route_resolves_to_nothing_for_that_sender_only() {
        let mut dir = Directory::new();
        let a1 = dir.attach("A1").frame;
        let a2 = dir.attach("A2").frame;
        let a3 = dir.attach("A3").frame;
        dir.block("A1", "A3");
        assert_eq!(dir.frame_by_app_id(&AppId::from("A3"), a1), None);
        assert_eq!(dir.frame_by_app_id(&AppId::from("A3"), a2), Some(a3));
        assert!(dir.unblock("A1", "A3"));
        assert_eq!(dir.frame_by_app_id(&AppId::from("A3"), a1), Some(a3));
    }

    #[test]
    fn detach_of_stale_handle_is_a_no_op() {
        let mut dir = Directory::new();
        let old = dir.attach("A1").frame;
        let new = dir.attach("A1").frame;
        assert_eq!(dir.detach(old), None);
        assert_eq!(dir.frame_of(&AppId::from("A1")), Some(new));
    }

    #[test]
    fn first_attach_replaces_nothing() {
        let mut dir = Directory::new();
        assert_eq!(dir.attach("A1").replaced, None);
        assert_eq!(dir.attach("A2").replaced, None);
    }

    #[test]
    fn detached_sender_gets_no_route_even_when_unblocked() {
        let mut dir = Directory::new();
        let a1 = dir.attach("A1").frame;
        let _a2 = dir.attach("A2");
        let a3 = dir.attach("A3").frame;
        dir.block("A1", "A3");
        assert_eq!(dir.detach(a1), Some(AppId::from("A1")));
        assert_eq!(dir.frame_by_app_id(&AppId::from("A3"), a1), None);
        assert_eq!(dir.frame_by_app_id(&AppId::from("A2"), a1), None);
        assert!(dir.frame_by_app_id(&AppId::from("A2"), a3).is_some());
    }
}
