//! Overlay timer state machine.
//!
//! Each tick feeds the latest [`Snapshot`] (or its absence) to [`OverlayTimers::reconcile`],
//! which updates the session and returns the ordered actions needed to reach the desired
//! overlay visibility. Executing those actions is left to the caller.


use std::time::{Duration, Instant};

use crate::status::Snapshot;

/// Timing windows, see [`crate::config::OverlayConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub show_now_playing_for: Duration,
    pub show_next_up_when_remaining: Duration,
    pub show_next_up_for: Duration,
}

/// One of the two independent title overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    NowPlaying,
    NextUp,
}

/// Side effect requested by the state machine, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    /// Persist the untruncated labels of a newly started item
    WriteLabels { current: String, next: String },
    /// Update the slot's title with `label`, then bring it on air
    Show { slot: Slot, label: String },
    Hide(Slot),
}

/// Visibility of one slot for the current item. Windows only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Window {
    #[default]
    Pending,
    Shown { since: Instant },
    Done,
}

impl Window {
    const fn is_shown(self) -> bool {
        matches!(self, Self::Shown { .. })
    }
}

#[derive(Debug)]
struct ActiveItem {
    id: String,
    started: Instant,
}

/// Mutable session state, cleared on every item change and on source loss.
#[derive(Debug, Default)]
struct Session {
    item: Option<ActiveItem>,
    now_playing: Window,
    next_up: Window,
}

pub struct OverlayTimers {
    timing: Timing,
    session: Session,
}

impl OverlayTimers {
    #[must_use]
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            session: Session::default(),
        }
    }

    /// Identity of the item the session currently tracks
    #[must_use]
    pub fn active_item(&self) -> Option<&str> {
        self.session.item.as_ref().map(|item| item.id.as_str())
    }

    #[must_use]
    pub const fn is_shown(&self, slot: Slot) -> bool {
        match slot {
            Slot::NowPlaying => self.session.now_playing.is_shown(),
            Slot::NextUp => self.session.next_up.is_shown(),
        }
    }

    /// Advance the session to `now` given this tick's snapshot.
    ///
    /// Change detection (and the hides it triggers) always precedes window evaluation in the
    /// returned list.
    pub fn reconcile(&mut self, snapshot: Option<&Snapshot>, now: Instant) -> Vec<OverlayAction> {
        let mut actions = Vec::new();

        let Some(snapshot) = snapshot else {
            if let Some(item) = &self.session.item {
                tracing::info!(item = %item.id, "Playlist no longer running. Clearing overlays");
            }
            self.reset(&mut actions);
            return actions;
        };

        if self.active_item() != Some(snapshot.active_item_id.as_str()) {
            tracing::info!(
                previous = ?self.active_item(),
                item = %snapshot.active_item_id,
                current = %snapshot.current_label,
                next = %snapshot.next_label,
                "Playlist item changed"
            );
            self.reset(&mut actions);
            self.session.item = Some(ActiveItem {
                id: snapshot.active_item_id.clone(),
                started: now,
            });
            actions.push(OverlayAction::WriteLabels {
                current: snapshot.current_label.clone(),
                next: snapshot.next_label.clone(),
            });
        }

        let Some(item) = &self.session.item else {
            return actions;
        };
        let elapsed = now.saturating_duration_since(item.started);

        match self.session.now_playing {
            Window::Pending if elapsed < self.timing.show_now_playing_for => {
                tracing::info!(label = %snapshot.current_label, "Showing now-playing title");
                actions.push(OverlayAction::Show {
                    slot: Slot::NowPlaying,
                    label: snapshot.current_label.clone(),
                });
                self.session.now_playing = Window::Shown { since: now };
            }
            Window::Shown { .. } if elapsed > self.timing.show_now_playing_for => {
                tracing::info!(?elapsed, "Hiding now-playing title");
                actions.push(OverlayAction::Hide(Slot::NowPlaying));
                self.session.now_playing = Window::Done;
            }
            _ => {}
        }

        match self.session.next_up {
            Window::Pending
                if snapshot.remaining() < self.timing.show_next_up_when_remaining
                    && !snapshot.next_label.is_empty() =>
            {
                tracing::info!(label = %snapshot.next_label, remaining = ?snapshot.remaining(), "Showing next-up title");
                actions.push(OverlayAction::Show {
                    slot: Slot::NextUp,
                    label: snapshot.next_label.clone(),
                });
                self.session.next_up = Window::Shown { since: now };
            }
            Window::Shown { since }
                if now.saturating_duration_since(since) >= self.timing.show_next_up_for =>
            {
                tracing::info!("Hiding next-up title");
                actions.push(OverlayAction::Hide(Slot::NextUp));
                self.session.next_up = Window::Done;
            }
            _ => {}
        }

        actions
    }

    /// Hide whatever is on air and forget the current item.
    fn reset(&mut self, actions: &mut Vec<OverlayAction>) {
        for (slot, window) in [
            (Slot::NowPlaying, self.session.now_playing),
            (Slot::NextUp, self.session.next_up),
        ] {
            if window.is_shown() {
                actions.push(OverlayAction::Hide(slot));
            }
        }
        self.session = Session::default();
    }
}
