//! # History Module
//!
//! Tracks the sequence of distinct input states seen by the frame loop.
//!
//! The frame loop feeds every frame's [`InputState`] to a [`HistoryTracker`],
//! which reports either a new state or how long the current one has been
//! held. Records travel to the viewer's [`HistoryStrip`] over a bounded
//! channel; when the viewer falls behind, records are dropped rather than
//! stalling the frame loop.

pub mod strip;

pub use strip::HistoryStrip;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::input::InputState;

/// What happened to the input state during one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRecord {
    /// The state differs from the previous frame's.
    Changed(InputState),
    /// The state is the same as it has been for `elapsed_frames` frames
    /// since it last changed.
    Unchanged { elapsed_frames: u64 },
}

/// Compares each frame's state against the previous one.
#[derive(Debug, Default)]
pub struct HistoryTracker {
    last: Option<InputState>,
    elapsed_frames: u64,
}

impl HistoryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes the state at the end of a frame.
    ///
    /// The first observation always counts as a change.
    ///
    /// # Examples
    ///
    /// ```
    /// use padview::history::{HistoryRecord, HistoryTracker};
    /// use padview::input::InputState;
    ///
    /// let mut tracker = HistoryTracker::new();
    /// let state = InputState::new();
    /// assert!(matches!(tracker.observe(&state), HistoryRecord::Changed(_)));
    /// assert_eq!(
    ///     tracker.observe(&state),
    ///     HistoryRecord::Unchanged { elapsed_frames: 1 }
    /// );
    /// ```
    pub fn observe(&mut self, state: &InputState) -> HistoryRecord {
        if self.last.as_ref() == Some(state) {
            self.elapsed_frames += 1;
            return HistoryRecord::Unchanged {
                elapsed_frames: self.elapsed_frames,
            };
        }

        self.last = Some(state.clone());
        self.elapsed_frames = 0;
        HistoryRecord::Changed(state.clone())
    }
}

/// Creates a publisher and the receiving end for the history strip.
///
/// # Panics
///
/// Panics if `capacity` is zero; configuration validation rejects that.
#[must_use]
pub fn channel(capacity: usize) -> (HistoryPublisher, mpsc::Receiver<HistoryRecord>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (HistoryPublisher { sender, dropped: 0 }, receiver)
}

/// Non-blocking sending half of the history channel.
#[derive(Debug)]
pub struct HistoryPublisher {
    sender: mpsc::Sender<HistoryRecord>,
    dropped: u64,
}

impl HistoryPublisher {
    /// Queues a record, dropping it when the channel is full or closed.
    ///
    /// Returns whether the record was queued.
    pub fn publish(&mut self, record: HistoryRecord) -> bool {
        match self.sender.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!("History channel full, dropped record ({} total)", self.dropped);
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped += 1;
                debug!("History receiver gone, dropped record");
                false
            }
        }
    }

    /// Number of records dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
