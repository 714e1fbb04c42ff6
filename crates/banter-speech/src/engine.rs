//! Speech engine managing the capture session lifecycle.
//!
//! The `SpeechEngine` owns the listening state machine and one optional
//! recognizer session at a time. Sessions are spawned tasks: independently
//! cancellable, never blocking the turn pipeline. A completed utterance is
//! written to the shared input slot and then submitted through the
//! `SubmitSink`, exactly as if the user had pressed submit.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use banter_core::events::PromptEvent;

use crate::recognizer::{Recognizer, SubmitSink};
use crate::slot::InputSlot;
use crate::state::{ListenState, ListenStateMachine};

/// Tracks the data associated with an active capture session.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Unique identifier for this session.
    pub id: Uuid,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// Language tag the recognizer was started with.
    pub locale: String,
}

impl CaptureSession {
    pub fn new(locale: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            locale,
        }
    }

    /// Returns the elapsed duration of this session in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds() as f32 / 1000.0
    }
}

/// The speech engine drives recognizer sessions through the listen state
/// machine.
///
/// `start` degrades to a logged no-op when no recognizer is configured (the
/// capability is unavailable on this platform) or when capture is switched
/// off in config; the rest of the application keeps working on typed input
/// alone.
pub struct SpeechEngine {
    state: ListenStateMachine,
    slot: InputSlot,
    recognizer: Option<Arc<dyn Recognizer>>,
    sink: Arc<dyn SubmitSink>,
    locale: String,
    enabled: bool,
    events: broadcast::Sender<PromptEvent>,
    session: Arc<Mutex<Option<CaptureSession>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SpeechEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechEngine")
            .field("state", &self.state)
            .field("locale", &self.locale)
            .field("has_recognizer", &self.recognizer.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl SpeechEngine {
    /// Create a `SpeechEngine` without a recognizer.
    ///
    /// `start` becomes a logged no-op; typed input is unaffected.
    pub fn new(
        slot: InputSlot,
        locale: String,
        sink: Arc<dyn SubmitSink>,
        events: broadcast::Sender<PromptEvent>,
    ) -> Self {
        Self {
            state: ListenStateMachine::new(),
            slot,
            recognizer: None,
            sink,
            locale,
            enabled: true,
            events,
            session: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Create a `SpeechEngine` backed by a real recognizer.
    pub fn with_recognizer(
        recognizer: Arc<dyn Recognizer>,
        slot: InputSlot,
        locale: String,
        sink: Arc<dyn SubmitSink>,
        events: broadcast::Sender<PromptEvent>,
    ) -> Self {
        Self {
            recognizer: Some(recognizer),
            ..Self::new(slot, locale, sink, events)
        }
    }

    /// Switch capture on or off, the `[speech] enabled` config state.
    ///
    /// A disabled engine ignores `start`; `stop` keeps working so disabling
    /// cannot strand an active session.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether a recognizer is configured.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Returns the current listening state.
    pub fn current_state(&self) -> ListenState {
        self.state.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state.current() == ListenState::Listening
    }

    /// Returns a clone of the current session, if one is active.
    pub fn current_session(&self) -> Option<CaptureSession> {
        self.session
            .lock()
            .expect("session mutex poisoned")
            .clone()
    }

    /// Begin a capture session.
    ///
    /// Fails silently in the degraded cases: with capture disabled in config
    /// or no recognizer configured nothing happens and the state stays
    /// `Idle`; a start while already listening is logged and ignored.
    pub fn start(&self) {
        if !self.enabled {
            tracing::info!("Speech capture disabled in config; listen request ignored");
            return;
        }

        let Some(recognizer) = self.recognizer.clone() else {
            tracing::warn!("Speech recognition unavailable; listen request ignored");
            return;
        };

        if self.state.transition(ListenState::Listening).is_err() {
            tracing::debug!("Start ignored; capture session already active");
            return;
        }

        let session = CaptureSession::new(self.locale.clone());
        let session_id = session.id;
        tracing::info!(session_id = %session_id, locale = %session.locale, "Capture session started");
        {
            let mut guard = self.session.lock().expect("session mutex poisoned");
            *guard = Some(session);
        }
        let _ = self.events.send(PromptEvent::ListeningStarted {
            timestamp: Utc::now(),
        });

        let state = self.state.clone();
        let slot = self.slot.clone();
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let session_slot = Arc::clone(&self.session);
        let locale = self.locale.clone();

        let handle = tokio::spawn(async move {
            match recognizer.recognize(&locale).await {
                Ok(Some(transcript)) if !transcript.trim().is_empty() => {
                    slot.set(&transcript);
                    tracing::info!(
                        session_id = %session_id,
                        transcript_len = transcript.len(),
                        "Utterance captured; submitting"
                    );
                    // Submission runs detached so a late stop() cannot abort
                    // an already-triggered turn.
                    let submit_sink = Arc::clone(&sink);
                    tokio::spawn(async move {
                        submit_sink.submit_input().await;
                    });
                }
                Ok(_) => {
                    tracing::debug!(session_id = %session_id, "Utterance produced no text");
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Speech recognition failed");
                }
            }

            if state.transition(ListenState::Idle).is_ok() {
                let mut guard = session_slot.lock().expect("session mutex poisoned");
                *guard = None;
                let _ = events.send(PromptEvent::ListeningStopped {
                    timestamp: Utc::now(),
                });
            }
        });

        let mut guard = self.task.lock().expect("task mutex poisoned");
        *guard = Some(handle);
    }

    /// End the capture session early.
    ///
    /// No-op when idle. Discards whatever the recognizer has not yet
    /// delivered; nothing is submitted.
    pub fn stop(&self) {
        if self.state.transition(ListenState::Idle).is_err() {
            tracing::debug!("Stop ignored; no active capture session");
            return;
        }

        if let Some(handle) = self.task.lock().expect("task mutex poisoned").take() {
            handle.abort();
        }

        let session_id = {
            let mut guard = self.session.lock().expect("session mutex poisoned");
            let id = guard.as_ref().map(|s| s.id);
            *guard = None;
            id
        };
        if let Some(id) = session_id {
            tracing::info!(session_id = %id, "Capture session stopped");
        }

        let _ = self.events.send(PromptEvent::ListeningStopped {
            timestamp: Utc::now(),
        });
    }

    /// Stop if listening, start otherwise.
    pub fn toggle(&self) {
        match self.state.current() {
            ListenState::Listening => self.stop(),
            ListenState::Idle => self.start(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
