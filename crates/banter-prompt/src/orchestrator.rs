//! Turn orchestrator.
//!
//! Single owner of the submit -> stream -> persist pipeline for one
//! conversation view. The orchestrator reads the shared input slot, drives
//! the phase machine, accumulates the streamed answer into the in-flight
//! turn, persists the completed turn exactly once, and publishes
//! `PromptEvent`s for the view layer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use banter_core::events::PromptEvent;
use banter_core::types::{ConversationId, ImageState};
use banter_core::{BanterError, Result};
use banter_llm::{ChatSession, TurnPart};
use banter_speech::{InputSlot, SubmitSink};
use banter_store::{ConversationCache, TurnRecord, TurnStore};

use crate::draft::InFlightTurn;
use crate::replay::ReplayLedger;
use crate::state::{PhaseMachine, TurnPhase};

/// Alert shown when submission is attempted with no usable question.
pub const EMPTY_QUESTION_ALERT: &str = "Please enter a valid question.";

/// Alert shown when a dispatched turn fails at any stage.
pub const TURN_FAILED_ALERT: &str =
    "An error occurred while fetching the response. Please try again.";

/// Orchestrates the turns of one conversation view.
///
/// Owns the in-flight turn, the chat session, and the phase machine for the
/// lifetime of the view; destroyed and recreated when the conversation
/// identity changes. All awaits happen on one logical thread of control, so
/// the pipeline has no internal races. Concurrent submissions lose the
/// Idle -> Submitting transition and are rejected.
pub struct PromptOrchestrator {
    conversation_id: ConversationId,
    phase: PhaseMachine,
    draft: InFlightTurn,
    slot: InputSlot,
    session: Mutex<ChatSession>,
    store: Arc<dyn TurnStore>,
    cache: Arc<ConversationCache>,
    replays: ReplayLedger,
    events: broadcast::Sender<PromptEvent>,
    fragment_timeout: Duration,
}

impl PromptOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conversation_id: ConversationId,
        session: ChatSession,
        store: Arc<dyn TurnStore>,
        cache: Arc<ConversationCache>,
        slot: InputSlot,
        replays: ReplayLedger,
        events: broadcast::Sender<PromptEvent>,
        fragment_timeout: Duration,
    ) -> Self {
        Self {
            conversation_id,
            phase: PhaseMachine::new(),
            draft: InFlightTurn::new(),
            slot,
            session: Mutex::new(session),
            store,
            cache,
            replays,
            events,
            fragment_timeout,
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Subscribe to the prompt event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PromptEvent> {
        self.events.subscribe()
    }

    /// Returns the current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase.current()
    }

    /// Whether a new submission would currently be accepted.
    ///
    /// The view uses this to disable the submit affordance; the phase
    /// machine remains the hard guard behind it.
    pub fn can_submit(&self) -> bool {
        self.phase.is_idle()
    }

    /// The question of the in-flight (or last failed) turn.
    pub fn question(&self) -> String {
        self.draft.question()
    }

    /// The accumulated answer of the in-flight (or last failed) turn.
    pub fn answer(&self) -> String {
        self.draft.answer()
    }

    /// Replace the image attachment for the next dispatched turn.
    pub fn attach_image(&self, image: ImageState) {
        self.draft.attach_image(image);
    }

    /// Submit whatever is currently in the input slot as a new question.
    ///
    /// The canonical entry point for typed and spoken input alike. Empty or
    /// whitespace-only input raises the validation alert and changes
    /// nothing; a submission while a turn is in flight is rejected without
    /// an alert.
    pub async fn submit_input(&self) -> Result<()> {
        let question = self.slot.peek().trim().to_string();
        if question.is_empty() {
            debug!("Submission rejected; question is empty");
            self.emit(PromptEvent::AlertRaised {
                message: EMPTY_QUESTION_ALERT.to_string(),
                timestamp: Utc::now(),
            });
            return Err(BanterError::Validation("question is empty".to_string()));
        }

        if self.phase.transition(TurnPhase::Submitting).is_err() {
            debug!(
                phase = %self.phase.current(),
                "Submission rejected; turn already in flight"
            );
            return Err(BanterError::TurnInFlight);
        }

        self.run_turn(question, false).await
    }

    /// Replay a conversation's stored opening message as its first turn.
    ///
    /// Fires when the history holds exactly one stored turn (a freshly
    /// created conversation carrying only the user's opening message), at
    /// most once per conversation id across the process. The stored text is
    /// dispatched without a `QuestionPosted` event and persisted with no
    /// `question` field, since it is already part of the stored document.
    pub async fn replay_opening_message(&self) -> Result<()> {
        let conversation = match self.cache.get(&self.conversation_id).await {
            Some(conversation) => conversation,
            None => self.cache.load(&self.conversation_id).await?,
        };

        if conversation.history.len() != 1 {
            return Ok(());
        }

        if !self.replays.first_visit(&self.conversation_id) {
            debug!(
                conversation_id = %self.conversation_id,
                "Opening message already replayed"
            );
            return Ok(());
        }

        let text = conversation.history[0].first_text().trim().to_string();
        if text.is_empty() {
            debug!(
                conversation_id = %self.conversation_id,
                "Stored opening message is empty; nothing to replay"
            );
            return Ok(());
        }

        if self.phase.transition(TurnPhase::Submitting).is_err() {
            return Err(BanterError::TurnInFlight);
        }

        info!(
            conversation_id = %self.conversation_id,
            "Replaying stored opening message"
        );
        self.run_turn(text, true).await
    }

    /// Drive one dispatched turn to completion.
    ///
    /// Entered with the phase machine in Submitting. Every failure after
    /// this point routes through `fail_turn` so the machine returns to Idle
    /// with the partial question/answer retained.
    async fn run_turn(&self, question: String, replay: bool) -> Result<()> {
        self.draft.begin_turn(&question);
        if !replay {
            self.emit(PromptEvent::QuestionPosted {
                text: question.clone(),
                timestamp: Utc::now(),
            });
        }

        let image = self.draft.image();
        let mut parts = Vec::new();
        if let Some(payload) = image.model_payload() {
            parts.push(TurnPart::InlineImage(payload.clone()));
        }
        parts.push(TurnPart::text(&question));

        self.phase.transition(TurnPhase::Streaming)?;

        let mut rx = {
            let session = self.session.lock().await;
            match session.send_streaming(&parts).await {
                Ok(rx) => rx,
                Err(e) => {
                    self.fail_turn(&e);
                    return Err(e);
                }
            }
        };

        // Drain the stream in arrival order; each wait is bounded.
        loop {
            let next = match timeout(self.fragment_timeout, rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    let e = BanterError::Stream(format!(
                        "No fragment within {}s",
                        self.fragment_timeout.as_secs()
                    ));
                    self.fail_turn(&e);
                    return Err(e);
                }
            };

            match next {
                Some(Ok(delta)) => {
                    let answer_len = self.draft.append_fragment(&delta);
                    self.emit(PromptEvent::AnswerAppended {
                        delta,
                        answer_len,
                        timestamp: Utc::now(),
                    });
                }
                Some(Err(e)) => {
                    self.fail_turn(&e);
                    return Err(e);
                }
                None => break,
            }
        }

        self.phase.transition(TurnPhase::Persisting)?;

        let answer = self.draft.answer();
        {
            let mut session = self.session.lock().await;
            session.record_exchange(&question, &answer);
        }

        let record = TurnRecord::new(
            if replay { None } else { Some(question.clone()) },
            answer.clone(),
        )
        .with_image(image.storage_path().map(str::to_string));

        if let Err(e) = self.store.save_turn(&self.conversation_id, &record).await {
            self.fail_turn(&e);
            return Err(e);
        }

        if let Err(e) = self.cache.invalidate_and_reload(&self.conversation_id).await {
            self.fail_turn(&e);
            return Err(e);
        }

        info!(
            conversation_id = %self.conversation_id,
            question_len = question.len(),
            answer_len = answer.len(),
            "Turn persisted"
        );

        self.draft.reset();
        self.slot.clear();
        self.emit(PromptEvent::TurnPersisted {
            conversation_id: self.conversation_id.clone(),
            timestamp: Utc::now(),
        });
        self.emit(PromptEvent::PromptReset {
            timestamp: Utc::now(),
        });
        self.phase.transition(TurnPhase::Idle)?;
        Ok(())
    }

    /// Abandon the current turn after a failure.
    ///
    /// Raises the single user-visible alert and walks the machine through
    /// Failed back to Idle. The draft and the input slot are left untouched
    /// so the user can see, and resubmit, what failed.
    fn fail_turn(&self, error: &BanterError) {
        warn!(
            conversation_id = %self.conversation_id,
            error = %error,
            "Turn failed"
        );
        self.emit(PromptEvent::AlertRaised {
            message: TURN_FAILED_ALERT.to_string(),
            timestamp: Utc::now(),
        });

        if self.phase.transition(TurnPhase::Failed).is_ok() {
            let _ = self.phase.transition(TurnPhase::Idle);
        } else {
            // Not in a failing phase; force recovery rather than leaving
            // the prompt stuck.
            self.phase.force_idle();
        }
    }

    fn emit(&self, event: PromptEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl SubmitSink for PromptOrchestrator {
    /// Voice completion takes the same path the submit control takes.
    /// Rejections are logged here, never bubbled into the capture session.
    async fn submit_input(&self) {
        if let Err(e) = PromptOrchestrator::submit_input(self).await {
            debug!(error = %e, "Speech-triggered submission rejected");
        }
    }
}
