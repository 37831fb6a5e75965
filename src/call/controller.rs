use super::events::{CallEvent, TranscriptKind};
use super::transport::{CallTransport, TransportError};
use crate::report::{Report, ReportSynthesisPipeline, SynthesisError};
use crate::session::{Session, Speaker, TranscriptAggregator, Utterance};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Lifecycle stage of the realtime voice connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    Idle,
    Connecting,
    Active,
    Ending,
    Ended,
    Failed,
}

#[derive(Error, Debug)]
pub enum CallError {
    #[error("call is already {0:?}; start is only valid from idle or failed")]
    AlreadyStarted(CallState),

    #[error("stop is only valid from active (current state: {0:?})")]
    NotActive(CallState),

    #[error("reset is only valid from failed (current state: {0:?})")]
    NotFailed(CallState),

    #[error("generation backend credential is not configured")]
    MissingCredential,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Observable snapshot of a live call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStatus {
    pub session_id: String,
    pub state: CallState,
    pub elapsed_secs: u64,
    pub current_speaker: Option<Speaker>,
    pub transcript_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a completed `stop()`: the call reached `ended`, with
/// whatever the synthesis pipeline produced. A synthesis failure is a
/// value here, never a reason to abort the shutdown.
#[derive(Debug)]
pub struct StopOutcome {
    pub duration_secs: u64,
    pub report: Option<Report>,
    pub synthesis_error: Option<SynthesisError>,
}

/// State shared between the controller and its event/timer tasks.
struct CallShared {
    session_id: String,
    state: Mutex<CallState>,
    aggregator: Mutex<TranscriptAggregator>,
    current_speaker: Mutex<Option<Speaker>>,
    elapsed_secs: AtomicU64,
    last_error: Mutex<Option<String>>,
    timer_task: Mutex<Option<JoinHandle<()>>>,
}

impl CallShared {
    /// Single dispatch entry point for every transport event. Runs on the
    /// event task; transitions are serialized by event-delivery order.
    async fn dispatch(shared: &Arc<Self>, event: CallEvent) {
        match event {
            CallEvent::CallStart => Self::on_call_start(shared).await,
            CallEvent::CallEnd => shared.on_call_end().await,
            CallEvent::SpeechStart { speaker } => {
                if shared.is_active().await {
                    *shared.current_speaker.lock().await = Some(speaker);
                }
            }
            CallEvent::SpeechEnd { speaker } => {
                let mut current = shared.current_speaker.lock().await;
                if *current == Some(speaker) {
                    *current = None;
                }
            }
            CallEvent::Transcript {
                speaker,
                transcript_type,
                text,
            } => shared.on_transcript(speaker, transcript_type, text).await,
            CallEvent::Error { message } => shared.fail(message).await,
        }
    }

    async fn is_active(&self) -> bool {
        *self.state.lock().await == CallState::Active
    }

    async fn on_call_start(shared: &Arc<Self>) {
        {
            let mut state = shared.state.lock().await;
            if *state != CallState::Connecting {
                warn!(
                    "Ignoring call-start for session {} in state {:?}",
                    shared.session_id, *state
                );
                return;
            }
            *state = CallState::Active;
        }

        shared.elapsed_secs.store(0, Ordering::SeqCst);
        Self::start_timer(shared).await;

        info!("Call active for session {}", shared.session_id);
    }

    async fn on_call_end(&self) {
        // The remote side hung up. The lifecycle still completes through
        // stop(); here the live-duration ticker stops and speaker state
        // clears, since nobody is on the call anymore.
        self.stop_timer().await;
        *self.current_speaker.lock().await = None;

        info!("Remote call-end received for session {}", self.session_id);
    }

    async fn on_transcript(&self, speaker: Speaker, kind: TranscriptKind, text: String) {
        if !self.is_active().await {
            warn!(
                "Ignoring transcript event for session {} outside active call",
                self.session_id
            );
            return;
        }

        let mut aggregator = self.aggregator.lock().await;
        match kind {
            TranscriptKind::Partial => aggregator.set_partial(speaker, text),
            TranscriptKind::Final => aggregator.append_final(Utterance::new(speaker, text)),
        }
    }

    /// Transport failure while connecting or active: move to `failed`,
    /// clear timers, and keep the message for the caller. Never panics out
    /// of the event task.
    async fn fail(&self, message: String) {
        {
            let mut state = self.state.lock().await;
            match *state {
                CallState::Connecting | CallState::Active => *state = CallState::Failed,
                _ => return,
            }
        }

        self.stop_timer().await;
        *self.current_speaker.lock().await = None;
        *self.last_error.lock().await = Some(message.clone());

        error!("Call failed for session {}: {}", self.session_id, message);
    }

    /// 1-second elapsed-duration ticker, owned here and cleared on every
    /// path out of `active`.
    async fn start_timer(shared: &Arc<Self>) {
        let ticker = Arc::clone(shared);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                ticker.elapsed_secs.fetch_add(1, Ordering::SeqCst);
            }
        });

        let mut slot = shared.timer_task.lock().await;
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }

    async fn stop_timer(&self) {
        if let Some(task) = self.timer_task.lock().await.take() {
            task.abort();
        }
    }
}

/// Owns the call state machine for one consultation session.
///
/// Exactly one controller exists per active call; transport events are
/// processed in delivery order by a single event task, and `start`/`stop`
/// guard their transitions with the state lock, so out-of-state calls are
/// typed no-op errors rather than mutations.
pub struct CallSessionController {
    session: Session,
    shared: Arc<CallShared>,
    transport: Mutex<Box<dyn CallTransport>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
    pipeline: Arc<ReportSynthesisPipeline>,
}

impl CallSessionController {
    pub fn new(
        session: Session,
        transport: Box<dyn CallTransport>,
        pipeline: Arc<ReportSynthesisPipeline>,
    ) -> Self {
        let shared = Arc::new(CallShared {
            session_id: session.id.clone(),
            state: Mutex::new(CallState::Idle),
            aggregator: Mutex::new(TranscriptAggregator::new()),
            current_speaker: Mutex::new(None),
            elapsed_secs: AtomicU64::new(0),
            last_error: Mutex::new(None),
            timer_task: Mutex::new(None),
        });

        Self {
            session,
            shared,
            transport: Mutex::new(transport),
            event_task: Mutex::new(None),
            pipeline,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Open the call. Valid from `idle` or `failed`; requires a configured
    /// generation-backend credential so the session can always be
    /// summarized once it completes.
    pub async fn start(&self) -> Result<(), CallError> {
        if !self.pipeline.backend_configured() {
            return Err(CallError::MissingCredential);
        }

        {
            let mut state = self.shared.state.lock().await;
            match *state {
                CallState::Idle | CallState::Failed => *state = CallState::Connecting,
                other => return Err(CallError::AlreadyStarted(other)),
            }
        }

        info!("Starting call for session {}", self.session.id);

        self.shared.elapsed_secs.store(0, Ordering::SeqCst);
        *self.shared.last_error.lock().await = None;

        let mut event_rx = {
            let mut transport = self.transport.lock().await;
            match transport.open().await {
                Ok(rx) => rx,
                Err(e) => {
                    *self.shared.state.lock().await = CallState::Failed;
                    *self.shared.last_error.lock().await = Some(e.to_string());
                    return Err(CallError::Transport(e));
                }
            }
        };

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                CallShared::dispatch(&shared, event).await;
            }

            // Stream closed. During stop() the state is already `ending`;
            // anything earlier means the transport died under us.
            let state = *shared.state.lock().await;
            if state == CallState::Connecting || state == CallState::Active {
                shared
                    .fail("call transport closed unexpectedly".to_string())
                    .await;
            }
        });

        let mut slot = self.event_task.lock().await;
        if let Some(old) = slot.replace(task) {
            old.abort();
        }

        Ok(())
    }

    /// Finalize the call. Valid from `active` only: stops the transport,
    /// clears the duration timer, runs report synthesis if there is
    /// anything to summarize, and lands in the terminal `ended` state.
    pub async fn stop(&self) -> Result<StopOutcome, CallError> {
        {
            let mut state = self.shared.state.lock().await;
            if *state != CallState::Active {
                return Err(CallError::NotActive(*state));
            }
            *state = CallState::Ending;
        }

        info!("Stopping call for session {}", self.session.id);

        if let Err(e) = self.transport.lock().await.close().await {
            warn!("Failed to close call transport: {}", e);
        }

        if let Some(task) = self.event_task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Call event task panicked: {}", e);
            }
        }

        self.shared.stop_timer().await;
        *self.shared.current_speaker.lock().await = None;

        let transcript = self.shared.aggregator.lock().await.snapshot().to_vec();
        let duration_secs = self.shared.elapsed_secs.load(Ordering::SeqCst);

        let (report, synthesis_error) = if transcript.is_empty() {
            info!(
                "Transcript empty for session {}; skipping report synthesis",
                self.session.id
            );
            (None, None)
        } else {
            let session = Session {
                transcript,
                ..self.session.clone()
            };

            match self.pipeline.generate(&session).await {
                Ok(report) => (Some(report), None),
                Err(e) => {
                    error!(
                        "Report synthesis failed for session {}: {}",
                        self.session.id, e
                    );
                    (None, Some(e))
                }
            }
        };

        *self.shared.state.lock().await = CallState::Ended;

        info!(
            "Call ended for session {} after {}s",
            self.session.id, duration_secs
        );

        Ok(StopOutcome {
            duration_secs,
            report,
            synthesis_error,
        })
    }

    /// Explicit reset of a failed call back to `idle` for a fresh attempt.
    /// `ended` is terminal and stays that way.
    pub async fn reset(&self) -> Result<(), CallError> {
        {
            let mut state = self.shared.state.lock().await;
            if *state != CallState::Failed {
                return Err(CallError::NotFailed(*state));
            }
            *state = CallState::Idle;
        }

        self.shared.stop_timer().await;
        self.shared.elapsed_secs.store(0, Ordering::SeqCst);
        *self.shared.current_speaker.lock().await = None;
        *self.shared.last_error.lock().await = None;
        self.shared.aggregator.lock().await.clear();

        info!("Call reset to idle for session {}", self.session.id);

        Ok(())
    }

    pub async fn state(&self) -> CallState {
        *self.shared.state.lock().await
    }

    /// Current in-progress (partial) text for a speaker, or empty.
    pub async fn peek_partial(&self, speaker: Speaker) -> String {
        self.shared
            .aggregator
            .lock()
            .await
            .peek_partial(speaker)
            .to_string()
    }

    /// Finalized utterances collected so far, in emission order.
    pub async fn transcript(&self) -> Vec<Utterance> {
        self.shared.aggregator.lock().await.snapshot().to_vec()
    }

    pub async fn status(&self) -> CallStatus {
        CallStatus {
            session_id: self.session.id.clone(),
            state: *self.shared.state.lock().await,
            elapsed_secs: self.shared.elapsed_secs.load(Ordering::SeqCst),
            current_speaker: *self.shared.current_speaker.lock().await,
            transcript_len: self.shared.aggregator.lock().await.len(),
            error: self.shared.last_error.lock().await.clone(),
        }
    }
}
