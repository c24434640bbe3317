//! Mock session host for deterministic testing.
//!
//! Implements [`SessionHost`] without spawning real CLI processes: each
//! accepted start/send command pops the next scripted event batch and emits
//! it into the engine's host channel. All commands are captured for later
//! verification.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::host::error::HostError;
use crate::host::events::CliEvent;
use crate::host::session_host::{SendMessageOptions, SessionHost, StartSessionOptions};
use crate::store::{AgentId, ToolUseId};

/// Failure to inject on the next command.
#[derive(Debug, Clone)]
pub enum MockFailure {
    BinaryNotFound(String),
    SpawnFailed(String),
    NoLiveSession(String),
    Transport(String),
}

impl MockFailure {
    fn into_host_error(self) -> HostError {
        match self {
            MockFailure::BinaryNotFound(msg) => HostError::BinaryNotFound(msg),
            MockFailure::SpawnFailed(msg) => HostError::SpawnFailed(msg),
            MockFailure::NoLiveSession(agent) => HostError::NoLiveSession(agent),
            MockFailure::Transport(msg) => HostError::Transport(msg),
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Event batches, consumed one per accepted start/send command.
    scripts: VecDeque<Vec<CliEvent>>,
    started: Vec<StartSessionOptions>,
    sent: Vec<SendMessageOptions>,
    stopped: Vec<AgentId>,
    fail_next_start: Option<MockFailure>,
    fail_next_send: Option<MockFailure>,
    fail_next_stop: Option<MockFailure>,
    event_delay: Duration,
}

/// Scripted session host.
///
/// Cloneable; clones share scripts and captured state.
#[derive(Clone)]
pub struct MockSessionHost {
    events_tx: mpsc::Sender<CliEvent>,
    inner: Arc<Mutex<Inner>>,
}

impl MockSessionHost {
    /// Create a mock host and the event receiver the engine consumes.
    pub fn new() -> (Self, mpsc::Receiver<CliEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let host = Self {
            events_tx,
            inner: Arc::new(Mutex::new(Inner::default())),
        };
        (host, events_rx)
    }

    /// Queue an event batch to emit on the next accepted start/send command.
    pub fn push_script(&self, events: Vec<CliEvent>) {
        self.inner.lock().scripts.push_back(events);
    }

    /// Delay between emitted events (default zero).
    pub fn set_event_delay(&self, delay: Duration) {
        self.inner.lock().event_delay = delay;
    }

    pub fn fail_next_start(&self, failure: MockFailure) {
        self.inner.lock().fail_next_start = Some(failure);
    }

    pub fn fail_next_send(&self, failure: MockFailure) {
        self.inner.lock().fail_next_send = Some(failure);
    }

    pub fn fail_next_stop(&self, failure: MockFailure) {
        self.inner.lock().fail_next_stop = Some(failure);
    }

    /// Emit an unsolicited event (post-stop stragglers, interleaving tests).
    pub async fn emit(&self, event: CliEvent) {
        let _ = self.events_tx.send(event).await;
    }

    // ── Captured state ──

    pub fn started(&self) -> Vec<StartSessionOptions> {
        self.inner.lock().started.clone()
    }

    pub fn sent(&self) -> Vec<SendMessageOptions> {
        self.inner.lock().sent.clone()
    }

    pub fn stopped(&self) -> Vec<AgentId> {
        self.inner.lock().stopped.clone()
    }

    fn emit_next_script(&self) {
        let (script, delay) = {
            let mut inner = self.inner.lock();
            (inner.scripts.pop_front(), inner.event_delay)
        };
        let Some(events) = script else { return };
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            for event in events {
                if delay > Duration::ZERO {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(event).await.is_err() {
                    break; // Receiver dropped
                }
            }
        });
    }
}

#[async_trait]
impl SessionHost for MockSessionHost {
    async fn start_session(&self, options: StartSessionOptions) -> Result<(), HostError> {
        let failure = {
            let mut inner = self.inner.lock();
            inner.started.push(options);
            inner.fail_next_start.take()
        };
        if let Some(failure) = failure {
            return Err(failure.into_host_error());
        }
        self.emit_next_script();
        Ok(())
    }

    async fn send_message(&self, options: SendMessageOptions) -> Result<(), HostError> {
        let failure = {
            let mut inner = self.inner.lock();
            inner.sent.push(options);
            inner.fail_next_send.take()
        };
        if let Some(failure) = failure {
            return Err(failure.into_host_error());
        }
        self.emit_next_script();
        Ok(())
    }

    async fn stop_session(&self, agent_id: &AgentId) -> Result<(), HostError> {
        let failure = {
            let mut inner = self.inner.lock();
            inner.stopped.push(agent_id.clone());
            inner.fail_next_stop.take()
        };
        if let Some(failure) = failure {
            return Err(failure.into_host_error());
        }
        Ok(())
    }
}

/// Fluent builder for scripted event sequences, all tagged with one agent.
pub struct CliEventBuilder {
    agent_id: AgentId,
    events: Vec<CliEvent>,
}

impl CliEventBuilder {
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            events: Vec::new(),
        }
    }

    pub fn session_id(mut self, session_id: &str) -> Self {
        self.events.push(CliEvent::SessionId {
            agent_id: self.agent_id.clone(),
            session_id: session_id.to_string(),
        });
        self
    }

    pub fn chunk(mut self, text: &str) -> Self {
        self.events.push(CliEvent::StreamChunk {
            agent_id: self.agent_id.clone(),
            text: text.to_string(),
        });
        self
    }

    pub fn complete(mut self, text: &str) -> Self {
        self.events.push(CliEvent::MessageComplete {
            agent_id: self.agent_id.clone(),
            text: text.to_string(),
        });
        self
    }

    pub fn model_info(mut self, model: &str) -> Self {
        self.events.push(CliEvent::ModelInfo {
            agent_id: self.agent_id.clone(),
            model: model.to_string(),
        });
        self
    }

    pub fn usage_info(mut self, input_tokens: u64, output_tokens: u64, cost_usd: f64) -> Self {
        self.events.push(CliEvent::UsageInfo {
            agent_id: self.agent_id.clone(),
            input_tokens,
            output_tokens,
            cost_usd,
        });
        self
    }

    pub fn tool_use(mut self, tool_use_id: &str, tool_name: &str, input: serde_json::Value) -> Self {
        self.events.push(CliEvent::ToolUse {
            agent_id: self.agent_id.clone(),
            tool_use_id: ToolUseId::from_string(tool_use_id),
            tool_name: tool_name.to_string(),
            tool_input: input,
        });
        self
    }

    pub fn tool_result(mut self, tool_use_id: &str, output: &str, is_error: bool) -> Self {
        self.events.push(CliEvent::ToolResult {
            agent_id: self.agent_id.clone(),
            tool_use_id: ToolUseId::from_string(tool_use_id),
            output_preview: output.to_string(),
            is_error,
        });
        self
    }

    pub fn turn_complete(mut self) -> Self {
        self.events.push(CliEvent::TurnComplete {
            agent_id: self.agent_id.clone(),
        });
        self
    }

    pub fn process_exited(mut self, exit_code: Option<i32>) -> Self {
        self.events.push(CliEvent::ProcessExited {
            agent_id: self.agent_id.clone(),
            exit_code,
        });
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        self.events.push(CliEvent::Error {
            agent_id: self.agent_id.clone(),
            message: message.to_string(),
        });
        self
    }

    pub fn build(self) -> Vec<CliEvent> {
        self.events
    }
}
