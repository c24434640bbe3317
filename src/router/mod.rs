//! Event router: demultiplexes the tagged host event stream into the
//! correct chat's message history.
//!
//! Every event carries its originating agent id. Routing resolves
//! `agent → active chat` first and only then touches shared state, so
//! interleaved events from concurrently running sessions stay isolated.
//! Message-list effects apply regardless of focus; ephemeral flags
//! (thinking indicator, tool banner) only when the resolved chat is the
//! one currently rendered. Events are handled strictly one at a time, in
//! arrival order, each transition running to completion.

pub mod ui_state;

pub use ui_state::UiState;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::engine::msg::EngineMsg;
use crate::host::CliEvent;
use crate::store::{ConversationStore, SessionRegistry, StoreError, ToolActivity, ToolUseId};

/// How long a finished tool invocation stays in the banner before clearing.
/// Debounces the banner between consecutive tool calls to avoid flicker.
pub const TOOL_CLEAR_DELAY: Duration = Duration::from_millis(1500);

struct PendingClear {
    tool_use_id: ToolUseId,
    abort: AbortHandle,
}

pub struct EventRouter {
    msg_tx: mpsc::Sender<EngineMsg>,
    clear_delay: Duration,
    pending_clear: Option<PendingClear>,
}

impl EventRouter {
    pub fn new(msg_tx: mpsc::Sender<EngineMsg>) -> Self {
        Self {
            msg_tx,
            clear_delay: TOOL_CLEAR_DELAY,
            pending_clear: None,
        }
    }

    /// Apply one host event to the stores and ephemeral state.
    pub fn route(
        &mut self,
        store: &mut ConversationStore,
        registry: &mut SessionRegistry,
        ui: &mut UiState,
        event: CliEvent,
    ) {
        let agent_id = event.agent_id().clone();

        // An agent with no chats cannot receive output. Transient focus-switch
        // race, not a user-visible failure.
        let Some(chat_id) = store.focus().active_chat(&agent_id).cloned() else {
            tracing::debug!(
                agent = %agent_id,
                event = event.event_type_name(),
                "dropping event for agent with no active chat"
            );
            return;
        };
        let is_focused = store.focus().is_rendered(&chat_id);

        let result = match event {
            CliEvent::SessionId { session_id, .. } => {
                tracing::debug!(agent = %agent_id, session = %session_id, "session alive");
                registry.mark_alive(agent_id.clone());
                Ok(())
            }

            CliEvent::StreamChunk { text, .. } => {
                let result = store.apply_stream_chunk(&chat_id, text);
                if is_focused {
                    ui.thinking = true;
                }
                result
            }

            CliEvent::MessageComplete { text, .. } => store.apply_message_complete(&chat_id, text),

            CliEvent::ModelInfo { model, .. } => {
                store.record_model(&agent_id, model);
                Ok(())
            }

            CliEvent::UsageInfo {
                input_tokens,
                output_tokens,
                cost_usd,
                ..
            } => {
                store.record_usage(
                    &agent_id,
                    crate::store::UsageTotals {
                        input_tokens,
                        output_tokens,
                        cost_usd,
                    },
                );
                Ok(())
            }

            CliEvent::ToolUse {
                tool_use_id,
                tool_name,
                tool_input,
                ..
            } => {
                let activity = ToolActivity::open(tool_use_id, tool_name, tool_input);
                tracing::debug!(
                    agent = %agent_id,
                    label = %crate::host::display::activity_label(&activity),
                    "tool started"
                );
                let result = store.append_tool_use(&chat_id, activity.clone()).map(|_| ());
                if is_focused {
                    self.cancel_pending_clear();
                    ui.tool_activity = Some(activity);
                }
                result
            }

            CliEvent::ToolResult {
                tool_use_id,
                output_preview,
                is_error,
                ..
            } => {
                let result = store
                    .close_tool_result(&chat_id, &tool_use_id, output_preview, is_error)
                    .map(|_| ());
                if is_focused {
                    self.arm_clear_timer(tool_use_id);
                }
                result
            }

            CliEvent::TurnComplete { .. } => {
                let result = store.finalize_streaming_tail(&chat_id).map(|_| ());
                if is_focused {
                    ui.thinking = false;
                    ui.tool_activity = None;
                    self.cancel_pending_clear();
                }
                result
            }

            CliEvent::ProcessExited { exit_code, .. } => {
                tracing::debug!(agent = %agent_id, ?exit_code, "session process exited");
                let result = store.finalize_streaming_tail(&chat_id).map(|_| ());
                registry.mark_dead(&agent_id);
                if is_focused {
                    ui.thinking = false;
                    ui.tool_activity = None;
                    self.cancel_pending_clear();
                }
                result
            }

            CliEvent::Error { message, .. } => {
                // Buffered on the agent even when backgrounded; surfaced when
                // that agent regains focus.
                ui.set_error(agent_id.clone(), message);
                if is_focused {
                    ui.thinking = false;
                }
                Ok(())
            }
        };

        if let Err(err) = result {
            self.warn_route_miss(&agent_id, err);
        }
    }

    /// Clear the tool banner if it still shows the invocation the timer was
    /// armed for. Later invocations win.
    pub fn handle_clear_elapsed(&mut self, ui: &mut UiState, tool_use_id: &ToolUseId) {
        if self
            .pending_clear
            .as_ref()
            .is_some_and(|p| &p.tool_use_id == tool_use_id)
        {
            self.pending_clear = None;
        }
        if ui
            .tool_activity
            .as_ref()
            .is_some_and(|a| &a.tool_use_id == tool_use_id)
        {
            ui.tool_activity = None;
        }
    }

    /// Abort any armed clear timer.
    pub fn cancel_pending_clear(&mut self) {
        if let Some(pending) = self.pending_clear.take() {
            pending.abort.abort();
        }
    }

    /// Arm (or re-arm) the single-shot clear timer for this invocation id.
    fn arm_clear_timer(&mut self, tool_use_id: ToolUseId) {
        self.cancel_pending_clear();

        let tx = self.msg_tx.clone();
        let delay = self.clear_delay;
        let id = tool_use_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx
                .send(EngineMsg::ToolClearElapsed { tool_use_id: id })
                .await;
        });
        self.pending_clear = Some(PendingClear {
            tool_use_id,
            abort: task.abort_handle(),
        });
    }

    fn warn_route_miss(&self, agent_id: &crate::store::AgentId, err: StoreError) {
        tracing::warn!(agent = %agent_id, error = %err, "event transition failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CliEventBuilder;
    use crate::store::AgentId;
    use serde_json::json;
    use std::path::PathBuf;

    struct Fixture {
        store: ConversationStore,
        registry: SessionRegistry,
        ui: UiState,
        router: EventRouter,
        msg_rx: mpsc::Receiver<EngineMsg>,
        agent: AgentId,
    }

    fn fixture() -> Fixture {
        let (msg_tx, msg_rx) = mpsc::channel(16);
        let mut store = ConversationStore::new();
        let agent = AgentId::workspace();
        store
            .add_agent(agent.clone(), "workspace", PathBuf::from("/ws"))
            .unwrap();
        Fixture {
            store,
            registry: SessionRegistry::new(),
            ui: UiState::new(),
            router: EventRouter::new(msg_tx),
            msg_rx,
            agent,
        }
    }

    impl Fixture {
        fn route_all(&mut self, events: Vec<CliEvent>) {
            for event in events {
                self.router
                    .route(&mut self.store, &mut self.registry, &mut self.ui, event);
            }
        }

        fn rendered_chat(&self) -> crate::store::ChatId {
            self.store.focus().rendered_chat().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn session_id_marks_alive() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone()).session_id("s1").build();
        fx.route_all(events);
        assert!(fx.registry.is_alive(&fx.agent));
    }

    #[tokio::test]
    async fn chunks_replace_and_set_thinking() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .chunk("He")
            .chunk("Hello")
            .build();
        fx.route_all(events);

        let chat = fx.rendered_chat();
        let messages = fx.store.messages(&chat);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello");
        assert!(fx.ui.thinking);
    }

    #[tokio::test]
    async fn turn_complete_clears_thinking_and_finalizes() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .chunk("Hello")
            .turn_complete()
            .build();
        fx.route_all(events);

        let chat = fx.rendered_chat();
        assert!(!fx.store.messages(&chat)[0].streaming);
        assert!(!fx.ui.thinking);
        assert!(fx.ui.tool_activity.is_none());
    }

    #[tokio::test]
    async fn process_exited_marks_dead_and_finalizes() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .session_id("s1")
            .chunk("partial")
            .process_exited(Some(0))
            .build();
        fx.route_all(events);

        assert!(!fx.registry.is_alive(&fx.agent));
        let chat = fx.rendered_chat();
        assert!(!fx.store.messages(&chat)[0].streaming);
        assert!(!fx.ui.thinking);
    }

    #[tokio::test]
    async fn tool_use_sets_banner_when_focused() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .chunk("working")
            .tool_use("t1", "Read", json!({"file_path": "/x/y.txt"}))
            .build();
        fx.route_all(events);

        let banner = fx.ui.tool_activity.as_ref().unwrap();
        assert_eq!(banner.tool_use_id.as_str(), "t1");
        let chat = fx.rendered_chat();
        assert_eq!(fx.store.messages(&chat)[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn background_tool_use_leaves_banner_alone() {
        let mut fx = fixture();
        let background = fx.agent.clone();
        // Focus moves to a second agent; `background` keeps emitting.
        fx.store.create_agent("proj", PathBuf::from("/proj"));

        let events = CliEventBuilder::new(background.clone())
            .chunk("working")
            .tool_use("t1", "Read", json!({"file_path": "/x/y.txt"}))
            .build();
        fx.route_all(events);

        assert!(fx.ui.tool_activity.is_none());
        assert!(!fx.ui.thinking);
        let chat = fx.store.focus().active_chat(&background).unwrap().clone();
        assert_eq!(fx.store.messages(&chat)[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn events_for_unknown_agent_are_dropped() {
        let mut fx = fixture();
        let stranger = AgentId::from_string("ghost");
        let events = CliEventBuilder::new(stranger.clone())
            .session_id("s9")
            .chunk("hello")
            .build();
        fx.route_all(events);

        // Nothing changed anywhere.
        assert!(!fx.registry.is_alive(&stranger));
        let chat = fx.rendered_chat();
        assert!(fx.store.messages(&chat).is_empty());
    }

    #[tokio::test]
    async fn focused_error_clears_thinking_and_buffers() {
        let mut fx = fixture();
        fx.ui.thinking = true;
        let events = CliEventBuilder::new(fx.agent.clone())
            .error("rate limited")
            .build();
        fx.route_all(events);

        assert!(!fx.ui.thinking);
        assert_eq!(fx.ui.error_for(&fx.agent), Some("rate limited"));
    }

    #[tokio::test]
    async fn background_error_is_buffered_without_touching_thinking() {
        let mut fx = fixture();
        let background = fx.agent.clone();
        fx.store.create_agent("proj", PathBuf::from("/proj"));
        fx.ui.thinking = true;

        let events = CliEventBuilder::new(background.clone())
            .error("spawn failed")
            .build();
        fx.route_all(events);

        assert!(fx.ui.thinking);
        assert_eq!(fx.ui.error_for(&background), Some("spawn failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn tool_result_arms_delayed_clear() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .chunk("working")
            .tool_use("t1", "Bash", json!({"command": "ls"}))
            .tool_result("t1", "ok", false)
            .build();
        fx.route_all(events);

        // Result arrived; banner still shows t1 until the timer fires.
        assert!(fx.ui.tool_activity.is_some());

        tokio::time::sleep(TOOL_CLEAR_DELAY + Duration::from_millis(100)).await;
        let msg = fx.msg_rx.recv().await.unwrap();
        match msg {
            EngineMsg::ToolClearElapsed { tool_use_id } => {
                fx.router.handle_clear_elapsed(&mut fx.ui, &tool_use_id);
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(fx.ui.tool_activity.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn next_tool_use_cancels_pending_clear() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .chunk("working")
            .tool_use("t1", "Bash", json!({"command": "ls"}))
            .tool_result("t1", "ok", false)
            .tool_use("t2", "Read", json!({"file_path": "/x"}))
            .build();
        fx.route_all(events);

        // The t1 timer was aborted before firing; banner shows t2 and never
        // flashes to empty.
        tokio::time::sleep(TOOL_CLEAR_DELAY + Duration::from_millis(100)).await;
        assert!(fx.msg_rx.try_recv().is_err());
        assert_eq!(
            fx.ui.tool_activity.as_ref().unwrap().tool_use_id.as_str(),
            "t2"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_clear_elapsed_is_a_noop() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .chunk("working")
            .tool_use("t2", "Read", json!({}))
            .build();
        fx.route_all(events);

        // A clear for an invocation no longer in the banner does nothing.
        fx.router
            .handle_clear_elapsed(&mut fx.ui, &ToolUseId::from_string("t1"));
        assert_eq!(
            fx.ui.tool_activity.as_ref().unwrap().tool_use_id.as_str(),
            "t2"
        );
    }

    #[tokio::test]
    async fn model_and_usage_update_agent_metadata() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .model_info("claude-sonnet-4-5")
            .usage_info(120, 40, 0.02)
            .build();
        fx.route_all(events);

        let agent = fx.store.agent(&fx.agent).unwrap();
        assert_eq!(agent.model.as_deref(), Some("claude-sonnet-4-5"));
        assert_eq!(agent.usage.output_tokens, 40);
    }

    #[tokio::test]
    async fn post_stop_stragglers_are_idempotent() {
        let mut fx = fixture();
        let events = CliEventBuilder::new(fx.agent.clone())
            .session_id("s1")
            .chunk("Hello")
            .process_exited(None)
            .turn_complete()
            .process_exited(None)
            .build();
        fx.route_all(events);

        assert!(!fx.registry.is_alive(&fx.agent));
        let chat = fx.rendered_chat();
        assert_eq!(fx.store.messages(&chat).len(), 1);
        assert!(!fx.ui.thinking);
    }
}
