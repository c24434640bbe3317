//! Engine wiring: owns the single instances of the conversation store,
//! session registry, ephemeral UI state, router, and dispatcher, and drives
//! them from one cooperative loop.
//!
//! All state transitions run to completion on this loop, one event or
//! command at a time. The only suspension points are the host command
//! acknowledgments and the tool-banner clear timer, both of which re-enter
//! through the internal message channel instead of mutating state from
//! their own tasks.

pub mod dispatch;
pub mod error;
pub mod msg;

pub use error::EngineError;
pub use msg::EngineMsg;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::engine::dispatch::CommandDispatcher;
use crate::host::{CliEvent, SessionHost};
use crate::projects::{ProjectBookmark, ProjectEntry, ProjectStore};
use crate::router::{EventRouter, UiState};
use crate::store::{AgentId, ChatId, ConversationStore, SessionRegistry, StoreError};

/// User actions accepted by the engine loop.
#[derive(Debug, Clone)]
pub enum Command {
    SendMessage { chat_id: ChatId, text: String },
    StopGeneration { agent_id: AgentId },
    CreateChat { agent_id: AgentId },
    SwitchChat { chat_id: ChatId },
    SwitchAgent { agent_id: AgentId },
    AddProject { path: PathBuf },
    OpenProject { bookmark_id: String },
    CloseAgent { agent_id: AgentId },
    ToggleExpanded { agent_id: AgentId },
    ClearChat { chat_id: ChatId },
    ClearError { agent_id: AgentId },
    Shutdown,
}

/// Cloneable sender half for submitting [`Command`]s to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Submit a command. Returns `false` once the engine has shut down.
    pub async fn send(&self, command: Command) -> bool {
        self.tx.send(command).await.is_ok()
    }
}

pub struct Engine {
    store: ConversationStore,
    registry: SessionRegistry,
    ui: UiState,
    router: EventRouter,
    dispatcher: CommandDispatcher,
    projects: Arc<dyn ProjectStore>,
    bookmarks: Vec<ProjectBookmark>,
    msg_rx: Option<mpsc::Receiver<EngineMsg>>,
    command_rx: Option<mpsc::Receiver<Command>>,
}

impl Engine {
    /// Wire the engine around a session host and bookmark store. A single
    /// instance is created at startup and owns all conversation state.
    pub fn new(host: Arc<dyn SessionHost>, projects: Arc<dyn ProjectStore>) -> (Self, EngineHandle) {
        let (msg_tx, msg_rx) = mpsc::channel(64);
        let (command_tx, command_rx) = mpsc::channel(64);

        let engine = Self {
            store: ConversationStore::new(),
            registry: SessionRegistry::new(),
            ui: UiState::new(),
            router: EventRouter::new(msg_tx.clone()),
            dispatcher: CommandDispatcher::new(host, msg_tx.clone()),
            projects,
            bookmarks: Vec::new(),
            msg_rx: Some(msg_rx),
            command_rx: Some(command_rx),
        };
        (engine, EngineHandle { tx: command_tx })
    }

    /// Provision the default workspace, load bookmarks, and open the
    /// workspace agent with its first chat. Saved projects become bookmarks
    /// only, not open agents.
    pub async fn bootstrap(&mut self) -> Result<(), EngineError> {
        let workspace_path = match self.projects.ensure_default_workspace().await {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(error = %err, "workspace provisioning failed, using default path");
                crate::util::paths::workspace_dir()
            }
        };

        let saved = match self.projects.load_projects().await {
            Ok(projects) => projects,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load saved projects");
                Vec::new()
            }
        };

        self.bookmarks = std::iter::once(ProjectBookmark {
            id: crate::store::WORKSPACE_AGENT_ID.to_string(),
            name: "workspace".to_string(),
            path: workspace_path.clone(),
        })
        .chain(saved.into_iter().map(|p| ProjectBookmark {
            id: p.id,
            name: p.name,
            path: p.path,
        }))
        .collect();

        self.store
            .add_agent(AgentId::workspace(), "workspace", workspace_path)?;
        Ok(())
    }

    // ── Read access for the presentation layer ──

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn bookmarks(&self) -> &[ProjectBookmark] {
        &self.bookmarks
    }

    /// The chat currently rendered: the active chat of the active agent.
    pub fn rendered_chat(&self) -> Option<&ChatId> {
        self.store.focus().rendered_chat()
    }

    // ── Prompt routing ──

    /// Append the user message optimistically and route the prompt to the
    /// owning agent's session. Local state never waits on the host; a
    /// rejection comes back through the internal channel.
    pub fn send_message(
        &mut self,
        chat_id: &ChatId,
        text: impl Into<String>,
    ) -> Result<(), EngineError> {
        let text = text.into();
        let agent_id = self
            .store
            .chat_owner(chat_id)
            .cloned()
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;

        self.store.append_user_message(chat_id, &text)?;
        self.ui.clear_error(&agent_id);
        if self.store.focus().is_rendered(chat_id) {
            self.ui.thinking = true;
        }

        let alive = self.registry.is_alive(&agent_id);
        let project_path = self.store.agent(&agent_id).map(|a| a.project_path.clone());
        self.dispatcher
            .dispatch_prompt(agent_id, text, project_path, None, alive);
        Ok(())
    }

    /// Stop the agent's session. Ephemeral state clears immediately; the
    /// external process may not acknowledge promptly and may keep emitting a
    /// few events, which the router re-clears idempotently.
    pub fn stop_generation(&mut self, agent_id: &AgentId) -> Result<(), EngineError> {
        if self.store.agent(agent_id).is_none() {
            return Err(StoreError::AgentNotFound(agent_id.clone()).into());
        }

        if self.store.focus().is_focused(agent_id) {
            self.ui.reset_ephemeral();
            self.router.cancel_pending_clear();
        }
        self.registry.mark_dead(agent_id);
        self.dispatcher.dispatch_stop(agent_id.clone());
        Ok(())
    }

    // ── Conversation operations ──

    pub fn create_chat(&mut self, agent_id: &AgentId) -> Result<ChatId, EngineError> {
        Ok(self.store.create_chat(agent_id)?)
    }

    pub fn switch_chat(&mut self, chat_id: &ChatId) -> Result<(), EngineError> {
        self.store.switch_chat(chat_id)?;
        Ok(())
    }

    /// Move global focus to an agent. Ephemeral flags reset so a
    /// backgrounded agent's thinking state is never inherited.
    pub fn switch_agent(&mut self, agent_id: &AgentId) -> Result<(), EngineError> {
        if self.store.switch_agent(agent_id)? {
            self.ui.reset_ephemeral();
            self.router.cancel_pending_clear();
        }
        Ok(())
    }

    /// Empty a chat's history and reset the owning agent's session state.
    pub fn clear_chat(&mut self, chat_id: &ChatId) -> Result<(), EngineError> {
        let agent_id = self
            .store
            .chat_owner(chat_id)
            .cloned()
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;

        self.store.clear_chat(chat_id)?;
        self.registry.mark_dead(&agent_id);
        self.ui.clear_error(&agent_id);
        if self.store.focus().is_rendered(chat_id) {
            self.ui.reset_ephemeral();
            self.router.cancel_pending_clear();
        }
        Ok(())
    }

    pub fn toggle_expanded(&mut self, agent_id: &AgentId) -> Result<(), EngineError> {
        Ok(self.store.toggle_expanded(agent_id)?)
    }

    pub fn clear_error(&mut self, agent_id: &AgentId) {
        self.ui.clear_error(agent_id);
    }

    // ── Project / agent lifecycle ──

    /// Open a folder as a project: dedup by path against existing bookmarks,
    /// otherwise bookmark it, open an agent for it, and persist the bookmark
    /// list (workspace excluded) in the background.
    pub fn add_project(&mut self, path: PathBuf) -> Result<AgentId, EngineError> {
        if let Some(existing) = self.bookmarks.iter().find(|b| b.path == path) {
            let id = existing.id.clone();
            return self.open_project(&id);
        }

        let agent_id = AgentId::new();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.bookmarks.push(ProjectBookmark {
            id: agent_id.as_str().to_string(),
            name: name.clone(),
            path: path.clone(),
        });
        self.store.add_agent(agent_id.clone(), name, path)?;
        self.ui.reset_ephemeral();
        self.router.cancel_pending_clear();

        self.persist_bookmarks();
        Ok(agent_id)
    }

    /// Open a bookmarked project: switch to the agent if it is already open,
    /// otherwise reopen it from the bookmark with a fresh chat.
    pub fn open_project(&mut self, bookmark_id: &str) -> Result<AgentId, EngineError> {
        let agent_id = AgentId::from_string(bookmark_id);
        if self.store.agent(&agent_id).is_some() {
            self.switch_agent(&agent_id)?;
            return Ok(agent_id);
        }

        let bookmark = self
            .bookmarks
            .iter()
            .find(|b| b.id == bookmark_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownBookmark(bookmark_id.to_string()))?;

        self.store
            .add_agent(agent_id.clone(), bookmark.name, bookmark.path)?;
        self.ui.reset_ephemeral();
        self.router.cancel_pending_clear();
        Ok(agent_id)
    }

    /// Close an agent card. Its bookmark survives; its session is stopped
    /// if still alive. Rejected for the last remaining agent.
    pub fn close_agent(&mut self, agent_id: &AgentId) -> Result<(), EngineError> {
        let was_focused = self.store.focus().is_focused(agent_id);
        self.store.close_agent(agent_id)?;

        if self.registry.is_alive(agent_id) {
            self.registry.mark_dead(agent_id);
            self.dispatcher.dispatch_stop(agent_id.clone());
        }
        self.ui.clear_error(agent_id);
        if was_focused {
            self.ui.reset_ephemeral();
            self.router.cancel_pending_clear();
        }
        Ok(())
    }

    fn persist_bookmarks(&self) {
        let entries: Vec<ProjectEntry> = self
            .bookmarks
            .iter()
            .filter(|b| b.id != crate::store::WORKSPACE_AGENT_ID)
            .map(|b| ProjectEntry {
                id: b.id.clone(),
                name: b.name.clone(),
                path: b.path.clone(),
                added_at: Utc::now(),
            })
            .collect();

        let projects = Arc::clone(&self.projects);
        tokio::spawn(async move {
            if let Err(err) = projects.save_projects(entries).await {
                tracing::warn!(error = %err, "failed to save project bookmarks");
            }
        });
    }

    // ── Event handling ──

    /// Route one host event. Called from the loop; safe to call directly in
    /// tests.
    pub fn handle_host_event(&mut self, event: CliEvent) {
        self.router
            .route(&mut self.store, &mut self.registry, &mut self.ui, event);
    }

    fn handle_msg(&mut self, msg: EngineMsg) {
        match msg {
            EngineMsg::CommandFailed { agent_id, message } => {
                // Synchronous with respect to the failure: no later host
                // event is needed to clear the spinner.
                if self.store.focus().is_focused(&agent_id) {
                    self.ui.thinking = false;
                }
                self.ui.set_error(agent_id, message);
            }
            EngineMsg::ToolClearElapsed { tool_use_id } => {
                self.router.handle_clear_elapsed(&mut self.ui, &tool_use_id);
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        let result = match command {
            Command::SendMessage { chat_id, text } => self.send_message(&chat_id, text),
            Command::StopGeneration { agent_id } => self.stop_generation(&agent_id),
            Command::CreateChat { agent_id } => self.create_chat(&agent_id).map(|_| ()),
            Command::SwitchChat { chat_id } => self.switch_chat(&chat_id),
            Command::SwitchAgent { agent_id } => self.switch_agent(&agent_id),
            Command::AddProject { path } => self.add_project(path).map(|_| ()),
            Command::OpenProject { bookmark_id } => self.open_project(&bookmark_id).map(|_| ()),
            Command::CloseAgent { agent_id } => self.close_agent(&agent_id),
            Command::ToggleExpanded { agent_id } => self.toggle_expanded(&agent_id),
            Command::ClearChat { chat_id } => self.clear_chat(&chat_id),
            Command::ClearError { agent_id } => {
                self.clear_error(&agent_id);
                Ok(())
            }
            Command::Shutdown => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "command failed");
        }
    }

    /// Drain pending internal messages without blocking. The run loop does
    /// this through `select!`; tests and shutdown paths call it directly.
    pub fn pump_messages(&mut self) {
        loop {
            let msg = match self.msg_rx.as_mut() {
                Some(rx) => match rx.try_recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
                None => break,
            };
            self.handle_msg(msg);
        }
    }

    /// Drive the engine until shutdown: host events, user commands, and
    /// internal messages, strictly one at a time in arrival order.
    ///
    /// The host event subscription is acquired here and released when the
    /// loop ends; it is independent of any view's lifetime.
    pub async fn run(mut self, mut host_events: mpsc::Receiver<CliEvent>) {
        let Some(mut msg_rx) = self.msg_rx.take() else {
            tracing::error!("engine run() called twice");
            return;
        };
        let Some(mut command_rx) = self.command_rx.take() else {
            tracing::error!("engine run() called twice");
            return;
        };

        loop {
            tokio::select! {
                event = host_events.recv() => match event {
                    Some(event) => self.handle_host_event(event),
                    None => break,
                },
                msg = msg_rx.recv() => match msg {
                    Some(msg) => self.handle_msg(msg),
                    None => break,
                },
                command = command_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }

        tracing::debug!("engine loop stopped");
    }
}
