//! Command dispatcher: thin async wrapper over the session host.
//!
//! Host calls run on spawned tasks so awaiting an acknowledgment never
//! blocks event delivery; rejections re-enter the engine loop as
//! [`EngineMsg::CommandFailed`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::msg::EngineMsg;
use crate::host::{SendMessageOptions, SessionHost, StartSessionOptions};
use crate::store::AgentId;

pub struct CommandDispatcher {
    host: Arc<dyn SessionHost>,
    msg_tx: mpsc::Sender<EngineMsg>,
}

impl CommandDispatcher {
    pub fn new(host: Arc<dyn SessionHost>, msg_tx: mpsc::Sender<EngineMsg>) -> Self {
        Self { host, msg_tx }
    }

    /// Route a prompt to the agent's session: follow-up when one is alive,
    /// fresh start otherwise.
    pub fn dispatch_prompt(
        &self,
        agent_id: AgentId,
        prompt: String,
        project_path: Option<PathBuf>,
        model: Option<String>,
        has_live_session: bool,
    ) {
        let host = Arc::clone(&self.host);
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let result = if has_live_session {
                host.send_message(SendMessageOptions::new(agent_id.clone(), prompt))
                    .await
            } else {
                let mut options = StartSessionOptions::new(agent_id.clone(), prompt);
                if let Some(path) = project_path {
                    options = options.with_project_path(path);
                }
                if let Some(model) = model {
                    options = options.with_model(model);
                }
                host.start_session(options).await
            };

            if let Err(err) = result {
                tracing::warn!(agent = %agent_id, error = %err, "prompt dispatch rejected");
                let _ = msg_tx
                    .send(EngineMsg::CommandFailed {
                        agent_id,
                        message: err.to_string(),
                    })
                    .await;
            }
        });
    }

    /// Ask the host to stop the agent's session. Local state is reconciled
    /// by the caller without waiting; only transport failures come back.
    pub fn dispatch_stop(&self, agent_id: AgentId) {
        let host = Arc::clone(&self.host);
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = host.stop_session(&agent_id).await {
                tracing::warn!(agent = %agent_id, error = %err, "stop dispatch rejected");
                let _ = msg_tx
                    .send(EngineMsg::CommandFailed {
                        agent_id,
                        message: err.to_string(),
                    })
                    .await;
            }
        });
    }
}
