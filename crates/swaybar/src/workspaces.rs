//! Workspace state for one output

use tracing::{debug, warn};

use crate::ipc::{EventType, IpcClient, IpcError, WorkspaceReply};

/// A workspace as shown on the bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Workspace number; -1 for named workspaces without one
    pub num: i32,
    pub name: String,
    pub focused: bool,
    pub visible: bool,
    pub urgent: bool,
}

impl From<WorkspaceReply> for Workspace {
    fn from(reply: WorkspaceReply) -> Self {
        Self {
            num: reply.num,
            name: reply.name,
            focused: reply.focused,
            visible: reply.visible,
            urgent: reply.urgent,
        }
    }
}

/// The workspaces on this bar's output, in compositor order
///
/// Rebuilt from scratch on every refresh; nothing is patched incrementally.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceCache {
    output: String,
    workspaces: Vec<Workspace>,
}

impl WorkspaceCache {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            workspaces: Vec::new(),
        }
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Replace the cache with the workspaces in a `get_workspaces` reply
    ///
    /// Keeps elements whose `output` is this bar's output, in reply order.
    /// A reply that is not a JSON array of workspace objects leaves the
    /// cache empty.
    pub fn rebuild(&mut self, json: &str) {
        self.workspaces.clear();

        let replies: Vec<WorkspaceReply> = match serde_json::from_str(json) {
            Ok(replies) => replies,
            Err(e) => {
                warn!(error = %e, "Ignoring unparseable workspace list");
                return;
            }
        };

        self.workspaces = replies
            .into_iter()
            .filter(|reply| reply.output == self.output)
            .map(Workspace::from)
            .collect();

        debug!(
            output = %self.output,
            count = self.workspaces.len(),
            "Workspace cache rebuilt"
        );
    }

    /// Query the compositor and rebuild the cache
    ///
    /// Workspace events that queued up while waiting are dropped; the reply
    /// already reflects them.
    ///
    /// # Errors
    ///
    /// Returns transport errors from the client. A malformed reply is not an
    /// error.
    pub async fn refresh(&mut self, client: &mut IpcClient) -> Result<(), IpcError> {
        let json = client.get_workspaces().await?;
        self.rebuild(&json);

        let dropped = client.discard_events(EventType::Workspace);
        if dropped > 0 {
            debug!(dropped, "Dropped workspace events superseded by refresh");
        }
        Ok(())
    }
}
