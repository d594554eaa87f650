//! VizManager - actor that owns every session's render state
//!
//! Pages never touch session state directly; each request sends a command and
//! waits for the actor's reply, so a change to one session cannot reach another.

use std::collections::{HashMap, VecDeque};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use super::document::{Session, VizDocument};
use super::messages::{BindError, SelectorChange, SessionId, VizApp, VizCommand, VizResponse};

/// Handle to send commands to the VizManager
#[derive(Clone)]
pub struct VizManager {
    tx: mpsc::Sender<VizCommand>,
}

impl VizManager {
    /// Spawn the actor on the current runtime
    pub fn spawn(max_sessions: usize) -> Self {
        debug!(max_sessions, "spawn: called");
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(Sessions::new(max_sessions), rx));
        info!("VizManager spawned");
        Self { tx }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<VizResponse<T>>) -> VizCommand) -> VizResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| BindError::ChannelError)?;
        reply_rx.await.map_err(|_| BindError::ChannelError)?
    }

    /// Open a session and render its initial document
    pub async fn open(&self, app: VizApp) -> VizResponse<(SessionId, VizDocument)> {
        debug!(app = app.name(), "open: called");
        self.request(|reply| VizCommand::Open { app, reply }).await
    }

    pub async fn render(&self, id: SessionId) -> VizResponse<VizDocument> {
        debug!(%id, "render: called");
        self.request(|reply| VizCommand::Render { id, reply }).await
    }

    /// Apply a selector change and render the updated document
    pub async fn select(&self, id: SessionId, change: SelectorChange) -> VizResponse<VizDocument> {
        debug!(%id, ?change, "select: called");
        self.request(|reply| VizCommand::Select { id, change, reply }).await
    }

    pub async fn close(&self, id: SessionId) -> VizResponse<()> {
        debug!(%id, "close: called");
        self.request(|reply| VizCommand::Close { id, reply }).await
    }

    /// Shutdown the VizManager
    pub async fn shutdown(&self) -> VizResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(VizCommand::Shutdown)
            .await
            .map_err(|_| BindError::ChannelError)
    }
}

/// Open sessions, oldest first
struct Sessions {
    max: usize,
    by_id: HashMap<SessionId, Session>,
    order: VecDeque<SessionId>,
}

impl Sessions {
    fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            by_id: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, session: Session) -> SessionId {
        while self.by_id.len() >= self.max {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            debug!(%oldest, "Sessions::insert: evicting oldest session");
            self.by_id.remove(&oldest);
        }
        let id = Uuid::now_v7();
        self.by_id.insert(id, session);
        self.order.push_back(id);
        id
    }

    fn get(&self, id: SessionId) -> Result<&Session, BindError> {
        self.by_id.get(&id).ok_or(BindError::UnknownSession(id))
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut Session, BindError> {
        self.by_id.get_mut(&id).ok_or(BindError::UnknownSession(id))
    }

    fn remove(&mut self, id: SessionId) -> Result<(), BindError> {
        self.by_id.remove(&id).ok_or(BindError::UnknownSession(id))?;
        self.order.retain(|s| *s != id);
        Ok(())
    }
}

async fn actor_loop(mut sessions: Sessions, mut rx: mpsc::Receiver<VizCommand>) {
    debug!("VizManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            VizCommand::Open { app, reply } => {
                debug!(app = app.name(), "actor_loop: Open command");
                let result = Session::open(app).and_then(|session| {
                    let id = sessions.insert(session);
                    let doc = sessions.get(id)?.render(id)?;
                    Ok((id, doc))
                });
                let _ = reply.send(result);
            }

            VizCommand::Render { id, reply } => {
                debug!(%id, "actor_loop: Render command");
                let _ = reply.send(sessions.get(id).and_then(|s| s.render(id)));
            }

            VizCommand::Select { id, change, reply } => {
                debug!(%id, selector = change.name(), "actor_loop: Select command");
                let result = sessions.get_mut(id).and_then(|s| {
                    s.apply(change)?;
                    s.render(id)
                });
                let _ = reply.send(result);
            }

            VizCommand::Close { id, reply } => {
                debug!(%id, "actor_loop: Close command");
                let _ = reply.send(sessions.remove(id));
            }

            VizCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!(open_sessions = sessions.by_id.len(), "VizManager shutting down");
                break;
            }
        }
    }

    debug!("VizManager actor stopped");
}
