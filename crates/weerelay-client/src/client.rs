//! Client wiring: config -> registry -> pipeline task -> handle.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use weerelay_proto::{RelayError, Result};

use crate::config::RelayConfig;
use crate::dispatch::{EventHandler, EventRegistry};
use crate::obs::PipelineMetrics;
use crate::session::{Session, SessionChange};
use crate::transport::{commands, conn, RelayTransport, TcpTransport};

/// Outbound command queue depth.
const COMMAND_QUEUE: usize = 64;
/// Change-descriptor queue depth per connection.
const CHANGE_QUEUE: usize = 1024;

/// Builder for one relay connection.
pub struct RelayClient {
    cfg: RelayConfig,
    registry: EventRegistry,
    metrics: Arc<PipelineMetrics>,
}

impl RelayClient {
    pub fn new(cfg: RelayConfig) -> Result<RelayClient> {
        cfg.validate()?;
        Ok(RelayClient {
            cfg,
            registry: EventRegistry::with_builtin(),
            metrics: Arc::new(PipelineMetrics::new()),
        })
    }

    /// Install an additional event handler before connecting.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.registry.register(handler);
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Connect over TCP and start the pipeline.
    pub async fn connect(self) -> Result<ClientHandle> {
        let transport = TcpTransport::connect(&self.cfg.relay.address).await?;
        Ok(self.run_with(transport))
    }

    /// Start the pipeline over a caller-supplied transport.
    pub fn run_with<T: RelayTransport + 'static>(self, transport: T) -> ClientHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (change_tx, change_rx) = mpsc::channel(CHANGE_QUEUE);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Session::default()));

        let registry = Arc::new(self.registry);
        let metrics = Arc::clone(&self.metrics);
        let task = tokio::spawn(conn::run_session(
            self.cfg,
            transport,
            registry,
            metrics,
            cmd_rx,
            snapshot_tx,
            change_tx,
        ));

        ClientHandle {
            commands: cmd_tx,
            snapshots: snapshot_rx,
            changes: change_rx,
            task,
        }
    }
}

/// Read side of a running connection.
///
/// Snapshots and change descriptors are read-only views; all session writes
/// happen inside the pipeline task.
pub struct ClientHandle {
    commands: mpsc::Sender<String>,
    snapshots: watch::Receiver<Arc<Session>>,
    changes: mpsc::Receiver<SessionChange>,
    task: JoinHandle<Result<()>>,
}

impl ClientHandle {
    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Session> {
        self.snapshots.borrow().clone()
    }

    /// A watch receiver for presentation layers that want wakeups.
    pub fn watch(&self) -> watch::Receiver<Arc<Session>> {
        self.snapshots.clone()
    }

    /// Next ordered change descriptor; `None` once the pipeline has exited.
    pub async fn next_change(&mut self) -> Option<SessionChange> {
        self.changes.recv().await
    }

    /// Queue a raw pre-formed command.
    pub async fn send_command(&self, command: String) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RelayError::Transport("pipeline task is gone".into()))
    }

    /// Send user input to a buffer.
    pub async fn input(&self, full_name: &str, text: &str) -> Result<()> {
        self.send_command(commands::input(full_name, text)).await
    }

    /// Stop syncing, say goodbye, and wait for the pipeline to finish.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.commands);
        match self.task.await {
            Ok(res) => res,
            Err(e) => Err(RelayError::Transport(format!("pipeline task failed: {e}"))),
        }
    }

    /// Wait for the pipeline to end (e.g. after a transport failure).
    pub async fn join(self) -> Result<()> {
        match self.task.await {
            Ok(res) => res,
            Err(e) => Err(RelayError::Transport(format!("pipeline task failed: {e}"))),
        }
    }
}
