//! Unix socket listener for the agent
//!
//! Accepts client connections and serves each one on its own task until a
//! shutdown signal arrives. The socket file is removed when the server is
//! dropped.

use crate::agent::engine::Agent;
use crate::error::{Error, Result};
use crate::utils::socket::{prepare_socket_path, set_socket_permissions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

/// Unix socket server for SSH agent clients
pub struct Server {
    socket_path: PathBuf,
    /// Set by `bind`
    listener: Option<UnixListener>,
}

impl Server {
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            listener: None,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Create the socket file, readable and writable by the owner only
    ///
    /// An existing non-symlink file at the path is removed first.
    pub fn bind(&mut self) -> Result<()> {
        prepare_socket_path(&self.socket_path).map_err(|e| Error::Socket(e.to_string()))?;

        let listener = UnixListener::bind(&self.socket_path).map_err(|e| {
            Error::Socket(format!(
                "Failed to bind to socket at {}: {}",
                self.socket_path.display(),
                e
            ))
        })?;
        set_socket_permissions(&self.socket_path).map_err(|e| Error::Socket(e.to_string()))?;

        info!(path = %self.socket_path.display(), "Server listening");
        self.listener = Some(listener);
        Ok(())
    }

    /// Accept connections until `shutdown_rx` turns true
    ///
    /// Each connection is handed to `handler` on a new task. Handler errors
    /// only end that connection.
    pub async fn run<F, Fut>(&self, handler: F, mut shutdown_rx: watch::Receiver<bool>) -> Result<()>
    where
        F: Fn(UnixStream) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| Error::Socket("Server is not bound".to_string()))?;

        let handler = Arc::new(handler);

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Received shutdown signal, stopping server");
                        break;
                    }
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            trace!("Accepted new client connection");
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                if let Err(e) = handler(stream).await {
                                    debug!(error = %e, "Connection handler error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Serve `agent` on every accepted connection
    pub async fn serve(&self, agent: Arc<Agent>, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        self.run(
            move |stream| {
                let agent = Arc::clone(&agent);
                async move { agent.handle_client(stream).await }
            },
            shutdown_rx,
        )
        .await
    }

    fn cleanup(&self) {
        if self.listener.is_none() {
            return;
        }
        match std::fs::remove_file(&self.socket_path) {
            Ok(()) => debug!(path = %self.socket_path.display(), "Removed socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.socket_path.display(),
                error = %e,
                "Failed to remove socket file during cleanup"
            ),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::registry::Registry;
    use crate::agent::client::AgentClient;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[test]
    fn test_server_new() {
        let server = Server::new("/tmp/test.sock");
        assert_eq!(server.socket_path(), Path::new("/tmp/test.sock"));
    }

    #[tokio::test]
    async fn test_bind_permissions_and_cleanup() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("agent.sock");

        {
            let mut server = Server::new(&socket_path);
            server.bind().unwrap();
            let mode = std::fs::metadata(&socket_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(!socket_path.exists());
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_file() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("agent.sock");
        std::fs::write(&socket_path, b"stale").unwrap();

        let mut server = Server::new(&socket_path);
        server.bind().unwrap();
        assert!(socket_path.exists());
    }

    #[tokio::test]
    async fn test_unbound_server_does_not_remove_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.sock");
        std::fs::write(&path, b"keep").unwrap();
        drop(Server::new(&path));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_run_not_bound() {
        let server = Server::new("/tmp/unbound.sock");
        let (_tx, rx) = watch::channel(false);
        let result = server.serve(Arc::new(Agent::new(Registry::new())), rx).await;
        assert!(matches!(result, Err(Error::Socket(_))));
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("agent.sock");
        let mut server = Server::new(&socket_path);
        server.bind().unwrap();

        let (tx, rx) = watch::channel(false);
        let agent = Arc::new(Agent::new(Registry::new()));
        let task = tokio::spawn(async move { server.serve(agent, rx).await });

        let mut client = AgentClient::connect(&socket_path).await.unwrap();
        assert!(client.request_identities(10).await.unwrap().is_empty());

        tx.send(true).unwrap();
        task.await.unwrap().unwrap();
        assert!(!socket_path.exists());
    }
}
