//! TCP listener accepting exactly one emulator connection.

use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::transport::EmulatorChannel;
use crate::{AppError, Result};

/// Bound socket waiting for the emulator script to connect.
#[derive(Debug)]
pub struct EmulatorListener {
    listener: TcpListener,
}

impl EmulatorListener {
    /// Bind `host:port`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the address cannot be bound.
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|err| AppError::Transport(format!("failed to bind {host}:{port}: {err}")))?;
        Ok(Self { listener })
    }

    /// Local address actually bound (useful when binding port 0).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the socket has no local address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|err| AppError::Transport(format!("no local address: {err}")))
    }

    /// Block until the emulator connects.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if accepting fails; the run cannot
    /// proceed without a connection.
    pub async fn accept(self) -> Result<EmulatorChannel<TcpStream>> {
        info!(addr = ?self.listener.local_addr().ok(), "waiting for emulator connection");
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|err| AppError::Transport(format!("accept failed: {err}")))?;
        // Small request/response lines: do not let Nagle hold them back.
        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!(%err, "could not disable nagle");
        }
        info!(%peer, "emulator connected");
        Ok(EmulatorChannel::new(stream))
    }
}
