//! Process lifecycle
//!
//! [`Lifecycle`] owns startup and shutdown of the server:
//!
//! - Startup connects the transport; a failure there ends the process with
//!   exit code 1.
//! - SIGINT/SIGTERM, or [`ShutdownHandle::request`], stop serving, close the
//!   transport within a bounded time and exit 0.
//! - End of input is a graceful shutdown; a transport error while serving is
//!   fatal.
//!
//! Shutdown hooks (log flushing) run exactly once on every path.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::server::PeepItMcpServer;
use crate::transport::Transport;

/// Upper bound on closing the transport during shutdown
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(&'static str),
    /// The client closed its end of the connection
    EndOfInput,
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "signal {}", name),
            ShutdownReason::EndOfInput => f.write_str("end of input"),
            ShutdownReason::Requested => f.write_str("shutdown requested"),
        }
    }
}

/// How the server run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Graceful(ShutdownReason),
    StartupFailed(String),
    Fatal(String),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Graceful(_) => 0,
            Outcome::StartupFailed(_) | Outcome::Fatal(_) => 1,
        }
    }
}

/// Cloneable trigger for a graceful shutdown
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl ShutdownHandle {
    /// Ask the server to stop; the first reason given wins
    pub fn request(&self, reason: ShutdownReason) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    pub async fn requested(&self) {
        self.token.cancelled().await
    }
}

type ShutdownHook = Box<dyn FnOnce() + Send>;

/// Startup and shutdown controller
pub struct Lifecycle {
    handle: ShutdownHandle,
    hooks: Vec<ShutdownHook>,
    close_timeout: Duration,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            handle: ShutdownHandle::default(),
            hooks: Vec::new(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// Register work to run once the server stops, in registration order
    pub fn on_shutdown(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Turn SIGINT/SIGTERM into shutdown requests
    ///
    /// Must be called from within the runtime.
    pub fn install_signal_handlers(&self) -> std::io::Result<()> {
        let handle = self.handle.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut terminate = signal(SignalKind::terminate())?;
            let mut interrupt = signal(SignalKind::interrupt())?;
            tokio::spawn(async move {
                let name = tokio::select! {
                    _ = terminate.recv() => "SIGTERM",
                    _ = interrupt.recv() => "SIGINT",
                };
                tracing::info!(signal = name, "Received signal, shutting down");
                handle.request(ShutdownReason::Signal(name));
            });
        }

        #[cfg(not(unix))]
        {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!(signal = "SIGINT", "Received signal, shutting down");
                    handle.request(ShutdownReason::Signal("SIGINT"));
                }
            });
        }

        Ok(())
    }

    /// Give up before serving; hooks still run
    pub fn fail_startup(self, message: impl Into<String>) -> Outcome {
        let message = message.into();
        tracing::error!(error = %message, "Server failed to start");
        self.run_hooks();
        Outcome::StartupFailed(message)
    }

    /// Connect, serve until shutdown, then clean up
    pub async fn run<T>(self, server: &PeepItMcpServer, transport: &mut T) -> Outcome
    where
        T: Transport + ?Sized,
    {
        if let Err(e) = transport.connect().await {
            return self.fail_startup(format!("Failed to connect transport: {}", e));
        }
        tracing::info!("PeepIt MCP server connected, waiting for requests");

        let handle = self.handle.clone();
        let served = tokio::select! {
            result = server.serve(&mut *transport) => Some(result),
            _ = handle.requested() => None,
        };

        let outcome = match served {
            Some(Ok(())) => {
                handle.request(ShutdownReason::EndOfInput);
                Outcome::Graceful(ShutdownReason::EndOfInput)
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Transport failed, shutting down");
                Outcome::Fatal(e.to_string())
            }
            None => Outcome::Graceful(handle.reason().unwrap_or(ShutdownReason::Requested)),
        };

        match tokio::time::timeout(self.close_timeout, transport.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Error closing transport"),
            Err(_) => tracing::warn!(
                timeout_ms = self.close_timeout.as_millis() as u64,
                "Timed out closing transport"
            ),
        }

        if let Outcome::Graceful(reason) = &outcome {
            tracing::info!(reason = %reason, "Server stopped");
        }
        self.run_hooks();
        outcome
    }

    fn run_hooks(self) {
        for hook in self.hooks {
            hook();
        }
    }
}
