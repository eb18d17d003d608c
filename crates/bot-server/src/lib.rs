#![deny(warnings)]

//! Background static host for the game assets.
//!
//! The page-automation collaborator needs something to load, so this crate
//! serves a local game directory over loopback. The server runs on its own
//! thread with a current-thread tokio runtime and shares no state with the
//! decision loop; dropping the handle leaves it running for the life of the
//! process, like a daemon thread.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use axum::Router;
use thiserror::Error;
use tower_http::services::ServeDir;
use tracing::{debug, error};

/// Failures while starting the host.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The game directory does not exist.
    #[error("game directory not found: {0}")]
    MissingDir(PathBuf),
    /// Could not bind the requested address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    /// Listener or thread setup failed.
    #[error("server setup failed: {0}")]
    Setup(std::io::Error),
}

/// Running server; exposes the bound loopback address.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    _thread: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL the page should load, e.g. `http://127.0.0.1:8000`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Bind `addr` and serve `dir` from a background thread.
///
/// Binding happens synchronously so a port-0 request reports the real port
/// back through the handle.
pub fn spawn(addr: SocketAddr, dir: impl AsRef<Path>) -> Result<ServerHandle, ServeError> {
    let dir = dir.as_ref().to_path_buf();
    if !dir.is_dir() {
        return Err(ServeError::MissingDir(dir));
    }
    let listener =
        std::net::TcpListener::bind(addr).map_err(|source| ServeError::Bind { addr, source })?;
    listener.set_nonblocking(true).map_err(ServeError::Setup)?;
    let local = listener.local_addr().map_err(ServeError::Setup)?;

    let thread = std::thread::Builder::new()
        .name("game-host".to_string())
        .spawn(move || serve_blocking(listener, dir))
        .map_err(ServeError::Setup)?;

    Ok(ServerHandle {
        addr: local,
        _thread: thread,
    })
}

fn serve_blocking(listener: std::net::TcpListener, dir: PathBuf) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "game host runtime failed to start");
            return;
        }
    };
    rt.block_on(async move {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, "game host listener registration failed");
                return;
            }
        };
        // Requests stay at debug level; the decision loop owns the console.
        debug!(dir = %dir.display(), "serving game assets");
        let app = Router::new().fallback_service(ServeDir::new(&dir));
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "game host stopped unexpectedly");
        }
    });
}
