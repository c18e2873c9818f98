//! TCP debug server

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::protocol::{DebugCommand, DebugResponse};

/// Trait that the application implements to handle debug commands
pub trait DebugHandler: Send + Sync + 'static {
    fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse;
}

/// Debug server handle - keep this alive to keep the server running
pub struct DebugServer {
    handle: tokio::task::JoinHandle<()>,
}

impl DebugServer {
    /// Start the debug server on the given localhost port.
    /// The handler is called for each incoming command.
    /// Returns immediately -- server runs in background.
    pub fn start(handler: Arc<Mutex<dyn DebugHandler>>, port: u16) -> Self {
        let handle = tokio::spawn(async move {
            let addr = format!("127.0.0.1:{}", port);
            let listener = match TcpListener::bind(&addr).await {
                Ok(l) => {
                    log::info!("Debug server listening on {}", addr);
                    l
                }
                Err(e) => {
                    log::error!("Failed to bind debug server on {}: {}", addr, e);
                    return;
                }
            };
            accept_loop(listener, handler).await;
        });

        Self { handle }
    }

    /// Bind first, then serve in the background.
    ///
    /// Unlike [`DebugServer::start`], bind failures are returned to the caller and
    /// the bound address is reported (useful with port 0).
    pub async fn bind(
        handler: Arc<Mutex<dyn DebugHandler>>,
        addr: SocketAddr,
    ) -> std::io::Result<(Self, SocketAddr)> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        log::info!("Debug server listening on {}", local);
        let handle = tokio::spawn(accept_loop(listener, handler));
        Ok((Self { handle }, local))
    }

    /// Stop accepting connections
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn accept_loop(listener: TcpListener, handler: Arc<Mutex<dyn DebugHandler>>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::error!("Debug server accept error: {}", e);
                continue;
            }
        };

        log::info!("Debug client connected from {}", peer);
        let handler = handler.clone();
        tokio::spawn(async move {
            match serve_client(stream, handler).await {
                Ok(served) => log::info!("Debug client {} disconnected after {} commands", peer, served),
                Err(e) => log::warn!("Debug client {} dropped: {}", peer, e),
            }
        });
    }
}

/// Answer one JSON command per line until the client hangs up.
///
/// Returns the number of commands answered.
async fn serve_client(stream: TcpStream, handler: Arc<Mutex<dyn DebugHandler>>) -> io::Result<usize> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut served = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(response) = dispatch_line(&line, &handler).await else {
            continue;
        };
        writer.write_all(encode_response(&response).as_bytes()).await?;
        writer.flush().await?;
        served += 1;
    }

    Ok(served)
}

/// Decode a command line and run it; blank lines yield nothing.
async fn dispatch_line(line: &str, handler: &Mutex<dyn DebugHandler>) -> Option<DebugResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let response = match serde_json::from_str::<DebugCommand>(line) {
        Ok(cmd) => {
            log::debug!("Debug command: {:?}", cmd);
            handler.lock().await.handle_command(cmd)
        }
        Err(e) => DebugResponse::error(format!("Invalid command JSON: {}", e)),
    };
    Some(response)
}

/// One newline-terminated JSON line
fn encode_response(response: &DebugResponse) -> String {
    let mut json = serde_json::to_string(response).unwrap_or_else(|e| {
        serde_json::json!({ "status": "error", "message": format!("Serialize error: {}", e) })
            .to_string()
    });
    json.push('\n');
    json
}
