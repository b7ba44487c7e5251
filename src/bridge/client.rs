//! Async client for communicating with a catalog bridge process.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};

use super::error::{BridgeError, BridgeResult};
use super::protocol::{ErrorInfo, RequestEnvelope, ResponseEnvelope};

/// Default timeout for requests (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

/// Async client for a catalog bridge.
///
/// The client spawns the bridge as a child process and communicates via
/// NDJSON (newline-delimited JSON) over stdin/stdout. Each request has a
/// unique ID for correlation with responses.
///
/// # Example
///
/// ```ignore
/// use metasync::bridge::{BridgeClient, protocol::*};
///
/// let client = BridgeClient::spawn("hive-bridge", &["--uri".into(), uri]).await?;
///
/// let response: HasTableResponse = client.request(
///     methods::HAS_TABLE,
///     TableParams { db: "sales", table: "orders" },
/// ).await?;
/// ```
pub struct BridgeClient {
    /// Writer for sending requests to bridge stdin.
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,

    /// Map of pending request IDs to response channels.
    pending: Pending,

    /// Handle to the bridge child process.
    _child: Child,

    /// Handle to the background reader task.
    reader_task: tokio::task::JoinHandle<()>,

    /// Request timeout duration.
    timeout: Duration,
}

impl BridgeClient {
    /// Spawn a bridge process with the default timeout.
    pub async fn spawn<P: AsRef<Path>>(bridge_path: P, args: &[String]) -> BridgeResult<Self> {
        Self::spawn_with_timeout(bridge_path, args, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
    }

    /// Spawn a bridge process with arguments and a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge process cannot be spawned.
    pub async fn spawn_with_timeout<P: AsRef<Path>>(
        bridge_path: P,
        args: &[String],
        timeout: Duration,
    ) -> BridgeResult<Self> {
        let mut child = Command::new(bridge_path.as_ref())
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(BridgeError::SpawnFailed)?;

        let stdin = child.stdin.take().ok_or_else(|| not_captured("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;

        let stdin = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

        let reader_task = Self::spawn_reader_task(stdout, pending.clone());

        tracing::debug!(bridge = %bridge_path.as_ref().display(), "spawned catalog bridge");
        Ok(Self {
            stdin,
            pending,
            _child: child,
            reader_task,
            timeout,
        })
    }

    /// Spawn the background task that reads responses from the bridge.
    fn spawn_reader_task(stdout: ChildStdout, pending: Pending) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            let mut pending = pending.lock().await;
                            if let Some(tx) = pending.remove(&resp.id) {
                                let _ = tx.send(resp);
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "bridge: failed to parse response");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "bridge: read error");
                        break;
                    }
                }
            }

            // Bridge exited - fail every request still waiting
            let mut pending = pending.lock().await;
            for (id, tx) in pending.drain() {
                let _ = tx.send(ResponseEnvelope {
                    id,
                    success: false,
                    result: None,
                    error: Some(ErrorInfo {
                        code: "BRIDGE_EXITED".to_string(),
                        message: "catalog bridge exited unexpectedly".to_string(),
                    }),
                });
            }
        })
    }

    /// Send a request to the bridge and wait for a response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Serialization fails
    /// - Writing to the bridge fails
    /// - The request times out
    /// - The bridge returns an error response
    /// - Deserialization of the response fails
    pub async fn request<P, R>(&self, method: &str, params: P) -> BridgeResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = uuid::Uuid::new_v4().to_string();

        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(BridgeError::SerializeFailed)?,
        };

        let line = serde_json::to_string(&request).map_err(BridgeError::SerializeFailed)? + "\n";

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if let Err(e) = self.write_line(&line).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }
        tracing::trace!(method, id = %id, "bridge request sent");

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(resp) => resp?,
            Err(_) => {
                // Drop the pending entry so a late response is discarded
                self.pending.lock().await.remove(&id);
                return Err(BridgeError::Timeout(self.timeout.as_secs()));
            }
        };

        Self::into_result(response)
    }

    async fn write_line(&self, line: &str) -> BridgeResult<()> {
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(BridgeError::WriteFailed)?;
        stdin.flush().await.map_err(BridgeError::WriteFailed)
    }

    /// Decode a response envelope into a typed result.
    fn into_result<R: DeserializeOwned>(response: ResponseEnvelope) -> BridgeResult<R> {
        if response.success {
            let result = response.result.unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result).map_err(BridgeError::DeserializeFailed)
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: "UNKNOWN".to_string(),
                message: "Unknown error".to_string(),
            });
            Err(Self::classify_error(&error.code, &error.message))
        }
    }

    /// Classify a bridge error code into a more specific error type.
    fn classify_error(code: &str, message: &str) -> BridgeError {
        match code {
            "CONNECTION_FAILED" => BridgeError::ConnectionFailed(message.to_string()),
            "INVALID_REQUEST" => BridgeError::InvalidRequest(message.to_string()),
            "METHOD_NOT_FOUND" => BridgeError::MethodNotFound(message.to_string()),
            "BRIDGE_EXITED" => BridgeError::ChannelClosed,
            _ => BridgeError::remote(code, message),
        }
    }

    /// Check if the bridge is still running.
    pub fn is_alive(&self) -> bool {
        !self.reader_task.is_finished()
    }

    /// Get the current request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(test)]
    async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

fn not_captured(stream: &str) -> BridgeError {
    BridgeError::SpawnFailed(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("bridge {stream} not captured"),
    ))
}
