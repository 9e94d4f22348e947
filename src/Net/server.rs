//! The buffer service: one authoritative slot queue plus payload store,
//! reachable over TCP.
//!
//! Each accepted connection is handled on its own task and carries exactly
//! one request/response exchange:
//!
//! `ACCEPTED -> REQUEST_READ -> DISPATCHED -> RESPONSE_SENT -> CLOSED`
//!
//! The accept loop waits at most `accept_poll` per attempt so it notices a
//! shutdown request promptly. A single lock covers the whole dispatch of one
//! request, so buffer and store mutations are serialized while reading and
//! parsing stay concurrent.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{self, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use super::protocol::{decode_line, encode_line, Request, Response};
use crate::config::BufferConfig;
use crate::error::{BufferError, Result};
use crate::Core::{DirectoryStore, PayloadStore};
use crate::SPSC::Buffer::SlotQueue;
use crate::SPSC::Structs::SlotToken;

/// Lifecycle of one accepted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    Accepted,
    RequestRead,
    Dispatched,
    ResponseSent,
    Closed,
}

/// Requests the accept loop to stop. Cheap to clone; usable from any thread.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Everything guarded by the service lock.
struct ServiceState {
    slots: SlotQueue,
    store: Arc<dyn PayloadStore>,
}

struct Shared {
    state: Mutex<ServiceState>,
    capacity: usize,
    shutdown: ShutdownHandle,
    accept_poll: Duration,
    io_timeout: Duration,
    max_request_bytes: usize,
}

#[derive(Clone)]
pub struct BufferService {
    shared: Arc<Shared>,
}

impl BufferService {
    /// Service with `capacity` slots over `store`, default timeouts.
    pub fn new(capacity: usize, store: Arc<dyn PayloadStore>) -> Result<Self> {
        Self::with_config(&BufferConfig::default().with_capacity(capacity), store)
    }

    /// Service using the capacity and timeouts of `config` over `store`.
    pub fn with_config(config: &BufferConfig, store: Arc<dyn PayloadStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ServiceState {
                    slots: SlotQueue::new(config.capacity)?,
                    store,
                }),
                capacity: config.capacity,
                shutdown: ShutdownHandle::default(),
                accept_poll: config.accept_poll,
                io_timeout: config.io_timeout,
                max_request_bytes: config.max_request_bytes,
            }),
        })
    }

    /// Service keeping payload files in `config.shared_dir`.
    pub fn from_config(config: &BufferConfig) -> Result<Self> {
        let store = Arc::new(DirectoryStore::new(&config.shared_dir)?);
        Self::with_config(config, store)
    }

    /// Apply one request to the buffer and store.
    ///
    /// The service lock is held for the whole call; a mutation either
    /// completes or leaves the state untouched before the lock is released.
    pub fn dispatch(&self, request: Request) -> Response {
        let mut state = self.shared.state.lock();
        let capacity = self.shared.capacity;

        match request {
            Request::Produce {
                file_number,
                xml_data,
            } => {
                if state.slots.is_full() {
                    debug!(token = file_number, buffer_size = state.slots.len(), "rejected, buffer full");
                    return Response::full(state.slots.len());
                }
                if let Err(e) = state.store.write(file_number, xml_data.as_bytes()) {
                    error!(token = file_number, error = %e, "failed to store payload");
                    return Response::error(e.to_string());
                }
                match state.slots.push(file_number) {
                    Ok(buffer_size) => {
                        info!(token = file_number, buffer_size, capacity, "produced");
                        Response::produced(file_number, buffer_size)
                    }
                    Err(e) => {
                        // Checked above; undo the store write to keep both sides in step.
                        let _ = state.store.delete(file_number);
                        Response::error(e.to_string())
                    }
                }
            }
            Request::Consume => {
                let Some(token) = state.slots.pop() else {
                    return Response::empty();
                };
                let buffer_size = state.slots.len();
                match Self::take_payload(state.store.as_ref(), token) {
                    Ok(payload) => {
                        info!(token, buffer_size, capacity, "consumed");
                        Response::consumed(token, payload, buffer_size)
                    }
                    Err(e) => {
                        // The token stays consumed; it is never re-offered.
                        error!(token, error = %e, "consume failed");
                        Response::error(e.to_string())
                    }
                }
            }
            Request::Status => Response::status(state.slots.len(), capacity),
        }
    }

    fn take_payload(store: &dyn PayloadStore, token: SlotToken) -> Result<String> {
        let bytes = store.take(token)?;
        String::from_utf8(bytes)
            .map_err(|_| BufferError::Protocol(format!("payload for token {token} is not valid UTF-8")))
    }

    /// Bind `addr` and serve until shutdown is triggered.
    pub async fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until shutdown is triggered, then
    /// wait for in-flight handlers to finish.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        info!(addr = %local, capacity = self.shared.capacity, "buffer service started");

        let mut handlers = JoinSet::new();
        while !self.shared.shutdown.is_triggered() {
            match timeout(self.shared.accept_poll, listener.accept()).await {
                // Poll timeout; loop around and re-check shutdown
                Err(_) => {}
                Ok(Ok((stream, peer))) => {
                    let service = self.clone();
                    handlers.spawn(async move { service.handle_connection(stream, peer).await });
                }
                Ok(Err(e)) => {
                    if !self.shared.shutdown.is_triggered() {
                        warn!(error = %e, "accept failed");
                    }
                }
            }

            // Reap finished handlers
            while let Some(joined) = handlers.try_join_next() {
                if let Err(e) = joined {
                    warn!(error = %e, "connection handler aborted");
                }
            }
        }

        info!(in_flight = handlers.len(), "buffer service shutting down");
        while let Some(joined) = handlers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "connection handler aborted");
            }
        }
        info!(buffer_size = self.len(), "buffer service stopped");
        Ok(())
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let mut phase = ConnectionPhase::Accepted;
        trace!(%peer, ?phase);

        let limit = self.shared.max_request_bytes;
        let io_timeout = self.shared.io_timeout;
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half).take(limit as u64 + 1);
        let mut line = Vec::new();

        let response = match timeout(io_timeout, reader.read_until(b'\n', &mut line)).await {
            Err(_) => {
                warn!(%peer, "timed out waiting for request");
                Response::error("request timed out")
            }
            Ok(Err(e)) => {
                warn!(%peer, error = %e, "failed to read request");
                return;
            }
            Ok(Ok(0)) => {
                debug!(%peer, "connection closed without a request");
                return;
            }
            Ok(Ok(_)) if line.len() > limit => {
                warn!(%peer, limit, "request too large");
                Response::error(format!("request exceeds {limit} bytes"))
            }
            Ok(Ok(_)) => {
                phase = ConnectionPhase::RequestRead;
                trace!(%peer, ?phase);
                match decode_line::<Request>(&line) {
                    Ok(request) => {
                        // Store I/O runs under the service lock; keep it off the async workers
                        let service = self.clone();
                        let response = match task::spawn_blocking(move || service.dispatch(request)).await {
                            Ok(response) => response,
                            Err(e) => {
                                error!(%peer, error = %e, "dispatch task failed");
                                Response::error("internal error")
                            }
                        };
                        phase = ConnectionPhase::Dispatched;
                        trace!(%peer, ?phase, status = ?response.status);
                        response
                    }
                    Err(e) => {
                        warn!(%peer, error = %e, "malformed request");
                        Response::error(format!("malformed request: {e}"))
                    }
                }
            }
        };

        let bytes = match encode_line(&response) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%peer, error = %e, "failed to encode response");
                return;
            }
        };
        match timeout(io_timeout, write_half.write_all(&bytes)).await {
            Ok(Ok(())) => {
                phase = ConnectionPhase::ResponseSent;
                trace!(%peer, ?phase);
            }
            Ok(Err(e)) => warn!(%peer, error = %e, "failed to send response"),
            Err(_) => warn!(%peer, "timed out sending response"),
        }
        let _ = write_half.shutdown().await;

        phase = ConnectionPhase::Closed;
        trace!(%peer, ?phase);
    }

    /// Handle for stopping [`serve`](Self::serve) from another task or thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shared.shutdown.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Buffered tokens in retrieval order.
    pub fn snapshot(&self) -> Vec<SlotToken> {
        self.shared.state.lock().slots.tokens().collect()
    }

    pub fn store(&self) -> Arc<dyn PayloadStore> {
        Arc::clone(&self.shared.state.lock().store)
    }
}

impl std::fmt::Debug for BufferService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_buffer_service(self, f)
    }
}
