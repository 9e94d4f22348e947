//! Remote producer and consumer for the buffer service.
//!
//! Every call opens a fresh connection, sends one request, reads one
//! response and closes. `FULL` and `EMPTY` are answered by sleeping a fixed
//! poll interval and asking again.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::protocol::{decode_line, encode_line, Request, Response, Status};
use crate::config::{BufferConfig, Pace, DEFAULT_MAX_REQUEST_BYTES};
use crate::error::{BufferError, Result};
use crate::payload::{PayloadSink, PayloadSource};
use crate::SPSC::Structs::SlotToken;

/// Sends single requests to a buffer service.
#[derive(Clone, Debug)]
pub struct BufferClient {
    addr: String,
    io_timeout: Duration,
    max_response_bytes: usize,
}

impl BufferClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            io_timeout: Duration::from_secs(5),
            max_response_bytes: DEFAULT_MAX_REQUEST_BYTES * 2,
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.addr.clone())
            .with_io_timeout(config.io_timeout)
            .with_max_response_bytes(config.max_request_bytes * 2)
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, bytes: usize) -> Self {
        self.max_response_bytes = bytes;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// One request/response exchange on a fresh connection.
    ///
    /// # Returns
    /// * `Err(TransportFailure)` if connecting, writing or reading fails or times out
    /// * `Err(Json | Protocol)` if the response cannot be parsed
    pub async fn try_send(&self, request: &Request) -> Result<Response> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.addr)
                .await
                .map_err(BufferError::TransportFailure)?;
            stream
                .write_all(&encode_line(request)?)
                .await
                .map_err(BufferError::TransportFailure)?;

            let mut reader = BufReader::new(stream).take(self.max_response_bytes as u64);
            let mut line = Vec::new();
            let read = reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(BufferError::TransportFailure)?;
            if read == 0 {
                return Err(BufferError::TransportFailure(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before a response arrived",
                )));
            }
            decode_line::<Response>(&line)
        };

        timeout(self.io_timeout, exchange).await.map_err(|_| {
            BufferError::TransportFailure(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response from {} within {:?}", self.addr, self.io_timeout),
            ))
        })?
    }

    /// Like [`try_send`](Self::try_send), but any failure becomes an `ERROR` response.
    pub async fn send(&self, request: &Request) -> Response {
        match self.try_send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(addr = %self.addr, error = %e, "request failed");
                Response::error(e.to_string())
            }
        }
    }

    pub async fn produce(&self, token: SlotToken, payload: String) -> Response {
        self.send(&Request::Produce {
            file_number: token,
            xml_data: payload,
        })
        .await
    }

    pub async fn consume(&self) -> Response {
        self.send(&Request::Consume).await
    }

    pub async fn status(&self) -> Response {
        self.send(&Request::Status).await
    }
}

/// What a remote producer achieved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProducerReport {
    /// Tokens the service admitted.
    pub produced: Vec<SlotToken>,
    /// Tokens given up after a hard error.
    pub abandoned: Vec<SlotToken>,
    /// Number of `FULL` answers that caused a retry.
    pub full_retries: usize,
}

/// What a remote consumer achieved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Tokens delivered to the sink, in retrieval order.
    pub consumed: Vec<SlotToken>,
    /// Number of `EMPTY` answers.
    pub empty_polls: usize,
    /// Number of `ERROR` answers or transport failures.
    pub errors: usize,
}

/// Produces tokens `1..=quota` against a remote buffer service.
#[derive(Clone, Debug)]
pub struct RemoteProducer {
    client: BufferClient,
    quota: u64,
    poll_interval: Duration,
    pace: Option<Pace>,
}

impl RemoteProducer {
    pub fn new(client: BufferClient, quota: u64) -> Self {
        Self {
            client,
            quota,
            poll_interval: Duration::from_secs(1),
            pace: None,
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self {
            client: BufferClient::from_config(config),
            quota: config.quota,
            poll_interval: config.poll_interval,
            pace: config.production_pace,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = Some(pace);
        self
    }

    /// For each token: generate its payload, then send `PRODUCE` until it is
    /// admitted. `FULL` sleeps and retries; anything else abandons that token
    /// and moves on.
    pub async fn run<S: PayloadSource>(&self, source: &mut S) -> ProducerReport {
        info!(addr = self.client.addr(), quota = self.quota, "remote producer started");
        let mut report = ProducerReport::default();

        for token in 1..=self.quota {
            let payload = match String::from_utf8(source.generate(token)) {
                Ok(payload) => payload,
                Err(_) => {
                    warn!(token, "payload is not valid UTF-8, skipping");
                    report.abandoned.push(token);
                    continue;
                }
            };

            loop {
                let response = self.client.produce(token, payload.clone()).await;
                match response.status {
                    Status::Success => {
                        debug!(token, buffer_size = ?response.buffer_size, "produced");
                        report.produced.push(token);
                        break;
                    }
                    Status::Full => {
                        debug!(token, "buffer full, waiting");
                        report.full_retries += 1;
                        sleep(self.poll_interval).await;
                    }
                    _ => {
                        warn!(token, message = ?response.message, "produce failed, abandoning item");
                        report.abandoned.push(token);
                        break;
                    }
                }
            }

            if let Some(pace) = &self.pace {
                sleep(pace.sample()).await;
            }
        }

        info!(
            produced = report.produced.len(),
            abandoned = report.abandoned.len(),
            "remote producer finished"
        );
        report
    }
}

/// Consumes from a remote buffer service until its own quota is reached.
///
/// The service sends no end-of-stream signal, so the quota must match the
/// producer's; with a larger quota this polls `EMPTY` forever.
#[derive(Clone, Debug)]
pub struct RemoteConsumer {
    client: BufferClient,
    quota: u64,
    poll_interval: Duration,
    pace: Option<Pace>,
}

impl RemoteConsumer {
    pub fn new(client: BufferClient, quota: u64) -> Self {
        Self {
            client,
            quota,
            poll_interval: Duration::from_secs(1),
            pace: None,
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self {
            client: BufferClient::from_config(config),
            quota: config.quota,
            poll_interval: config.poll_interval,
            pace: config.consumption_pace,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = Some(pace);
        self
    }

    pub async fn run<K: PayloadSink>(&self, sink: &mut K) -> ConsumerReport {
        info!(addr = self.client.addr(), quota = self.quota, "remote consumer started");
        let mut report = ConsumerReport::default();

        while (report.consumed.len() as u64) < self.quota {
            let response = self.client.consume().await;
            match (response.status, response.file_number, response.payload()) {
                (Status::Success, Some(token), Some(payload)) => {
                    debug!(token, buffer_size = ?response.buffer_size, "consumed");
                    sink.deliver(token, payload);
                    report.consumed.push(token);
                }
                (Status::Empty, ..) => {
                    debug!("buffer empty, waiting");
                    report.empty_polls += 1;
                    sleep(self.poll_interval).await;
                    continue;
                }
                _ => {
                    warn!(status = ?response.status, message = ?response.message, "consume failed");
                    report.errors += 1;
                    sleep(self.poll_interval).await;
                    continue;
                }
            }

            if let Some(pace) = &self.pace {
                sleep(pace.sample()).await;
            }
        }

        info!(consumed = report.consumed.len(), "remote consumer finished");
        report
    }
}
