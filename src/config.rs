//! Run configuration shared by the demos, the in-process session and the
//! buffer service.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BufferError, Result};
use crate::SPSC::Buffer::DEFAULT_CAPACITY;

/// Default number of records produced (and expected by the consumer).
pub const DEFAULT_QUOTA: u64 = 10;
/// Default shared directory for the file-backed payload store.
pub const DEFAULT_SHARED_DIR: &str = "shared_files";
/// Default buffer service address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
/// Default largest accepted request line, in bytes.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// A random pause between `min` and `max`, used to simulate production or
/// consumption time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pace {
    pub min: Duration,
    pub max: Duration,
}

impl Pace {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Pick a pause length uniformly in `[min, max]`.
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(fastrand::u64(min..=max))
    }

    /// Sleep the current thread for a sampled pause.
    pub fn pause(&self) {
        std::thread::sleep(self.sample());
    }
}

#[derive(Clone, Debug)]
pub struct BufferConfig {
    /// Number of slots in the buffer.
    pub capacity: usize,
    /// Number of records the producer emits and the remote consumer expects.
    pub quota: u64,
    /// Directory backing the file payload store.
    pub shared_dir: PathBuf,
    /// Buffer service listen / connect address.
    pub addr: String,
    /// Sleep between retries after `FULL` / `EMPTY` / `ERROR`.
    pub poll_interval: Duration,
    /// How long one accept attempt waits before re-checking for shutdown.
    pub accept_poll: Duration,
    /// Read/write timeout for one request or response.
    pub io_timeout: Duration,
    pub max_request_bytes: usize,
    pub production_pace: Option<Pace>,
    pub consumption_pace: Option<Pace>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            quota: DEFAULT_QUOTA,
            shared_dir: PathBuf::from(DEFAULT_SHARED_DIR),
            addr: DEFAULT_ADDR.to_string(),
            poll_interval: Duration::from_secs(1),
            accept_poll: Duration::from_secs(1),
            io_timeout: Duration::from_secs(5),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            production_pace: None,
            consumption_pace: None,
        }
    }
}

impl BufferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DMXP_CAPACITY`, `DMXP_QUOTA`, `DMXP_SHARED_DIR`,
    /// `DMXP_ADDR` and `DMXP_POLL_MS` when set.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Apply the `DMXP_*` overrides on top of `self`.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Some(capacity) = env_parse::<usize>("DMXP_CAPACITY")? {
            self.capacity = capacity;
        }
        if let Some(quota) = env_parse::<u64>("DMXP_QUOTA")? {
            self.quota = quota;
        }
        if let Ok(dir) = std::env::var("DMXP_SHARED_DIR") {
            self.shared_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("DMXP_ADDR") {
            self.addr = addr;
        }
        if let Some(ms) = env_parse::<u64>("DMXP_POLL_MS")? {
            self.poll_interval = Duration::from_millis(ms);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(BufferError::InvalidCapacity);
        }
        if self.max_request_bytes == 0 {
            return Err(BufferError::Config("max_request_bytes must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_quota(mut self, quota: u64) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shared_dir = dir.into();
        self
    }

    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_accept_poll(mut self, interval: Duration) -> Self {
        self.accept_poll = interval;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_max_request_bytes(mut self, bytes: usize) -> Self {
        self.max_request_bytes = bytes;
        self
    }

    pub fn with_production_pace(mut self, pace: Pace) -> Self {
        self.production_pace = Some(pace);
        self
    }

    pub fn with_consumption_pace(mut self, pace: Pace) -> Self {
        self.consumption_pace = Some(pace);
        self
    }

    /// Demo timings: 0.5-1.5 s per produced record and
    /// 1.0-2.0 s per consumed record.
    pub fn with_demo_pacing(self) -> Self {
        self.with_production_pace(Pace::new(Duration::from_millis(500), Duration::from_millis(1500)))
            .with_consumption_pace(Pace::new(Duration::from_millis(1000), Duration::from_millis(2000)))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| BufferError::Config(format!("{key}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}
