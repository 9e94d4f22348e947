use super::{BoundedBuffer, Session};
use crate::config::{BufferConfig, Pace, DEFAULT_QUOTA};
use crate::error::Result;
use crate::Core::{DirectoryStore, MemoryStore, PayloadStore};
use crate::SPSC::Buffer::DEFAULT_CAPACITY;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the session keeps payload bytes.
enum StoreChoice {
    Directory(PathBuf),
    Memory,
    Custom(Arc<dyn PayloadStore>),
}

pub struct SessionBuilder {
    capacity: usize,
    quota: u64,
    store: StoreChoice,
    production_pace: Option<Pace>,
    consumption_pace: Option<Pace>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY, // 10 slots
            quota: DEFAULT_QUOTA,       // 10 records
            store: StoreChoice::Memory,
            production_pace: None,
            consumption_pace: None,
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity, quota, shared directory and pacing from `config`.
    pub fn from_config(config: &BufferConfig) -> Self {
        Self {
            capacity: config.capacity,
            quota: config.quota,
            store: StoreChoice::Directory(config.shared_dir.clone()),
            production_pace: config.production_pace,
            consumption_pace: config.consumption_pace,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_quota(mut self, quota: u64) -> Self {
        self.quota = quota;
        self
    }

    /// Keep payloads as files in `dir`.
    pub fn with_shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store = StoreChoice::Directory(dir.into());
        self
    }

    /// Keep payloads in memory.
    pub fn with_memory_store(mut self) -> Self {
        self.store = StoreChoice::Memory;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn PayloadStore>) -> Self {
        self.store = StoreChoice::Custom(store);
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

    pub fn build(self) -> Result<Session> {
        let buffer = Arc::new(BoundedBuffer::new(self.capacity)?);
        let store: Arc<dyn PayloadStore> = match self.store {
            StoreChoice::Directory(dir) => Arc::new(DirectoryStore::new(dir)?),
            StoreChoice::Memory => Arc::new(MemoryStore::new()),
            StoreChoice::Custom(store) => store,
        };
        Ok(Session::new(
            buffer,
            store,
            self.quota,
            self.production_pace,
            self.consumption_pace,
        ))
    }
}
