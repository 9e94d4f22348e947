// In-process producer handle.

use crate::config::Pace;
use crate::error::Result;
use crate::payload::PayloadSource;
use crate::Core::PayloadStore;
use crate::SPSC::Buffer::BoundedBuffer;
use crate::SPSC::Structs::SlotToken;
use std::sync::Arc;
use tracing::{debug, info};

/// The producing side of an in-process session.
///
/// Writes each payload to the store first, then admits its token, so a
/// token is never visible before its payload.
pub struct Producer {
    buffer: Arc<BoundedBuffer>,
    store: Arc<dyn PayloadStore>,
    quota: u64,
    pace: Option<Pace>,
}

impl Producer {
    pub(crate) fn new(
        buffer: Arc<BoundedBuffer>,
        store: Arc<dyn PayloadStore>,
        quota: u64,
        pace: Option<Pace>,
    ) -> Self {
        Self {
            buffer,
            store,
            quota,
            pace,
        }
    }

    /// Stores `payload` under `token`, then admits `token`, blocking while the
    /// buffer is full.
    ///
    /// # Returns
    /// * `Err(Closed)` if the buffer was already closed; the payload is removed again
    pub fn send(&self, token: SlotToken, payload: &[u8]) -> Result<()> {
        self.store.write(token, payload)?;
        if let Err(e) = self.buffer.put(token) {
            self.store.delete(token)?;
            return Err(e);
        }
        debug!(token, buffer_size = self.buffer.len(), "produced");
        Ok(())
    }

    /// Produces tokens `1..=quota`, then sets the termination flag.
    ///
    /// The flag is set even if a send fails, so the consumer never waits on
    /// a producer that has given up.
    pub fn run<S: PayloadSource>(&self, source: &mut S) -> Result<Vec<SlotToken>> {
        info!(quota = self.quota, capacity = self.buffer.capacity(), "producer started");
        let result = self.produce_all(source);
        self.buffer.close();
        let produced = result?;
        info!(produced = produced.len(), "producer finished");
        Ok(produced)
    }

    fn produce_all<S: PayloadSource>(&self, source: &mut S) -> Result<Vec<SlotToken>> {
        let mut produced = Vec::with_capacity(self.quota as usize);
        for token in 1..=self.quota {
            let payload = source.generate(token);
            self.send(token, &payload)?;
            produced.push(token);

            if let Some(pace) = &self.pace {
                pace.pause();
            }
        }
        Ok(produced)
    }

    /// Sets the termination flag without producing anything further.
    pub fn finish(&self) {
        self.buffer.close();
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }
}
