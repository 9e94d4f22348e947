// In-process consumer handle.

use crate::config::Pace;
use crate::error::Result;
use crate::payload::PayloadSink;
use crate::Core::PayloadStore;
use crate::SPSC::Buffer::BoundedBuffer;
use crate::SPSC::Structs::{ConsumerTally, SlotToken};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The consuming side of an in-process session.
pub struct Consumer {
    buffer: Arc<BoundedBuffer>,
    store: Arc<dyn PayloadStore>,
    pace: Option<Pace>,
}

impl Consumer {
    pub(crate) fn new(
        buffer: Arc<BoundedBuffer>,
        store: Arc<dyn PayloadStore>,
        pace: Option<Pace>,
    ) -> Self {
        Self {
            buffer,
            store,
            pace,
        }
    }

    /// Receives the next token and its payload, blocking until one is available
    /// or the producer has finished.
    ///
    /// # Returns
    /// * `Ok(Some((token, payload)))` for the next token; its payload is removed from the store
    /// * `Ok(None)` once the termination flag is set and the buffer is drained
    /// * `Err(PayloadMissing)` if the token's payload is gone; the token is still consumed
    pub fn receive_blocking(&self) -> Result<Option<(SlotToken, Vec<u8>)>> {
        match self.buffer.take() {
            Some(token) => {
                let payload = self.store.take(token)?;
                debug!(token, buffer_size = self.buffer.len(), "consumed");
                Ok(Some((token, payload)))
            }
            None => Ok(None),
        }
    }

    /// Drains the buffer into `sink` until the producer has finished and no
    /// token remains.
    ///
    /// A token whose payload cannot be read is logged and recorded as
    /// missing; it is not re-offered.
    pub fn run<K: PayloadSink>(&self, sink: &mut K) -> ConsumerTally {
        info!("consumer started");
        let mut tally = ConsumerTally::default();

        while let Some(token) = self.buffer.take() {
            match self.store.take(token) {
                Ok(payload) => {
                    debug!(token, buffer_size = self.buffer.len(), "consumed");
                    sink.deliver(token, &payload);
                    tally.consumed.push(token);
                }
                Err(e) => {
                    error!(token, error = %e, "payload unavailable for retrieved token");
                    tally.missing.push(token);
                }
            }

            if let Some(pace) = &self.pace {
                pace.pause();
            }
        }

        info!(
            consumed = tally.consumed.len(),
            missing = tally.missing.len(),
            "consumer finished"
        );
        tally
    }

    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }
}
