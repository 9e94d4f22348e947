// One in-process run: a producer thread and a consumer thread sharing a
// bounded buffer and a payload store.

use super::{BoundedBuffer, Consumer, Producer, SessionBuilder};
use crate::config::Pace;
use crate::error::{BufferError, Result};
use crate::payload::{PayloadSink, PayloadSource};
use crate::Core::PayloadStore;
use crate::SPSC::Structs::SessionReport;
use std::sync::Arc;
use std::thread;
use tracing::info;

#[derive(Debug)]
pub struct Session {
    buffer: Arc<BoundedBuffer>,
    store: Arc<dyn PayloadStore>,
    quota: u64,
    production_pace: Option<Pace>,
    consumption_pace: Option<Pace>,
}

impl Session {
    pub(crate) fn new(
        buffer: Arc<BoundedBuffer>,
        store: Arc<dyn PayloadStore>,
        quota: u64,
        production_pace: Option<Pace>,
        consumption_pace: Option<Pace>,
    ) -> Self {
        Self {
            buffer,
            store,
            quota,
            production_pace,
            consumption_pace,
        }
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// A producer handle over this session's buffer and store.
    pub fn producer(&self) -> Producer {
        Producer::new(
            Arc::clone(&self.buffer),
            Arc::clone(&self.store),
            self.quota,
            self.production_pace,
        )
    }

    /// A consumer handle over this session's buffer and store.
    pub fn consumer(&self) -> Consumer {
        Consumer::new(
            Arc::clone(&self.buffer),
            Arc::clone(&self.store),
            self.consumption_pace,
        )
    }

    /// Runs the producer and consumer on two named threads and waits for both.
    ///
    /// Returns once the producer has met its quota and the consumer has
    /// drained every admitted token.
    pub fn run<S, K>(&self, mut source: S, mut sink: K) -> Result<(SessionReport, K)>
    where
        S: PayloadSource + Send + 'static,
        K: PayloadSink + Send + 'static,
    {
        info!(
            capacity = self.buffer.capacity(),
            quota = self.quota,
            "session started"
        );

        let producer = self.producer();
        let producer_thread = thread::Builder::new()
            .name("producer".into())
            .spawn(move || producer.run(&mut source))?;

        let consumer = self.consumer();
        let consumer_thread = thread::Builder::new()
            .name("consumer".into())
            .spawn(move || {
                let tally = consumer.run(&mut sink);
                (tally, sink)
            });
        let consumer_thread = match consumer_thread {
            Ok(handle) => handle,
            Err(e) => {
                // Nobody will drain; unblock and reap the producer.
                self.buffer.close();
                while self.buffer.try_take().is_ok() {}
                let _ = producer_thread.join();
                return Err(e.into());
            }
        };

        let produced = producer_thread
            .join()
            .map_err(|_| BufferError::WorkerPanicked("producer"))?;
        let (tally, sink) = consumer_thread
            .join()
            .map_err(|_| BufferError::WorkerPanicked("consumer"))?;
        let produced = produced?;

        let report = SessionReport {
            produced,
            consumed: tally.consumed,
            missing: tally.missing,
        };
        info!(
            produced = report.produced.len(),
            consumed = report.consumed.len(),
            missing = report.missing.len(),
            "session completed"
        );
        Ok((report, sink))
    }

    /// Removes any payloads left in the store, e.g. after an interrupted run.
    pub fn cleanup(&self) -> Result<usize> {
        let removed = self.store.purge()?;
        info!(removed, "cleanup removed residual payloads");
        Ok(removed)
    }

    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }

    pub fn store(&self) -> &Arc<dyn PayloadStore> {
        &self.store
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }
}
