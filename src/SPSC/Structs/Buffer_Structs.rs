// Plain data shared by the bounded buffer and both bindings.

/// A 1-based sequence number naming one payload in the buffer.
///
/// Assigned by the producing party in strictly increasing order. The buffer
/// holds only tokens; the bytes they name live in a payload store.
pub type SlotToken = u64;

/// What the consuming side saw while draining the buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumerTally {
    /// Tokens whose payload was delivered, in retrieval order.
    pub consumed: Vec<SlotToken>,
    /// Tokens retrieved from the buffer whose payload was gone from the store.
    pub missing: Vec<SlotToken>,
}

impl ConsumerTally {
    /// Every token taken out of the buffer, delivered or not.
    pub fn retrieved(&self) -> usize {
        self.consumed.len() + self.missing.len()
    }
}

/// Outcome of one in-process producer/consumer run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Tokens admitted by the producer, in admission order.
    pub produced: Vec<SlotToken>,
    /// Tokens delivered to the sink, in retrieval order.
    pub consumed: Vec<SlotToken>,
    /// Tokens retrieved without a payload.
    pub missing: Vec<SlotToken>,
}

impl SessionReport {
    /// True when every admitted token was retrieved exactly once.
    ///
    /// With nothing missing, delivery order must also equal admission order.
    /// Missing tokens are recorded apart from deliveries, so with any missing
    /// only the sets are compared.
    pub fn is_complete(&self) -> bool {
        if self.missing.is_empty() {
            return self.consumed == self.produced;
        }
        let mut retrieved: Vec<SlotToken> = self.consumed.clone();
        retrieved.extend_from_slice(&self.missing);
        retrieved.sort_unstable();
        let mut produced = self.produced.clone();
        produced.sort_unstable();
        produced == retrieved
    }
}
