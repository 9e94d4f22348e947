// The bounded slot buffer: a capacity-checked FIFO of tokens, and the
// semaphore-guarded blocking wrapper used by the in-process binding.

use crate::Core::Semaphore;
use crate::SPSC::Structs::SlotToken;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;

/// Default number of slots.
pub const DEFAULT_CAPACITY: usize = 10;

/// A fixed-capacity FIFO of slot tokens with no blocking of its own.
///
/// Invariants:
/// - `0 <= len <= capacity` at all times; a push at capacity is rejected.
/// - Tokens come out in exactly the order they went in.
///
/// The network binding guards one of these with its service lock; the
/// in-process binding wraps one in [`BoundedBuffer`].
pub struct SlotQueue {
    pub(crate) tokens: VecDeque<SlotToken>,
    pub(crate) capacity: usize,
}

/// Blocking bounded buffer for one producer thread and one consumer thread.
///
/// ### Concurrency Design:
/// - **put**: wait(`empty_slots`) -> lock -> append -> unlock -> signal(`full_slots`).
/// - **take**: wait(`full_slots`) -> lock -> remove oldest -> unlock -> signal(`empty_slots`).
///
/// Counting waits always happen before the queue lock is taken and never
/// while it is held, so a producer waiting for space cannot hold the lock the
/// consumer needs to free space.
///
/// At any instant `empty_slots + full_slots + in-flight admissions = capacity`,
/// except for the single wake permit posted by [`BoundedBuffer::close`].
pub struct BoundedBuffer {
    /// The token FIFO. Only mutated while this lock is held.
    pub(crate) slots: Mutex<SlotQueue>,

    /// Free slots. Starts at `capacity`.
    pub(crate) empty_slots: Semaphore,

    /// Filled slots. Starts at 0.
    pub(crate) full_slots: Semaphore,

    /// Termination flag. Goes false -> true once, never back.
    pub(crate) closed: AtomicBool,

    pub(crate) capacity: usize,
}
