use std::fmt;
use std::sync::atomic::Ordering;
use crate::Net::server::BufferService;
use crate::SPSC::Buffer::{BoundedBuffer, SlotQueue};

/// Debug function for SlotQueue
///
/// Shows length, capacity and the queued tokens in retrieval order.
pub fn debug_slot_queue(queue: &SlotQueue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SlotQueue")
        .field("len", &queue.len())
        .field("capacity", &queue.capacity())
        .field("tokens", &queue.tokens.iter().collect::<Vec<_>>())
        .finish()
}

/// Debug function for BoundedBuffer
///
/// Shows:
/// - Queue contents (taken under the lock, so never torn)
/// - Both admission counters
/// - Termination flag
pub fn debug_bounded_buffer(buffer: &BoundedBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundedBuffer")
        .field("slots", &*buffer.slots.lock())
        .field("empty_slots", &buffer.empty_slots.available())
        .field("full_slots", &buffer.full_slots.available())
        .field("closed", &buffer.closed.load(Ordering::Relaxed))
        .finish()
}

/// Debug function for BufferService
///
/// Shows the buffer size against capacity and whether shutdown was requested.
/// The payload store is opaque.
pub fn debug_buffer_service(service: &BufferService, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BufferService")
        .field("buffer_size", &service.len())
        .field("buffer_capacity", &service.capacity())
        .field("store", &"<opaque>")
        .field("shutdown", &service.shutdown_handle().is_triggered())
        .finish_non_exhaustive()
}
