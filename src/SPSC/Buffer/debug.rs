use super::Buffer::{BoundedBuffer, SlotQueue};
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for SlotQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_slot_queue(self, f)
    }
}

impl fmt::Debug for BoundedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_bounded_buffer(self, f)
    }
}
