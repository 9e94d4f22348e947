use std::collections::VecDeque;
use std::sync::atomic::Ordering::{AcqRel, Acquire};
use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;
use tracing::trace;

use super::Buffer::{BoundedBuffer, SlotQueue};
use crate::error::{BufferError, Result};
use crate::Core::Semaphore;
use crate::SPSC::Structs::SlotToken;

impl SlotQueue {
    /// Create an empty queue holding at most `capacity` tokens.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity);
        }
        Ok(Self {
            tokens: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append `token` at the tail.
    ///
    /// # Returns
    /// * `Ok(len)` with the new length on success
    /// * `Err(CapacityExceeded)` if the queue is full; nothing is appended
    pub fn push(&mut self, token: SlotToken) -> Result<usize> {
        if self.is_full() {
            return Err(BufferError::CapacityExceeded {
                size: self.tokens.len(),
                capacity: self.capacity,
            });
        }
        self.tokens.push_back(token);
        Ok(self.tokens.len())
    }

    /// Remove and return the oldest token, or None if the queue is empty.
    pub fn pop(&mut self) -> Option<SlotToken> {
        self.tokens.pop_front()
    }

    /// The oldest token without removing it.
    pub fn peek(&self) -> Option<SlotToken> {
        self.tokens.front().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.tokens.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens in retrieval order.
    pub fn tokens(&self) -> impl Iterator<Item = SlotToken> + '_ {
        self.tokens.iter().copied()
    }
}

impl BoundedBuffer {
    /// Create an empty buffer with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self> {
        let permits = u32::try_from(capacity).map_err(|_| BufferError::InvalidCapacity)?;
        Ok(Self {
            slots: Mutex::new(SlotQueue::new(capacity)?),
            empty_slots: Semaphore::new(permits),
            full_slots: Semaphore::new(0),
            closed: AtomicBool::new(false),
            capacity,
        })
    }

    /// Admit `token`, blocking while every slot is taken.
    ///
    /// Returns once the token is visible to a concurrent [`take`](Self::take).
    ///
    /// # Returns
    /// * `Err(Closed)` if the termination flag is already set
    pub fn put(&self, token: SlotToken) -> Result<()> {
        if self.is_closed() {
            return Err(BufferError::Closed);
        }

        // Wait for space outside the lock
        self.empty_slots.acquire();

        let pushed = self.slots.lock().push(token);
        match pushed {
            Ok(len) => {
                trace!(token, len, "admitted");
                self.full_slots.release();
                Ok(())
            }
            Err(e) => {
                // Unreachable while the permit accounting holds; hand the permit back.
                self.empty_slots.release();
                Err(e)
            }
        }
    }

    /// Admit `token` only if a slot is free right now.
    ///
    /// # Returns
    /// * `Err(CapacityExceeded)` if the buffer is full
    /// * `Err(Closed)` if the termination flag is set
    pub fn try_put(&self, token: SlotToken) -> Result<()> {
        if self.is_closed() {
            return Err(BufferError::Closed);
        }
        if !self.empty_slots.try_acquire() {
            return Err(BufferError::CapacityExceeded {
                size: self.len(),
                capacity: self.capacity,
            });
        }
        match self.slots.lock().push(token) {
            Ok(_) => {
                self.full_slots.release();
                Ok(())
            }
            Err(e) => {
                self.empty_slots.release();
                Err(e)
            }
        }
    }

    /// Remove the oldest token, blocking while the buffer is empty.
    ///
    /// # Returns
    /// * `Some(token)` for the next token in admission order
    /// * `None` once the buffer is closed and fully drained
    pub fn take(&self) -> Option<SlotToken> {
        // Wait for data outside the lock
        self.full_slots.acquire();

        let popped = self.slots.lock().pop();
        match popped {
            Some(token) => {
                trace!(token, "retrieved");
                self.empty_slots.release();
                Some(token)
            }
            None => {
                // Only the close permit gets here. Re-post it so any later
                // take() also observes the closed, drained state.
                self.full_slots.release();
                None
            }
        }
    }

    /// Remove the oldest token if one is present right now.
    ///
    /// # Returns
    /// * `Err(BufferEmpty)` if nothing is buffered
    pub fn try_take(&self) -> Result<SlotToken> {
        if !self.full_slots.try_acquire() {
            return Err(BufferError::BufferEmpty);
        }
        match self.slots.lock().pop() {
            Some(token) => {
                self.empty_slots.release();
                Ok(token)
            }
            None => {
                self.full_slots.release();
                Err(BufferError::BufferEmpty)
            }
        }
    }

    /// Set the termination flag and wake a consumer blocked on an empty buffer.
    ///
    /// Tokens already admitted stay retrievable; `take` returns `None` only
    /// after they are drained. Calling this more than once has no further effect.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, AcqRel, Acquire)
            .is_ok()
        {
            self.full_slots.release();
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Acquire)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots as counted by `empty_slots`.
    pub fn available_slots(&self) -> usize {
        self.empty_slots.available() as usize
    }

    /// Copy of the buffered tokens in retrieval order.
    pub fn snapshot(&self) -> Vec<SlotToken> {
        self.slots.lock().tokens().collect()
    }
}
