mod builder;
mod consumer;
mod producer;
mod session;

pub use builder::SessionBuilder;
pub use consumer::Consumer;
pub use producer::Producer;
pub use session::Session;

pub use Buffer::{BoundedBuffer, SlotQueue};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    mod debug;
    pub use Buffer::{BoundedBuffer, SlotQueue, DEFAULT_CAPACITY}; // re-export for stable path
}

pub mod Structs {
    pub mod Buffer_Structs;
    pub use Buffer_Structs::{ConsumerTally, SessionReport, SlotToken}; // re-export for stable path
}
