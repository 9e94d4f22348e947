pub mod client;
pub mod protocol;
pub mod server;

pub use client::{BufferClient, ConsumerReport, ProducerReport, RemoteConsumer, RemoteProducer};
pub use protocol::{Request, Response, Status};
pub use server::{BufferService, ConnectionPhase, ShutdownHandle};
