// Buffer service process. Producers and consumers connect to it over TCP.
use dmxp_slotbuffer::Debug::init_tracing;
use dmxp_slotbuffer::Net::BufferService;
use dmxp_slotbuffer::BufferConfig;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = BufferConfig::from_env()?;
    if let Some(addr) = env::args().nth(1) {
        config.addr = addr;
    }

    let service = BufferService::from_config(&config)?;
    let shutdown = service.shutdown_handle();

    // Handle Ctrl+C to stop accepting and drain in-flight connections
    ctrlc::set_handler(move || {
        shutdown.trigger();
    })
    .expect("Error setting Ctrl+C handler");

    println!("Buffer service listening on {} (capacity {})", config.addr, config.capacity);
    service.run(&config.addr).await?;

    let leftover = service.store().purge()?;
    println!("Buffer service stopped ({} residual payloads removed)", leftover);
    Ok(())
}
