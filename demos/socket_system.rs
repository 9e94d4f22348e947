// Buffer service, remote producer and remote consumer in one process.
use dmxp_slotbuffer::Debug::init_tracing;
use dmxp_slotbuffer::Net::{BufferService, RemoteConsumer, RemoteProducer};
use dmxp_slotbuffer::payload::{ReportSink, StudentSource};
use dmxp_slotbuffer::BufferConfig;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = BufferConfig::from_env()?.with_demo_pacing();
    if std::env::args().any(|a| a == "--fast") {
        config = config
            .with_poll_interval(Duration::from_millis(50))
            .with_accept_poll(Duration::from_millis(100));
        config.production_pace = None;
        config.consumption_pace = None;
    }

    println!("{}", "=".repeat(60));
    println!("SOCKET-BASED PRODUCER-CONSUMER SYSTEM");
    println!("{}\n", "=".repeat(60));

    let service = BufferService::from_config(&config)?;
    let shutdown = service.shutdown_handle();
    let listener = TcpListener::bind(&config.addr).await?;
    let server = {
        let service = service.clone();
        tokio::spawn(async move { service.serve(listener).await })
    };

    let producer = RemoteProducer::from_config(&config);
    let consumer = RemoteConsumer::from_config(&config);
    let produce = tokio::spawn(async move { producer.run(&mut StudentSource::new()).await });
    let consume = tokio::spawn(async move {
        let mut sink = ReportSink::stdout();
        let report = consumer.run(&mut sink).await;
        (report, sink)
    });

    let produced = produce.await?;
    let (consumed, sink) = consume.await?;

    shutdown.trigger();
    server.await??;

    println!("{}", "=".repeat(60));
    println!(
        "SOCKET SYSTEM COMPLETED: produced {}, consumed {}, rejected {}",
        produced.produced.len(),
        consumed.consumed.len(),
        sink.rejected.len()
    );
    println!("{}", "=".repeat(60));
    Ok(())
}
