// Remote producer: sends `count` student records to the buffer service.
use dmxp_slotbuffer::Debug::init_tracing;
use dmxp_slotbuffer::Net::RemoteProducer;
use dmxp_slotbuffer::payload::StudentSource;
use dmxp_slotbuffer::BufferConfig;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_records> [addr]", args[0]);
        std::process::exit(1);
    }

    let mut config = BufferConfig::from_env()?;
    config.quota = args[1].parse().expect("Invalid number of records");
    if let Some(addr) = args.get(2) {
        config.addr = addr.clone();
    }

    let producer = RemoteProducer::from_config(&config);
    let report = producer.run(&mut StudentSource::new()).await;

    println!(
        "Producer: produced {} records ({} abandoned, {} retries on full buffer)",
        report.produced.len(),
        report.abandoned.len(),
        report.full_retries
    );
    Ok(())
}
