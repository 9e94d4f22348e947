// Remote consumer: takes `count` records from the buffer service and prints
// a report for each. `count` must match the producer's.
use dmxp_slotbuffer::Debug::init_tracing;
use dmxp_slotbuffer::Net::RemoteConsumer;
use dmxp_slotbuffer::payload::ReportSink;
use dmxp_slotbuffer::BufferConfig;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <expected_records> [addr]", args[0]);
        std::process::exit(1);
    }

    let mut config = BufferConfig::from_env()?;
    config.quota = args[1].parse().expect("Invalid number of records");
    if let Some(addr) = args.get(2) {
        config.addr = addr.clone();
    }

    let consumer = RemoteConsumer::from_config(&config);
    let mut sink = ReportSink::stdout();
    let report = consumer.run(&mut sink).await;

    println!(
        "Consumer: Finished (Processed {} records, {} rejected)",
        report.consumed.len(),
        sink.rejected.len()
    );
    if sink.rejected.is_empty() && report.consumed.len() as u64 == config.quota {
        println!("All records received successfully");
    }
    Ok(())
}
