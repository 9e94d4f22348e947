// In-process run: a producer thread and a consumer thread sharing one
// bounded buffer, payloads kept as files in the shared directory.
use dmxp_slotbuffer::payload::{ReportSink, StudentSource};
use dmxp_slotbuffer::Core::{DirectoryStore, PayloadStore};
use dmxp_slotbuffer::Debug::init_tracing;
use dmxp_slotbuffer::SPSC::SessionBuilder;
use dmxp_slotbuffer::BufferConfig;
use std::env;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let fast = env::args().any(|a| a == "--fast");
    let args: Vec<String> = env::args().skip(1).filter(|a| !a.starts_with("--")).collect();

    let mut config = BufferConfig::from_env()?.with_demo_pacing();
    if let Some(quota) = args.first() {
        config.quota = quota.parse().expect("Invalid number of records");
    }
    if let Some(capacity) = args.get(1) {
        config.capacity = capacity.parse().expect("Invalid capacity");
    }
    if fast {
        config.production_pace = None;
        config.consumption_pace = None;
    }

    let store = Arc::new(DirectoryStore::new(&config.shared_dir)?);
    let store_for_handler = Arc::clone(&store);

    // Handle Ctrl+C to clean up residual payload files
    ctrlc::set_handler(move || {
        match store_for_handler.purge() {
            Ok(removed) => println!("\n[CLEANUP] Removed {} payload files", removed),
            Err(e) => eprintln!("\n[CLEANUP] Failed: {}", e),
        }
        std::process::exit(130);
    })
    .expect("Error setting Ctrl+C handler");

    println!("{}", "=".repeat(60));
    println!("PRODUCER-CONSUMER SIMULATION");
    println!("Buffer Size: {}", config.capacity);
    println!("Records to Process: {}", config.quota);
    println!("{}\n", "=".repeat(60));

    let session = SessionBuilder::from_config(&config).with_store(store).build()?;
    let (report, sink) = session.run(StudentSource::new(), ReportSink::stdout())?;

    println!("{}", "=".repeat(60));
    println!(
        "SIMULATION COMPLETED: produced {}, consumed {}, missing {}, rejected {}",
        report.produced.len(),
        report.consumed.len(),
        report.missing.len(),
        sink.rejected.len()
    );
    println!("{}", "=".repeat(60));

    session.cleanup()?;
    Ok(())
}
