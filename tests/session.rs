use dmxp_slotbuffer::payload::{PayloadSink, ReportSink, StudentSource};
use dmxp_slotbuffer::Core::{DirectoryStore, MemoryStore, PayloadStore};
use dmxp_slotbuffer::SPSC::Structs::SessionReport;
use dmxp_slotbuffer::SPSC::SessionBuilder;
use dmxp_slotbuffer::BufferError;
use serial_test::serial;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn numbered_payload(token: u64) -> Vec<u8> {
    format!("record-{}", token).into_bytes()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dmxp-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn drains_after_flag_with_small_capacity() {
    // quota=5, capacity=2: exactly 5 retrievals no matter when the flag flips
    for _ in 0..20 {
        let session = SessionBuilder::new()
            .with_capacity(2)
            .with_quota(5)
            .with_memory_store()
            .build()
            .unwrap();

        let (report, delivered) = session
            .run(numbered_payload, Vec::<(u64, Vec<u8>)>::new())
            .unwrap();

        assert_eq!(report.produced, vec![1, 2, 3, 4, 5]);
        assert_eq!(report.consumed, vec![1, 2, 3, 4, 5]);
        assert!(report.missing.is_empty());
        assert!(report.is_complete());
        assert_eq!(delivered.len(), 5);
        assert_eq!(delivered[2], (3, b"record-3".to_vec()));
        assert!(session.buffer().is_empty());
        assert!(session.store().is_empty());
    }
}

#[test]
fn drains_when_consumer_is_slower_than_producer() {
    struct SlowSink(Vec<u64>);
    impl PayloadSink for SlowSink {
        fn deliver(&mut self, token: u64, _payload: &[u8]) {
            thread::sleep(Duration::from_millis(5));
            self.0.push(token);
        }
    }

    let session = SessionBuilder::new()
        .with_capacity(2)
        .with_quota(5)
        .build()
        .unwrap();
    let (report, sink) = session.run(numbered_payload, SlowSink(Vec::new())).unwrap();

    // Producer finished (flag set) long before the consumer was done
    assert_eq!(sink.0, vec![1, 2, 3, 4, 5]);
    assert_eq!(report.consumed.len(), 5);
}

#[test]
fn capacity_one_preserves_order() {
    let session = SessionBuilder::new()
        .with_capacity(1)
        .with_quota(3)
        .build()
        .unwrap();
    let (report, _) = session
        .run(numbered_payload, Vec::<(u64, Vec<u8>)>::new())
        .unwrap();
    assert_eq!(report.consumed, vec![1, 2, 3]);
}

#[test]
fn default_session_produces_ten_student_records() {
    let session = SessionBuilder::new().build().unwrap();
    assert_eq!(session.buffer().capacity(), 10);
    assert_eq!(session.quota(), 10);

    let (report, sink) = session
        .run(StudentSource::with_seed(7), ReportSink::quiet())
        .unwrap();
    assert_eq!(report.consumed, (1..=10).collect::<Vec<_>>());
    assert_eq!(sink.accepted.len(), 10);
    assert!(sink.rejected.is_empty());
}

#[test]
fn missing_payload_is_reported_and_not_reoffered() {
    let store: Arc<dyn PayloadStore> = Arc::new(MemoryStore::new());
    let session = SessionBuilder::new()
        .with_capacity(3)
        .with_quota(3)
        .with_store(Arc::clone(&store))
        .build()
        .unwrap();

    let producer = session.producer();
    producer.send(1, b"one").unwrap();
    producer.send(2, b"two").unwrap();
    store.delete(1).unwrap();
    producer.finish();

    let consumer = session.consumer();
    match consumer.receive_blocking() {
        Err(BufferError::PayloadMissing(1)) => {}
        other => panic!("expected PayloadMissing(1), got {:?}", other),
    }
    let (token, payload) = consumer.receive_blocking().unwrap().unwrap();
    assert_eq!(token, 2);
    assert_eq!(payload, b"two");
    assert!(consumer.receive_blocking().unwrap().is_none());
}

#[test]
fn consumer_run_records_missing_tokens() {
    let session = SessionBuilder::new().with_capacity(4).build().unwrap();
    let producer = session.producer();
    for token in 1..=3 {
        producer.send(token, b"x").unwrap();
    }
    session.store().delete(2).unwrap();
    producer.finish();

    let mut delivered: Vec<(u64, Vec<u8>)> = Vec::new();
    let tally = session.consumer().run(&mut delivered);
    assert_eq!(tally.consumed, vec![1, 3]);
    assert_eq!(tally.missing, vec![2]);
    assert_eq!(tally.retrieved(), 3);
}

#[test]
fn send_after_finish_is_rejected_and_payload_removed() {
    let session = SessionBuilder::new().build().unwrap();
    let producer = session.producer();
    producer.finish();

    assert!(matches!(producer.send(1, b"late"), Err(BufferError::Closed)));
    assert!(session.store().is_empty());
}

#[test]
#[serial]
fn directory_store_session_leaves_no_files() {
    let dir = scratch_dir("session");
    let session = SessionBuilder::new()
        .with_capacity(2)
        .with_quota(6)
        .with_shared_dir(&dir)
        .build()
        .unwrap();

    let (report, sink) = session
        .run(StudentSource::with_seed(1), ReportSink::quiet())
        .unwrap();
    assert_eq!(report.consumed, (1..=6).collect::<Vec<_>>());
    assert_eq!(sink.accepted.len(), 6);

    let store = DirectoryStore::new(&dir).unwrap();
    assert_eq!(store.len(), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
#[serial]
fn cleanup_purges_residual_payload_files() {
    let dir = scratch_dir("cleanup");
    let session = SessionBuilder::new()
        .with_capacity(4)
        .with_shared_dir(&dir)
        .build()
        .unwrap();

    let producer = session.producer();
    producer.send(1, b"a").unwrap();
    producer.send(2, b"b").unwrap();
    std::fs::write(dir.join("notes.txt"), b"keep me").unwrap();

    assert_eq!(session.cleanup().unwrap(), 2);
    assert!(dir.join("notes.txt").exists());
    assert!(!dir.join(DirectoryStore::file_name(1)).exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn report_completeness_checks_order_and_coverage() {
    let in_order = SessionReport {
        produced: vec![1, 2, 3],
        consumed: vec![1, 2, 3],
        missing: vec![],
    };
    assert!(in_order.is_complete());

    let reordered = SessionReport {
        consumed: vec![2, 1, 3],
        ..in_order.clone()
    };
    assert!(!reordered.is_complete());

    let with_missing = SessionReport {
        consumed: vec![1, 3],
        missing: vec![2],
        ..in_order.clone()
    };
    assert!(with_missing.is_complete());

    let lost = SessionReport {
        consumed: vec![1],
        missing: vec![2],
        ..in_order
    };
    assert!(!lost.is_complete());
}
