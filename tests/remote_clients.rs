use dmxp_slotbuffer::Core::{MemoryStore, PayloadStore};
use dmxp_slotbuffer::Net::{BufferClient, BufferService, RemoteConsumer, RemoteProducer, Status};
use dmxp_slotbuffer::payload::{ReportSink, StudentSource};
use dmxp_slotbuffer::BufferConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const POLL: Duration = Duration::from_millis(10);

async fn spawn_service(capacity: usize) -> (BufferService, String, tokio::task::JoinHandle<dmxp_slotbuffer::Result<()>>) {
    let config = BufferConfig::default()
        .with_capacity(capacity)
        .with_accept_poll(Duration::from_millis(20));
    let service = BufferService::with_config(&config, Arc::new(MemoryStore::new())).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = {
        let service = service.clone();
        tokio::spawn(async move { service.serve(listener).await })
    };
    (service, addr, handle)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn producer_and_consumer_complete_a_run() {
    let (service, addr, server) = spawn_service(3).await;

    let producer = RemoteProducer::new(BufferClient::new(addr.clone()), 12).with_poll_interval(POLL);
    let consumer = RemoteConsumer::new(BufferClient::new(addr.clone()), 12).with_poll_interval(POLL);

    let produce = tokio::spawn(async move {
        let mut source = |token: u64| format!("payload-{token}").into_bytes();
        producer.run(&mut source).await
    });
    let consume = tokio::spawn(async move {
        let mut sink: Vec<(u64, Vec<u8>)> = Vec::new();
        let report = consumer.run(&mut sink).await;
        (report, sink)
    });

    let produced = produce.await.unwrap();
    let (consumed, sink) = consume.await.unwrap();

    let expected: Vec<u64> = (1..=12).collect();
    assert_eq!(produced.produced, expected);
    assert!(produced.abandoned.is_empty());
    assert_eq!(consumed.consumed, expected);
    assert_eq!(consumed.errors, 0);
    for (token, payload) in &sink {
        assert_eq!(payload, format!("payload-{token}").as_bytes());
    }
    assert!(service.is_empty());
    assert!(service.store().is_empty());

    service.shutdown_handle().trigger();
    server.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn producer_waits_on_full_buffer() {
    let (service, addr, server) = spawn_service(2).await;

    let producer = RemoteProducer::new(BufferClient::new(addr.clone()), 4).with_poll_interval(POLL);
    let produce = tokio::spawn(async move {
        let mut source = |token: u64| token.to_string().into_bytes();
        producer.run(&mut source).await
    });

    // Let the producer hit FULL a few times before draining
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.len(), 2);

    let client = BufferClient::new(addr);
    let mut drained = Vec::new();
    while drained.len() < 4 {
        let response = client.consume().await;
        match response.status {
            Status::Success => drained.push(response.file_number.unwrap()),
            Status::Empty => tokio::time::sleep(POLL).await,
            other => panic!("unexpected status {:?}", other),
        }
    }

    let report = produce.await.unwrap();
    assert_eq!(report.produced, vec![1, 2, 3, 4]);
    assert!(report.full_retries > 0);
    assert_eq!(drained, vec![1, 2, 3, 4]);

    service.shutdown_handle().trigger();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn student_records_verify_end_to_end() {
    let (service, addr, server) = spawn_service(10).await;

    let producer = RemoteProducer::new(BufferClient::new(addr.clone()), 5).with_poll_interval(POLL);
    let report = producer.run(&mut StudentSource::with_seed(7)).await;
    assert_eq!(report.produced.len(), 5);

    let consumer = RemoteConsumer::new(BufferClient::new(addr), 5).with_poll_interval(POLL);
    let mut sink = ReportSink::quiet();
    let consumed = consumer.run(&mut sink).await;

    assert_eq!(consumed.consumed, vec![1, 2, 3, 4, 5]);
    assert_eq!(sink.accepted, vec![1, 2, 3, 4, 5]);
    assert!(sink.rejected.is_empty());

    service.shutdown_handle().trigger();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn unreachable_service_abandons_every_item() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let client = BufferClient::new(addr).with_io_timeout(Duration::from_millis(500));
    let producer = RemoteProducer::new(client, 3).with_poll_interval(POLL);
    let mut source = |token: u64| vec![b'a' + token as u8];
    let report = producer.run(&mut source).await;

    assert!(report.produced.is_empty());
    assert_eq!(report.abandoned, vec![1, 2, 3]);
    assert_eq!(report.full_retries, 0);
}

#[tokio::test]
async fn non_utf8_payload_is_abandoned() {
    let (service, addr, server) = spawn_service(4).await;

    let producer = RemoteProducer::new(BufferClient::new(addr), 2).with_poll_interval(POLL);
    let mut source = |token: u64| if token == 1 { vec![0xff, 0xfe] } else { b"ok".to_vec() };
    let report = producer.run(&mut source).await;

    assert_eq!(report.abandoned, vec![1]);
    assert_eq!(report.produced, vec![2]);
    assert_eq!(service.snapshot(), vec![2]);

    service.shutdown_handle().trigger();
    server.await.unwrap().unwrap();
}
