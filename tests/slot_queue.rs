use dmxp_slotbuffer::SPSC::SlotQueue;
use dmxp_slotbuffer::BufferError;

#[test]
fn simple_push_pop() {
    let mut queue = SlotQueue::new(16).unwrap();

    assert_eq!(queue.push(7).unwrap(), 1);
    assert_eq!(queue.peek(), Some(7));
    assert_eq!(queue.pop(), Some(7));
    assert!(queue.is_empty());
    assert_eq!(queue.pop(), None);
}

#[test]
fn full_queue() {
    let mut queue = SlotQueue::new(4).unwrap();

    // Fill queue
    for token in 1..=4 {
        assert_eq!(queue.push(token).unwrap(), token as usize);
    }
    assert!(queue.is_full());

    // Next push should fail without changing anything
    match queue.push(5) {
        Err(BufferError::CapacityExceeded { size, capacity }) => {
            assert_eq!(size, 4);
            assert_eq!(capacity, 4);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other),
    }
    assert_eq!(queue.len(), 4);

    // Pop one
    assert_eq!(queue.pop(), Some(1));

    // Push should succeed now
    assert!(queue.push(5).is_ok());
    assert_eq!(queue.tokens().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
}

#[test]
fn fifo_order_without_interleaving() {
    let mut queue = SlotQueue::new(8).unwrap();
    let admitted = [3, 1, 4, 15, 9, 2, 6, 5];
    for token in admitted {
        queue.push(token).unwrap();
    }

    let retrieved: Vec<u64> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(retrieved, admitted);
}

#[test]
fn duplicate_tokens_are_not_deduplicated() {
    let mut queue = SlotQueue::new(3).unwrap();
    queue.push(1).unwrap();
    queue.push(1).unwrap();
    assert_eq!(queue.len(), 2);
}

#[test]
fn zero_capacity_is_rejected() {
    assert!(matches!(SlotQueue::new(0), Err(BufferError::InvalidCapacity)));
}
