//! Unit tests for deletion_queue.rs

use crate::error::Error;
use crate::resource::{DeletionQueue, Teardown};

#[test]
fn test_new_queue_is_empty() {
    let queue = DeletionQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_run_all_is_last_in_first_out() {
    let mut queue = DeletionQueue::new();
    queue.register(Teardown::ImageAllocation).unwrap();
    queue.register(Teardown::ImageView).unwrap();
    queue.register(Teardown::Sampler).unwrap();

    let mut order = Vec::new();
    queue.run_all(|step| order.push(step));

    assert_eq!(order, vec![Teardown::Sampler, Teardown::ImageView, Teardown::ImageAllocation]);
    assert!(queue.is_empty());
}

#[test]
fn test_pending_matches_run_order() {
    let mut queue = DeletionQueue::new();
    queue.register(Teardown::BufferAllocation).unwrap();
    queue.register(Teardown::Mapping).unwrap();

    let pending: Vec<Teardown> = queue.pending().collect();
    assert_eq!(pending, vec![Teardown::Mapping, Teardown::BufferAllocation]);
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_run_all_twice_runs_nothing_the_second_time() {
    let mut queue = DeletionQueue::new();
    queue.register(Teardown::BufferAllocation).unwrap();

    let mut runs = 0;
    queue.run_all(|_| runs += 1);
    queue.run_all(|_| runs += 1);
    assert_eq!(runs, 1);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut queue = DeletionQueue::new();
    queue.register(Teardown::ImageView).unwrap();

    let err = queue.register(Teardown::ImageView).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_every_step_fits() {
    let mut queue = DeletionQueue::new();
    for step in [
        Teardown::BufferAllocation,
        Teardown::Mapping,
        Teardown::ImageAllocation,
        Teardown::ImageView,
        Teardown::Sampler,
    ] {
        queue.register(step).unwrap();
    }
    assert_eq!(queue.len(), Teardown::COUNT);
}

#[test]
fn test_queue_can_be_reused_after_run_all() {
    let mut queue = DeletionQueue::new();
    queue.register(Teardown::Sampler).unwrap();
    queue.run_all(|_| {});

    queue.register(Teardown::Sampler).unwrap();
    assert!(queue.contains(Teardown::Sampler));
}
