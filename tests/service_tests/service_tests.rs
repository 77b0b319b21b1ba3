//! Tests for SelectionService
//!
//! These tests verify:
//! - Two-pointer elimination for min and max
//! - Session lifecycle (ids, removal on done)
//! - Rejection of out-of-turn and unknown messages
//! - Session capacity and release of abandoned sessions
//! - Concurrent sessions on a shared service

use std::sync::Arc;
use std::thread;

use oracle_select::client::Client;
use oracle_select::protocol::{decode, encode, Message, WireRecord};
use oracle_select::{Result, SelectError, SelectionService};

// =============================================================================
// Helper Functions
// =============================================================================

/// In-process transport straight into a service
fn local(service: &SelectionService) -> impl FnMut(WireRecord) -> Result<WireRecord> + '_ {
    move |record: WireRecord| -> Result<WireRecord> {
        let reply = service.handle(decode(record)?)?;
        Ok(encode(&reply))
    }
}

fn compare_parts(message: &Message) -> (u32, usize, usize) {
    match *message {
        Message::Compare {
            request_id,
            left,
            right,
        } => (request_id, left, right),
        ref other => panic!("Expected compare, got {}", other),
    }
}

// =============================================================================
// Elimination Tests
// =============================================================================

#[test]
fn test_first_query_spans_the_sequence() {
    let service = SelectionService::default();

    let reply = service.handle(Message::ComputeMax { length: 4 }).unwrap();
    let (_, left, right) = compare_parts(&reply);

    assert_eq!((left, right), (0, 3));
    assert_eq!(service.live_sessions(), 1);
}

#[test]
fn test_max_walkthrough() {
    let service = SelectionService::default();
    let values = [1, 2, 3, 1];

    let mut reply = service.handle(Message::ComputeMax { length: 4 }).unwrap();
    let mut comparisons = 0;

    while let Message::Compare {
        request_id,
        left,
        right,
    } = reply
    {
        comparisons += 1;
        reply = service
            .handle(Message::ComparisonResult {
                request_id,
                answer: values[left] < values[right],
            })
            .unwrap();
    }

    assert_eq!(reply, Message::Done { result: 2 });
    assert_eq!(comparisons, 3);
    assert_eq!(service.live_sessions(), 0);
}

#[test]
fn test_min_moves_pointers_the_other_way() {
    let service = SelectionService::default();

    let (id, _, _) = compare_parts(&service.handle(Message::ComputeMin { length: 3 }).unwrap());

    // value[0] < value[2]: for min the left candidate survives
    let reply = service
        .handle(Message::ComparisonResult {
            request_id: id,
            answer: true,
        })
        .unwrap();
    assert_eq!(compare_parts(&reply), (id, 0, 1));

    // value[0] >= value[1]: right candidate survives
    let reply = service
        .handle(Message::ComparisonResult {
            request_id: id,
            answer: false,
        })
        .unwrap();
    assert_eq!(reply, Message::Done { result: 1 });
}

#[test]
fn test_single_value_is_done_immediately() {
    let service = SelectionService::default();

    let reply = service.handle(Message::ComputeMin { length: 1 }).unwrap();

    assert_eq!(reply, Message::Done { result: 0 });
    assert_eq!(service.live_sessions(), 0);
}

#[test]
fn test_empty_sequence_is_rejected() {
    let service = SelectionService::default();

    let result = service.handle(Message::ComputeMax { length: 0 });
    assert!(matches!(result, Err(SelectError::EmptySequence)));
}

#[test]
fn test_ties_resolve_to_a_matching_value() {
    let service = SelectionService::default();
    let values = [7, 7, 7];
    let mut client = Client::new(local(&service));

    assert_eq!(client.compute(&values, "max").unwrap(), 7);
    assert_eq!(client.compute(&values, "min").unwrap(), 7);
}

// =============================================================================
// Session Lifecycle Tests
// =============================================================================

#[test]
fn test_session_ids_are_unique_and_nonzero() {
    let service = SelectionService::default();

    let ids: Vec<u32> = (0..5)
        .map(|_| compare_parts(&service.handle(Message::ComputeMax { length: 2 }).unwrap()).0)
        .collect();

    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
    assert!(ids.iter().all(|&id| id != 0));
}

#[test]
fn test_finished_session_is_forgotten() {
    let service = SelectionService::default();
    let (id, _, _) = compare_parts(&service.handle(Message::ComputeMax { length: 2 }).unwrap());

    let reply = service
        .handle(Message::ComparisonResult {
            request_id: id,
            answer: false,
        })
        .unwrap();
    assert_eq!(reply, Message::Done { result: 0 });
    assert!(service.session(id).is_none());

    // a second answer for the same query matches nothing
    let result = service.handle(Message::ComparisonResult {
        request_id: id,
        answer: true,
    });
    assert!(matches!(result, Err(SelectError::SessionNotFound(i)) if i == id));
}

#[test]
fn test_unknown_request_id() {
    let service = SelectionService::default();

    let result = service.handle(Message::ComparisonResult {
        request_id: 77,
        answer: true,
    });

    assert!(matches!(result, Err(SelectError::SessionNotFound(77))));
}

#[test]
fn test_service_messages_are_violations() {
    let service = SelectionService::default();

    for message in [
        Message::Done { result: 0 },
        Message::Compare {
            request_id: 1,
            left: 0,
            right: 1,
        },
    ] {
        match service.handle(message.clone()) {
            Err(SelectError::ProtocolViolation { message: offending, .. }) => {
                assert_eq!(offending, message)
            }
            other => panic!("Expected ProtocolViolation, got {:?}", other),
        }
    }
}

#[test]
fn test_capacity_limit() {
    let service = SelectionService::with_capacity(2);

    service.handle(Message::ComputeMax { length: 3 }).unwrap();
    service.handle(Message::ComputeMin { length: 3 }).unwrap();

    let result = service.handle(Message::ComputeMax { length: 3 });
    assert!(matches!(result, Err(SelectError::CapacityExceeded(2))));

    // single-value sessions never occupy a slot
    assert_eq!(
        service.handle(Message::ComputeMax { length: 1 }).unwrap(),
        Message::Done { result: 0 }
    );
}

#[test]
fn test_abandoned_sessions_free_capacity() {
    let service = SelectionService::with_capacity(3);

    let ids: Vec<u32> = (0..3)
        .map(|_| compare_parts(&service.handle(Message::ComputeMax { length: 4 }).unwrap()).0)
        .collect();
    assert!(matches!(
        service.handle(Message::ComputeMax { length: 4 }),
        Err(SelectError::CapacityExceeded(3))
    ));

    for &id in &ids {
        assert!(service.abandon(id));
    }
    assert_eq!(service.live_sessions(), 0);

    let (id, left, right) =
        compare_parts(&service.handle(Message::ComputeMax { length: 4 }).unwrap());
    assert!(!ids.contains(&id));
    assert_eq!((left, right), (0, 3));
}

#[test]
fn test_abandon_unknown_or_finished_session() {
    let service = SelectionService::default();
    assert!(!service.abandon(9));

    let (id, _, _) = compare_parts(&service.handle(Message::ComputeMin { length: 2 }).unwrap());
    service
        .handle(Message::ComparisonResult {
            request_id: id,
            answer: true,
        })
        .unwrap();
    assert!(!service.abandon(id));

    // answers for an abandoned session are unknown ids
    let (id, _, _) = compare_parts(&service.handle(Message::ComputeMin { length: 3 }).unwrap());
    assert!(service.abandon(id));
    let result = service.handle(Message::ComparisonResult {
        request_id: id,
        answer: true,
    });
    assert!(matches!(result, Err(SelectError::SessionNotFound(i)) if i == id));
}

// =============================================================================
// Driver + Service Tests
// =============================================================================

#[test]
fn test_driver_against_service_for_many_lengths() {
    let service = SelectionService::default();
    let mut client = Client::new(local(&service));

    for len in 1..64i64 {
        let values: Vec<i64> = (0..len).map(|i| (i * 37 + 11) % 23 - 9).collect();

        assert_eq!(
            client.compute(&values, "max").unwrap(),
            *values.iter().max().unwrap()
        );
        assert_eq!(
            client.compute(&values, "min").unwrap(),
            *values.iter().min().unwrap()
        );
    }

    assert_eq!(service.live_sessions(), 0);
}

#[test]
fn test_concurrent_sessions_share_a_service() {
    let service = Arc::new(SelectionService::default());

    let handles: Vec<_> = (0..8i64)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let mut client = Client::new(local(&service));
                for round in 0..50i64 {
                    let values: Vec<i64> = (0..(round % 13 + 1)).map(|i| (i * t + round) % 17).collect();
                    let max = client.compute(&values, "max").unwrap();
                    assert_eq!(max, *values.iter().max().unwrap());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.live_sessions(), 0);
}
