//! Chunking-independence property for the framing protocol: for any
//! payload sequence, splitting the encoded wire bytes at arbitrary
//! boundaries must still deliver the same decoded sequence, in order.

use std::sync::Arc;

use lifecycle_core::framing::{Framer, TlvCodec, Value, ZlibCompressor};
use proptest::prelude::*;

fn framer() -> Framer {
    Framer::new(Arc::new(TlvCodec), Arc::new(ZlibCompressor))
}

fn sample_payloads() -> Vec<Value> {
    vec![
        Value::None,
        Value::Bool(true),
        Value::Int(-42),
        Value::str("hello"),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        Value::Map(vec![(
            Value::str("foo"),
            Value::List(vec![Value::str("bar"), Value::str("baz")]),
        )]),
    ]
}

proptest! {
    #[test]
    fn arbitrary_chunk_boundaries_preserve_order(cut_points in prop::collection::vec(1usize..37, 0..40)) {
        let payloads = sample_payloads();
        let mut sender = framer();
        let mut wire = Vec::new();
        for payload in &payloads {
            wire.extend(sender.send(payload).unwrap());
        }

        let mut boundaries: Vec<usize> = cut_points
            .into_iter()
            .map(|c| c % wire.len().max(1))
            .filter(|&c| c > 0 && c < wire.len())
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut receiver = framer();
        let mut received = Vec::new();
        let mut start = 0;
        for &end in boundaries.iter().chain(std::iter::once(&wire.len())) {
            if end <= start {
                continue;
            }
            let (decoded, result) = receiver.data_received(&wire[start..end]);
            result.unwrap();
            received.extend(decoded);
            start = end;
        }

        prop_assert_eq!(received, payloads);
    }
}

#[test]
fn ten_concatenated_copies_round_trip_byte_by_byte() {
    let mut sender = framer();
    let payload = Value::Map(vec![(
        Value::str("foo"),
        Value::List(vec![Value::str("bar"), Value::str("baz")]),
    )]);
    let message = sender.send(&payload).unwrap();
    let wire = message.repeat(10);

    let mut receiver = framer();
    let mut received = Vec::new();
    for byte in &wire {
        let (decoded, result) = receiver.data_received(std::slice::from_ref(byte));
        result.unwrap();
        received.extend(decoded);
    }

    assert_eq!(received.len(), 10);
    assert!(received.iter().all(|v| v == &payload));
}
