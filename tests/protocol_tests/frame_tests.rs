//! Frame Tests
//!
//! Tests for the status + length envelope and stream helpers.

use std::io::Cursor;

use oracle_select::protocol::{
    decode_frame, encode_frame, read_frame, write_frame, Frame, Message, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use oracle_select::SelectError;

#[test]
fn test_encode_frame_layout() {
    let frame = Frame::error("boom");
    let bytes = encode_frame(&frame).unwrap();

    assert_eq!(bytes.len(), HEADER_SIZE + 4);
    assert_eq!(bytes[0], 0x01);
    assert_eq!(&bytes[1..5], &4u32.to_be_bytes());
    assert_eq!(&bytes[5..], b"boom");
}

#[test]
fn test_decode_frame_message() {
    let msg = Message::Done { result: 7 };
    let decoded = decode_frame(&encode_frame(&Frame::message(&msg)).unwrap()).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.into_message().unwrap(), msg);
}

#[test]
fn test_error_frame_surfaces_as_remote() {
    let result = Frame::error("Session not found: 4").into_message();

    match result {
        Err(e @ SelectError::Remote(_)) => {
            assert!(e.is_transport());
            assert!(e.to_string().contains("Session not found"));
        }
        other => panic!("Expected Remote, got {:?}", other),
    }
}

#[test]
fn test_decode_frame_incomplete_header() {
    let result = decode_frame(&[0x00, 0x00]);
    assert!(matches!(result, Err(SelectError::Transport(_))));
}

#[test]
fn test_decode_frame_incomplete_payload() {
    let mut bytes = encode_frame(&Frame::message(&Message::ComputeMax { length: 3 }))
        .unwrap()
        .to_vec();
    bytes.truncate(bytes.len() - 2);

    assert!(matches!(decode_frame(&bytes), Err(SelectError::Transport(_))));
}

#[test]
fn test_decode_frame_unknown_status() {
    let bytes = [0x7f, 0, 0, 0, 0];
    assert!(matches!(decode_frame(&bytes), Err(SelectError::Transport(_))));
}

#[test]
fn test_read_frame_rejects_oversized_payload() {
    let mut bytes = vec![0x00];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());
    let mut cursor = Cursor::new(bytes);

    assert!(matches!(read_frame(&mut cursor), Err(SelectError::Transport(_))));
}

#[test]
fn test_stream_write_then_read_sequence() {
    let messages = vec![
        Message::ComputeMin { length: 2 },
        Message::ComparisonResult {
            request_id: 1,
            answer: false,
        },
    ];

    let mut buf = Vec::new();
    for msg in &messages {
        write_frame(&mut buf, &Frame::message(msg)).unwrap();
    }
    write_frame(&mut buf, &Frame::error("done here")).unwrap();

    let mut cursor = Cursor::new(buf);
    for msg in &messages {
        assert_eq!(read_frame(&mut cursor).unwrap().into_message().unwrap(), *msg);
    }
    assert_eq!(read_frame(&mut cursor).unwrap().reason(), "done here");

    // Nothing left: clean EOF surfaces as an I/O error
    assert!(matches!(read_frame(&mut cursor), Err(SelectError::Io(_))));
}

#[test]
fn test_non_object_payload_is_malformed() {
    let frame = Frame {
        status: Status::Ok,
        payload: b"[1, 2, 3]".to_vec(),
    };

    assert!(matches!(
        frame.into_record(),
        Err(SelectError::MalformedMessage(_))
    ));
}

#[test]
fn test_oversized_frame_is_not_written() {
    let frame = Frame {
        status: Status::Ok,
        payload: vec![b' '; MAX_PAYLOAD_SIZE as usize + 1],
    };

    assert!(matches!(encode_frame(&frame), Err(SelectError::Transport(_))));

    let mut buf = Vec::new();
    assert!(matches!(
        write_frame(&mut buf, &frame),
        Err(SelectError::Transport(_))
    ));
    assert!(buf.is_empty());
}

#[test]
fn test_frame_at_payload_limit_is_written() {
    let frame = Frame {
        status: Status::Error,
        payload: vec![b'x'; MAX_PAYLOAD_SIZE as usize],
    };

    let bytes = encode_frame(&frame).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + MAX_PAYLOAD_SIZE as usize);
    assert_eq!(decode_frame(&bytes).unwrap(), frame);
}
