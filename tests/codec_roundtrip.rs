//! Round-trip tests: everything the encoder writes, the decoder returns.

mod common;

use common::RecordingSink;
use scantool_supervisor::dispatch::NotificationSink;
use scantool_supervisor::protocol::{
    pump, DecodeError, Notification, NotifierKind, OrderedMap, Payload, TransmissionStream,
};

/// Decodes a complete byte stream and returns the dispatched notifications.
async fn decode(bytes: &[u8]) -> Vec<Notification> {
    let sink = RecordingSink::new();
    pump(bytes, &sink).await.expect("stream should decode");
    sink.notifications()
}

/// Encodes with `write`, closes, and returns the raw stream.
fn transmit(write: impl FnOnce(&TransmissionStream<Vec<u8>>)) -> Vec<u8> {
    let stream = TransmissionStream::new(Vec::new());
    write(&stream);
    stream.close().unwrap();
    stream.into_inner()
}

#[tokio::test]
async fn map_roundtrip_preserves_order_and_content() {
    let map: OrderedMap = [
        ("operation", "scanning"),
        ("file", "src/måin.rs"),
        ("日本語", "çontent"),
        ("empty", ""),
    ]
    .into_iter()
    .collect();

    let bytes = transmit(|stream| stream.progress(&map));
    let decoded = decode(&bytes).await;

    assert_eq!(
        decoded,
        [Notification::new(NotifierKind::Progress, Payload::Map(map))]
    );
}

#[tokio::test]
async fn empty_map_roundtrips_as_empty_map() {
    // An empty map writes an empty body; the map-kind routing restores it as
    // an empty map, not an empty string.
    let bytes = transmit(|stream| stream.message(&OrderedMap::new()));
    let decoded = decode(&bytes).await;

    assert_eq!(
        decoded,
        [Notification::new(
            NotifierKind::Message,
            Payload::Map(OrderedMap::new()),
        )]
    );
}

#[tokio::test]
async fn bare_string_roundtrip() {
    let long = "long ".repeat(500);
    for text in ["", "plain", "non-ascii: åèñ→日本", long.as_str()] {
        let bytes = transmit(|stream| stream.sysout(text));
        let decoded = decode(&bytes).await;
        assert_eq!(
            decoded,
            [Notification::new(
                NotifierKind::Sysout,
                Payload::Text(text.to_string()),
            )]
        );
    }
}

#[tokio::test]
async fn overflow_string_roundtrips_byte_for_byte() {
    // Ten times the decoder's working buffer: the overflow path must be
    // lossless, multi-byte characters included.
    let text = "déjà-vu ".repeat(5120 / 8);
    assert!(text.len() >= 5120);

    let bytes = transmit(|stream| stream.output(&text));
    let decoded = decode(&bytes).await;
    assert_eq!(
        decoded,
        [Notification::new(NotifierKind::Output, Payload::Text(text))]
    );
}

#[tokio::test]
async fn overflow_map_values_roundtrip() {
    let huge = "x".repeat(4096);
    let mut map = OrderedMap::new();
    map.insert("small", "v");
    map.insert("huge", huge);
    map.insert("after", "w");

    let bytes = transmit(|stream| stream.scan_log(&map));
    let decoded = decode(&bytes).await;
    assert_eq!(
        decoded,
        [Notification::new(NotifierKind::ScanLog, Payload::Map(map))]
    );
}

#[tokio::test]
async fn unknown_wire_identifier_keeps_payload() {
    let mut bytes = vec![1, 9, 2];
    bytes.extend_from_slice(b"mystery");
    bytes.push(3);
    bytes.push(4);

    let decoded = decode(&bytes).await;
    assert_eq!(
        decoded,
        [Notification::new(
            NotifierKind::Unknown,
            Payload::Text("mystery".to_string()),
        )]
    );
}

#[tokio::test]
async fn multi_frame_stream_decodes_in_order() {
    let progress: OrderedMap = [("file", "a.txt")].into_iter().collect();
    let scan_log: OrderedMap = [("entry", "1"), ("level", "info")].into_iter().collect();

    let bytes = transmit(|stream| {
        stream.sysout("starting");
        stream.progress(&progress);
        stream.message(&OrderedMap::new());
        stream.scan_log(&scan_log);
        stream.output("done");
    });

    let decoded = decode(&bytes).await;
    assert_eq!(
        decoded,
        [
            Notification::new(NotifierKind::Sysout, Payload::Text("starting".to_string())),
            Notification::new(NotifierKind::Progress, Payload::Map(progress)),
            Notification::new(NotifierKind::Message, Payload::Map(OrderedMap::new())),
            Notification::new(NotifierKind::ScanLog, Payload::Map(scan_log)),
            Notification::new(NotifierKind::Output, Payload::Text("done".to_string())),
        ]
    );
}

#[tokio::test]
async fn raw_writes_roundtrip_as_sysout() {
    use std::io::Write;

    let mut stream = TransmissionStream::new(Vec::new());
    stream.write_all(b"redirected bytes").unwrap();
    stream.close().unwrap();
    let decoded = decode(&stream.into_inner()).await;

    assert_eq!(
        decoded,
        [Notification::new(
            NotifierKind::Sysout,
            Payload::Text("redirected bytes".to_string()),
        )]
    );
}

#[tokio::test]
async fn bytes_after_eot_are_not_decoded() {
    let mut bytes = transmit(|stream| stream.sysout("first"));
    // A conforming encoder never writes past EOT; a decoder must still stop.
    bytes.extend_from_slice(&[1, 0, 2, b'x', 3]);

    let decoded = decode(&bytes).await;
    assert_eq!(decoded.len(), 1);
}

#[tokio::test]
async fn truncated_stream_is_an_error_not_silence() {
    let stream = TransmissionStream::new(Vec::new());
    stream.sysout("unfinished");
    let bytes = stream.into_inner();

    let sink = RecordingSink::new();
    let result = pump(&bytes[..], &sink).await;
    assert!(matches!(result, Err(DecodeError::UnexpectedEof)));
}
