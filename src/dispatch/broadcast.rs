//! Per-kind broadcast fan-out for notification listeners.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::dispatch::NotificationSink;
use crate::protocol::{Notification, NotifierKind, OrderedMap, Payload, ALL_KINDS};

/// Default capacity of each per-kind channel. Slow listeners that fall more
/// than this many notifications behind observe a lag error, not a stall of
/// the decoder.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A sink that fans each notification out to the listeners subscribed to its
/// kind.
///
/// Every kind owns an independent channel, so listeners registered for
/// `Progress` never see `Output` events and vice versa. The channel table is
/// built eagerly for the whole closed kind set; subscribing and dispatching
/// never take a lock.
pub struct Broadcaster {
    channels: [broadcast::Sender<Notification>; ALL_KINDS.len()],
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: std::array::from_fn(|_| broadcast::channel(capacity).0),
        }
    }

    /// Subscribes to one kind's notifications.
    #[must_use]
    pub fn subscribe(&self, kind: NotifierKind) -> broadcast::Receiver<Notification> {
        self.channels[kind.index()].subscribe()
    }

    /// Subscribes to one kind's notifications as a stream.
    #[must_use]
    pub fn subscribe_stream(&self, kind: NotifierKind) -> BroadcastStream<Notification> {
        BroadcastStream::new(self.subscribe(kind))
    }

    fn send(&self, kind: NotifierKind, payload: Payload) {
        // A send with no live receivers is not an error: nobody asked to
        // observe this kind.
        let _ = self.channels[kind.index()].send(Notification::new(kind, payload));
    }
}

impl NotificationSink for Broadcaster {
    fn sysout(&self, text: &str) {
        self.send(NotifierKind::Sysout, Payload::Text(text.to_string()));
    }

    fn progress(&self, map: &OrderedMap) {
        self.send(NotifierKind::Progress, Payload::Map(map.clone()));
    }

    fn message(&self, map: &OrderedMap) {
        self.send(NotifierKind::Message, Payload::Map(map.clone()));
    }

    fn output(&self, text: &str) {
        self.send(NotifierKind::Output, Payload::Text(text.to_string()));
    }

    fn scan_log(&self, map: &OrderedMap) {
        self.send(NotifierKind::ScanLog, Payload::Map(map.clone()));
    }

    fn unknown_text(&self, text: &str) {
        self.send(NotifierKind::Unknown, Payload::Text(text.to_string()));
    }

    fn unknown_map(&self, map: &OrderedMap) {
        self.send(NotifierKind::Unknown, Payload::Map(map.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listeners_only_see_their_kind() {
        let broadcaster = Broadcaster::new();
        let mut progress_rx = broadcaster.subscribe(NotifierKind::Progress);
        let mut output_rx = broadcaster.subscribe(NotifierKind::Output);

        let map: OrderedMap = [("file", "a.txt")].into_iter().collect();
        broadcaster.progress(&map);
        broadcaster.output("diagnostic");

        let progress = progress_rx.recv().await.unwrap();
        assert_eq!(progress.kind, NotifierKind::Progress);
        assert_eq!(progress.payload, Payload::Map(map));

        let output = output_rx.recv().await.unwrap();
        assert_eq!(output.payload, Payload::Text("diagnostic".to_string()));
        assert!(progress_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatch_without_listeners_is_silent() {
        let broadcaster = Broadcaster::new();
        broadcaster.sysout("nobody listening");
        broadcaster.unknown_text("still fine");
    }

    #[tokio::test]
    async fn delivery_preserves_frame_order() {
        let broadcaster = Broadcaster::new();
        let mut rx = broadcaster.subscribe(NotifierKind::Sysout);
        for i in 0..5 {
            broadcaster.sysout(&i.to_string());
        }
        for i in 0..5 {
            let n = rx.recv().await.unwrap();
            assert_eq!(n.payload, Payload::Text(i.to_string()));
        }
    }
}
