//! Shared helpers for integration tests.

use std::sync::Mutex;

use scantool_supervisor::dispatch::NotificationSink;
use scantool_supervisor::protocol::{Notification, NotifierKind, OrderedMap, Payload};

/// A sink that records every dispatched notification in dispatch order.
#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    fn record(&self, kind: NotifierKind, payload: Payload) {
        self.notifications
            .lock()
            .unwrap()
            .push(Notification::new(kind, payload));
    }
}

impl NotificationSink for RecordingSink {
    fn sysout(&self, text: &str) {
        self.record(NotifierKind::Sysout, Payload::Text(text.to_string()));
    }

    fn progress(&self, map: &OrderedMap) {
        self.record(NotifierKind::Progress, Payload::Map(map.clone()));
    }

    fn message(&self, map: &OrderedMap) {
        self.record(NotifierKind::Message, Payload::Map(map.clone()));
    }

    fn output(&self, text: &str) {
        self.record(NotifierKind::Output, Payload::Text(text.to_string()));
    }

    fn scan_log(&self, map: &OrderedMap) {
        self.record(NotifierKind::ScanLog, Payload::Map(map.clone()));
    }

    fn unknown_text(&self, text: &str) {
        self.record(NotifierKind::Unknown, Payload::Text(text.to_string()));
    }

    fn unknown_map(&self, map: &OrderedMap) {
        self.record(NotifierKind::Unknown, Payload::Map(map.clone()));
    }
}
