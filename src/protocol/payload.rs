//! Payload and notification types carried by the transmission protocol.

use std::fmt;

use crate::protocol::NotifierKind;

/// A string-to-string map that preserves insertion order.
///
/// Keys are unique; inserting an existing key overwrites its value in place
/// without changing its position. This is the wire contract for map payloads,
/// so lookup stays linear over a handful of entries rather than pulling in a
/// hashed collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
}

impl OrderedMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key/value pair; a duplicate key overwrites the earlier value
    /// but keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl fmt::Display for OrderedMap {
    /// Renders `{key=value, key2=value2}`, the form text-kind consumers see
    /// when a map payload arrives on a text channel.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

/// The body of a notification: either bare UTF-8 text or an ordered map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Map(OrderedMap),
}

impl Payload {
    /// The payload as text; maps render through their `Display` form.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Map(map) => map.to_string(),
        }
    }

    /// The payload as a map; bare text coerces to the empty map.
    #[must_use]
    pub fn to_map(&self) -> OrderedMap {
        match self {
            Self::Text(_) => OrderedMap::new(),
            Self::Map(map) => map.clone(),
        }
    }
}

/// One decoded unit of transmission. Notifications are transient: they are
/// constructed, dispatched, and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotifierKind,
    pub payload: Payload,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotifierKind, payload: Payload) -> Self {
        Self { kind, payload }
    }
}
