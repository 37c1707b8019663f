//! Minimal `text/event-stream` decoder for the database's streaming API.

use fxfeed_core::StoreError;
use fxfeed_core::ports::store::path_segments;
use fxfeed_core::store::tree;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    pub name: String,
    pub data: String,
}

/// Accumulates raw chunks and yields complete events. Chunks may split
/// lines and even UTF-8 sequences anywhere.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
    name: String,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.name.is_empty() || !self.data.is_empty() {
                    events.push(SseEvent {
                        name: std::mem::take(&mut self.name),
                        data: std::mem::take(&mut self.data).join("\n"),
                    });
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => self.name = value.to_string(),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }
        events
    }
}

/// Payload of `put` and `patch` events.
#[derive(Deserialize)]
struct Change {
    path: String,
    #[serde(default)]
    data: Value,
}

/// Fold a `put`/`patch` event into the listener's local copy of the
/// watched subtree.
pub(crate) fn apply_change(snapshot: &mut Value, event: &SseEvent) -> Result<(), StoreError> {
    let change: Change = serde_json::from_str(&event.data)?;
    let base = path_segments(&change.path)?;

    match event.name.as_str() {
        "put" => tree::write(snapshot, &base, tree::normalize(change.data)),
        "patch" => {
            let Value::Object(children) = change.data else {
                return Err(StoreError::Serialization(
                    "patch event without an object payload".to_string(),
                ));
            };
            for (key, value) in children {
                let mut target = base.clone();
                target.extend(path_segments(&key)?);
                tree::write(snapshot, &target, tree::normalize(value));
            }
        }
        other => {
            return Err(StoreError::Serialization(format!(
                "unexpected event '{other}'"
            )));
        }
    }
    Ok(())
}
