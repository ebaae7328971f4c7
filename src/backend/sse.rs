//! Server-Sent Events decoding for the database streaming endpoint.
//!
//! The streaming REST API answers `Accept: text/event-stream` with events
//! such as:
//!
//! ```text
//! event: put
//! data: {"path":"/empanadas/0","data":{"nombre":"Pino"}}
//! ```

use serde::Deserialize;
use serde_json::Value;

use super::tree::{merge_at, set_at};
use super::BackendError;

/// One raw SSE frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental SSE frame decoder; feed it body chunks as they arrive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Append a chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_frame(&String::from_utf8_lossy(&frame)) {
                events.push(event);
            }
        }
        events
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines = Vec::new();

    for line in frame.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event.event = value.to_string(),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if event.event.is_empty() && data_lines.is_empty() {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}

/// Payload of `put` and `patch` events
#[derive(Debug, Deserialize)]
struct PathData {
    path: String,
    data: Value,
}

/// Database stream events
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the value at `path`
    Put { path: String, data: Value },
    /// Merge the children of `data` below `path`
    Patch { path: String, data: Value },
    KeepAlive,
    /// The server closed the listener (rules changed, permission lost)
    Cancel(String),
    AuthRevoked,
}

impl StreamEvent {
    /// Interpret a raw frame; unknown event names yield `None`.
    pub fn from_sse(event: &SseEvent) -> Result<Option<Self>, BackendError> {
        let parsed = match event.event.as_str() {
            "put" => {
                let PathData { path, data } = serde_json::from_str(&event.data)?;
                StreamEvent::Put { path, data }
            }
            "patch" => {
                let PathData { path, data } = serde_json::from_str(&event.data)?;
                StreamEvent::Patch { path, data }
            }
            "keep-alive" => StreamEvent::KeepAlive,
            "cancel" => StreamEvent::Cancel(event.data.clone()),
            "auth_revoked" => StreamEvent::AuthRevoked,
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }
}

/// Local copy of the root kept in step with the stream.
#[derive(Debug, Default)]
pub struct MirroredRoot {
    root: Value,
}

impl MirroredRoot {
    /// Apply an event. Returns the new root for data events, `None` for
    /// keep-alives, and an error for events that end the stream.
    pub fn apply(&mut self, event: StreamEvent) -> Result<Option<Option<Value>>, BackendError> {
        match event {
            StreamEvent::Put { path, data } => set_at(&mut self.root, &path, data),
            StreamEvent::Patch { path, data } => match data {
                Value::Object(children) => merge_at(&mut self.root, &path, children),
                other => set_at(&mut self.root, &path, other),
            },
            StreamEvent::KeepAlive => return Ok(None),
            StreamEvent::Cancel(reason) => return Err(BackendError::StreamClosed(reason)),
            StreamEvent::AuthRevoked => {
                return Err(BackendError::Auth("credential revoked".to_string()))
            }
        }

        let snapshot = if self.root.is_null() {
            None
        } else {
            Some(self.root.clone())
        };
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"event: put\ndata: {\"path\":\"/\",").is_empty());
        let events = decoder.push(b"\"data\":null}\n\nevent: keep-alive\ndata: null\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "put");
        assert_eq!(events[0].data, r#"{"path":"/","data":null}"#);
        assert_eq!(events[1].event, "keep-alive");
    }

    #[test]
    fn test_decoder_strips_carriage_returns() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b"event: cancel\r\ndata: permission denied\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "cancel".to_string(),
                data: "permission denied".to_string(),
            }]
        );
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": comment\nevent: x\ndata: a\ndata: b\n\n");
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn test_stream_event_parsing() {
        let put = SseEvent {
            event: "put".to_string(),
            data: r#"{"path":"/empanadas","data":[]}"#.to_string(),
        };
        assert_eq!(
            StreamEvent::from_sse(&put).unwrap(),
            Some(StreamEvent::Put {
                path: "/empanadas".to_string(),
                data: json!([]),
            })
        );

        let unknown = SseEvent {
            event: "mystery".to_string(),
            data: String::new(),
        };
        assert_eq!(StreamEvent::from_sse(&unknown).unwrap(), None);

        let broken = SseEvent {
            event: "patch".to_string(),
            data: "{".to_string(),
        };
        assert!(StreamEvent::from_sse(&broken).is_err());
    }

    #[test]
    fn test_mirror_applies_put_and_patch() {
        let mut mirror = MirroredRoot::default();

        let first = mirror
            .apply(StreamEvent::Put {
                path: "/".to_string(),
                data: json!({"empanadas": [{"nombre": "Pino", "precio": 2500}]}),
            })
            .unwrap();
        assert_eq!(
            first,
            Some(Some(json!({"empanadas": [{"nombre": "Pino", "precio": 2500}]})))
        );

        let second = mirror
            .apply(StreamEvent::Patch {
                path: "/empanadas/0".to_string(),
                data: json!({"precio": 2700}),
            })
            .unwrap();
        assert_eq!(
            second,
            Some(Some(json!({"empanadas": [{"nombre": "Pino", "precio": 2700}]})))
        );

        assert_eq!(mirror.apply(StreamEvent::KeepAlive).unwrap(), None);
    }

    #[test]
    fn test_mirror_reports_empty_root_and_cancel() {
        let mut mirror = MirroredRoot::default();
        let empty = mirror
            .apply(StreamEvent::Put {
                path: "/".to_string(),
                data: Value::Null,
            })
            .unwrap();
        assert_eq!(empty, Some(None));

        assert!(matches!(
            mirror.apply(StreamEvent::Cancel("rules".to_string())),
            Err(BackendError::StreamClosed(_))
        ));
    }
}
