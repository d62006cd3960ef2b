//! Stand-in for the out-of-scope tracing subsystem.
//!
//! The tick engine reports per-requester receive/complete events, MSHR
//! coalescing hits, and hit/miss classification by name and a field map.
//! What happens to those events is a collaborator's concern; this crate
//! ships a no-op sink and a JSON-lines sink.

use std::collections::HashMap;
use std::io::Write;

use serde_json::Value;

/// Receives tick-engine trace events.
pub trait TraceSink {
    fn on_event(&mut self, name: &str, fields: HashMap<String, Value>);
}

/// Discards every event. The default for `Builder`.
#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn on_event(&mut self, _name: &str, _fields: HashMap<String, Value>) {}
}

/// Appends one JSON object per line to the wrapped writer.
#[derive(Debug)]
pub struct JsonlTraceSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlTraceSink<W> {
    pub fn new(writer: W) -> Self {
        JsonlTraceSink { writer }
    }
}

impl<W: Write> TraceSink for JsonlTraceSink<W> {
    fn on_event(&mut self, name: &str, fields: HashMap<String, Value>) {
        let mut record = fields;
        record.insert("event".to_string(), Value::String(name.to_string()));
        if let Ok(line) = serde_json::to_string(&record) {
            let _ = writeln!(self.writer, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_sink_emits_one_line_per_event() {
        let mut buf = Vec::new();
        {
            let mut sink = JsonlTraceSink::new(&mut buf);
            sink.on_event("mshr-hit", HashMap::new());
            sink.on_event("hit", HashMap::new());
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("mshr-hit"));
    }
}
