// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental decoder for the `text/event-stream` format.
//!
//! Bytes are pushed as they arrive; complete events are popped in order.
//! Lines may end in `\n`, `\r\n` or `\r`. An event is dispatched on a blank
//! line and only if it carried at least one `data` field.

use std::collections::VecDeque;

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event` field, `message` when absent.
    pub event: String,
    /// `data` fields joined with `\n`.
    pub data: String,
    /// Value of the last `id` field, if any.
    pub id: Option<String>,
}

/// Streaming SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// A `\r` ended the previous chunk; a leading `\n` belongs to it.
    pending_cr: bool,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
    ready: VecDeque<SseEvent>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes from the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        let mut chunk = chunk;
        if self.pending_cr {
            self.pending_cr = false;
            if let Some(rest) = chunk.strip_prefix(b"\n") {
                chunk = rest;
            }
        }
        self.buf.extend_from_slice(chunk);

        let mut start = 0;
        let mut i = 0;
        while i < self.buf.len() {
            match self.buf[i] {
                b'\n' => {
                    let line = String::from_utf8_lossy(&self.buf[start..i]).into_owned();
                    self.process_line(&line);
                    start = i + 1;
                }
                b'\r' => {
                    let line = String::from_utf8_lossy(&self.buf[start..i]).into_owned();
                    self.process_line(&line);
                    if i + 1 < self.buf.len() {
                        if self.buf[i + 1] == b'\n' {
                            i += 1;
                        }
                    } else {
                        self.pending_cr = true;
                    }
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        self.buf.drain(..start);
    }

    /// Pops the next complete event.
    pub fn next_event(&mut self) -> Option<SseEvent> {
        self.ready.pop_front()
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            self.dispatch();
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            // `retry` and unknown fields are ignored; reconnect timing is ours
            _ => {}
        }
    }

    fn dispatch(&mut self) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        self.ready.push_back(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
            id: self.last_id.clone(),
        });
    }
}
