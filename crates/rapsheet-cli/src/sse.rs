//! Minimal Server-Sent-Events decoding for the `/changes` stream.

use rapsheet_core::store::{ChangeEvent, ChangeFeed, ChangeKind};
use tracing::{debug, warn};

// ─── Decoder ──────────────────────────────────────────────────────────────────

/// One dispatched SSE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
  pub event: Option<String>,
  pub data:  String,
}

/// Incremental decoder: feed it raw body chunks, take out complete messages.
/// Chunks may split a message (or a UTF-8 sequence, or a CRLF pair) anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
  /// Buffered input with every line ending folded to `\n`.
  buf:        Vec<u8>,
  /// The last pushed byte was a CR; a leading LF in the next chunk is its pair.
  pending_cr: bool,
}

impl SseDecoder {
  pub fn push(&mut self, chunk: &[u8]) {
    self.buf.reserve(chunk.len());
    for &byte in chunk {
      if std::mem::take(&mut self.pending_cr) && byte == b'\n' {
        continue;
      }
      if byte == b'\r' {
        self.buf.push(b'\n');
        self.pending_cr = true;
      } else {
        self.buf.push(byte);
      }
    }
  }

  /// The next complete message, skipping comment-only and empty blocks.
  pub fn next_message(&mut self) -> Option<SseMessage> {
    loop {
      let block = self.take_block()?;
      if let Some(message) = parse_block(&block) {
        return Some(message);
      }
    }
  }

  fn take_block(&mut self) -> Option<String> {
    let end = self.buf.windows(2).position(|w| w == b"\n\n")?;
    let block: Vec<u8> = self.buf.drain(..end + 2).collect();
    Some(String::from_utf8_lossy(&block[..end]).into_owned())
  }
}

fn parse_block(block: &str) -> Option<SseMessage> {
  let mut event = None;
  let mut data: Vec<&str> = Vec::new();

  for line in block.split('\n') {
    if line.is_empty() || line.starts_with(':') {
      continue;
    }
    let (field, value) = line.split_once(':').unwrap_or((line, ""));
    let value = value.strip_prefix(' ').unwrap_or(value);
    match field {
      "event" => event = Some(value.to_owned()),
      "data" => data.push(value),
      _ => {}
    }
  }

  if data.is_empty() && event.is_none() {
    return None;
  }
  Some(SseMessage { event, data: data.join("\n") })
}

// ─── Feed ─────────────────────────────────────────────────────────────────────

/// A [`ChangeFeed`] reading the server's `/changes` event stream.
/// Dropping it closes the HTTP connection.
pub struct SseFeed {
  response: reqwest::Response,
  decoder:  SseDecoder,
  table:    String,
}

impl SseFeed {
  pub(crate) fn new(response: reqwest::Response, table: &str) -> Self {
    Self { response, decoder: SseDecoder::default(), table: table.to_owned() }
  }

  fn decode(&self, message: SseMessage) -> ChangeEvent {
    match serde_json::from_str::<ChangeEvent>(&message.data) {
      Ok(event) => event,
      Err(e) => {
        // Still a change; the payload just could not be read.
        warn!(error = %e, event = ?message.event, "unreadable change event");
        ChangeEvent::new(self.table.clone(), ChangeKind::Resync)
      }
    }
  }
}

impl ChangeFeed for SseFeed {
  async fn next(&mut self) -> Option<ChangeEvent> {
    loop {
      if let Some(message) = self.decoder.next_message() {
        let event = self.decode(message);
        if event.table == self.table {
          return Some(event);
        }
        continue;
      }

      match self.response.chunk().await {
        Ok(Some(chunk)) => self.decoder.push(&chunk),
        Ok(None) => {
          debug!(table = %self.table, "change stream ended");
          return None;
        }
        Err(e) => {
          warn!(table = %self.table, error = %e, "change stream failed");
          return None;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_axum_style_event() {
    let mut dec = SseDecoder::default();
    dec.push(b"event: insert\ndata: {\"table\":\"records\",\"kind\":\"insert\"}\n\n");

    let msg = dec.next_message().unwrap();
    assert_eq!(msg.event.as_deref(), Some("insert"));
    let event: ChangeEvent = serde_json::from_str(&msg.data).unwrap();
    assert_eq!(event, ChangeEvent::new("records", ChangeKind::Insert));
    assert!(dec.next_message().is_none());
  }

  #[test]
  fn message_split_across_chunks() {
    let mut dec = SseDecoder::default();
    dec.push(b"event: upd");
    assert!(dec.next_message().is_none());
    dec.push(b"ate\ndata: {\"table\":\"records\",");
    assert!(dec.next_message().is_none());
    dec.push(b"\"kind\":\"update\"}\n");
    assert!(dec.next_message().is_none());
    dec.push(b"\nevent: delete\ndata: x\n\n");

    assert_eq!(dec.next_message().unwrap().event.as_deref(), Some("update"));
    assert_eq!(dec.next_message().unwrap().data, "x");
  }

  #[test]
  fn keep_alive_comments_are_skipped() {
    let mut dec = SseDecoder::default();
    dec.push(b":\n\n: ping\n\nevent: insert\ndata: {}\n\n");
    let msg = dec.next_message().unwrap();
    assert_eq!(msg.event.as_deref(), Some("insert"));
    assert_eq!(msg.data, "{}");
  }

  #[test]
  fn multiline_data_is_joined() {
    let mut dec = SseDecoder::default();
    dec.push(b"data: a\ndata:b\n\n");
    assert_eq!(dec.next_message().unwrap().data, "a\nb");
  }

  #[test]
  fn crlf_terminated_events_dispatch() {
    let mut dec = SseDecoder::default();
    dec.push(b"event: insert\r\ndata: a\r\n\r\nevent: delete\r\ndata: b\r");
    assert_eq!(dec.next_message().unwrap().event.as_deref(), Some("insert"));
    assert!(dec.next_message().is_none());

    // The CRLF pair is split across chunks.
    dec.push(b"\n\r\n");
    let msg = dec.next_message().unwrap();
    assert_eq!(msg.event.as_deref(), Some("delete"));
    assert_eq!(msg.data, "b");
    assert!(dec.next_message().is_none());
    assert!(dec.buf.is_empty());
  }

  #[test]
  fn bare_cr_terminated_events_dispatch() {
    let mut dec = SseDecoder::default();
    dec.push(b"data: x\r\rdata: y\r\r");
    assert_eq!(dec.next_message().unwrap().data, "x");
    assert_eq!(dec.next_message().unwrap().data, "y");
  }
}
