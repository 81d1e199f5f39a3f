//! Incremental server-sent-events framing.

/// Splits a byte stream into SSE `data:` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly. Multi-line `data:`
/// fields are joined with `\n`; comment lines are skipped; `[DONE]` ends the
/// stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending_data: Vec<String>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a network chunk, returning every payload it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut payloads = Vec::new();
        if self.done {
            return payloads;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                if let Some(data) = self.take_pending() {
                    payloads.push(data);
                }
                if self.done {
                    break;
                }
            } else if line.starts_with(':') {
                continue;
            } else if let Some(rest) = line.strip_prefix("data:") {
                let rest = rest.strip_prefix(' ').unwrap_or(rest);
                self.pending_data.push(rest.to_string());
            }
        }
        payloads
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() && !self.done {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            if let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") {
                self.pending_data
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending_data.is_empty() {
            return None;
        }
        let data = self.pending_data.join("\n");
        self.pending_data.clear();
        if data == "[DONE]" {
            self.done = true;
            return None;
        }
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_split_across_chunks_are_reassembled() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: x\ndata: {\"a\":").is_empty());
        let payloads = decoder.push(b"1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn multibyte_characters_survive_chunk_boundaries() {
        let frame = "data: {\"t\":\"héron\"}\n\n".as_bytes();
        let split = frame.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&frame[..split]).is_empty());
        assert_eq!(decoder.push(&frame[split..]), vec!["{\"t\":\"héron\"}".to_string()]);
    }

    #[test]
    fn comments_are_skipped_and_done_stops_decoding() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\r\ndata: one\r\n\r\ndata: [DONE]\n\ndata: two\n\n");
        assert_eq!(payloads, vec!["one".to_string()]);
        assert!(decoder.is_done());
        assert!(decoder.push(b"data: three\n\n").is_empty());
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
    }
}
