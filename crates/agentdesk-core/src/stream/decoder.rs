//! Incremental decoding of an SSE byte stream into `data:` payloads.
//!
//! Bytes arrive in arbitrary chunks. [`Utf8Decoder`] keeps an incomplete
//! multi-byte sequence between chunks, [`LineBuffer`] keeps the trailing
//! partial line, and [`SseDecoder`] combines both and yields the payload of
//! every complete `data:` line in arrival order.

/// Streaming UTF-8 decoder. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + chunk` as possible; an incomplete
    /// trailing sequence is kept for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let keep = rest.len();
        let start = self.pending.len() - keep;
        self.pending.drain(..start);
        out
    }

    /// Flush at end of stream; a dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// Splits text on `\n` / `\r\n`, holding back the trailing partial line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line it completed.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let remainder = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, remainder);

        complete
            .split_terminator('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

/// Payload of a line starting with `data:` (prefix and one leading space
/// removed). Other lines (comments, `event:`, blank separators) yield `None`.
pub fn data_payload(line: &str) -> Option<&str> {
    let payload = line.trim_end().strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.trim().is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// Bytes in, `data:` payloads out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    utf8: Utf8Decoder,
    lines: LineBuffer,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        self.lines
            .push(&text)
            .iter()
            .filter_map(|line| data_payload(line).map(str::to_string))
            .collect()
    }

    /// Flush the decoder and the trailing partial line.
    pub fn finish(&mut self) -> Vec<String> {
        let tail = self.utf8.finish();
        let mut payloads: Vec<String> = self
            .lines
            .push(&tail)
            .iter()
            .filter_map(|line| data_payload(line).map(str::to_string))
            .collect();
        if let Some(rest) = self.lines.finish() {
            payloads.extend(data_payload(&rest).map(str::to_string));
        }
        payloads
    }
}
