//! 序列埠資料會在任意位置被切斷，這裡把片段重組回完整的一行。

/// 累積片段、依 `\n` 切行，最後一段不完整的留到下一次
#[derive(Debug, Default, Clone)]
pub struct FrameReassembler {
    buffer: Vec<u8>,
    max_line_bytes: Option<usize>,
    discarded: u64,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 沒有換行的行超過上限時整段丟掉。預設不設上限
    pub fn with_max_line_bytes(max_line_bytes: Option<usize>) -> Self {
        Self {
            max_line_bytes,
            ..Self::default()
        }
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.feed_bytes(chunk.as_bytes())
    }

    /// 依到達順序回傳所有完整的行 (去掉行尾 `\r`)。
    /// 在 byte 層切行，多位元組字元被切在兩個片段之間也不會壞掉。
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.buffer[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);

        if let Some(limit) = self.max_line_bytes {
            if self.buffer.len() > limit {
                tracing::warn!(
                    "Discarding {} buffered bytes without a line terminator (limit {})",
                    self.buffer.len(),
                    limit
                );
                self.buffer.clear();
                self.discarded += 1;
            }
        }

        lines
    }

    /// 尚未結束的那一段
    pub fn pending(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn discarded_fragments(&self) -> u64 {
        self.discarded
    }
}

/// USB 序列橋接把資料以 hex 字串交出來，先解回 byte
#[derive(Debug, Default, Clone)]
pub struct HexDecoder {
    pending_nibble: Option<u8>,
    invalid_digits: u64,
}

impl HexDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空白會被略過；奇數個 hex 字元時最後半個 byte 留到下一次。
    /// 線路雜訊造成的非 hex 字元直接丟掉，並捨棄手上的半個 byte 重新對齊
    pub fn decode(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len() / 2 + 1);
        let mut skipped = 0u64;
        for &c in input {
            if c.is_ascii_whitespace() {
                continue;
            }
            let Some(nibble) = hex_value(c) else {
                skipped += 1;
                self.pending_nibble = None;
                continue;
            };
            match self.pending_nibble.take() {
                Some(high) => out.push((high << 4) | nibble),
                None => self.pending_nibble = Some(nibble),
            }
        }

        if skipped > 0 {
            self.invalid_digits += skipped;
            tracing::warn!(
                "Skipped {} non-hex bytes in serial payload ({} so far)",
                skipped,
                self.invalid_digits
            );
        }
        out
    }

    pub fn invalid_digits(&self) -> u64 {
        self.invalid_digits
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembles_lines_across_chunks() {
        let mut frames = FrameReassembler::new();

        assert!(frames.feed("ab").is_empty());
        assert_eq!(frames.feed("cd\nef\ngh"), vec!["abcd", "ef"]);
        assert_eq!(frames.pending(), "gh");
        assert_eq!(frames.feed("\n"), vec!["gh"]);
        assert_eq!(frames.pending_len(), 0);
    }

    #[test]
    fn test_keeps_empty_lines_and_strips_carriage_return() {
        let mut frames = FrameReassembler::new();
        assert_eq!(frames.feed("a\r\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_multibyte_char_split_between_chunks() {
        let mut frames = FrameReassembler::new();
        let bytes = "秤\n".as_bytes();

        assert!(frames.feed_bytes(&bytes[..1]).is_empty());
        assert_eq!(frames.feed_bytes(&bytes[1..]), vec!["秤"]);
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut frames = FrameReassembler::new();
        let long = "x".repeat(100_000);
        assert!(frames.feed(&long).is_empty());
        assert_eq!(frames.pending_len(), 100_000);
    }

    #[test]
    fn test_discards_overlong_partial_line() {
        let mut frames = FrameReassembler::with_max_line_bytes(Some(8));

        assert!(frames.feed("0123456789").is_empty());
        assert_eq!(frames.pending_len(), 0);
        assert_eq!(frames.discarded_fragments(), 1);
        assert_eq!(frames.feed("ok\n"), vec!["ok"]);
    }

    #[test]
    fn test_hex_decoder_handles_odd_split() {
        let mut decoder = HexDecoder::new();

        let first = decoder.decode(b"7b2");
        let second = decoder.decode(b"27d 0a");

        assert_eq!(first, b"{".to_vec());
        assert_eq!(second, b"\"}\n".to_vec());
    }

    #[test]
    fn test_hex_decoder_skips_line_noise() {
        let mut decoder = HexDecoder::new();

        assert_eq!(decoder.decode(b"zz0a"), b"\n".to_vec());
        // 雜訊落在一個 byte 中間時，前半個 nibble 一起丟掉
        assert_eq!(decoder.decode(b"7?7b"), b"{".to_vec());
        assert_eq!(decoder.invalid_digits(), 3);
    }
}
