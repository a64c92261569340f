use log::warn;
/// Longest unterminated fragment kept between chunks before it is dropped.
pub const DEFAULT_MAX_PARTIAL_LINE_BYTES: usize = 4096;
/// Incremental decoder for the device's newline-framed decimal samples.
///
/// Lines that do not start with a decimal literal are dropped silently; a
/// noisy or chatty device must never take the session down.
#[derive(Debug)]
pub struct LineDecoder {
    partial: String,
    utf8_tail: Vec<u8>,
    max_partial_bytes: usize,
    discarding: bool,
}
impl Default for LineDecoder {
    fn default() -> Self {
        Self::with_max_partial(DEFAULT_MAX_PARTIAL_LINE_BYTES)
    }
}
impl LineDecoder {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_partial(max_partial_bytes: usize) -> Self {
        Self {
            partial: String::new(),
            utf8_tail: Vec::new(),
            max_partial_bytes: max_partial_bytes.max(1),
            discarding: false,
        }
    }
    #[cfg(test)]
    /// Unterminated text retained from previous chunks.
    pub fn pending(&self) -> &str {
        &self.partial
    }
    #[cfg(test)]
    pub fn reset(&mut self) {
        self.partial.clear();
        self.utf8_tail.clear();
        self.discarding = false;
    }
    /// Feeds one text chunk and returns the samples of every line it completed.
    pub fn feed(&mut self, chunk: &str) -> Vec<f64> {
        let mut samples = Vec::new();
        let mut rest = chunk;
        if self.discarding {
            match rest.find('\n') {
                Some(idx) => {
                    self.discarding = false;
                    rest = &rest[idx + 1..];
                }
                None => return samples,
            }
        }
        self.partial.push_str(rest);
        if let Some(last_newline) = self.partial.rfind('\n') {
            let tail = self.partial.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.partial, tail);
            samples.extend(
                complete[..last_newline]
                    .split('\n')
                    .filter_map(parse_sample),
            );
        }
        if self.partial.len() > self.max_partial_bytes {
            warn!(
                "Dropping {} bytes of unterminated input (limit {}).",
                self.partial.len(),
                self.max_partial_bytes
            );
            self.partial.clear();
            self.discarding = true;
        }
        samples
    }
    /// Feeds raw bytes, carrying a multi-byte UTF-8 sequence split across
    /// chunks over to the next call. Invalid sequences become U+FFFD.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<f64> {
        let mut pending = std::mem::take(&mut self.utf8_tail);
        pending.extend_from_slice(bytes);
        let mut text = String::with_capacity(pending.len());
        let mut rest: &[u8] = &pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        self.feed(&text)
    }
}
/// Parses one line: the leading decimal literal after trimming, trailing text
/// ignored. Non-finite results are rejected.
pub fn parse_sample(line: &str) -> Option<f64> {
    let literal = leading_decimal(line.trim())?;
    literal.parse::<f64>().ok().filter(|v| v.is_finite())
}
fn leading_decimal(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;
    let mut digits = int_digits;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
            digits += frac_digits;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits_from(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    Some(&text[..end])
}
