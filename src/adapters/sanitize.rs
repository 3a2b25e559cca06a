//! Log sanitization for screening output.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`], which redacts:
//! - body measurements written as `key=value` or `"Key": value`
//!   (age, height, weight, BMI)
//! - UUIDs and email addresses
//! - signing seeds, signatures and other key material (base64 or hex)
//!
//! The library never logs raw measurements on purpose; this is the net under
//! that rule, applied to everything the subscriber formats.
//!
//! Input is capped per line; the writer takes the cap from
//! [`Config::sanitize_max_bytes`](crate::config::Config), the free functions use
//! the 16 KiB default.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

use crate::config::DEFAULT_SANITIZE_MAX_BYTES;

/// Replacement for a line when the patterns could not be compiled.
const UNSANITIZABLE: &str = "[REDACTED-LINE]";

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

struct Pattern {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Pattern>,
}

const RULES: &[(&str, &str)] = &[
    // Measurements: `weight=70.0`, `BMI: 24.2`, `"Height": 1.7`
    (
        r#"(?i)\b(age|height|weight|bmi)\b("?\s*[:=]\s*)-?\d+(?:\.\d+)?"#,
        "${1}${2}[REDACTED]",
    ),
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    // Contextual secrets: `seed=<base64>`, `signing_key: <b64>`
    (
        r"(?i)\b(?:seed|secret|signing[_-]?key|private[_-]?key|signature|sig|key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
        "[REDACTED-SECRET]",
    ),
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
];

fn patterns() -> Option<&'static Patterns> {
    PATTERNS
        .get_or_init(|| {
            let set = RegexSet::new(RULES.iter().map(|(p, _)| *p)).ok()?;
            let rules = RULES
                .iter()
                .map(|(pattern, replacement)| {
                    Regex::new(pattern).ok().map(|regex| Pattern {
                        regex,
                        replacement: *replacement,
                    })
                })
                .collect::<Option<Vec<_>>>()?;
            Some(Patterns { set, rules })
        })
        .as_ref()
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact measurements, identifiers and key material from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let Some(patterns) = patterns() else {
        return UNSANITIZABLE.to_string();
    };
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }
    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Whether `input` contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, DEFAULT_SANITIZE_MAX_BYTES);
    patterns().map_or(true, |p| p.set.is_match(prefix))
}

/// `MakeWriter` wrapper that sanitizes each formatted log line before it
/// reaches the inner writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    /// Wrap `inner`, capping each sanitized line at `max_bytes`.
    #[must_use]
    pub fn new(inner: M, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.max(1),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let sanitized = sanitize_with_limit(&String::from_utf8_lossy(bytes), self.max_bytes);
        self.inner.write_all(sanitized.as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            // The terminator survives truncation.
            line.pop();
            self.write_sanitized(&line)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline must not buffer forever.
        let hard_cap = self.max_bytes.saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}
