//! Log sanitization for PII filtering.
//!
//! The inference inputs are patient data, so anything that reaches the
//! formatted log output is passed through a redaction pass first:
//! - Assessment/patient identifiers (UUIDs)
//! - National identifiers and medical record numbers
//! - Contact details (email, phone)
//! - Key material and contextual secrets
//!
//! Sanitizing strings is a fallback; the primary protection is that raw
//! feature values never reach logging calls. `sanitize()` caps its input
//! size (`CARDIOSCOPE_SANITIZE_MAX_BYTES`) so hostile log lines cannot turn
//! the redaction pass into a CPU sink.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PII_PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CARDIOSCOPE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static PiiPatterns {
    PII_PATTERNS.get_or_init(|| {
        // The regex crate is linear-time; patterns stay simple and input is
        // capped by max_sanitize_bytes.
        let rules: Vec<(&'static str, &'static str)> = vec![
            // UUIDs (assessment and patient IDs)
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            // SSN-like patterns (xxx-xx-xxxx)
            (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
            // Medical record numbers
            (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
            // Email addresses
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            // Phone numbers
            (
                r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
                "[REDACTED-PHONE]",
            ),
            // Contextual secrets (signing keys for artifact tooling)
            (
                r"(?i)\b(?:api[_-]?key|secret|password|private[_-]?key|seed|signature|token|key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}\b",
                "[REDACTED-SECRET]",
            ),
            // Broad key material pattern
            (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PiiPatterns { set, patterns }
    })
}

/// Sanitize a string by replacing PII patterns.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    // Fast path: single scan for "any match".
    if !patterns.set.is_match(prefix) {
        let mut out = prefix.to_string();
        if truncated {
            out.push_str(" [TRUNCATED]");
        }
        return out;
    }

    let matched: Vec<usize> = patterns.set.matches(prefix).into_iter().collect();
    let mut result = prefix.to_string();
    for idx in matched {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .to_string();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check if a string contains potential PII.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it reaches the underlying sink.
///
/// Keeps redaction centralized instead of relying on every callsite.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let line_str = String::from_utf8_lossy(&line);
            let sanitized = sanitize(&line_str);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // Bound the buffer if the formatter writes a huge line with no
        // newline.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if hard_cap > 0 && self.buffer.len() > hard_cap {
            let s = String::from_utf8_lossy(&self.buffer).to_string();
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let s = String::from_utf8_lossy(&self.buffer);
            let sanitized = sanitize(&s);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
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
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_uuid() {
        let input = "Assessment 550e8400-e29b-41d4-a716-446655440000 complete";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_ssn() {
        let sanitized = sanitize("SSN: 123-45-6789");
        assert!(sanitized.contains("[REDACTED-SSN]"));
        assert!(!sanitized.contains("123-45-6789"));
    }

    #[test]
    fn test_sanitize_mrn() {
        let sanitized = sanitize("MRN:12345678 found");
        assert!(sanitized.contains("[REDACTED-MRN]"));
    }

    #[test]
    fn test_sanitize_email() {
        let sanitized = sanitize("Contact: patient@hospital.com");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_sanitize_key_material() {
        let sanitized = sanitize("Key: 0123456789abcdef0123456789abcdef");
        assert!(sanitized.contains("[REDACTED-KEY]") || sanitized.contains("[REDACTED-SECRET]"));
    }

    #[test]
    fn test_contains_pii() {
        assert!(contains_pii("ID: 550e8400-e29b-41d4-a716-446655440000"));
        assert!(!contains_pii("Loaded artifacts (kind=Logistic)"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let input = "prefix 0123456789abcdef0123456789abcdef suffix";
        let sanitized = sanitize_with_limit(input, 16);
        assert!(sanitized.contains("[TRUNCATED]"));
    }
}
