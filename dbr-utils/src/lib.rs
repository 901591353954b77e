//! Shared utility functions for dashboardr crates.

/// Content digests used for incremental builds and chart cache keys.
pub mod digest {
    use sha2::{Digest, Sha256};

    /// SHA-256 of a byte slice, hex encoded.
    pub fn sha256_hex(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    /// Accumulates several parts into one digest.
    ///
    /// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]`
    /// produce different digests.
    pub struct Digester {
        hasher: Sha256,
    }

    impl Default for Digester {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Digester {
        pub fn new() -> Self {
            Self {
                hasher: Sha256::new(),
            }
        }

        pub fn part(&mut self, bytes: &[u8]) -> &mut Self {
            self.hasher.update((bytes.len() as u64).to_le_bytes());
            self.hasher.update(bytes);
            self
        }

        pub fn part_str(&mut self, s: &str) -> &mut Self {
            self.part(s.as_bytes())
        }

        pub fn finish(self) -> String {
            hex::encode(self.hasher.finalize())
        }
    }

}

/// Text helpers for file names and the YAML/HTML/JS we emit.
pub mod text {
    /// Turn a page name into a file-name-safe slug.
    ///
    /// Lowercases, keeps ASCII alphanumerics, collapses everything else into
    /// single underscores. An empty result becomes `page`.
    pub fn slugify(name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut pending_sep = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }
        if out.is_empty() {
            "page".to_string()
        } else {
            out
        }
    }

    /// Double-quoted YAML scalar.
    pub fn yaml_quote(s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('"');
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }

    pub fn html_escape(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        out
    }

    /// Single-quoted JS string literal, safe to embed inside a `<script>` tag.
    pub fn js_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        let mut prev = '\0';
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '/' if prev == '<' => out.push_str("\\/"),
                '\u{2028}' => out.push_str("\\u2028"),
                '\u{2029}' => out.push_str("\\u2029"),
                c => out.push(c),
            }
            prev = c;
        }
        out.push('\'');
        out
    }

}

/// Date utility functions
pub mod dates {
    use chrono::{NaiveDate, SecondsFormat, Utc};

    /// Current UTC time as an RFC 3339 string, second precision.
    pub fn timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d %b %Y", "%b %d, %Y"];

    /// Parse a survey date in one of the common layouts.
    ///
    /// Month-only values (`2020-02`, `Feb 2020`, `February 2020`) resolve to
    /// the first of the month. Plain numbers such as years are not dates.
    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() || s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        DAY_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
            .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok())
            .or_else(|| NaiveDate::parse_from_str(&format!("1 {}", s), "%d %b %Y").ok())
    }

}
