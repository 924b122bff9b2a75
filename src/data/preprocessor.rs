// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw corpus text before tokenisation.
//
// Scraped news articles carry non-breaking spaces, zero-width
// characters, stray control bytes and line breaks left over
// from HTML layout. The word-level tokenizer treats all
// whitespace the same, so every run of whitespace is folded
// into a single space and the result is trimmed.
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw text string for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // swallows leading whitespace

        for c in text.chars() {
            let c = match c {
                // Zero-width characters vanish entirely
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => continue,
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
