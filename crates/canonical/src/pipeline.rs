use std::borrow::Cow;

use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::NormalizeConfig;
use crate::document::NormalizedText;
use crate::error::{CanonicalError, NoTextReason};
use crate::token::Token;

/// Replacement text for a run of collapsed digit tokens.
pub const DIGIT_PLACEHOLDER: &str = "000";

/// Tokens that only carry markup meaning. Sorted for binary search.
const MARKUP_TOKENS: &[&str] = &[
    "amp", "apos", "body", "br", "div", "gt", "head", "href", "html", "li", "lt", "nbsp", "ol",
    "p", "quot", "span", "td", "th", "tr", "ul",
];

/// Main entry point. Turns text into a token stream with line and byte
/// mapping back into `input`.
pub fn normalize(input: &str, cfg: &NormalizeConfig) -> Result<NormalizedText, CanonicalError> {
    cfg.validate()?;

    // Rough guess: one token per six bytes of prose.
    let mut state = TokenizerState::with_capacity(input.len() / 6 + 1);
    let mut line: u32 = 1;

    // Grapheme clusters keep combining sequences together, so offsets never
    // split a user-perceived character.
    for (offset, grapheme) in input.grapheme_indices(true) {
        if is_line_break(grapheme) {
            state.finalize_token(cfg);
            line = line.saturating_add(1);
            continue;
        }

        let folded: Cow<str> = if cfg.normalize_unicode {
            Cow::Owned(grapheme.nfkc().collect::<String>())
        } else {
            Cow::Borrowed(grapheme)
        };
        let span = offset..offset + grapheme.len();

        for ch in folded.chars() {
            if ch.is_alphanumeric() {
                state.append_char(ch, span.clone(), line, cfg.lowercase);
            } else if ch.is_mark() && state.in_token() {
                // Combining marks stay attached to the word they decorate.
                state.append_char(ch, span.clone(), line, false);
            } else {
                state.finalize_token(cfg);
            }
        }
    }
    state.finalize_token(cfg);

    if state.tokens.is_empty() {
        return Err(CanonicalError::NoTextContent(NoTextReason::Empty));
    }

    Ok(NormalizedText {
        tokens: state.tokens,
        normalizer_version: cfg.version,
    })
}

fn is_line_break(grapheme: &str) -> bool {
    matches!(grapheme, "\n" | "\r\n" | "\r")
}

fn is_markup_token(text: &str) -> bool {
    if text.len() > 5 {
        return false;
    }
    let lowered = text.to_ascii_lowercase();
    MARKUP_TOKENS.binary_search(&lowered.as_str()).is_ok()
}

fn is_collapsible_number(text: &str, min_digits: usize) -> bool {
    min_digits > 0 && text.len() >= min_digits && text.bytes().all(|b| b.is_ascii_digit())
}

/// Token under construction.
struct PendingToken {
    text: String,
    start: usize,
    end: usize,
    line: u32,
}

struct TokenizerState {
    tokens: Vec<Token>,
    pending: Option<PendingToken>,
    // The last emitted token is a digit placeholder that later digit runs extend.
    in_digit_run: bool,
}

impl TokenizerState {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
            pending: None,
            in_digit_run: false,
        }
    }

    fn in_token(&self) -> bool {
        self.pending.is_some()
    }

    fn append_char(&mut self, ch: char, span: std::ops::Range<usize>, line: u32, lowercase: bool) {
        let pending = self.pending.get_or_insert_with(|| PendingToken {
            text: String::new(),
            start: span.start,
            end: span.end,
            line,
        });
        pending.end = span.end;
        // Lowercasing can expand a single character into several.
        if lowercase {
            pending.text.extend(ch.to_lowercase());
        } else {
            pending.text.push(ch);
        }
    }

    fn finalize_token(&mut self, cfg: &NormalizeConfig) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.text.is_empty() {
            return;
        }
        if cfg.strip_markup && is_markup_token(&pending.text) {
            return;
        }

        if is_collapsible_number(&pending.text, cfg.min_collapsed_digits) {
            if self.in_digit_run {
                if let Some(last) = self.tokens.last_mut() {
                    last.end = pending.end;
                }
                return;
            }
            self.in_digit_run = true;
            self.tokens.push(Token {
                text: DIGIT_PLACEHOLDER.to_string(),
                start: pending.start,
                end: pending.end,
                line: pending.line,
            });
            return;
        }

        self.in_digit_run = false;
        self.tokens.push(Token {
            text: pending.text,
            start: pending.start,
            end: pending.end,
            line: pending.line,
        });
    }
}
