//! Token counting and truncation
//!
//! Uses tiktoken's `cl100k_base` encoding so counts are deterministic across
//! runs; falls back to a ~4-chars-per-token estimate if the encoder cannot
//! be built.

use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

static CL100K_ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    CL100K_ENCODER
        .get_or_init(|| tiktoken_rs::cl100k_base().ok())
        .as_ref()
}

fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Count tokens in `text`
pub fn count_tokens(text: &str) -> usize {
    match encoder() {
        Some(enc) => enc.encode_ordinary(text).len(),
        None => estimate_tokens(text),
    }
}

/// Truncate `text` to at most `max_tokens` tokens, cutting at a token
/// boundary. Returns the text unchanged when it already fits.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    if max_tokens == 0 {
        return String::new();
    }
    match encoder() {
        Some(enc) => {
            let tokens = enc.encode_ordinary(text);
            if tokens.len() <= max_tokens {
                return text.to_string();
            }
            // Re-encoding a decoded prefix can tokenize differently, so
            // shrink until the recount actually fits.
            // A prefix can also end mid-codepoint, which fails to decode;
            // both cases shrink by one token and retry.
            let mut take = max_tokens;
            loop {
                if take == 0 {
                    return String::new();
                }
                if let Ok(candidate) = enc.decode(tokens[..take].to_vec()) {
                    if enc.encode_ordinary(&candidate).len() <= max_tokens {
                        return candidate;
                    }
                }
                take -= 1;
            }
        }
        None => {
            if estimate_tokens(text) <= max_tokens {
                text.to_string()
            } else {
                char_truncate(text, max_tokens)
            }
        }
    }
}

/// Character-level fallback: ~4 chars per token, cut at a char boundary
fn char_truncate(text: &str, max_tokens: usize) -> String {
    let max_bytes = max_tokens.saturating_mul(4);
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
