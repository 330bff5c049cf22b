//! Token counting and token-level truncation backed by `tiktoken-rs`.
//!
//! The chunker measures every record under the run's model so its budgets are
//! expressed in the same units the provider bills and limits by. Truncation
//! happens at the token level: slicing the encoded sequence guarantees the
//! post-truncation count never exceeds the budget in a single pass, which a
//! character-level shrink loop cannot.

use std::fmt;

use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Errors from tokenizer construction or round-tripping.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// No encoding is registered for the requested model.
    #[error("no tokenizer available for model '{model}': {message}")]
    UnknownModel { model: String, message: String },

    /// Decoding a truncated token sequence produced invalid text.
    #[error("failed to decode truncated tokens: {0}")]
    Decode(String),
}

/// A text measured against a token budget, truncated if it exceeded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasuredText {
    /// The (possibly truncated) text to submit.
    pub text: String,
    /// Token count of `text`; never exceeds the budget passed to `measure`.
    pub token_count: usize,
    /// Whether the original text was cut down to fit.
    pub truncated: bool,
}

/// Token counter for a specific embedding model.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: CoreBPE,
    model: String,
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl TokenCounter {
    /// Resolves the encoding registered for `model`.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let bpe =
            tiktoken_rs::get_bpe_from_model(model).map_err(|err| TokenizerError::UnknownModel {
                model: model.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            bpe,
            model: model.to_string(),
        })
    }

    /// Model this counter tokenizes for.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of tokens in `text` under this model.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Measures `text` against `max_tokens`, truncating when it exceeds it.
    ///
    /// Truncation keeps exactly the first `max_tokens` tokens of the encoded
    /// sequence and decodes them back to text.
    pub fn measure(&self, text: &str, max_tokens: usize) -> Result<MeasuredText, TokenizerError> {
        let mut tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return Ok(MeasuredText {
                text: text.to_string(),
                token_count: tokens.len(),
                truncated: false,
            });
        }

        tokens.truncate(max_tokens);
        let decoded = self
            .bpe
            .decode(tokens)
            .map_err(|err| TokenizerError::Decode(err.to_string()))?;
        Ok(MeasuredText {
            text: decoded,
            token_count: max_tokens,
            truncated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> TokenCounter {
        TokenCounter::for_model("text-embedding-ada-002").unwrap()
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = TokenCounter::for_model("no-such-model").unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownModel { .. }));
    }

    #[test]
    fn counts_single_letter_as_one_token() {
        assert_eq!(counter().count("a"), 1);
    }

    #[test]
    fn measure_leaves_fitting_text_alone() {
        let measured = counter().measure("journey", 10).unwrap();
        assert_eq!(measured.text, "journey");
        assert_eq!(measured.token_count, 2);
        assert!(!measured.truncated);
    }

    #[test]
    fn measure_truncates_to_exact_budget() {
        // "journey" encodes as two tokens (jour|ney) under cl100k.
        let measured = counter().measure("journey", 1).unwrap();
        assert_eq!(measured.text, "jour");
        assert_eq!(measured.token_count, 1);
        assert!(measured.truncated);
    }
}
