//! Greedy, order-preserving chunking of records into provider-sized batches.
//!
//! The chunker walks the input once, appending each record to the open chunk
//! unless doing so would push the chunk past its token budget or entry cap,
//! in which case the chunk is closed and a new one opened. Concatenating the
//! returned chunks reproduces the input order exactly, which is what makes
//! checkpoint offsets meaningful downstream.

use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::tokenizer::{TokenCounter, TokenizerError};
use crate::types::Record;

/// Errors raised while validating or splitting records.
#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    /// A record had empty text. Providers interpret empty input ambiguously,
    /// so this fails eagerly instead of substituting placeholder content.
    #[error("record {index} is empty and cannot be embedded")]
    EmptyRecord { index: usize },

    /// A chunk limit was zero.
    #[error("{name} must be at least 1, got {value}")]
    InvalidLimit { name: &'static str, value: usize },

    /// Tokenizer construction or truncation failed.
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}

/// An ordered, non-empty batch of records plus their summed token count.
///
/// Invariants upheld by [`Chunker::split`]: `1 <= len <= max_entries_per_chunk`
/// and `token_count <= max_tokens_per_chunk` (oversized records are truncated
/// to exactly the budget before packing, so the sum never exceeds it).
#[derive(Clone, Debug)]
pub struct Chunk {
    records: Vec<Record>,
    token_count: usize,
}

impl Chunk {
    /// Records in this chunk, in input order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records in this chunk.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`: the chunker never emits an empty chunk.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summed token count of all records in this chunk.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Owned copies of the record texts, ready for a provider request.
    pub fn texts(&self) -> Vec<String> {
        self.records.iter().map(|r| r.text.clone()).collect()
    }

    /// Absolute index of the first record in this chunk.
    pub fn first_index(&self) -> usize {
        self.records.first().map(|r| r.index).unwrap_or(0)
    }
}

/// Result of splitting an input list: the chunks plus the overall token count.
#[derive(Clone, Debug, Default)]
pub struct ChunkingOutcome {
    /// Chunks in input order; concatenating them reproduces the input.
    pub chunks: Vec<Chunk>,
    /// Token count across all chunks, after any truncation.
    pub total_tokens: usize,
}

impl ChunkingOutcome {
    /// Total number of records across all chunks.
    pub fn record_count(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }
}

/// Splits ordered records into chunks under token and entry-count budgets.
///
/// Holds no state across calls beyond the tokenizer and the configured limits.
#[derive(Clone, Debug)]
pub struct Chunker {
    counter: TokenCounter,
    max_tokens_per_chunk: usize,
    max_entries_per_chunk: usize,
}

impl Chunker {
    /// Builds a chunker for the configured model and budgets.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ChunkingError> {
        let counter = TokenCounter::for_model(&config.model)?;
        Self::with_counter(
            counter,
            config.max_tokens_per_chunk,
            config.max_entries_per_chunk,
        )
    }

    /// Builds a chunker around an existing tokenizer.
    pub fn with_counter(
        counter: TokenCounter,
        max_tokens_per_chunk: usize,
        max_entries_per_chunk: usize,
    ) -> Result<Self, ChunkingError> {
        if max_tokens_per_chunk < 1 {
            return Err(ChunkingError::InvalidLimit {
                name: "max_tokens_per_chunk",
                value: max_tokens_per_chunk,
            });
        }
        if max_entries_per_chunk < 1 {
            return Err(ChunkingError::InvalidLimit {
                name: "max_entries_per_chunk",
                value: max_entries_per_chunk,
            });
        }
        Ok(Self {
            counter,
            max_tokens_per_chunk,
            max_entries_per_chunk,
        })
    }

    /// Token budget each chunk is packed under.
    pub fn max_tokens_per_chunk(&self) -> usize {
        self.max_tokens_per_chunk
    }

    /// Entry cap each chunk is packed under.
    pub fn max_entries_per_chunk(&self) -> usize {
        self.max_entries_per_chunk
    }

    /// Splits `records` into ordered chunks.
    ///
    /// Empty input yields zero chunks and zero tokens. A record whose text
    /// tokenizes past the budget is truncated to exactly the budget and kept
    /// as a single submission unit; a record with empty text aborts the whole
    /// split with [`ChunkingError::EmptyRecord`] before any provider call.
    pub fn split(&self, records: &[Record]) -> Result<ChunkingOutcome, ChunkingError> {
        let mut chunks = Vec::new();
        let mut current: Vec<Record> = Vec::new();
        let mut current_tokens = 0usize;
        let mut total_tokens = 0usize;

        for record in records {
            if record.text.is_empty() {
                return Err(ChunkingError::EmptyRecord {
                    index: record.index,
                });
            }

            let measured = self
                .counter
                .measure(&record.text, self.max_tokens_per_chunk)?;
            if measured.truncated {
                warn!(
                    index = record.index,
                    budget = self.max_tokens_per_chunk,
                    "record exceeds token budget, truncating to fit"
                );
            }

            let over_tokens = current_tokens + measured.token_count > self.max_tokens_per_chunk;
            let over_entries = current.len() >= self.max_entries_per_chunk;
            if !current.is_empty() && (over_tokens || over_entries) {
                chunks.push(Chunk {
                    records: std::mem::take(&mut current),
                    token_count: current_tokens,
                });
                current_tokens = 0;
            }

            current.push(Record::new(record.index, measured.text));
            current_tokens += measured.token_count;
            total_tokens += measured.token_count;
        }

        if !current.is_empty() {
            chunks.push(Chunk {
                records: current,
                token_count: current_tokens,
            });
        }

        Ok(ChunkingOutcome {
            chunks,
            total_tokens,
        })
    }
}
