//! Truncation and segmentation applied before text reaches a summarizer.
//!
//! Every segment sent to a summarizer is capped by a fixed budget.
//!
//! Highlights:
//!
//! - Budget units: characters (Unicode scalar values) by default, or tokenizer tokens counted
//!   with `tiktoken-rs` for the configured model.
//! - Modes: `full` sends the whole document truncated to the budget; `per_page` summarizes every
//!   non-empty page on its own; `semantic` splits with `semchunk-rs` so each segment fits the
//!   budget without cutting mid-sentence where avoidable.
//! - Fan-out: segmenting modes stop after `max_segments` segments.

use crate::config::{BudgetUnit, ChunkMode, Config};
use crate::extraction::ExtractedText;
use anyhow::Error as TokenizerError;
use semchunk_rs::Chunker;
use std::sync::Arc;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

use super::types::ChunkingError;

pub(crate) type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// A unit of text sent to the summarizer on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Human-readable origin such as `Page 3`; `None` for whole-document segments.
    pub label: Option<String>,
    /// Text already cut to the budget.
    pub text: String,
}

/// Budget and segmentation rules derived from configuration.
#[derive(Debug, Clone)]
pub struct ChunkPolicy {
    /// Segmentation mode.
    pub mode: ChunkMode,
    /// Unit of `budget`.
    pub unit: BudgetUnit,
    /// Per-segment size limit.
    pub budget: usize,
    /// Maximum number of segments produced by segmenting modes.
    pub max_segments: usize,
    /// Model whose tokenizer is used for token budgets.
    pub model: Option<String>,
    /// Cut segments to the budget. Off for in-process summarizers, which read everything.
    pub truncate: bool,
}

impl ChunkPolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.chunk_mode,
            unit: config.chunk_unit,
            budget: config.chunk_budget,
            max_segments: config.chunk_max_segments.max(1),
            model: config.summarization_model.clone(),
            truncate: true,
        }
    }

    /// Replace the segmentation mode, keeping the budget.
    pub fn with_mode(mut self, mode: ChunkMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep segments whole instead of cutting them to the budget.
    pub fn untruncated(mut self) -> Self {
        self.truncate = false;
        self
    }

    /// Split extracted text into budgeted segments.
    ///
    /// Returns an empty vector when the document has no text.
    pub fn segments(&self, extracted: &ExtractedText) -> Result<Vec<Segment>, ChunkingError> {
        if self.budget == 0 {
            return Err(ChunkingError::InvalidBudget);
        }
        if extracted.is_empty() {
            return Ok(Vec::new());
        }

        let counter = self.counter();
        let segments = match self.mode {
            ChunkMode::Full => vec![Segment {
                label: None,
                text: self.cut(&extracted.joined(), &counter),
            }],
            ChunkMode::PerPage => extracted
                .pages()
                .iter()
                .take(self.max_segments)
                .map(|page| Segment {
                    label: Some(format!("Page {}", page.number)),
                    text: self.cut(&page.text, &counter),
                })
                .collect(),
            ChunkMode::Semantic => {
                let chunker_counter = counter.clone();
                let chunker = Chunker::new(
                    self.budget,
                    Box::new(move |segment: &str| chunker_counter.as_ref()(segment)),
                );
                chunker
                    .chunk(&extracted.joined())
                    .into_iter()
                    .filter(|chunk| !chunk.trim().is_empty())
                    .take(self.max_segments)
                    .enumerate()
                    .map(|(index, chunk)| Segment {
                        label: Some(format!("Part {}", index + 1)),
                        text: self.cut(&chunk, &counter),
                    })
                    .collect()
            }
        };

        tracing::debug!(
            mode = ?self.mode,
            unit = ?self.unit,
            budget = self.budget,
            segments = segments.len(),
            "Prepared summarization segments"
        );
        Ok(segments)
    }

    fn counter(&self) -> TokenCounter {
        match self.unit {
            BudgetUnit::Characters => char_counter(),
            BudgetUnit::Tokens => build_token_counter(self.model.as_deref().unwrap_or("")),
        }
    }

    fn cut(&self, text: &str, counter: &TokenCounter) -> String {
        if !self.truncate {
            return text.to_string();
        }
        match self.unit {
            BudgetUnit::Characters => truncate_chars(text, self.budget),
            BudgetUnit::Tokens => truncate_to_budget(text, self.budget, counter),
        }
    }
}

/// Keep the first `budget` characters of `text`.
///
/// Longer input yields exactly `budget` characters; shorter input is returned unchanged.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Keep the longest character prefix whose counted size fits `budget`.
pub(crate) fn truncate_to_budget(text: &str, budget: usize, counter: &TokenCounter) -> String {
    if counter.as_ref()(text) <= budget {
        return text.to_string();
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .collect();
    let (mut low, mut high) = (0usize, boundaries.len() - 1);
    while low < high {
        let mid = (low + high).div_ceil(2);
        if counter.as_ref()(&text[..boundaries[mid]]) <= budget {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    text[..boundaries[low]].to_string()
}

fn char_counter() -> TokenCounter {
    Arc::new(|segment: &str| segment.chars().count())
}

/// Build a token counter for the given model.
///
/// Uses OpenAI encodings when the model or encoding name is known and falls back to
/// `cl100k_base` otherwise, which is close enough for budgeting Gemini or Ollama prompts.
pub(crate) fn build_token_counter(model: &str) -> TokenCounter {
    let normalized = model.trim();
    let target = if normalized.is_empty() {
        "cl100k_base"
    } else {
        normalized
    };
    match resolve_encoding(target) {
        Ok(encoding) => {
            let encoding = Arc::new(encoding);
            Arc::new(move |segment: &str| encoding.encode_ordinary(segment).len())
        }
        Err(source) => {
            tracing::warn!(
                model = target,
                error = %source,
                "Tokenizer unavailable; falling back to whitespace counter"
            );
            whitespace_counter()
        }
    }
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                model,
                error = %model_err,
                "Tokenizer model lookup failed; trying encoding name"
            );
            if let Some(candidate) = encoding_from_name(model) {
                candidate
            } else {
                tracing::debug!(
                    model,
                    "Falling back to 'cl100k_base' encoding for token counting"
                );
                cl100k_base()
            }
        }
    }
}

fn encoding_from_name(name: &str) -> Option<Result<CoreBPE, TokenizerError>> {
    match name {
        "cl100k_base" => Some(cl100k_base()),
        "o200k_base" => Some(o200k_base()),
        "p50k_base" => Some(p50k_base()),
        "p50k_edit" => Some(p50k_edit()),
        "r50k_base" | "gpt2" => Some(r50k_base()),
        _ => None,
    }
}

fn whitespace_counter() -> TokenCounter {
    Arc::new(|segment: &str| {
        let tokens = segment.split_whitespace().count();
        if tokens == 0 && !segment.is_empty() {
            1
        } else {
            tokens
        }
    })
}
