use crate::error::AnalysisError;
use crate::extractor::ExtractOptions;
use serde::{Deserialize, Serialize};

/// Which reader produced an extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReaderKind {
    Primary,
    Fallback,
}

/// Text pulled out of a document, with provenance. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub reader: ReaderKind,
    pub pages_consulted: usize,
    /// True when the character budget stopped extraction before the last page.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TruncationStrategy {
    /// Keep the first `max_chars` characters.
    HardCutoff,
    /// Keep the head and tail of the text, dropping the middle.
    HeadTail,
}

/// Output of the truncator. Invariant: `text` holds at most the configured
/// character budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedText {
    pub text: String,
    pub strategy: TruncationStrategy,
    /// True when the budget forced part of the input to be dropped.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    Summary,
    Metrics,
    Risks,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "summary",
            AnalysisKind::Metrics => "metrics",
            AnalysisKind::Risks => "risks",
        }
    }
}

/// Parameters forwarded verbatim to the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// One knob set for the whole pipeline. The defaults mirror the tuned
/// numbers of the reference deployment: 3000-word chunks, temperature 0.2,
/// head/tail sampling over a 40k-character budget.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub max_pages: Option<usize>,
    pub max_chars: usize,
    pub truncation: TruncationStrategy,
    pub chunk_word_count: usize,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_pages: None,
            max_chars: 40_000,
            truncation: TruncationStrategy::HeadTail,
            chunk_word_count: 3_000,
            model: "openai/gpt-oss-20b".to_string(),
            temperature: 0.2,
            max_tokens: Some(1_024),
        }
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.chunk_word_count == 0 {
            return Err(AnalysisError::InvalidChunkConfig(
                "chunk word count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Extraction limits derived from the analysis budget. Under a hard
    /// cutoff nothing past `max_chars` survives truncation, so extraction
    /// stops there too; head/tail sampling needs the closing pages, so only
    /// the page budget applies. The fallback reader gets half the page
    /// budget.
    pub fn extract_options(&self) -> ExtractOptions {
        let char_cap = match self.truncation {
            TruncationStrategy::HardCutoff => Some(self.max_chars),
            TruncationStrategy::HeadTail => None,
        };

        ExtractOptions {
            max_pages: self.max_pages,
            max_chars: char_cap,
            fallback_max_pages: self.max_pages.map(|pages| (pages / 2).max(1)),
            fallback_max_chars: char_cap,
        }
    }
}

/// One row of the metrics table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricRow {
    pub metric: String,
    pub current: String,
    pub previous: String,
    pub change: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsTable {
    pub rows: Vec<MetricRow>,
}

/// What the orchestrator produced for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub kind: AnalysisKind,
    pub text: String,
    pub chunk_count: usize,
    pub failed_chunks: usize,
    /// True when a reduce call merged multiple chunk outputs.
    pub reduced: bool,
    pub reduce_error: Option<String>,
}

/// Final pipeline result handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub outcome: AnalysisOutcome,
    /// Parsed metrics table, when the kind is `Metrics` and the provider
    /// output parsed. Callers fall back to `outcome.text` otherwise.
    pub table: Option<MetricsTable>,
    pub reader: ReaderKind,
    pub pages_consulted: usize,
    /// True when either extraction or truncation dropped input text.
    pub input_truncated: bool,
}
