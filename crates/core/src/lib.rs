pub mod cache;
pub mod chunking;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod truncate;

pub use cache::{cache_key, ExtractionCache};
pub use chunking::{chunk_words, word_count, WordChunks};
pub use error::{
    AnalysisError, ExtractError, PipelineError, ProviderError, TableParseError,
};
pub use extractor::{
    extract, extract_with, ExtractOptions, LopdfReader, PageReader, PageText, PdfExtractReader,
};
pub use llm::{CompletionClient, GroqClient, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
pub use metrics::parse_metrics_table;
pub use models::{
    AnalysisKind, AnalysisOutcome, AnalysisResult, BoundedText, Configuration, ExtractedText,
    MetricRow, MetricsTable, ModelParams, ReaderKind, TruncationStrategy,
};
pub use orchestrator::{
    AnalysisOrchestrator, NoProgress, ProgressObserver, METRICS_HEADER, METRIC_ROWS,
    SYSTEM_PROMPT,
};
pub use pipeline::{
    analyze_folder_best_effort, discover_pdf_files, run, AnalysisReport, FileAnalysis,
    SkippedPdf,
};
pub use truncate::{truncate, OMISSION_MARKER};
