use crate::error::AnalysisError;
use crate::llm::CompletionClient;
use crate::models::{AnalysisKind, AnalysisOutcome, ModelParams};

pub const SYSTEM_PROMPT: &str = "You are a financial analyst assistant.";

pub const METRICS_HEADER: &str = "Metric,Current Period,Previous Period,Change";
pub const METRIC_ROWS: [&str; 6] = [
    "Revenue",
    "Net Income",
    "EBITDA",
    "EPS",
    "Total Assets",
    "Total Debt",
];

/// Advisory progress callback, fired after each per-chunk call completes.
/// Has no effect on the result.
pub trait ProgressObserver: Sync {
    fn chunk_completed(&self, completed: usize, total: usize);
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn chunk_completed(&self, _completed: usize, _total: usize) {}
}

/// Runs one analysis over a chunk sequence: one completion per chunk in
/// order, then a reduce call that merges the per-chunk outputs when there
/// is more than one.
pub struct AnalysisOrchestrator<C> {
    client: C,
}

impl<C> AnalysisOrchestrator<C>
where
    C: CompletionClient + Send + Sync,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Best-effort across chunks: a failed provider call is recorded in
    /// place of that chunk's output and the batch continues, so the failure
    /// stays visible in the merged result instead of being dropped. No
    /// retries.
    pub async fn analyze(
        &self,
        chunks: &[String],
        kind: AnalysisKind,
        params: &ModelParams,
        progress: &dyn ProgressObserver,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if chunks.iter().all(|chunk| chunk.trim().is_empty()) {
            return Err(AnalysisError::EmptyInput);
        }

        let total = chunks.len();
        let mut outputs = Vec::with_capacity(total);
        let mut failed = 0usize;

        for (index, chunk) in chunks.iter().enumerate() {
            let prompt = chunk_prompt(kind, chunk);
            let output = match self.client.complete(SYSTEM_PROMPT, &prompt, params).await {
                Ok(text) => text,
                Err(error) => {
                    failed += 1;
                    format!("[chunk {} failed: {error}]", index + 1)
                }
            };

            outputs.push(output);
            progress.chunk_completed(index + 1, total);
        }

        if total == 1 {
            return Ok(AnalysisOutcome {
                kind,
                text: outputs.pop().unwrap_or_default(),
                chunk_count: 1,
                failed_chunks: failed,
                reduced: false,
                reduce_error: None,
            });
        }

        let joined = outputs.join("\n");
        let prompt = reduce_prompt(kind, &joined);

        match self.client.complete(SYSTEM_PROMPT, &prompt, params).await {
            Ok(text) => Ok(AnalysisOutcome {
                kind,
                text,
                chunk_count: total,
                failed_chunks: failed,
                reduced: true,
                reduce_error: None,
            }),
            // A failed merge falls back to the per-chunk outputs in order
            // rather than discarding the successful calls.
            Err(error) => Ok(AnalysisOutcome {
                kind,
                text: joined,
                chunk_count: total,
                failed_chunks: failed,
                reduced: false,
                reduce_error: Some(error.to_string()),
            }),
        }
    }
}

fn chunk_prompt(kind: AnalysisKind, chunk: &str) -> String {
    match kind {
        AnalysisKind::Summary => format!(
            "Write a 200-word executive summary of the following financial report excerpt. \
             Focus on overall performance, key drivers, and outlook.\n\n{chunk}"
        ),
        AnalysisKind::Metrics => format!(
            "Extract key financial metrics from the following report excerpt as CSV with the \
             header row `{METRICS_HEADER}` and exactly these metric rows: {}. Use N/A for any \
             value the excerpt does not state. Output only the table.\n\n{chunk}",
            METRIC_ROWS.join(", ")
        ),
        AnalysisKind::Risks => format!(
            "List the top 5 risks disclosed in the following financial report excerpt as \
             bullet points, pairing each with a related opportunity where the text suggests \
             one.\n\n{chunk}"
        ),
    }
}

fn reduce_prompt(kind: AnalysisKind, joined_outputs: &str) -> String {
    match kind {
        AnalysisKind::Metrics => format!(
            "Combine and refine the following metric tables into one coherent, concise CSV \
             table with the header row `{METRICS_HEADER}`, keeping one row per \
             metric:\n\n{joined_outputs}"
        ),
        _ => format!(
            "Combine and refine the following outputs into one coherent, concise \
             result:\n\n{joined_outputs}"
        ),
    }
}
