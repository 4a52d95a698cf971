use crate::cache::{cache_key, ExtractionCache};
use crate::chunking::chunk_words;
use crate::error::PipelineError;
use crate::extractor::extract;
use crate::llm::CompletionClient;
use crate::metrics::parse_metrics_table;
use crate::models::{AnalysisKind, AnalysisResult, Configuration};
use crate::orchestrator::{AnalysisOrchestrator, ProgressObserver};
use crate::truncate::truncate;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Run the full pipeline over one document: extract (through the cache
/// when one is supplied), bound, chunk, analyze. Extraction failure halts
/// the run before any provider call is spent.
pub async fn run<C>(
    data: &[u8],
    kind: AnalysisKind,
    config: &Configuration,
    orchestrator: &AnalysisOrchestrator<C>,
    cache: Option<&ExtractionCache>,
    progress: &dyn ProgressObserver,
) -> Result<AnalysisResult, PipelineError>
where
    C: CompletionClient + Send + Sync,
{
    config.validate()?;

    let options = config.extract_options();
    let key = cache.map(|_| cache_key(data, &options));

    let extracted = match (cache, &key) {
        (Some(cache), Some(key)) => match cache.get(key) {
            Some(hit) => hit,
            None => {
                let fresh = extract(data, &options)?;
                cache.put(key.clone(), fresh.clone());
                fresh
            }
        },
        _ => extract(data, &options)?,
    };

    let bounded = truncate(&extracted.text, config.max_chars, config.truncation);
    let chunks: Vec<String> = chunk_words(&bounded.text, config.chunk_word_count)?.collect();

    let outcome = orchestrator
        .analyze(&chunks, kind, &config.model_params(), progress)
        .await?;

    let table = match kind {
        AnalysisKind::Metrics => parse_metrics_table(&outcome.text).ok(),
        _ => None,
    };

    Ok(AnalysisResult {
        outcome,
        table,
        reader: extracted.reader,
        pages_consulted: extracted.pages_consulted,
        input_truncated: extracted.truncated || bounded.truncated,
    })
}

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

#[derive(Debug)]
pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub result: AnalysisResult,
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub analyzed: Vec<FileAnalysis>,
    pub skipped: Vec<SkippedPdf>,
}

/// Analyze every PDF under `folder`, best effort: an unreadable file lands
/// in `skipped` with its reason and never aborts the rest of the batch.
/// The cache carries extractions across files with identical content.
pub async fn analyze_folder_best_effort<C>(
    folder: &Path,
    kind: AnalysisKind,
    config: &Configuration,
    orchestrator: &AnalysisOrchestrator<C>,
    cache: Option<&ExtractionCache>,
    progress: &dyn ProgressObserver,
) -> Result<AnalysisReport, PipelineError>
where
    C: CompletionClient + Send + Sync,
{
    let files = discover_pdf_files(folder);
    if files.is_empty() {
        return Err(PipelineError::NoDocuments(folder.display().to_string()));
    }

    let mut analyzed = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(error) => {
                skipped.push(SkippedPdf {
                    path,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        match run(&data, kind, config, orchestrator, cache, progress).await {
            Ok(result) => analyzed.push(FileAnalysis { path, result }),
            Err(error) => skipped.push(SkippedPdf {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(AnalysisReport { analyzed, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::llm::CompletionClient;
    use crate::models::{ModelParams, ReaderKind, TruncationStrategy};
    use crate::orchestrator::NoProgress;
    use async_trait::async_trait;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CannedClient {
        reply: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl CannedClient {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _params: &ModelParams,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    /// Build a minimal one-page PDF carrying `text` in its content stream.
    fn one_page_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content stream should encode"),
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf should serialize");
        bytes
    }

    fn config() -> Configuration {
        Configuration {
            truncation: TruncationStrategy::HardCutoff,
            max_chars: 10_000,
            chunk_word_count: 100,
            ..Configuration::default()
        }
    }

    #[tokio::test]
    async fn pipeline_runs_end_to_end_over_a_real_pdf() {
        let data = one_page_pdf("Revenue grew nine percent year over year");
        let orchestrator = AnalysisOrchestrator::new(CannedClient::new("a fine summary"));

        let result = run(
            &data,
            AnalysisKind::Summary,
            &config(),
            &orchestrator,
            None,
            &NoProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.outcome.text, "a fine summary");
        assert_eq!(result.outcome.chunk_count, 1);
        assert_eq!(result.reader, ReaderKind::Primary);
        assert!(!result.input_truncated);
    }

    #[tokio::test]
    async fn garbage_bytes_halt_before_any_provider_call() {
        let client = CannedClient::new("never sent");
        let calls = client.calls.clone();
        let orchestrator = AnalysisOrchestrator::new(client);

        let error = run(
            b"not a pdf",
            AnalysisKind::Summary,
            &config(),
            &orchestrator,
            None,
            &NoProgress,
        )
        .await
        .expect_err("unreadable input must fail");

        assert!(matches!(error, PipelineError::Extract(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_skips_re_extraction_on_the_second_run() {
        let data = one_page_pdf("Cached content");
        let cache = ExtractionCache::new(std::time::Duration::from_secs(60));
        let orchestrator = AnalysisOrchestrator::new(CannedClient::new("ok"));

        let first = run(
            &data,
            AnalysisKind::Summary,
            &config(),
            &orchestrator,
            Some(&cache),
            &NoProgress,
        )
        .await
        .unwrap();
        assert_eq!(cache.len(), 1);

        // Same document, different analysis kind: the extraction is reused.
        let second = run(
            &data,
            AnalysisKind::Risks,
            &config(),
            &orchestrator,
            Some(&cache),
            &NoProgress,
        )
        .await
        .unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(first.pages_consulted, second.pages_consulted);
    }

    #[tokio::test]
    async fn metrics_kind_attaches_a_parsed_table() {
        let data = one_page_pdf("Revenue was 500 this year and 450 last year");
        let orchestrator = AnalysisOrchestrator::new(CannedClient::new(
            "Metric,Current Period,Previous Period,Change\nRevenue,500,450,+11%",
        ));

        let result = run(
            &data,
            AnalysisKind::Metrics,
            &config(),
            &orchestrator,
            None,
            &NoProgress,
        )
        .await
        .unwrap();

        let table = result.table.expect("table should parse");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].metric, "Revenue");
    }

    #[tokio::test]
    async fn unparsable_metrics_output_keeps_the_raw_text() {
        let data = one_page_pdf("Numbers are hard");
        let orchestrator =
            AnalysisOrchestrator::new(CannedClient::new("I could not find any metrics."));

        let result = run(
            &data,
            AnalysisKind::Metrics,
            &config(),
            &orchestrator,
            None,
            &NoProgress,
        )
        .await
        .unwrap();

        assert!(result.table.is_none());
        assert_eq!(result.outcome.text, "I could not find any metrics.");
    }

    #[test]
    fn discover_pdf_files_is_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        fs::write(dir.path().join("b.pdf"), b"%PDF-1.4").unwrap();
        fs::write(nested.join("a.PDF"), b"%PDF-1.4").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a pdf").unwrap();

        let files = discover_pdf_files(dir.path());
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn batch_fails_without_pdfs() {
        let dir = tempdir().unwrap();
        let orchestrator = AnalysisOrchestrator::new(CannedClient::new("unused"));

        let error = analyze_folder_best_effort(
            dir.path(),
            AnalysisKind::Summary,
            &config(),
            &orchestrator,
            None,
            &NoProgress,
        )
        .await
        .expect_err("an empty folder is an error");

        assert!(matches!(error, PipelineError::NoDocuments(_)));
    }

    #[tokio::test]
    async fn batch_skips_unreadable_pdfs_and_analyzes_the_rest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4 garbage").unwrap();
        fs::write(dir.path().join("good.pdf"), one_page_pdf("Solid quarter")).unwrap();

        let orchestrator = AnalysisOrchestrator::new(CannedClient::new("summary"));

        let report = analyze_folder_best_effort(
            dir.path(),
            AnalysisKind::Summary,
            &config(),
            &orchestrator,
            None,
            &NoProgress,
        )
        .await
        .unwrap();

        assert_eq!(report.analyzed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].path.file_name().and_then(|name| name.to_str()),
            Some("broken.pdf")
        );
    }
}
