//! Concurrent fill of a document set
//!
//! One task is spawned per document, with dispatches staggered by the pacing
//! interval. Each task sends exactly one result on a channel sized to the
//! document count; the orchestrator drains that many results (or, if a task
//! dies without reporting, marks its document aborted) and aggregates them.

use crate::config::{FillConfig, OrderingPolicy};
use crate::error::ExtractorError;
use crate::parser::parse_completion;
use crate::prompt::PromptBuilder;
use crate::schema::SchemaDocument;
use crate::types::{
    AggregateOutput, BatchMetadata, DocumentState, FailureKind, FillFailure, FillOutcome,
    FillRecord, FillResult,
};
use docfill_domain::{CompletionEngine, DocumentHandle, DocumentLoader};
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Fills a schema from every document of a set
pub struct FillOrchestrator<L, E> {
    loader: Arc<L>,
    engine: Arc<E>,
    schema: Arc<SchemaDocument>,
    instructions: Option<Arc<str>>,
    config: FillConfig,
}

impl<L, E> FillOrchestrator<L, E>
where
    L: DocumentLoader + Send + Sync + 'static,
    E: CompletionEngine + Send + Sync + 'static,
    L::Error: Display,
    E::Error: Display,
{
    /// Create a new orchestrator
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] if the configuration is invalid.
    pub fn new(
        loader: L,
        engine: E,
        schema: SchemaDocument,
        config: FillConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            loader: Arc::new(loader),
            engine: Arc::new(engine),
            schema: Arc::new(schema),
            instructions: None,
            config,
        })
    }

    /// Add extra instructions to every prompt; blank text is ignored
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = if instructions.trim().is_empty() {
            None
        } else {
            Some(Arc::from(instructions))
        };
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    /// Fill every document and aggregate the results
    ///
    /// Always returns exactly one entry per input document. Per-document
    /// failures are captured in the entries and never stop the run.
    pub async fn run(&self, documents: Vec<DocumentHandle>) -> AggregateOutput {
        let start = Instant::now();
        let total = documents.len();
        let model_name = self.engine.model_name().to_string();

        info!(
            documents = total,
            model = %model_name,
            ordering = ?self.config.ordering,
            "Starting fill run"
        );

        let (tx, mut rx) = mpsc::channel::<FillResult>(total.max(1));
        let limiter = self
            .config
            .max_in_flight
            .map(|slots| Arc::new(Semaphore::new(slots)));
        let pacing = self.config.pacing_interval();
        let task_timeout = self.config.task_timeout();

        for (index, document) in documents.iter().enumerate() {
            if index > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }

            // The semaphore is never closed, so acquisition cannot fail
            let permit = match &limiter {
                Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
                None => None,
            };

            debug!(
                document = %document.name(),
                index,
                state = %DocumentState::Pending,
                "Dispatching document"
            );

            let task = DocumentTask {
                index,
                document: document.clone(),
                loader: Arc::clone(&self.loader),
                engine: Arc::clone(&self.engine),
                schema: Arc::clone(&self.schema),
                instructions: self.instructions.clone(),
            };
            let tx = tx.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let result = task.run(task_timeout).await;
                // Capacity covers every document, so this never waits
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        let mut reported = vec![false; total];
        while results.len() < total {
            match rx.recv().await {
                Some(result) => {
                    reported[result.index] = true;
                    results.push(result);
                }
                None => break,
            }
        }

        for (index, document) in documents.iter().enumerate() {
            if !reported[index] {
                warn!(document = %document.name(), "Fill task ended without a result");
                results.push(FillResult {
                    index,
                    document: document.clone(),
                    outcome: FillOutcome::Failure(FillFailure::new(
                        document.name(),
                        FailureKind::Aborted,
                        "fill task ended without reporting a result",
                    )),
                    elapsed_ms: 0,
                });
            }
        }

        if self.config.ordering == OrderingPolicy::InputOrder {
            results.sort_by_key(|r| r.index);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let metadata = BatchMetadata {
            model_name,
            documents: total,
            succeeded,
            failed: total - succeeded,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Fill run complete: {} succeeded, {} failed in {} ms",
            metadata.succeeded, metadata.failed, metadata.duration_ms
        );

        AggregateOutput::new(results, self.config.identity_key.clone(), metadata)
    }
}

/// Everything one document's task needs
struct DocumentTask<L, E> {
    index: usize,
    document: DocumentHandle,
    loader: Arc<L>,
    engine: Arc<E>,
    schema: Arc<SchemaDocument>,
    instructions: Option<Arc<str>>,
}

impl<L, E> DocumentTask<L, E>
where
    L: DocumentLoader + Send + Sync,
    E: CompletionEngine + Send + Sync,
    L::Error: Display,
    E::Error: Display,
{
    async fn run(self, task_timeout: Duration) -> FillResult {
        let start = Instant::now();

        let outcome = match timeout(task_timeout, self.fill()).await {
            Ok(outcome) => outcome,
            Err(_) => FillOutcome::Failure(FillFailure::new(
                self.document.name(),
                FailureKind::Timeout,
                format!("fill exceeded {} s", task_timeout.as_secs()),
            )),
        };

        match &outcome {
            FillOutcome::Success(_) => debug!(
                document = %self.document.name(),
                state = %DocumentState::Resolved,
                "Document filled"
            ),
            FillOutcome::Failure(failure) => warn!(
                document = %self.document.name(),
                kind = %failure.kind,
                error = %failure.message,
                "Document failed"
            ),
        }

        FillResult {
            index: self.index,
            document: self.document,
            outcome,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn fill(&self) -> FillOutcome {
        let name = self.document.name();

        debug!(document = %name, state = %DocumentState::Loading, "Loading document");
        let text = match self.loader.load(&self.document).await {
            Ok(text) => text,
            Err(e) => return failure(name, FailureKind::Load, e.to_string()),
        };

        debug!(
            document = %name,
            state = %DocumentState::Completing,
            chars = text.len(),
            "Requesting completion"
        );
        let mut builder = PromptBuilder::new(&self.schema);
        if let Some(instructions) = &self.instructions {
            builder = builder.with_instructions(instructions);
        }
        let sections = builder.build(&text);

        let raw = match self.engine.complete(&sections).await {
            Ok(raw) => raw,
            Err(e) => return failure(name, FailureKind::Completion, e.to_string()),
        };

        let checked = parse_completion(&raw).and_then(|fields| {
            self.schema.check(&fields)?;
            Ok(fields)
        });

        match checked {
            Ok(fields) => FillOutcome::Success(FillRecord {
                document: name.to_string(),
                fields,
            }),
            Err(e) => FillOutcome::Failure(FillFailure {
                document: name.to_string(),
                kind: FailureKind::Shape,
                message: e.to_string(),
                raw_completion: Some(raw),
            }),
        }
    }
}

fn failure(document: &str, kind: FailureKind, message: String) -> FillOutcome {
    FillOutcome::Failure(FillFailure::new(document, kind, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, SchemaDeriver, TargetShape};
    use async_trait::async_trait;
    use docfill_llm::MockEngine;
    use std::collections::HashMap;

    /// Serves document text from memory, keyed by name
    struct MemoryLoader {
        texts: HashMap<String, String>,
    }

    #[async_trait]
    impl DocumentLoader for MemoryLoader {
        type Error = String;

        async fn load(&self, document: &DocumentHandle) -> Result<String, String> {
            self.texts
                .get(document.name())
                .cloned()
                .ok_or_else(|| format!("{} not found", document.name()))
        }
    }

    fn schema() -> SchemaDocument {
        SchemaDeriver::derive(&TargetShape::new().field("name", FieldType::String)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = FillConfig {
            max_in_flight: Some(0),
            ..FillConfig::default()
        };
        let result = FillOrchestrator::new(
            MemoryLoader {
                texts: HashMap::new(),
            },
            MockEngine::default(),
            schema(),
            config,
        );
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_document_is_load_failure() {
        let orchestrator = FillOrchestrator::new(
            MemoryLoader {
                texts: HashMap::new(),
            },
            MockEngine::default(),
            schema(),
            FillConfig::default(),
        )
        .unwrap();

        let output = orchestrator
            .run(vec![DocumentHandle::from_path("missing.txt")])
            .await;

        assert_eq!(output.len(), 1);
        let failure = output.failures().next().unwrap();
        assert_eq!(failure.kind, FailureKind::Load);
        assert_eq!(failure.document, "missing.txt");
    }

    /// Keeps every prompt it receives
    #[derive(Default)]
    struct RecordingEngine {
        prompts: std::sync::Mutex<Vec<docfill_domain::PromptSections>>,
    }

    #[async_trait]
    impl CompletionEngine for RecordingEngine {
        type Error = String;

        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            sections: &docfill_domain::PromptSections,
        ) -> Result<String, String> {
            self.prompts.lock().unwrap().push(sections.clone());
            Ok(r#"{"name": "x"}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_instructions_reach_every_prompt() {
        use docfill_domain::SectionKind;

        let texts = HashMap::from([
            ("a.txt".to_string(), "first".to_string()),
            ("b.txt".to_string(), "second".to_string()),
        ]);
        let config = FillConfig {
            pacing_interval_ms: 0,
            ..FillConfig::default()
        };
        let orchestrator =
            FillOrchestrator::new(MemoryLoader { texts }, RecordingEngine::default(), schema(), config)
                .unwrap()
                .with_instructions("Names are upper case.");

        let output = orchestrator
            .run(vec![
                DocumentHandle::from_path("a.txt"),
                DocumentHandle::from_path("b.txt"),
            ])
            .await;
        assert_eq!(output.successes().count(), 2);

        let prompts = orchestrator.engine.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        for prompt in prompts.iter() {
            assert_eq!(
                prompt.get(SectionKind::ExtraInstructions).unwrap().content,
                "Names are upper case."
            );
        }
    }

    #[tokio::test]
    async fn test_blank_instructions_not_sent() {
        use docfill_domain::SectionKind;

        let texts = HashMap::from([("a.txt".to_string(), "text".to_string())]);
        let orchestrator = FillOrchestrator::new(
            MemoryLoader { texts },
            RecordingEngine::default(),
            schema(),
            FillConfig::default(),
        )
        .unwrap()
        .with_instructions("   ");

        orchestrator
            .run(vec![DocumentHandle::from_path("a.txt")])
            .await;

        let prompts = orchestrator.engine.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].get(SectionKind::ExtraInstructions).is_none());
    }
}
