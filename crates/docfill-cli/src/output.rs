//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use docfill_extractor::{AggregateOutput, FillOutcome};
use std::fs;
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the run output for stdout.
    pub fn format_output(&self, output: &AggregateOutput) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(output.to_json_string()?),
            CliFormat::Table => Ok(self.format_table(output)),
            CliFormat::Quiet => Ok(self.summary(output)),
        }
    }

    /// Format the run as a per-document status table.
    fn format_table(&self, output: &AggregateOutput) -> String {
        if output.is_empty() {
            return self.colorize("No documents processed.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Document", "Kind", "Status", "Detail", "Time (ms)"]);

        for result in output {
            let (status, detail) = match &result.outcome {
                FillOutcome::Success(record) => {
                    ("ok".to_string(), format!("{} field(s)", record.fields.len()))
                }
                FillOutcome::Failure(failure) => {
                    (failure.kind.to_string(), failure.message.clone())
                }
            };
            builder.push_record([
                result.document.name().to_string(),
                result.document.kind().to_string(),
                status,
                detail,
                result.elapsed_ms.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("{}\n{}", table, self.summary(output))
    }

    /// One-line summary of the run.
    pub fn summary(&self, output: &AggregateOutput) -> String {
        let metadata = output.metadata();
        let message = format!(
            "{} document(s): {} filled, {} failed in {} ms ({})",
            metadata.documents,
            metadata.succeeded,
            metadata.failed,
            metadata.duration_ms,
            metadata.model_name
        );

        if metadata.failed == 0 {
            self.success(&message)
        } else {
            self.warning(&message)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Write the combined JSON array to a file.
pub fn write_json(output: &AggregateOutput, path: &Path) -> Result<()> {
    let mut contents = output.to_json_string()?;
    contents.push('\n');
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_domain::DocumentHandle;
    use docfill_extractor::{FieldType, FillConfig, FillOrchestrator, SchemaDeriver, TargetShape};
    use docfill_llm::MockEngine;
    use docfill_source::FileSystemSource;

    async fn run_output(documents: Vec<DocumentHandle>) -> AggregateOutput {
        let schema =
            SchemaDeriver::derive(&TargetShape::new().field("name", FieldType::String)).unwrap();
        let orchestrator = FillOrchestrator::new(
            FileSystemSource::new(),
            MockEngine::new(r#"{"name":"A"}"#),
            schema,
            FillConfig::default(),
        )
        .unwrap();
        orchestrator.run(documents).await
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(CliFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
        assert_eq!(formatter.colorize("plain", "green"), "plain");
    }

    #[test]
    fn test_colorize_enabled() {
        colored::control::set_override(true);
        let formatter = Formatter::new(CliFormat::Table, true);
        let green = formatter.colorize("ok", "green");
        assert!(green.contains("ok"));
        assert_ne!(green, "ok");
        assert_eq!(formatter.colorize("ok", "purple"), "ok");
        colored::control::unset_override();
    }

    #[tokio::test]
    async fn test_summary_of_clean_run() {
        let output = run_output(Vec::new()).await;
        let summary = Formatter::new(CliFormat::Quiet, false).summary(&output);
        assert!(summary.starts_with("✓ 0 document(s): 0 filled, 0 failed"));
        assert!(summary.ends_with("(mock)"), "{summary}");
    }

    #[tokio::test]
    async fn test_summary_warns_on_failures() {
        let dir = tempfile::tempdir().unwrap();
        let missing = DocumentHandle::from_path(dir.path().join("missing.txt"));
        let output = run_output(vec![missing]).await;

        let formatter = Formatter::new(CliFormat::Quiet, false);
        let summary = formatter.summary(&output);
        assert!(summary.starts_with("⚠ 1 document(s): 0 filled, 1 failed"));
        assert_eq!(formatter.format_output(&output).unwrap(), summary);
    }

    #[tokio::test]
    async fn test_table_of_empty_run() {
        let output = run_output(Vec::new()).await;
        let table = Formatter::new(CliFormat::Table, false)
            .format_output(&output)
            .unwrap();
        assert_eq!(table, "No documents processed.");
    }
}
