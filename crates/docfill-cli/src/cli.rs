//! Command-line argument parsing.

use clap::{ArgGroup, Parser};
use docfill_extractor::OrderingPolicy;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Fills a JSON structure with data from a file or a directory of files.
The JSON structure is given as a skeleton file; extra instructions as a text file.

Example:
  docfill --dir ./data --json ./json.json --instructions ./instructions.txt";

/// Docfill - Fill a JSON structure from documents using a language model.
#[derive(Debug, Parser)]
#[command(name = "docfill")]
#[command(version, about, long_about = None, after_help = AFTER_HELP)]
#[command(group(ArgGroup::new("input").required(true).args(["dir", "file"])))]
pub struct Cli {
    /// Directory to read documents from (not recursive)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Single document to read
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Skeleton JSON file describing the structure to fill
    #[arg(short = 'j', long = "json", value_name = "FILE")]
    pub shape: PathBuf,

    /// Text file with extra instructions for the model
    #[arg(short, long, value_name = "FILE")]
    pub instructions: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Completion provider
    #[arg(long, value_enum, env = "DOCFILL_PROVIDER")]
    pub provider: Option<ProviderArg>,

    /// Model name
    #[arg(short, long, env = "DOCFILL_MODEL")]
    pub model: Option<String>,

    /// Provider base URL (OpenAI-compatible API or Ollama server)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Delay between starting successive documents, in milliseconds
    #[arg(long, value_name = "MS")]
    pub pacing_ms: Option<u64>,

    /// Time limit for each document, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Maximum number of documents processed at once
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Order of the output entries
    #[arg(long, value_enum)]
    pub ordering: Option<OrderingArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: CliFormat,

    /// Write the JSON array to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Combined JSON array (default)
    Json,
    /// Per-document status table
    Table,
    /// Summary line only
    Quiet,
}

/// Completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// OpenAI chat completions (needs an API key)
    Openai,
    /// Local Ollama server
    Ollama,
}

/// Output ordering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OrderingArg {
    /// Same order as the documents were listed
    Input,
    /// Order in which documents finished
    Arrival,
}

impl From<OrderingArg> for OrderingPolicy {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Input => OrderingPolicy::InputOrder,
            OrderingArg::Arrival => OrderingPolicy::ArrivalOrder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_directory_run() {
        let cli = Cli::try_parse_from([
            "docfill",
            "--dir",
            "./data",
            "--json",
            "./json.json",
            "--instructions",
            "./instructions.txt",
        ])
        .unwrap();

        assert_eq!(cli.dir, Some(PathBuf::from("./data")));
        assert_eq!(cli.shape, PathBuf::from("./json.json"));
        assert_eq!(cli.instructions, Some(PathBuf::from("./instructions.txt")));
        assert_eq!(cli.format, CliFormat::Json);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_dir_and_file_are_exclusive() {
        let result = Cli::try_parse_from([
            "docfill", "--dir", "a", "--file", "b.txt", "--json", "s.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["docfill", "--json", "s.json"]).is_err());
        assert!(Cli::try_parse_from(["docfill", "--file", "a.txt"]).is_err());
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "docfill",
            "--file",
            "a.pdf",
            "--json",
            "s.json",
            "--provider",
            "ollama",
            "--pacing-ms",
            "0",
            "--max-in-flight",
            "2",
            "--ordering",
            "arrival",
            "--format",
            "table",
        ])
        .unwrap();

        assert_eq!(cli.provider, Some(ProviderArg::Ollama));
        assert_eq!(cli.pacing_ms, Some(0));
        assert_eq!(cli.max_in_flight, Some(2));
        assert_eq!(
            cli.ordering.map(OrderingPolicy::from),
            Some(OrderingPolicy::ArrivalOrder)
        );
        assert_eq!(cli.format, CliFormat::Table);
    }
}
