//! Per-document results and the aggregate output of a run

use crate::error::ShapeError;
use docfill_domain::DocumentHandle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// Key under which a failure marker carries its error
const ERROR_KEY: &str = "error";

/// Lifecycle of one document within a run
///
/// States advance strictly in order with no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocumentState {
    /// Not yet started
    Pending,
    /// Reading the document text
    Loading,
    /// Prompting the engine and checking its answer
    Completing,
    /// Terminal, with a success or a failure
    Resolved,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentState::Pending => "pending",
            DocumentState::Loading => "loading",
            DocumentState::Completing => "completing",
            DocumentState::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// A filled record for one document
#[derive(Debug, Clone, PartialEq)]
pub struct FillRecord {
    /// Display name of the originating document
    pub document: String,
    /// Field values from the completion, in the order the engine emitted them
    pub fields: Map<String, Value>,
}

impl FillRecord {
    /// The record as a JSON object carrying the document identity
    ///
    /// The identity key overwrites any field of the same name.
    pub fn to_value(&self, identity_key: &str) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(identity_key.to_string(), Value::String(self.document.clone()));
        Value::Object(fields)
    }

    /// Decode the fields into a caller type
    ///
    /// # Examples
    ///
    /// ```
    /// use docfill_extractor::FillRecord;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Person {
    ///     name: String,
    /// }
    ///
    /// let fields = serde_json::json!({"name": "John Smith"});
    /// let record = FillRecord {
    ///     document: "john.txt".to_string(),
    ///     fields: fields.as_object().unwrap().clone(),
    /// };
    /// let person: Person = record.decode().unwrap();
    /// assert_eq!(person.name, "John Smith");
    /// ```
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ShapeError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| ShapeError::Decode(e.to_string()))
    }
}

/// Category of a per-document failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The document could not be read or extracted
    Load,
    /// The engine call failed
    Completion,
    /// The engine answered with something that does not fit the shape
    Shape,
    /// The document's pipeline exceeded its time limit
    Timeout,
    /// The document's task ended without reporting
    Aborted,
}

impl FailureKind {
    /// Stable name used in output
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Load => "load_error",
            FailureKind::Completion => "completion_error",
            FailureKind::Shape => "shape_error",
            FailureKind::Timeout => "timeout",
            FailureKind::Aborted => "aborted",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-document failure
#[derive(Debug, Clone, PartialEq)]
pub struct FillFailure {
    /// Display name of the originating document
    pub document: String,
    /// Failure category
    pub kind: FailureKind,
    /// Error message
    pub message: String,
    /// The engine's answer, kept for shape failures
    pub raw_completion: Option<String>,
}

impl FillFailure {
    /// Create a failure without a completion
    pub fn new(document: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            kind,
            message: message.into(),
            raw_completion: None,
        }
    }

    /// The failure marker emitted in place of a record
    pub fn to_value(&self, identity_key: &str) -> Value {
        let mut error = Map::new();
        error.insert("kind".to_string(), json!(self.kind.as_str()));
        error.insert("message".to_string(), json!(self.message));
        if let Some(raw) = &self.raw_completion {
            error.insert("raw".to_string(), json!(raw));
        }

        let mut marker = Map::new();
        marker.insert(identity_key.to_string(), json!(self.document));
        marker.insert(ERROR_KEY.to_string(), Value::Object(error));
        Value::Object(marker)
    }
}

/// Terminal outcome of one document
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    /// The document was filled
    Success(FillRecord),
    /// The document failed
    Failure(FillFailure),
}

/// Result of one document's fill attempt
#[derive(Debug, Clone, PartialEq)]
pub struct FillResult {
    /// Position of the document in the input enumeration
    pub index: usize,
    /// The document
    pub document: DocumentHandle,
    /// Success or failure
    pub outcome: FillOutcome,
    /// Time spent in the document's pipeline (milliseconds)
    pub elapsed_ms: u64,
}

impl FillResult {
    /// Whether the document was filled
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FillOutcome::Success(_))
    }

    /// The filled record, if any
    pub fn record(&self) -> Option<&FillRecord> {
        match &self.outcome {
            FillOutcome::Success(record) => Some(record),
            FillOutcome::Failure(_) => None,
        }
    }

    /// The failure, if any
    pub fn failure(&self) -> Option<&FillFailure> {
        match &self.outcome {
            FillOutcome::Success(_) => None,
            FillOutcome::Failure(failure) => Some(failure),
        }
    }

    /// Output entry for this result
    pub fn to_value(&self, identity_key: &str) -> Value {
        match &self.outcome {
            FillOutcome::Success(record) => record.to_value(identity_key),
            FillOutcome::Failure(failure) => failure.to_value(identity_key),
        }
    }
}

/// Metadata about a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchMetadata {
    /// Name of the completion model
    pub model_name: String,
    /// Number of input documents
    pub documents: usize,
    /// Number of filled documents
    pub succeeded: usize,
    /// Number of failed documents
    pub failed: usize,
    /// Wall time of the run (milliseconds)
    pub duration_ms: u64,
}

/// All results of a run, one per input document
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    results: Vec<FillResult>,
    identity_key: String,
    metadata: BatchMetadata,
}

impl AggregateOutput {
    pub(crate) fn new(results: Vec<FillResult>, identity_key: String, metadata: BatchMetadata) -> Self {
        Self {
            results,
            identity_key,
            metadata,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the run had no documents
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in aggregate order
    pub fn iter(&self) -> std::slice::Iter<'_, FillResult> {
        self.results.iter()
    }

    /// Results in aggregate order
    pub fn results(&self) -> &[FillResult] {
        &self.results
    }

    /// Filled records in aggregate order
    pub fn successes(&self) -> impl Iterator<Item = &FillRecord> {
        self.results.iter().filter_map(FillResult::record)
    }

    /// Failures in aggregate order
    pub fn failures(&self) -> impl Iterator<Item = &FillFailure> {
        self.results.iter().filter_map(FillResult::failure)
    }

    /// Run metadata
    pub fn metadata(&self) -> &BatchMetadata {
        &self.metadata
    }

    /// Key carrying each entry's document identity
    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    /// The combined JSON array
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.results
                .iter()
                .map(|r| r.to_value(&self.identity_key))
                .collect(),
        )
    }

    /// The combined JSON array, tab-indented
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_json().serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl<'a> IntoIterator for &'a AggregateOutput {
    type Item = &'a FillResult;
    type IntoIter = std::slice::Iter<'a, FillResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_domain::DocumentKind;
    use serde::Deserialize;

    fn record(name: &str, fields: Value) -> FillRecord {
        FillRecord {
            document: name.to_string(),
            fields: fields.as_object().unwrap().clone(),
        }
    }

    fn result(index: usize, name: &str, outcome: FillOutcome) -> FillResult {
        FillResult {
            index,
            document: DocumentHandle::new(name, DocumentKind::PlainText),
            outcome,
            elapsed_ms: 5,
        }
    }

    fn metadata(documents: usize) -> BatchMetadata {
        BatchMetadata {
            model_name: "mock".to_string(),
            documents,
            succeeded: 1,
            failed: documents - 1,
            duration_ms: 10,
        }
    }

    #[test]
    fn test_state_order() {
        assert!(DocumentState::Pending < DocumentState::Loading);
        assert!(DocumentState::Loading < DocumentState::Completing);
        assert!(DocumentState::Completing < DocumentState::Resolved);
        assert_eq!(DocumentState::Completing.to_string(), "completing");
    }

    #[test]
    fn test_record_carries_identity() {
        let rec = record("john.txt", json!({"name": "John Smith", "age": 30}));
        assert_eq!(
            rec.to_value("filename"),
            json!({"name": "John Smith", "age": 30, "filename": "john.txt"})
        );
    }

    #[test]
    fn test_identity_overwrites_field() {
        let rec = record("a.txt", json!({"source": "engine said"}));
        assert_eq!(rec.to_value("source"), json!({"source": "a.txt"}));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_decode() {
        let rec = record("john.txt", json!({"name": "John Smith", "age": 30}));
        let person: Person = rec.decode().unwrap();
        assert_eq!(
            person,
            Person {
                name: "John Smith".to_string(),
                age: 30
            }
        );

        let rec = record("john.txt", json!({"name": "John Smith", "age": ""}));
        assert!(matches!(rec.decode::<Person>(), Err(ShapeError::Decode(_))));
    }

    #[test]
    fn test_failure_marker() {
        let mut failure = FillFailure::new("bad.txt", FailureKind::Shape, "Completion is not a JSON object");
        failure.raw_completion = Some("[]".to_string());

        assert_eq!(
            failure.to_value("filename"),
            json!({
                "filename": "bad.txt",
                "error": {
                    "kind": "shape_error",
                    "message": "Completion is not a JSON object",
                    "raw": "[]"
                }
            })
        );

        let failure = FillFailure::new("gone.txt", FailureKind::Load, "not found");
        assert!(failure.to_value("filename")["error"].get("raw").is_none());
    }

    #[test]
    fn test_aggregate_json() {
        let output = AggregateOutput::new(
            vec![
                result(0, "a.txt", FillOutcome::Success(record("a.txt", json!({"name": "A"})))),
                result(
                    1,
                    "b.txt",
                    FillOutcome::Failure(FillFailure::new("b.txt", FailureKind::Timeout, "timed out")),
                ),
            ],
            "filename".to_string(),
            metadata(2),
        );

        assert_eq!(output.len(), 2);
        assert_eq!(output.successes().count(), 1);
        assert_eq!(output.failures().count(), 1);
        assert_eq!(
            output.to_json(),
            json!([
                {"name": "A", "filename": "a.txt"},
                {"filename": "b.txt", "error": {"kind": "timeout", "message": "timed out"}}
            ])
        );
    }

    #[test]
    fn test_tab_indented_output() {
        let output = AggregateOutput::new(
            vec![result(0, "a.txt", FillOutcome::Success(record("a.txt", json!({"name": "A"}))))],
            "filename".to_string(),
            metadata(1),
        );

        let text = output.to_json_string().unwrap();
        assert_eq!(text, "[\n\t{\n\t\t\"name\": \"A\",\n\t\t\"filename\": \"a.txt\"\n\t}\n]");
    }

    #[test]
    fn test_empty_aggregate() {
        let output = AggregateOutput::new(
            Vec::new(),
            "filename".to_string(),
            BatchMetadata {
                model_name: "mock".to_string(),
                documents: 0,
                succeeded: 0,
                failed: 0,
                duration_ms: 0,
            },
        );
        assert!(output.is_empty());
        assert_eq!(output.to_json_string().unwrap(), "[]");
    }
}
