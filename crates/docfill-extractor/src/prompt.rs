//! Prompt assembly for schema filling
//!
//! Section order and labels are a protocol with the completion engine: the
//! engine answers the final label with a JSON object and nothing else.

use crate::schema::SchemaDocument;
use docfill_domain::{PromptSection, PromptSections, SectionKind};

/// Fixed instruction establishing the engine's role
pub const SYSTEM_PROMPT: &str = "You are a parser of unstructured text data. Your task is to \
return JSON in the format specified, where each JSON value is filled in using information \
provided in the data. If the data does not contain the information required, return an empty \
string for that value.";

/// Label preceding the schema document
pub const SCHEMA_LABEL: &str = "[JSON Structure]";

/// Label preceding the document text
pub const DATA_LABEL: &str = "[Data to fill JSON structure with]";

/// Label marking where the filled structure is expected
pub const OUTPUT_LABEL: &str = "[Filled JSON structure]";

/// Builds the prompt sections for one document
///
/// The schema and instructions are shared by every document of a run, so a
/// single builder is reused for all of them.
#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    schema: &'a SchemaDocument,
    instructions: Option<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for a schema document
    pub fn new(schema: &'a SchemaDocument) -> Self {
        Self {
            schema,
            instructions: None,
        }
    }

    /// Add extra instructions; blank text is ignored
    pub fn with_instructions(mut self, instructions: &'a str) -> Self {
        self.instructions = if instructions.trim().is_empty() {
            None
        } else {
            Some(instructions)
        };
        self
    }

    /// Build the sections for one document's text
    ///
    /// The text is passed through unmodified and may be empty.
    pub fn build(&self, document_text: &str) -> PromptSections {
        let mut sections = Vec::with_capacity(7);

        sections.push(PromptSection::system(
            SectionKind::SystemInstruction,
            SYSTEM_PROMPT,
        ));
        if let Some(instructions) = self.instructions {
            sections.push(PromptSection::system(
                SectionKind::ExtraInstructions,
                instructions,
            ));
        }
        sections.push(PromptSection::system(SectionKind::SchemaLabel, SCHEMA_LABEL));
        sections.push(PromptSection::system(
            SectionKind::Schema,
            self.schema.to_prompt_string(),
        ));
        sections.push(PromptSection::system(SectionKind::DataLabel, DATA_LABEL));
        sections.push(PromptSection::system(SectionKind::Data, document_text));
        sections.push(PromptSection::system(SectionKind::OutputLabel, OUTPUT_LABEL));

        PromptSections::new(sections)
    }
}
