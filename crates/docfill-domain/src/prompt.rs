//! Prompt module - the ordered sections sent to a completion engine

use std::fmt;

/// Message role understood by chat-style completion engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Instructions and context supplied by the pipeline
    System,

    /// End-user content
    User,
}

impl Role {
    /// Get the role name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a prompt section holds
///
/// The variants are listed in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Fixed instruction establishing the engine's role
    SystemInstruction,

    /// Caller-supplied extra instructions
    ExtraInstructions,

    /// Tag introducing the schema
    SchemaLabel,

    /// The serialized schema document
    Schema,

    /// Tag introducing the document text
    DataLabel,

    /// The document's extracted text
    Data,

    /// Tag marking where the filled structure is expected
    OutputLabel,
}

/// One labeled message of a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    /// Message role
    pub role: Role,

    /// What this section holds
    pub kind: SectionKind,

    /// Message text
    pub content: String,
}

impl PromptSection {
    /// Create a system-role section
    pub fn system(kind: SectionKind, content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            kind,
            content: content.into(),
        }
    }
}

/// The complete, ordered prompt for one document
///
/// Built once per document and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSections {
    sections: Vec<PromptSection>,
}

impl PromptSections {
    /// Wrap an ordered list of sections
    pub fn new(sections: Vec<PromptSection>) -> Self {
        Self { sections }
    }

    /// Iterate over the sections in order
    pub fn iter(&self) -> std::slice::Iter<'_, PromptSection> {
        self.sections.iter()
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether there are no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The section kinds, in order
    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }

    /// First section of the given kind
    pub fn get(&self, kind: SectionKind) -> Option<&PromptSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Index of the first section of the given kind
    pub fn position(&self, kind: SectionKind) -> Option<usize> {
        self.sections.iter().position(|s| s.kind == kind)
    }

    /// Flatten all sections into a single prompt string
    ///
    /// Used by engines that accept one prompt instead of a message list.
    /// Sections are separated by a blank line.
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl<'a> IntoIterator for &'a PromptSections {
    type Item = &'a PromptSection;
    type IntoIter = std::slice::Iter<'a, PromptSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PromptSections {
        PromptSections::new(vec![
            PromptSection::system(SectionKind::SystemInstruction, "be a parser"),
            PromptSection::system(SectionKind::SchemaLabel, "[schema]"),
            PromptSection::system(SectionKind::Schema, "{}"),
            PromptSection::system(SectionKind::DataLabel, "[data]"),
            PromptSection::system(SectionKind::Data, "hello"),
            PromptSection::system(SectionKind::OutputLabel, "[out]"),
        ])
    }

    #[test]
    fn test_lookup_by_kind() {
        let sections = sample();
        assert_eq!(sections.len(), 6);
        assert_eq!(sections.get(SectionKind::Data).unwrap().content, "hello");
        assert_eq!(sections.position(SectionKind::Schema), Some(2));
        assert!(sections.get(SectionKind::ExtraInstructions).is_none());
    }

    #[test]
    fn test_render_joins_in_order() {
        let rendered = sample().render();
        assert_eq!(rendered, "be a parser\n\n[schema]\n\n{}\n\n[data]\n\nhello\n\n[out]");
    }

    #[test]
    fn test_system_sections_use_system_role() {
        assert!(sample().iter().all(|s| s.role == Role::System));
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.to_string(), "user");
    }
}
