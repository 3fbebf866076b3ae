//! The diagnostics sink.
//!
//! Compilation problems are reported, never thrown: every pass appends
//! structured records to a [`Diagnostics`] sink and the pipeline consults
//! [`Diagnostics::has_errors`] at pass boundaries. Records keep their emission
//! order; nothing is deduplicated or reordered.
//!
//! The sink also provides helpers that pre-format the canonical messages for
//! the common diagnostic kinds, so passes never hand-assemble the same
//! wording twice.

use std::fmt;

use strum_macros::Display;

use crate::span::Span;

/// Severity of a diagnostic record. Warnings never halt the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub location: Span,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.level, self.message)
    }
}

/// An append-only, ordered collection of diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    errors: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>, location: Span) {
        self.errors += 1;
        self.entries.push(Diagnostic {
            level: Level::Error,
            message: message.into(),
            location,
        });
    }

    pub fn warning(&mut self, message: impl Into<String>, location: Span) {
        self.entries.push(Diagnostic {
            level: Level::Warning,
            message: message.into(),
            location,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

// Canonical messages. Every diagnostic kind from the taxonomy that is emitted
// from more than one place gets a helper here; one-off messages are formatted
// at the call site.
impl Diagnostics {
    pub fn unexpected_token(&mut self, found: &str, location: Span) {
        self.error(format!("unexpected {found}"), location);
    }

    pub fn unexpected_end_of_input(&mut self, location: Span) {
        self.error("unexpected end of input", location);
    }

    pub fn invalid_message_name(&mut self, found: &str, location: Span) {
        self.error(format!("{found} is not a valid message name"), location);
    }

    pub fn invalid_import_path(&mut self, location: Span) {
        self.error("this import path is invalid", location);
    }

    pub fn malformed_number(&mut self, lexeme: &str, location: Span) {
        self.error(format!("{lexeme} is not a valid number"), location);
    }

    pub fn module_not_found(&mut self, name: &str, location: Span) {
        self.error(format!("the module {name:?} could not be found"), location);
    }

    pub fn undefined_local(&mut self, name: &str, location: Span) {
        self.error(
            format!("the local variable {name:?} is undefined"),
            location,
        );
    }

    pub fn undefined_attribute(&mut self, name: &str, location: Span) {
        self.error(format!("the attribute {name:?} is undefined"), location);
    }

    pub fn undefined_constant(&mut self, name: &str, location: Span) {
        self.error(format!("the constant {name:?} is undefined"), location);
    }

    pub fn undefined_method(&mut self, name: &str, type_name: &str, location: Span) {
        self.error(
            format!("the type {type_name} does not respond to the message {name:?}"),
            location,
        );
    }

    pub fn redefine_local(&mut self, name: &str, location: Span) {
        self.error(
            format!("the local variable {name:?} has already been defined"),
            location,
        );
    }

    pub fn redefine_attribute(&mut self, name: &str, location: Span) {
        self.error(
            format!("the attribute {name:?} has already been defined"),
            location,
        );
    }

    pub fn redefine_constant(&mut self, name: &str, location: Span) {
        self.error(
            format!("the constant {name:?} has already been defined"),
            location,
        );
    }

    pub fn redefine_reserved_constant(&mut self, name: &str, location: Span) {
        self.error(
            format!("the reserved constant {name:?} cannot be redefined"),
            location,
        );
    }

    pub fn reassign_immutable_local(&mut self, name: &str, location: Span) {
        self.error(
            format!("cannot reassign the immutable local variable {name:?}"),
            location,
        );
    }

    pub fn reassign_undefined_local(&mut self, name: &str, location: Span) {
        self.error(
            format!("cannot reassign the undefined local variable {name:?}"),
            location,
        );
    }

    pub fn reassign_undefined_attribute(&mut self, name: &str, location: Span) {
        self.error(
            format!("cannot reassign the undefined attribute {name:?}"),
            location,
        );
    }

    pub fn type_mismatch(&mut self, expected: &str, found: &str, location: Span) {
        self.error(
            format!("expected a value of type {expected}, found {found}"),
            location,
        );
    }

    pub fn return_type_mismatch(&mut self, expected: &str, found: &str, location: Span) {
        self.error(
            format!("expected a value of type {expected} to be returned, found {found}"),
            location,
        );
    }

    pub fn throw_type_mismatch(&mut self, expected: &str, found: &str, location: Span) {
        self.error(
            format!("expected a value of type {expected} to be thrown, found {found}"),
            location,
        );
    }

    pub fn generic_arity_mismatch(
        &mut self,
        type_name: &str,
        expected: usize,
        found: usize,
        location: Span,
    ) {
        self.error(
            format!(
                "the type {type_name} takes {expected} type parameters, but {found} were given"
            ),
            location,
        );
    }

    pub fn argument_count(
        &mut self,
        given: usize,
        minimum: usize,
        maximum: Option<usize>,
        location: Span,
    ) {
        let range = match maximum {
            Some(maximum) if maximum == minimum => format!("{minimum}"),
            Some(maximum) => format!("{minimum}..{maximum}"),
            None => format!("{minimum}.."),
        };

        self.error(
            format!("incorrect number of arguments: expected {range}, found {given}"),
            location,
        );
    }

    pub fn unknown_keyword_argument(&mut self, name: &str, location: Span) {
        self.error(format!("the keyword argument {name:?} is unknown"), location);
    }

    pub fn trait_not_implemented(&mut self, trait_name: &str, type_name: &str, location: Span) {
        self.error(
            format!("the type {type_name} does not implement the trait {trait_name}"),
            location,
        );
    }

    pub fn required_method_not_implemented(&mut self, name: &str, location: Span) {
        self.error(
            format!("the required method {name:?} is not implemented"),
            location,
        );
    }

    pub fn required_traits_not_implemented(
        &mut self,
        trait_name: &str,
        required: &str,
        location: Span,
    ) {
        self.error(
            format!(
                "the trait {trait_name} requires the trait {required} to be implemented first"
            ),
            location,
        );
    }

    pub fn throw_at_top_level(&mut self, location: Span) {
        self.error("throw can not be used at the top level of a module", location);
    }

    pub fn throw_without_throw_type(&mut self, location: Span) {
        self.error(
            "throw can only be used in a block that declares a type to throw",
            location,
        );
    }

    pub fn missing_try(&mut self, name: &str, location: Span) {
        self.error(
            format!("the message {name:?} may throw and requires a try"),
            location,
        );
    }

    pub fn unused_throw_type(&mut self, location: Span) {
        self.warning(
            "a type is declared to be thrown, but nothing is ever thrown",
            location,
        );
    }

    pub fn unreachable_code(&mut self, location: Span) {
        self.warning("this code is unreachable", location);
    }

    pub fn unknown_raw_instruction(&mut self, name: &str, location: Span) {
        self.error(format!("the raw instruction {name:?} is unknown"), location);
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostics, Level};
    use crate::{file::SourceFile, span::Span};
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::start_of(SourceFile::new("test.nara", "x"))
    }

    #[test]
    fn records_preserve_emission_order() {
        let mut diagnostics = Diagnostics::new();

        diagnostics.warning("first", span());
        diagnostics.undefined_local("x", span());
        diagnostics.warning("third", span());

        let levels: Vec<Level> = diagnostics.iter().map(|entry| entry.level).collect();

        assert_eq!(levels, vec![Level::Warning, Level::Error, Level::Warning]);
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diagnostics = Diagnostics::new();

        diagnostics.unused_throw_type(span());
        diagnostics.unreachable_code(span());

        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn argument_count_ranges() {
        let mut diagnostics = Diagnostics::new();

        diagnostics.argument_count(0, 1, None, span());
        diagnostics.argument_count(4, 1, Some(3), span());
        diagnostics.argument_count(2, 1, Some(1), span());

        let messages: Vec<&str> = diagnostics
            .iter()
            .map(|entry| entry.message.as_str())
            .collect();

        assert_eq!(
            messages,
            vec![
                "incorrect number of arguments: expected 1.., found 0",
                "incorrect number of arguments: expected 1..3, found 4",
                "incorrect number of arguments: expected 1, found 2",
            ]
        );
    }
}
