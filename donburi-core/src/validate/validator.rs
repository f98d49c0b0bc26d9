use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, Violation};
use crate::types::Document;

use super::rules;

pub(crate) static VAR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid"));

/// Knobs for document validation.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// When set, action keys outside this set are reported.
    pub known_actions: Option<BTreeSet<String>>,
    /// Also report constructs that run but are likely mistakes.
    pub strict: bool,
}

impl ValidateOptions {
    pub fn with_known_actions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_actions: Some(names.into_iter().map(Into::into).collect()),
            strict: false,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

pub struct Validator<'o> {
    violations: Vec<Violation>,
    pub(crate) options: &'o ValidateOptions,
}

impl<'o> Validator<'o> {
    pub fn new(options: &'o ValidateOptions) -> Self {
        Self {
            violations: Vec::new(),
            options,
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_document(&mut self, doc: &Document) {
        rules::document::validate_document(self, doc);
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    pub(crate) fn is_known_action(&self, name: &str) -> bool {
        self.options
            .known_actions
            .as_ref()
            .map_or(true, |known| known.contains(name))
    }
}
