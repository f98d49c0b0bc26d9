mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::Document;
pub use validator::ValidateOptions;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Document {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_document(self)
    }
}

pub fn validate_document(doc: &Document) -> Result<(), ValidationError> {
    validate_document_with(doc, &ValidateOptions::default())
}

pub fn validate_document_with(doc: &Document, options: &ValidateOptions) -> Result<(), ValidationError> {
    let mut v = Validator::new(options);
    v.validate_document(doc);
    v.finish()
}
