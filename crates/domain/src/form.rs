use crate::models::{Comment, CommentId};
use std::collections::HashMap;
use thiserror::Error;

pub const FIELD_NAME: &str = "fields[name]";
pub const FIELD_EMAIL: &str = "fields[email]";
pub const FIELD_MESSAGE: &str = "fields[message]";
pub const OPTION_SLUG: &str = "options[slug]";
pub const OPTION_REDIRECT: &str = "options[redirect]";

const UPLOAD_PLACEHOLDER: &str = "uploaded file removed";
const MISSING_PLACEHOLDER: &str = "missing";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("invalid {0}: file uploads are not accepted")]
    InvalidField(&'static str),
    #[error("malformed form data")]
    MalformedForm,
}

/// A single multipart form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    Upload,
}

/// Raw form fields as received. A name that never appeared is absent.
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    fields: HashMap<String, FormValue>,
}

impl RawForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first value seen for a name, like `FormData.get`.
    pub fn insert(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.entry(name.into()).or_insert(value);
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, FormValue::Text(value.into()));
        self
    }

    pub fn upload(mut self, name: &str) -> Self {
        self.insert(name, FormValue::Upload);
        self
    }

    fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.get(name)
    }
}

/// A normalized comment plus the two hidden fields the pipeline needs.
#[derive(Debug, Clone)]
pub struct Submission {
    pub comment: Comment,
    pub page_slug: String,
    pub redirect: String,
}

/// Turns raw form fields into a `Submission`.
///
/// Hidden fields are checked before anything else so a bad request never
/// produces a partial comment.
pub fn normalize(form: &RawForm) -> Result<Submission, ValidationError> {
    let page_slug = hidden_field(OPTION_SLUG, form.get(OPTION_SLUG))?;
    let redirect = hidden_field(OPTION_REDIRECT, form.get(OPTION_REDIRECT))?;

    let comment = Comment::new(
        CommentId::generate(),
        sanitize(visible_field(form.get(FIELD_NAME))),
        sanitize(visible_field(form.get(FIELD_EMAIL))),
        sanitize(visible_field(form.get(FIELD_MESSAGE))),
        chrono::Utc::now().timestamp(),
    );

    tracing::debug!("Normalized comment {} for page {}", comment.id(), page_slug);

    Ok(Submission {
        comment,
        page_slug,
        redirect,
    })
}

fn visible_field(value: Option<&FormValue>) -> &str {
    match value {
        Some(FormValue::Text(text)) => text.as_str(),
        Some(FormValue::Upload) => UPLOAD_PLACEHOLDER,
        None => MISSING_PLACEHOLDER,
    }
}

fn hidden_field(name: &'static str, value: Option<&FormValue>) -> Result<String, ValidationError> {
    match value {
        Some(FormValue::Text(text)) => Ok(text.clone()),
        Some(FormValue::Upload) => Err(ValidationError::InvalidField(name)),
        None => Err(ValidationError::MissingField(name)),
    }
}

fn sanitize(text: &str) -> String {
    ammonia::clean(text)
}
