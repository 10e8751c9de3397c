mod form;
mod models;
pub mod protocol;
pub mod redirect;

pub use form::{normalize, FormValue, RawForm, Submission, ValidationError};
pub use models::{Comment, CommentId, RequestContext};
