//! Naming and payload rules for publishing a comment to a content repository.

use crate::models::Comment;

pub const COMMIT_MESSAGE: &str = "no-comment - comment";
pub const MERGE_REQUEST_TITLE: &str = "no-comment received a comment";
const BRANCH_PREFIX: &str = "no-comment_";

/// Where and as whom comments are committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitTarget {
    /// Branch the merge request targets.
    pub branch: String,
    pub comment_dir: String,
    pub author_name: String,
    pub author_email: String,
}

/// Everything one publish attempt needs, derived from a single comment.
#[derive(Debug, Clone)]
pub struct PublishTransaction {
    pub working_branch: String,
    pub base_branch: String,
    pub path: String,
    pub commit_message: &'static str,
    pub author_name: String,
    pub author_email: String,
    /// Compact JSON written to `path`.
    pub content: String,
    pub title: &'static str,
    pub description: String,
}

impl PublishTransaction {
    pub fn new(
        comment: &Comment,
        page_slug: &str,
        target: &GitTarget,
    ) -> Result<Self, serde_json::Error> {
        let id = comment.id().as_str();
        let comment_dir = target.comment_dir.trim_end_matches('/');
        let pretty = serde_json::to_string_pretty(comment)?;

        Ok(Self {
            working_branch: format!("{}{}", BRANCH_PREFIX, id),
            base_branch: target.branch.clone(),
            path: format!("{}/{}/comment_{}.json", comment_dir, page_slug, id),
            commit_message: COMMIT_MESSAGE,
            author_name: target.author_name.clone(),
            author_email: target.author_email.clone(),
            content: serde_json::to_string(comment)?,
            title: MERGE_REQUEST_TITLE,
            description: format!("received JSON: \n```json\n{}\n```", pretty),
        })
    }
}
