pub mod akismet;
pub mod github;
pub mod gitlab;

use crate::error::PublishError;
use domain::Comment;
use tracing::{error, info};

/// Logs the outcome of a publish attempt and collapses it to a boolean.
fn report_outcome(provider: &str, comment: &Comment, result: Result<(), PublishError>) -> bool {
    match result {
        Ok(()) => {
            info!("{}: opened merge request for comment {}", provider, comment.id());
            true
        }
        Err(e) => {
            let step = e
                .step()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "prepare".to_string());
            error!(
                comment_id = %comment.id(),
                step = %step,
                "{}: publish failed: {}",
                provider,
                e
            );
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use domain::protocol::GitTarget;
    use domain::{Comment, CommentId};

    pub const COMMENT_ID: &str = "7f3c2a10-0000-4000-8000-000000000001";

    pub fn comment() -> Comment {
        Comment::new(
            CommentId::new_unchecked(COMMENT_ID),
            "Jane",
            "jane@example.com",
            "Nice post",
            1_700_000_000,
        )
    }

    pub fn target() -> GitTarget {
        GitTarget {
            branch: "main".to_string(),
            comment_dir: "_data/comments".to_string(),
            author_name: "no-comment".to_string(),
            author_email: "bot@example.com".to_string(),
        }
    }

    pub fn client() -> reqwest::Client {
        crate::common::http::build_client(std::time::Duration::from_secs(5)).unwrap()
    }
}
