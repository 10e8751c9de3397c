use adapter::{CommentPublisher, SpamCheck};
use domain::{redirect, RequestContext, Submission};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Terminal state of one submission after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Published; redirect the visitor here.
    Redirected(String),
    /// Classified as spam; nothing was published.
    Rejected { message: String },
    Failed,
}

/// Spam gate, publish, redirect.
pub struct Pipeline {
    spam: Option<Arc<dyn SpamCheck>>,
    publisher: Arc<dyn CommentPublisher>,
    allowed_domains: Vec<String>,
}

impl Pipeline {
    pub fn new(
        spam: Option<Arc<dyn SpamCheck>>,
        publisher: Arc<dyn CommentPublisher>,
        allowed_domains: Vec<String>,
    ) -> Self {
        Self {
            spam,
            publisher,
            allowed_domains,
        }
    }

    pub async fn run(&self, submission: Submission, ctx: &RequestContext) -> Outcome {
        let Submission {
            comment,
            page_slug,
            redirect: redirect_to,
        } = submission;

        match &self.spam {
            Some(spam) => {
                if spam.classify(ctx, &comment).await {
                    warn!(comment_id = %comment.id(), "comment rejected as spam");
                    return Outcome::Rejected {
                        message: comment.message().to_string(),
                    };
                }
            }
            None => debug!("spam check not configured, consider enabling it"),
        }

        if !self.publisher.publish(&comment, &page_slug).await {
            return Outcome::Failed;
        }

        let target = redirect::sanitize(&redirect_to, Some(self.allowed_domains.as_slice()));
        info!(comment_id = %comment.id(), "comment published, redirecting to {}", target);
        Outcome::Redirected(target)
    }
}
