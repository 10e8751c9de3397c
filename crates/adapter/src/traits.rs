use async_trait::async_trait;
use domain::{Comment, RequestContext};

/// Publishes a comment to a content repository as a merge/pull request.
///
/// Returns `true` only when every step of the transaction succeeded. Failures
/// are logged by the implementation; nothing already created is rolled back.
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    async fn publish(&self, comment: &Comment, page_slug: &str) -> bool;
}

/// Spam verdict for one comment. Implementations fail open.
#[async_trait]
pub trait SpamCheck: Send + Sync {
    async fn classify(&self, ctx: &RequestContext, comment: &Comment) -> bool;
}
