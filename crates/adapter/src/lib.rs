mod common;
mod drivers;
mod error;
mod traits;

pub use common::http::{build_client, USER_AGENT};
pub use common::unmask::{EmailKey, UnmaskError, Unmasked};
pub use drivers::akismet::{AkismetClassifier, AkismetConfig, DEFAULT_ENDPOINT as AKISMET_ENDPOINT};
pub use drivers::github::{GitHubConfig, GitHubPublisher};
pub use drivers::gitlab::{GitLabConfig, GitLabPublisher};
pub use error::{ConfigurationError, PublishError, PublishStep, SpamCheckError};
pub use traits::{CommentPublisher, SpamCheck};

use domain::protocol::GitTarget;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub enum PublisherConfig {
    GitHub(GitHubConfig),
    GitLab(GitLabConfig),
}

/// Picks the publisher backend from configuration.
pub fn build_publisher(
    config: PublisherConfig,
    target: GitTarget,
    client: Client,
) -> Arc<dyn CommentPublisher> {
    match config {
        PublisherConfig::GitHub(gh) => {
            info!("Publishing comments as GitHub pull requests to {}/{}", gh.owner, gh.repo);
            Arc::new(GitHubPublisher::new(client, gh, target))
        }
        PublisherConfig::GitLab(gl) => {
            info!("Publishing comments as GitLab merge requests to project {}", gl.project_id);
            Arc::new(GitLabPublisher::new(client, gl, target))
        }
    }
}
