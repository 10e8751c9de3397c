use super::report_outcome;
use crate::common::http::{json_body, send_step};
use crate::error::{PublishError, PublishStep};
use crate::traits::CommentPublisher;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use domain::protocol::{GitTarget, PublishTransaction};
use domain::Comment;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::json;

#[derive(Clone)]
pub struct GitLabConfig {
    /// Instance root, e.g. `https://gitlab.com`. `/api/v4` is appended.
    pub url: String,
    pub token: String,
    /// Numeric id or `group/project` path.
    pub project_id: String,
}

pub struct GitLabPublisher {
    client: Client,
    config: GitLabConfig,
    target: GitTarget,
}

impl GitLabPublisher {
    pub fn new(client: Client, config: GitLabConfig, target: GitTarget) -> Self {
        Self {
            client,
            config,
            target,
        }
    }

    fn project_url(&self) -> String {
        format!(
            "{}/api/v4/projects/{}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.project_id)
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.config.token)
    }

    async fn execute(&self, txn: &PublishTransaction) -> Result<(), PublishError> {
        let project_url = self.project_url();

        let step = PublishStep::ResolveBase;
        let url = format!(
            "{}/repository/branches/{}",
            project_url,
            urlencoding::encode(&txn.base_branch)
        );
        let body = json_body(step, send_step(step, self.request(Method::GET, url)).await?).await?;
        let base_sha = body
            .pointer("/commit/id")
            .and_then(|v| v.as_str())
            .filter(|sha| !sha.is_empty())
            .ok_or(PublishError::MissingField {
                step,
                field: "commit.id",
            })?
            .to_string();
        tracing::info!("create branch {} from {}", txn.working_branch, base_sha);

        // 以第一步拿到的 SHA 为起点，而不是分支名
        let request = self
            .request(Method::POST, format!("{}/repository/branches", project_url))
            .json(&json!({
                "branch": txn.working_branch,
                "ref": base_sha,
            }));
        send_step(PublishStep::CreateBranch, request).await?;

        let request = self
            .request(
                Method::POST,
                format!(
                    "{}/repository/files/{}",
                    project_url,
                    urlencoding::encode(&txn.path)
                ),
            )
            .json(&json!({
                "branch": txn.working_branch,
                "content": STANDARD.encode(&txn.content),
                "encoding": "base64",
                "commit_message": txn.commit_message,
                "author_name": txn.author_name,
                "author_email": txn.author_email,
            }));
        send_step(PublishStep::WriteFile, request).await?;

        let request = self
            .request(Method::POST, format!("{}/merge_requests", project_url))
            .json(&json!({
                "source_branch": txn.working_branch,
                "target_branch": txn.base_branch,
                "title": txn.title,
                "description": txn.description,
            }));
        send_step(PublishStep::OpenMergeRequest, request).await?;

        Ok(())
    }
}

#[async_trait]
impl CommentPublisher for GitLabPublisher {
    async fn publish(&self, comment: &Comment, page_slug: &str) -> bool {
        tracing::info!("create GitLab MR for comment {}", comment.id());
        let result = match PublishTransaction::new(comment, page_slug, &self.target) {
            Ok(txn) => self.execute(&txn).await,
            Err(e) => Err(e.into()),
        };
        report_outcome("GitLab", comment, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::test_support::{client, comment, target, COMMENT_ID};
    use mockito::{Matcher, Mock, ServerGuard};

    const PROJECT: &str = "/api/v4/projects/42";

    fn publisher(url: String) -> GitLabPublisher {
        GitLabPublisher::new(
            client(),
            GitLabConfig {
                url,
                token: "gl-token".to_string(),
                project_id: "42".to_string(),
            },
            target(),
        )
    }

    async fn mock_base(server: &mut ServerGuard) -> Mock {
        server
            .mock("GET", format!("{}/repository/branches/main", PROJECT).as_str())
            .match_header("private-token", "gl-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"main","commit":{"id":"def456"}}"#)
            .create_async()
            .await
    }

    async fn mock_branch(server: &mut ServerGuard) -> Mock {
        server
            .mock("POST", format!("{}/repository/branches", PROJECT).as_str())
            .match_body(Matcher::PartialJson(json!({
                "branch": format!("no-comment_{}", COMMENT_ID),
                "ref": "def456",
            })))
            .with_status(201)
            .create_async()
            .await
    }

    fn files_path() -> Matcher {
        Matcher::Regex(format!(r"^{}/repository/files/.+$", PROJECT))
    }

    #[tokio::test]
    async fn test_publish_runs_all_four_steps() {
        let mut server = mockito::Server::new_async().await;
        let base = mock_base(&mut server).await;
        let branch = mock_branch(&mut server).await;
        let file = server
            .mock("POST", files_path())
            .match_header("private-token", "gl-token")
            .match_body(Matcher::PartialJson(json!({
                "encoding": "base64",
                "commit_message": "no-comment - comment",
                "author_name": "no-comment",
                "author_email": "bot@example.com",
            })))
            .with_status(201)
            .create_async()
            .await;
        let mr = server
            .mock("POST", format!("{}/merge_requests", PROJECT).as_str())
            .match_body(Matcher::PartialJson(json!({
                "source_branch": format!("no-comment_{}", COMMENT_ID),
                "target_branch": "main",
                "title": "no-comment received a comment",
            })))
            .with_status(201)
            .create_async()
            .await;

        // trailing slash on the instance URL must not double up
        let url = format!("{}/", server.url());
        assert!(publisher(url).publish(&comment(), "hello-world").await);

        base.assert_async().await;
        branch.assert_async().await;
        file.assert_async().await;
        mr.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_base_lookup_makes_no_further_calls() {
        let mut server = mockito::Server::new_async().await;
        let base = server
            .mock("GET", format!("{}/repository/branches/main", PROJECT).as_str())
            .with_status(401)
            .create_async()
            .await;
        let writes = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        assert!(!publisher(server.url()).publish(&comment(), "hello-world").await);

        base.assert_async().await;
        writes.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_commit_id_stops_the_transaction() {
        let mut server = mockito::Server::new_async().await;
        let base = server
            .mock("GET", format!("{}/repository/branches/main", PROJECT).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"main","commit":{}}"#)
            .create_async()
            .await;
        let writes = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        assert!(!publisher(server.url()).publish(&comment(), "hello-world").await);

        base.assert_async().await;
        writes.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_file_write_skips_merge_request() {
        let mut server = mockito::Server::new_async().await;
        let _base = mock_base(&mut server).await;
        let branch = mock_branch(&mut server).await;
        let file = server
            .mock("POST", files_path())
            .with_status(400)
            .with_body(r#"{"message":"A file with this name already exists"}"#)
            .create_async()
            .await;
        let mr = server
            .mock("POST", format!("{}/merge_requests", PROJECT).as_str())
            .expect(0)
            .create_async()
            .await;

        assert!(!publisher(server.url()).publish(&comment(), "hello-world").await);

        branch.assert_async().await;
        file.assert_async().await;
        mr.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let publisher = publisher("http://127.0.0.1:1".to_string());
        assert!(!publisher.publish(&comment(), "hello-world").await);
    }
}
