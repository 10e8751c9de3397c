use super::report_outcome;
use crate::common::http::{encode_segments, json_body, send_step};
use crate::error::{PublishError, PublishStep};
use crate::traits::CommentPublisher;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use domain::protocol::{GitTarget, PublishTransaction};
use domain::Comment;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::json;

#[derive(Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
}

pub struct GitHubPublisher {
    client: Client,
    config: GitHubConfig,
    target: GitTarget,
}

impl GitHubPublisher {
    pub fn new(client: Client, config: GitHubConfig, target: GitTarget) -> Self {
        Self {
            client,
            config,
            target,
        }
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo)
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn execute(&self, txn: &PublishTransaction) -> Result<(), PublishError> {
        let repo_url = self.repo_url();

        // 1. 目标分支当前的 head
        let step = PublishStep::ResolveBase;
        let url = format!("{}/git/ref/heads/{}", repo_url, encode_segments(&txn.base_branch));
        let body = json_body(step, send_step(step, self.request(Method::GET, url)).await?).await?;
        let base_sha = body
            .pointer("/object/sha")
            .and_then(|v| v.as_str())
            .filter(|sha| !sha.is_empty())
            .ok_or(PublishError::MissingField {
                step,
                field: "object.sha",
            })?
            .to_string();
        tracing::info!("create branch {} from {}", txn.working_branch, base_sha);

        // 2. 新分支
        let request = self
            .request(Method::POST, format!("{}/git/refs", repo_url))
            .json(&json!({
                "ref": format!("refs/heads/{}", txn.working_branch),
                "sha": base_sha,
            }));
        send_step(PublishStep::CreateBranch, request).await?;

        // 3. 评论文件
        let author = json!({ "name": txn.author_name, "email": txn.author_email });
        let request = self
            .request(
                Method::PUT,
                format!("{}/contents/{}", repo_url, encode_segments(&txn.path)),
            )
            .json(&json!({
                "message": txn.commit_message,
                "content": STANDARD.encode(&txn.content),
                "branch": txn.working_branch,
                "committer": author,
                "author": author,
            }));
        send_step(PublishStep::WriteFile, request).await?;

        // 4. Pull request
        let request = self
            .request(Method::POST, format!("{}/pulls", repo_url))
            .json(&json!({
                "title": txn.title,
                "head": txn.working_branch,
                "base": txn.base_branch,
                "body": txn.description,
            }));
        send_step(PublishStep::OpenMergeRequest, request).await?;

        Ok(())
    }
}

#[async_trait]
impl CommentPublisher for GitHubPublisher {
    async fn publish(&self, comment: &Comment, page_slug: &str) -> bool {
        tracing::info!("create GitHub PR for comment {}", comment.id());
        let result = match PublishTransaction::new(comment, page_slug, &self.target) {
            Ok(txn) => self.execute(&txn).await,
            Err(e) => Err(e.into()),
        };
        report_outcome("GitHub", comment, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::test_support::{client, comment, target, COMMENT_ID};
    use mockito::{Matcher, Mock, ServerGuard};

    const REPO: &str = "/repos/acme/site";

    fn publisher(server: &ServerGuard) -> GitHubPublisher {
        GitHubPublisher::new(
            client(),
            GitHubConfig {
                api_url: server.url(),
                token: "gh-token".to_string(),
                owner: "acme".to_string(),
                repo: "site".to_string(),
            },
            target(),
        )
    }

    fn file_path() -> String {
        format!(
            "{}/contents/_data/comments/hello-world/comment_{}.json",
            REPO, COMMENT_ID
        )
    }

    async fn mock_base(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
        server
            .mock("GET", format!("{}/git/ref/heads/main", REPO).as_str())
            .match_header("authorization", "Bearer gh-token")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_publish_runs_all_four_steps() {
        let mut server = mockito::Server::new_async().await;
        let base = mock_base(&mut server, 200, r#"{"object":{"sha":"abc123"}}"#).await;
        let branch = server
            .mock("POST", format!("{}/git/refs", REPO).as_str())
            .match_body(Matcher::PartialJson(json!({
                "ref": format!("refs/heads/no-comment_{}", COMMENT_ID),
                "sha": "abc123",
            })))
            .with_status(201)
            .create_async()
            .await;
        let file = server
            .mock("PUT", file_path().as_str())
            .match_body(Matcher::PartialJson(json!({
                "message": "no-comment - comment",
                "branch": format!("no-comment_{}", COMMENT_ID),
                "committer": { "name": "no-comment", "email": "bot@example.com" },
            })))
            .with_status(201)
            .create_async()
            .await;
        let pull = server
            .mock("POST", format!("{}/pulls", REPO).as_str())
            .match_body(Matcher::PartialJson(json!({
                "title": "no-comment received a comment",
                "head": format!("no-comment_{}", COMMENT_ID),
                "base": "main",
            })))
            .with_status(201)
            .create_async()
            .await;

        assert!(publisher(&server).publish(&comment(), "hello-world").await);

        base.assert_async().await;
        branch.assert_async().await;
        file.assert_async().await;
        pull.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_base_lookup_stops_the_transaction() {
        let mut server = mockito::Server::new_async().await;
        let base = mock_base(&mut server, 404, r#"{"message":"Not Found"}"#).await;
        let rest = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        assert!(!publisher(&server).publish(&comment(), "hello-world").await);

        base.assert_async().await;
        rest.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_sha_stops_the_transaction() {
        let mut server = mockito::Server::new_async().await;
        let _base = mock_base(&mut server, 200, r#"{"object":{}}"#).await;
        let rest = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        assert!(!publisher(&server).publish(&comment(), "hello-world").await);
        rest.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_file_write_skips_pull_request() {
        let mut server = mockito::Server::new_async().await;
        let _base = mock_base(&mut server, 200, r#"{"object":{"sha":"abc123"}}"#).await;
        let _branch = server
            .mock("POST", format!("{}/git/refs", REPO).as_str())
            .with_status(201)
            .create_async()
            .await;
        let file = server
            .mock("PUT", file_path().as_str())
            .with_status(422)
            .create_async()
            .await;
        let pull = server
            .mock("POST", format!("{}/pulls", REPO).as_str())
            .expect(0)
            .create_async()
            .await;

        assert!(!publisher(&server).publish(&comment(), "hello-world").await);

        file.assert_async().await;
        pull.assert_async().await;
    }
}
