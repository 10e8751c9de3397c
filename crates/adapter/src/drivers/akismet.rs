//! Akismet comment-check client.
//!
//! The API takes form-urlencoded parameters and answers with the literal
//! text `true` (spam) or `false`.

use crate::common::unmask::{EmailKey, Unmasked};
use crate::error::{ConfigurationError, SpamCheckError};
use crate::traits::SpamCheck;
use async_trait::async_trait;
use domain::{Comment, RequestContext};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://rest.akismet.com/1.1/comment-check";

#[derive(Clone, Default)]
pub struct AkismetConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// The protected site, sent as `blog`.
    pub blog: Option<String>,
    pub test_mode: bool,
    pub rsa_private_key: Option<String>,
}

pub struct AkismetClassifier {
    client: Client,
    endpoint: String,
    api_key: String,
    blog: String,
    test_mode: bool,
    email_key: Option<EmailKey>,
}

impl AkismetClassifier {
    /// Fails when a credential is absent or the private key cannot be parsed.
    pub fn new(client: Client, config: AkismetConfig) -> Result<Self, ConfigurationError> {
        let api_key = non_empty(config.api_key).ok_or(ConfigurationError::Missing("spam.api_key"))?;
        let blog = non_empty(config.blog).ok_or(ConfigurationError::Missing("spam.blog"))?;
        let email_key = non_empty(config.rsa_private_key)
            .map(|pem| EmailKey::from_pem(&pem))
            .transpose()?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key,
            blog,
            test_mode: config.test_mode,
            email_key,
        })
    }

    fn email_for_check(&self, comment: &Comment) -> String {
        let Some(key) = &self.email_key else {
            return comment.email().to_string();
        };
        match key.unmask(comment.email()) {
            Unmasked::Unmasked(email) => {
                debug!("Email decrypted for spam check of comment {}", comment.id());
                email
            }
            Unmasked::Unchanged { value, reason } => {
                if let Some(e) = reason {
                    warn!("Could not decrypt email of comment {}, using as-is: {}", comment.id(), e);
                }
                value
            }
        }
    }

    /// Every value is percent-encoded exactly once.
    fn request_body(&self, ctx: &RequestContext, comment: &Comment, email: &str) -> String {
        let is_test = if self.test_mode { "true" } else { "false" };
        let params = [
            ("api_key", self.api_key.as_str()),
            ("blog", self.blog.as_str()),
            ("user_ip", ctx.user_ip.as_str()),
            ("user_agent", ctx.user_agent.as_str()),
            ("referrer", ctx.referrer.as_str()),
            ("comment_type", "comment"),
            ("is_test", is_test),
            ("comment_author", comment.name()),
            ("comment_author_email", email),
            ("comment_content", comment.message()),
        ];

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    async fn check(&self, body: String) -> Result<bool, SpamCheckError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpamCheckError::Status(status));
        }

        let text = response.text().await?;
        match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(SpamCheckError::UnexpectedBody(text)),
        }
    }
}

#[async_trait]
impl SpamCheck for AkismetClassifier {
    async fn classify(&self, ctx: &RequestContext, comment: &Comment) -> bool {
        let email = self.email_for_check(comment);
        let body = self.request_body(ctx, comment, &email);

        match self.check(body).await {
            Ok(spam) => {
                info!(comment_id = %comment.id(), "akismet result: spam={}", spam);
                spam
            }
            Err(e) => {
                // 宁可放过，不可错杀
                error!(
                    comment_id = %comment.id(),
                    "Error checking comment, flagging HAM to avoid losing comments: {}",
                    e
                );
                false
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
