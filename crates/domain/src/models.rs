use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new_unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 访客提交的一条评论。构造后不可变，序列化格式即仓库中保存的 JSON 文件格式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    id: CommentId,
    name: String,
    // 可能是明文，也可能是客户端加密后的 base64
    email: String,
    message: String,
    #[serde(rename = "date")]
    submitted_at: i64,
}

impl Comment {
    pub fn new(
        id: CommentId,
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
        submitted_at: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            message: message.into(),
            submitted_at,
        }
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn submitted_at(&self) -> i64 {
        self.submitted_at
    }
}

/// Metadata about the inbound HTTP request, forwarded to the spam classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_agent: String,
    pub user_ip: String,
    pub referrer: String,
}

impl RequestContext {
    /// Sent as `user_ip` when no client address could be determined.
    pub const UNKNOWN_IP: &'static str = "error";
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            user_ip: Self::UNKNOWN_IP.to_string(),
            referrer: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_wire_format() {
        let comment = Comment::new(
            CommentId::new_unchecked("abc"),
            "Jane",
            "jane@example.com",
            "hello",
            1_700_000_000,
        );
        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "_id": "abc",
                "name": "Jane",
                "email": "jane@example.com",
                "message": "hello",
                "date": 1_700_000_000
            })
        );

        let back: Comment = serde_json::from_value(value).unwrap();
        assert_eq!(back, comment);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = CommentId::generate();
        let b = CommentId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
    }
}
