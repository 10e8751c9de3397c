use adapter::{AkismetConfig, GitHubConfig, GitLabConfig, PublisherConfig};
use config::ConfigError;
use domain::protocol::GitTarget;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "NO_COMMENT_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub http: HttpSettings,
    pub git: GitSettings,
    pub vcs: VcsSettings,
    pub spam: SpamSettings,
    pub redirect: RedirectSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct GitSettings {
    pub author: String,
    pub email: String,
    pub branch: String,
    pub comment_dir: String,
}

#[derive(Deserialize, Clone)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VcsSettings {
    Github {
        token: String,
        owner: String,
        repo: String,
        api_url: String,
    },
    Gitlab {
        token: String,
        project_id: String,
        url: String,
    },
}

#[derive(Deserialize, Clone)]
pub struct SpamSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub blog: Option<String>,
    pub test_mode: bool,
    pub endpoint: String,
    // 可选：客户端加密邮箱时用于解密的 PKCS#8 私钥
    pub rsa_private_key: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct RedirectSettings {
    /// Comma separated. Empty disables the allow-list.
    pub allowed_domains: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(collect_env_vars(std::env::vars()))
    }

    fn load(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8787)?
            .set_default("http.timeout_secs", 10)?
            .set_default("git.branch", "main")?
            .set_default("git.comment_dir", "_data/comments")?
            .set_default("vcs.provider", "github")?
            .set_default("vcs.api_url", "https://api.github.com")?
            .set_default("vcs.url", "https://gitlab.com")?
            .set_default("spam.enabled", false)?
            .set_default("spam.test_mode", false)?
            .set_default("spam.endpoint", adapter::AKISMET_ENDPOINT)?
            .set_default("redirect.allowed_domains", "")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .map_err(|e| ConfigError::Foreign(Box::new(e)))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn git_target(&self) -> GitTarget {
        GitTarget {
            branch: self.git.branch.clone(),
            comment_dir: self.git.comment_dir.clone(),
            author_name: self.git.author.clone(),
            author_email: self.git.email.clone(),
        }
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        match &self.vcs {
            VcsSettings::Github {
                token,
                owner,
                repo,
                api_url,
            } => PublisherConfig::GitHub(GitHubConfig {
                api_url: api_url.clone(),
                token: token.clone(),
                owner: owner.clone(),
                repo: repo.clone(),
            }),
            VcsSettings::Gitlab {
                token,
                project_id,
                url,
            } => PublisherConfig::GitLab(GitLabConfig {
                url: url.clone(),
                token: token.clone(),
                project_id: project_id.clone(),
            }),
        }
    }

    pub fn akismet_config(&self) -> AkismetConfig {
        AkismetConfig {
            endpoint: self.spam.endpoint.clone(),
            api_key: self.spam.api_key.clone(),
            blog: self.spam.blog.clone(),
            test_mode: self.spam.test_mode,
            rsa_private_key: self.spam.rsa_private_key.clone(),
        }
    }

    pub fn allowed_domains(&self) -> Vec<String> {
        self.redirect
            .allowed_domains
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// `NO_COMMENT_VCS__PROJECT_ID=42` becomes `vcs.project_id`. Empty values are dropped.
fn collect_env_vars(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter(|(k, v)| k.starts_with(ENV_PREFIX) && !v.is_empty())
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
