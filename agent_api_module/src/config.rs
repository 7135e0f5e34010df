use std::env;

use crate::errors::ClientError;

pub const DEFAULT_AGENT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentApiConfig {
    pub base_url: String,
}

impl AgentApiConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "AGENT_API_BASE_URL must be an http(s) url, got '{}'",
                base_url
            )));
        }
        Ok(Self {
            base_url: trimmed.to_string(),
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        let base_url = env::var("AGENT_API_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_AGENT_API_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var(key).ok();
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn new_trims_trailing_slashes() {
        let config = AgentApiConfig::new("http://agent.local:8000//").expect("config");
        assert_eq!(config.base_url, "http://agent.local:8000");
        assert_eq!(
            config.url("/api/agent/resume"),
            "http://agent.local:8000/api/agent/resume"
        );
    }

    #[test]
    fn new_rejects_non_http_urls() {
        let result = AgentApiConfig::new("ftp://agent.local");
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn from_env_reads_base_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::set("AGENT_API_BASE_URL", " https://agent.example.com/ ");

        let config = AgentApiConfig::from_env().expect("config");
        assert_eq!(config.base_url, "https://agent.example.com");
    }

    #[test]
    fn from_env_falls_back_to_default_when_blank() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::set("AGENT_API_BASE_URL", "   ");

        let config = AgentApiConfig::from_env().expect("config");
        assert_eq!(config.base_url, DEFAULT_AGENT_API_BASE_URL);
    }
}
