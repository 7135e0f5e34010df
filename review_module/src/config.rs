use std::env;
use std::io;
use std::path::PathBuf;

use agent_api_module::{AgentApiConfig, ListOrder};

use crate::BoxError;

#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub user_id: String,
    pub api: AgentApiConfig,
    pub list_order: ListOrder,
    pub read_marks_db_path: PathBuf,
}

impl ReviewConfig {
    pub fn from_env() -> Result<Self, BoxError> {
        dotenvy::dotenv().ok();

        let user_id = env::var("AGENT_USER_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or("AGENT_USER_ID must be set to the signed-in user's id")?;

        let api = AgentApiConfig::from_env()?;

        let list_order = match env::var("AGENT_LIST_ORDER") {
            Ok(raw) if !raw.trim().is_empty() => ListOrder::parse(&raw)
                .ok_or_else(|| format!("AGENT_LIST_ORDER must be newest or oldest, got '{}'", raw))?,
            _ => ListOrder::default(),
        };

        let read_marks_db_path = match env::var("READ_MARKS_DB_PATH") {
            Ok(raw) if !raw.trim().is_empty() => resolve_path(raw)?,
            _ => default_read_marks_path()?,
        };

        Ok(Self {
            user_id,
            api,
            list_order,
            read_marks_db_path,
        })
    }
}

fn default_read_marks_path() -> Result<PathBuf, io::Error> {
    let home = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))?;
    Ok(home.join(".inbox_review").join("read_marks.db"))
}

fn resolve_path(raw: String) -> Result<PathBuf, io::Error> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir()?;
        Ok(cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: String,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let previous = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                previous,
            }
        }

        fn unset(key: &str) -> Self {
            let previous = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                previous,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn from_env_reads_all_settings() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _user = EnvGuard::set("AGENT_USER_ID", " user-42 ");
        let _base = EnvGuard::set("AGENT_API_BASE_URL", "http://agent.test:9000/");
        let _order = EnvGuard::set("AGENT_LIST_ORDER", "Oldest");
        let _db = EnvGuard::set("READ_MARKS_DB_PATH", "/tmp/review/read_marks.db");

        let config = ReviewConfig::from_env().expect("config");

        assert_eq!(config.user_id, "user-42");
        assert_eq!(config.api.base_url, "http://agent.test:9000");
        assert_eq!(config.list_order, ListOrder::Oldest);
        assert_eq!(
            config.read_marks_db_path,
            PathBuf::from("/tmp/review/read_marks.db")
        );
    }

    #[test]
    fn from_env_applies_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _user = EnvGuard::set("AGENT_USER_ID", "user-1");
        let _base = EnvGuard::unset("AGENT_API_BASE_URL");
        let _order = EnvGuard::unset("AGENT_LIST_ORDER");
        let _db = EnvGuard::set("READ_MARKS_DB_PATH", "marks.db");

        let config = ReviewConfig::from_env().expect("config");

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.list_order, ListOrder::Newest);
        assert!(config.read_marks_db_path.is_absolute());
        assert!(config.read_marks_db_path.ends_with("marks.db"));
    }

    #[test]
    fn from_env_requires_user_id() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _user = EnvGuard::unset("AGENT_USER_ID");

        let err = ReviewConfig::from_env().expect_err("missing user id");
        assert!(err.to_string().contains("AGENT_USER_ID"));
    }

    #[test]
    fn from_env_rejects_unknown_order() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _user = EnvGuard::set("AGENT_USER_ID", "user-1");
        let _order = EnvGuard::set("AGENT_LIST_ORDER", "random");

        assert!(ReviewConfig::from_env().is_err());
    }
}
