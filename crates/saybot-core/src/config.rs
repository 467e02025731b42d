use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::UserId, errors::Error, Result};

/// Runtime configuration, loaded once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub bot_token: String,
    pub openai_api_key: String,
    pub admin_user: UserId,

    // Completion provider
    pub openai_model: String,

    // Storage
    pub data_dir: PathBuf,

    // Relay timing
    pub handler_timeout: Duration,
    pub stream_throttle: Duration,
    pub typing_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let bot_token = env_str("BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;
        let openai_api_key = env_str("OPENAI_API_KEY").and_then(non_empty).ok_or_else(|| {
            Error::Config("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        let admin_user = env_str("ADMIN_USER")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("ADMIN_USER environment variable is required".to_string())
            })?
            .trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| {
                Error::Config("ADMIN_USER must be a numeric Telegram user id".to_string())
            })?;

        let openai_model = env_str("OPENAI_MODEL")
            .and_then(non_empty)
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        let data_dir = env_path("DATA_DIR").unwrap_or_else(|| PathBuf::from("./data"));

        // Timeouts and intervals
        let handler_timeout =
            Duration::from_millis(env_u64("HANDLER_TIMEOUT_MS").unwrap_or(180_000));
        let stream_throttle = Duration::from_millis(env_u64("STREAM_THROTTLE_MS").unwrap_or(2_000));
        let typing_interval = Duration::from_millis(env_u64("TYPING_INTERVAL_MS").unwrap_or(4_000));

        Ok(Self {
            bot_token,
            openai_api_key,
            admin_user,
            openai_model,
            data_dir,
            handler_timeout,
            stream_throttle,
            typing_interval,
        })
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin_user
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
