use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, security::AccessPolicy, Result};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a highly specialized assistant that translates financial market texts from any language into Persian. Ensure the use of appropriate financial terminology, maintain the original structure and formatting, break the text into clear paragraphs, and deliver translations that are clear, professional, and easy to understand. Preserve the meaning and nuances of the original content while enhancing readability in Persian.";

/// Typed configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: String,
    pub openai_api_key: String,

    // Translation / transcription
    pub openai_base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub transcription_model: String,
    pub request_timeout: Duration,

    // Relay behavior
    pub media_group_timeout: Duration,
    pub chunk_delay: Duration,
    pub telegram_message_limit: usize,

    // Video notes
    pub temp_dir: PathBuf,
    pub ffmpeg_path: PathBuf,

    // Access
    pub allowed_users: Vec<i64>,
    pub allowed_groups: Vec<i64>,
    pub allowed_channels: Vec<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;

        // Video-note scratch files land here.
        fs::create_dir_all(&cfg.temp_dir)?;
        Ok(cfg)
    }

    /// Build a config from any key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_API_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_API_TOKEN environment variable is required".to_string())
            })?;
        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            Error::Config("OPENAI_API_KEY environment variable is required".to_string())
        })?;

        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        let model = get("MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let system_prompt = get("SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let transcription_model =
            get("TRANSCRIPTION_MODEL").unwrap_or_else(|| "whisper-1".to_string());
        let request_timeout =
            Duration::from_secs(parse_num(get("REQUEST_TIMEOUT_SECS")).unwrap_or(60));

        let media_group_timeout =
            Duration::from_millis(parse_num(get("MEDIA_GROUP_TIMEOUT_MS")).unwrap_or(2000));
        let chunk_delay = Duration::from_millis(parse_num(get("CHUNK_DELAY_MS")).unwrap_or(100));
        let telegram_message_limit = parse_num(get("TELEGRAM_MESSAGE_LIMIT"))
            .map(|n: u64| n as usize)
            .filter(|n| *n > 0)
            .unwrap_or(4096);

        let temp_dir = PathBuf::from(get("TEMP_DIR").unwrap_or_else(|| "./tempfiles".to_string()));
        let ffmpeg_path = PathBuf::from(get("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()));

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            openai_base_url,
            model,
            system_prompt,
            transcription_model,
            request_timeout,
            media_group_timeout,
            chunk_delay,
            telegram_message_limit,
            temp_dir,
            ffmpeg_path,
            allowed_users: parse_csv_i64(get("ALLOWED_USERS")),
            allowed_groups: parse_csv_i64(get("ALLOWED_GROUPS")),
            allowed_channels: parse_csv_i64(get("ALLOWED_CHANNELS")),
        })
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(
            self.allowed_users.clone(),
            self.allowed_groups.clone(),
            self.allowed_channels.clone(),
        )
    }
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

        env::set_var(key, unquote(v.trim()));
    }
}

/// Strip optional surrounding quotes.
fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_num<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_with_only_credentials() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_API_TOKEN", "t"),
            ("OPENAI_API_KEY", "k"),
        ]))
        .unwrap();

        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.transcription_model, "whisper-1");
        assert_eq!(cfg.media_group_timeout, Duration::from_secs(2));
        assert_eq!(cfg.chunk_delay, Duration::from_millis(100));
        assert_eq!(cfg.telegram_message_limit, 4096);
        assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(cfg.access_policy().is_open());
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "k")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn legacy_token_name_and_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("OPENAI_API_KEY", "k"),
            ("OPENAI_BASE_URL", "https://openrouter.ai/api/v1/"),
            ("MEDIA_GROUP_TIMEOUT_MS", "500"),
            ("ALLOWED_CHANNELS", "-1001, nope, -1002"),
        ]))
        .unwrap();

        assert_eq!(cfg.telegram_bot_token, "t");
        assert_eq!(cfg.openai_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(cfg.media_group_timeout, Duration::from_millis(500));
        assert_eq!(cfg.allowed_channels, vec![-1001, -1002]);
        assert!(!cfg.access_policy().is_open());
    }

    #[test]
    fn dotenv_fills_missing_keys_without_overriding() {
        let dir = std::env::temp_dir().join(format!("relaybot-dotenv-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        fs::write(
            &path,
            "# comment\nRELAYBOT_TEST_PRESET=from-file\nRELAYBOT_TEST_MISSING=\"quoted value\"\nnot a pair\n",
        )
        .unwrap();
        env::set_var("RELAYBOT_TEST_PRESET", "from-env");
        env::remove_var("RELAYBOT_TEST_MISSING");

        load_dotenv_if_present(&path);

        assert_eq!(env::var("RELAYBOT_TEST_PRESET").unwrap(), "from-env");
        assert_eq!(env::var("RELAYBOT_TEST_MISSING").unwrap(), "quoted value");

        env::remove_var("RELAYBOT_TEST_PRESET");
        env::remove_var("RELAYBOT_TEST_MISSING");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_dotenv_is_ignored() {
        load_dotenv_if_present(Path::new("/nonexistent/relaybot/.env"));
    }

    #[test]
    fn unquote_strips_matching_quotes_only() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
    }
}
