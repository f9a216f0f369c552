use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration, resolved from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Discord bot token.
    pub discord_token: String,
    /// SauceNAO API key.
    pub sauce_key: String,
    /// Pixiv `PHPSESSID` cookie value.
    pub pixiv_session: String,
    /// Value for the `x-user-id` header on Pixiv ajax calls.
    pub pixiv_user_id: Option<String>,
    /// First-party Twitter API bearer token; the embed proxy is used when
    /// this is absent.
    pub twitter_bearer: Option<String>,
    /// Delay before re-checking whether Discord already embedded a link.
    pub embed_wait: Duration,
    /// Transcoder binary for ugoira reassembly.
    pub ffmpeg_path: PathBuf,
}

const DEFAULT_EMBED_WAIT_MS: u64 = 750;

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let discord_token = required("DISCORD_TOKEN")?;
        let sauce_key = required("SAUCE_KEY")?;
        let pixiv_session = required("PIXIV_SESSION")?;

        let pixiv_user_id = env_str("PIXIV_USER_ID").and_then(non_empty);
        let twitter_bearer = env_str("TWITTER_BEARER").and_then(non_empty);

        let embed_wait =
            Duration::from_millis(env_u64("EMBED_WAIT_MS").unwrap_or(DEFAULT_EMBED_WAIT_MS));
        let ffmpeg_path = env_path("FFMPEG_PATH").unwrap_or_else(|| PathBuf::from("ffmpeg"));

        Ok(Self {
            discord_token,
            sauce_key,
            pixiv_session,
            pixiv_user_id,
            twitter_bearer,
            embed_wait,
            ffmpeg_path,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
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

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.env"))
    }

    #[test]
    fn dotenv_does_not_override_existing_env() {
        let path = tmp_file("saucery-dotenv");
        env::set_var("SAUCERY_TEST_EXISTING", "kept");
        fs::write(
            &path,
            "SAUCERY_TEST_EXISTING=overwritten\nSAUCERY_TEST_FRESH=\"quoted value\"\n# comment\n",
        )
        .unwrap();

        load_dotenv_if_present(&path);

        assert_eq!(env::var("SAUCERY_TEST_EXISTING").unwrap(), "kept");
        assert_eq!(env::var("SAUCERY_TEST_FRESH").unwrap(), "quoted value");

        env::remove_var("SAUCERY_TEST_EXISTING");
        env::remove_var("SAUCERY_TEST_FRESH");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn non_empty_rejects_whitespace() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
