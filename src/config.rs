use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default Kraken v5 API root
pub const DEFAULT_API_BASE: &str = "https://api.twitch.tv/kraken";

/// Default location of the file holding the Twitch Client-ID
pub const DEFAULT_CLIENT_ID_FILE: &str = "twitchClientId";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Upstream API root, without trailing slash
    pub api_base: String,
    /// Twitch Client-ID credential, read once at startup
    pub client_id: String,
    /// Per-request upstream timeout
    pub upstream_timeout: Duration,
    /// Maximum entries held by each resource cache
    pub cache_capacity: usize,
    /// Interval between background sweeps of expired cache entries
    pub cache_sweep_interval: Duration,
    /// Landing page served at `/`
    pub index_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails if the Client-ID file cannot be read or is empty; the server
    /// must not start without a credential.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let api_base = env::var("TWITCH_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let parsed = Url::parse(&api_base)
            .map_err(|e| format!("TWITCH_API_BASE is not a valid URL ({api_base}): {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("TWITCH_API_BASE must be http(s), got '{}'", parsed.scheme()).into());
        }
        let api_base = api_base.trim_end_matches('/').to_string();

        let client_id_file = env::var("TWITCH_CLIENT_ID_FILE")
            .unwrap_or_else(|_| DEFAULT_CLIENT_ID_FILE.to_string());
        let client_id = load_client_id(Path::new(&client_id_file))?;

        let upstream_timeout = Duration::from_secs(
            env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()?
                .max(1),
        );

        let cache_capacity = env::var("CACHE_CAPACITY")
            .unwrap_or_else(|_| crate::cache::DEFAULT_CAPACITY.to_string())
            .parse()?;

        let cache_sweep_interval = Duration::from_secs(
            env::var("CACHE_SWEEP_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()?
                .max(1),
        );

        let index_path = PathBuf::from(env::var("INDEX_PATH").unwrap_or_else(|_| "index.html".to_string()));

        Ok(Config {
            port,
            api_base,
            client_id,
            upstream_timeout,
            cache_capacity,
            cache_sweep_interval,
            index_path,
        })
    }
}

/// Read the Client-ID credential from `path`, trimming surrounding whitespace.
pub fn load_client_id(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read Client ID from {}: {}", path.display(), e))?;
    let client_id = raw.trim();
    if client_id.is_empty() {
        return Err(format!("Client ID file {} is empty", path.display()).into());
    }
    Ok(client_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serialize all env-var tests to prevent races between parallel test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const UNSET_EXCEPT_CREDENTIAL: &[&str] = &[
        "PORT",
        "TWITCH_API_BASE",
        "UPSTREAM_TIMEOUT_SECS",
        "CACHE_CAPACITY",
        "CACHE_SWEEP_SECS",
        "INDEX_PATH",
    ];

    /// Set env vars, run `f`, then restore original state.
    ///
    /// `set`: vars to set; `unset`: vars to remove before running `f`.
    fn with_env(set: &[(&str, &str)], unset: &[&str], f: impl FnOnce()) {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());

        let save_set: Vec<(&str, Option<String>)> = set
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();
        let save_unset: Vec<(&str, Option<String>)> =
            unset.iter().map(|k| (*k, std::env::var(k).ok())).collect();

        for (k, v) in set {
            // SAFETY: serialized by ENV_LOCK, no other thread modifies env vars concurrently.
            unsafe { std::env::set_var(k, v) };
        }
        for k in unset {
            unsafe { std::env::remove_var(k) };
        }

        f();

        for (k, old) in save_set.into_iter().chain(save_unset) {
            match old {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
    }

    fn credential_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_with_credential_file() {
        let file = credential_file("abc123xyz\n");
        let path = file.path().to_str().unwrap().to_string();
        with_env(&[("TWITCH_CLIENT_ID_FILE", path.as_str())], UNSET_EXCEPT_CREDENTIAL, || {
            let config = Config::from_env().expect("should load with a credential");
            assert_eq!(config.port, 8080);
            assert_eq!(config.api_base, DEFAULT_API_BASE);
            assert_eq!(config.client_id, "abc123xyz");
            assert_eq!(config.upstream_timeout, Duration::from_secs(10));
            assert_eq!(config.cache_capacity, crate::cache::DEFAULT_CAPACITY);
            assert_eq!(config.cache_sweep_interval, Duration::from_secs(30));
            assert_eq!(config.index_path, PathBuf::from("index.html"));
        });
    }

    #[test]
    fn missing_credential_file_is_fatal() {
        with_env(
            &[("TWITCH_CLIENT_ID_FILE", "/nonexistent/streamcache/clientid")],
            &[],
            || {
                let result = Config::from_env();
                assert!(result.is_err(), "Should fail without a Client ID");
            },
        );
    }

    #[test]
    fn empty_credential_file_is_fatal() {
        let file = credential_file("   \n");
        let path = file.path().to_str().unwrap().to_string();
        with_env(&[("TWITCH_CLIENT_ID_FILE", path.as_str())], &[], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("empty"));
        });
    }

    #[test]
    fn api_base_trailing_slash_is_stripped() {
        let file = credential_file("id");
        let path = file.path().to_str().unwrap().to_string();
        with_env(
            &[
                ("TWITCH_CLIENT_ID_FILE", path.as_str()),
                ("TWITCH_API_BASE", "http://127.0.0.1:9000/kraken/"),
            ],
            &[],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.api_base, "http://127.0.0.1:9000/kraken");
            },
        );
    }

    #[test]
    fn non_http_api_base_rejected() {
        let file = credential_file("id");
        let path = file.path().to_str().unwrap().to_string();
        with_env(
            &[
                ("TWITCH_CLIENT_ID_FILE", path.as_str()),
                ("TWITCH_API_BASE", "ftp://api.twitch.tv/kraken"),
            ],
            &[],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn tunables_parsed() {
        let file = credential_file("id");
        let path = file.path().to_str().unwrap().to_string();
        with_env(
            &[
                ("TWITCH_CLIENT_ID_FILE", path.as_str()),
                ("PORT", "9090"),
                ("UPSTREAM_TIMEOUT_SECS", "3"),
                ("CACHE_CAPACITY", "256"),
                ("CACHE_SWEEP_SECS", "0"),
                ("INDEX_PATH", "static/index.html"),
            ],
            &[],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.port, 9090);
                assert_eq!(config.upstream_timeout, Duration::from_secs(3));
                assert_eq!(config.cache_capacity, 256);
                assert_eq!(config.cache_sweep_interval, Duration::from_secs(1));
                assert_eq!(config.index_path, PathBuf::from("static/index.html"));
            },
        );
    }

    #[test]
    fn zero_upstream_timeout_clamped_to_one_second() {
        let file = credential_file("id");
        let path = file.path().to_str().unwrap().to_string();
        with_env(
            &[
                ("TWITCH_CLIENT_ID_FILE", path.as_str()),
                ("UPSTREAM_TIMEOUT_SECS", "0"),
            ],
            &[],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.upstream_timeout, Duration::from_secs(1));
            },
        );
    }

    #[test]
    fn invalid_port_rejected() {
        let file = credential_file("id");
        let path = file.path().to_str().unwrap().to_string();
        with_env(
            &[("TWITCH_CLIENT_ID_FILE", path.as_str()), ("PORT", "not-a-port")],
            &[],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
