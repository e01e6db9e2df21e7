use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_URL: &str = "BLACKLAKE_URL";
const ENV_API_KEY: &str = "BLACKLAKE_API_KEY";
const ENV_VERIFY: &str = "BLACKLAKE_VERIFY";
const ENV_TIMEOUT: &str = "BLACKLAKE_TIMEOUT";
const ENV_RC: &str = "BLACKLAKE_RC";
const RC_FILE_NAME: &str = ".blacklakerc";

/// Connection settings. Fixed once a client is built from them.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Base portal URL, e.g. `https://portal.example.com`.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <key>` when set.
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            verify_tls: true,
        }
    }
}

// Keeps the key out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Resolves settings from, in order of precedence:
    /// - explicit arguments
    /// - environment variables `BLACKLAKE_URL`, `BLACKLAKE_API_KEY`, `BLACKLAKE_VERIFY`,
    ///   `BLACKLAKE_TIMEOUT` (seconds)
    /// - the rc file named by `BLACKLAKE_RC`, or `.blacklakerc` in the current directory
    ///   or the home directory
    /// - built-in defaults
    pub fn load(url: Option<String>, api_key: Option<String>, verify: Option<bool>) -> Result<Self> {
        load_config(
            Overrides {
                url,
                api_key,
                verify,
                timeout: None,
            },
            |name| std::env::var(name).ok(),
            &rc_candidates(),
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) url: Option<String>,
    pub(crate) api_key: Option<String>,
    pub(crate) verify: Option<bool>,
    pub(crate) timeout: Option<Duration>,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct RcConfig {
    pub(crate) url: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) verify: Option<bool>,
    pub(crate) timeout: Option<Duration>,
}

pub(crate) fn load_config<F>(
    explicit: Overrides,
    env: F,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut url = explicit.url.or_else(|| env(ENV_URL));
    let mut api_key = explicit.api_key.or_else(|| env(ENV_API_KEY));
    let mut verify = match explicit.verify {
        Some(v) => Some(v),
        None => env(ENV_VERIFY).map(|v| parse_bool(&v)).transpose()?,
    };
    let mut timeout = match explicit.timeout {
        Some(t) => Some(t),
        None => env(ENV_TIMEOUT).map(|v| parse_timeout(&v)).transpose()?,
    };

    if url.is_none() || api_key.is_none() || verify.is_none() || timeout.is_none() {
        if let Some(rc_path) = rc_candidates.iter().find(|p| p.exists()) {
            let cfg = read_rc(rc_path).with_context(|| {
                format!("failed to read configuration file {}", rc_path.display())
            })?;
            log::debug!("loaded client settings from {}", rc_path.display());

            url = url.or(cfg.url);
            api_key = api_key.or(cfg.key);
            verify = verify.or(cfg.verify);
            timeout = timeout.or(cfg.timeout);
        }
    }

    let base_url = url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        bail!(
            "Invalid configuration: url must start with http:// or https:// (got `{}`)",
            base_url
        );
    }

    Ok(ClientConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key: api_key.filter(|k| !k.trim().is_empty()),
        timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        verify_tls: verify.unwrap_or(true),
    })
}

pub(crate) fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_rc(&text)
}

pub(crate) fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // `key:` may sit on one line with its value on the next.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !is_key_line(line) {
                apply_rc_value(&mut cfg, pk, strip_quotes(line))?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                if matches!(k, "url" | "key") {
                    pending_key = Some(k);
                }
                continue;
            }
            apply_rc_value(&mut cfg, k, v)?;
        }
    }

    Ok(cfg)
}

fn is_key_line(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(k, _)| matches!(k.trim(), "url" | "key" | "verify" | "timeout"))
}

fn apply_rc_value(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "key" => cfg.key = Some(value.to_string()),
        "verify" => cfg.verify = Some(parse_bool(value)?),
        "timeout" => cfg.timeout = Some(parse_timeout(value)?),
        _ => {}
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Invalid boolean value `{}` (expected true/false or 1/0)", other),
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let secs: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid timeout `{}` (expected seconds)", value.trim()))?;
    if !secs.is_finite() || secs <= 0.0 {
        bail!("Invalid timeout `{}` (must be a positive number of seconds)", value.trim());
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Invalid timeout `{}` (too large)", value.trim()))
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    ['"', '\'']
        .iter()
        .find_map(|q| s.strip_prefix(*q).and_then(|rest| rest.strip_suffix(*q)))
        .unwrap_or(s)
}

/// `$BLACKLAKE_RC` alone when set, else `./.blacklakerc` then `~/.blacklakerc`.
fn rc_candidates() -> Vec<PathBuf> {
    if let Ok(explicit) = std::env::var(ENV_RC) {
        return vec![PathBuf::from(explicit)];
    }

    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::home_dir())
        .map(|dir| dir.join(RC_FILE_NAME))
        .collect()
}
