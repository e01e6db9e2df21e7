use crate::config::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Overrides, RcConfig, load_config, parse_rc,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

fn no_env() -> impl Fn(&str) -> Option<String> {
    env_from(&[])
}

#[test]
fn given_nothing_configured_when_loading_then_defaults_apply() {
    let cfg = load_config(Overrides::default(), no_env(), &[]).unwrap();

    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    assert!(cfg.verify_tls);
    assert!(cfg.api_key.is_none());
}

#[test]
fn given_rc_with_continuation_lines_when_parsed_then_values_joined() {
    let text = "# portal settings\nurl:\n  https://portal.example.com\nkey:\n  'abc123'\nverify: 0\ntimeout: 2.5\n";

    let cfg = parse_rc(text).unwrap();

    assert_eq!(
        cfg,
        RcConfig {
            url: Some("https://portal.example.com".to_string()),
            key: Some("abc123".to_string()),
            verify: Some(false),
            timeout: Some(Duration::from_millis(2500)),
        }
    );
}

#[test]
fn given_rc_with_invalid_verify_when_parsed_then_error() {
    assert!(parse_rc("verify: maybe").is_err());
    assert!(parse_rc("timeout: -1").is_err());
}

/// **VALUE**: explicit arguments beat environment, environment beats the rc file.
#[test]
fn given_all_sources_when_loading_then_precedence_respected() {
    let mut rc = tempfile::NamedTempFile::new().unwrap();
    writeln!(rc, "url: https://rc.example.com").unwrap();
    writeln!(rc, "key: rc-key").unwrap();
    writeln!(rc, "verify: false").unwrap();
    writeln!(rc, "timeout: 5").unwrap();
    let candidates = vec![PathBuf::from("/definitely/not/here/.blacklakerc"), rc.path().to_path_buf()];

    let cfg = load_config(
        Overrides {
            url: Some("https://explicit.example.com/".to_string()),
            ..Overrides::default()
        },
        env_from(&[("BLACKLAKE_API_KEY", "env-key")]),
        &candidates,
    )
    .unwrap();

    assert_eq!(cfg.base_url, "https://explicit.example.com");
    assert_eq!(cfg.api_key.as_deref(), Some("env-key"));
    assert!(!cfg.verify_tls);
    assert_eq!(cfg.timeout, Duration::from_secs(5));
}

#[test]
fn given_env_only_when_loading_then_env_values_used() {
    let cfg = load_config(
        Overrides::default(),
        env_from(&[
            ("BLACKLAKE_URL", "http://10.0.0.5:9000"),
            ("BLACKLAKE_VERIFY", "no"),
            ("BLACKLAKE_TIMEOUT", "12"),
        ]),
        &[],
    )
    .unwrap();

    assert_eq!(cfg.base_url, "http://10.0.0.5:9000");
    assert!(!cfg.verify_tls);
    assert_eq!(cfg.timeout, Duration::from_secs(12));
}

#[test]
fn given_non_http_url_when_loading_then_error() {
    let err = load_config(
        Overrides {
            url: Some("ftp://portal".to_string()),
            ..Overrides::default()
        },
        no_env(),
        &[],
    )
    .unwrap_err();

    assert!(err.to_string().contains("http://"));
}

#[test]
fn given_config_with_key_when_debug_formatted_then_key_redacted() {
    let cfg = ClientConfig::default().with_api_key("super-secret");

    let debug = format!("{:?}", cfg);

    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("<redacted>"));
}

/// **VALUE**: an absurd timeout is a config error, not a panic inside `Duration`.
#[test]
fn given_huge_timeout_when_parsed_then_error() {
    let err = parse_rc("timeout: 1e30").unwrap_err();
    assert!(format!("{:#}", err).contains("too large"));

    let err = load_config(
        Overrides::default(),
        env_from(&[("BLACKLAKE_TIMEOUT", "1e30")]),
        &[],
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("1e30"));
}

#[test]
fn given_quoted_values_when_parsed_then_quotes_stripped() {
    let cfg = parse_rc("url: 'https://portal.example.com'\nkey: \"abc\"\n").unwrap();

    assert_eq!(cfg.url.as_deref(), Some("https://portal.example.com"));
    assert_eq!(cfg.key.as_deref(), Some("abc"));
}
