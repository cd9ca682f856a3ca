#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use rightsgate_engine::config::{self, LogFormat, RegexMode};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
engine:
  store_timeout_ms: 500
  cache_tll_ms: 1000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.engine.store_timeout(), Duration::from_millis(2000));
    assert_eq!(cfg.engine.cache_ttl(), Some(Duration::from_secs(30)));
    assert_eq!(cfg.engine.regex_operator, RegexMode::Stub);
    assert!(!cfg.engine.audit);
    assert_eq!(cfg.log.filter, "info");
    assert_eq!(cfg.log.format, LogFormat::Pretty);
    assert!(cfg.store.policies_file.is_none());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
engine:
  store_timeout_ms: 250
  cache_ttl_ms: 0
  regex_operator: enabled
  audit: true
log:
  filter: "rightsgate=debug,info"
  format: json
store:
  policies_file: "policies.json"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.engine.store_timeout(), Duration::from_millis(250));
    assert_eq!(cfg.engine.cache_ttl(), None);
    assert_eq!(cfg.engine.regex_operator, RegexMode::Enabled);
    assert!(cfg.engine.audit);
    assert_eq!(cfg.log.format, LogFormat::Json);
    assert_eq!(cfg.store.policies_file.as_deref(), Some("policies.json"));
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 1\nengine:\n  store_timeout_ms: 5\n",
        "version: 1\nengine:\n  store_timeout_ms: 60001\n",
        "version: 1\nengine:\n  cache_ttl_ms: 3600001\n",
        "version: 1\nlog:\n  filter: \"  \"\n",
        "version: 1\nengine:\n  regex_operator: pcre\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "BAD_REQUEST", "{bad}");
    }
}
