#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use otelcheck_plugin::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
relay:
  idle_timeout_msec: 1000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.relay.idle_timeout(), None);
    assert_eq!(cfg.relay.sink_capacity, 1024);
    assert_eq!(cfg.fetch.path, "/metrics");
    assert!(cfg.fetch.collector.is_none());
    assert!(cfg.cmdb.is_none());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
relay:
  idle_timeout_ms: 30000
  sink_capacity: 64
fetch:
  path: /custom
  collector:
    process_name: otelcol
    command: /usr/bin/otelcol
    args: ["--config", "/etc/otelcol/config.yaml"]
    settle_ms: 2000
cmdb:
  url: https://example.service-now.com
  username: admin
  password: secret
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.relay.idle_timeout(), Some(Duration::from_secs(30)));
    let collector = cfg.fetch.collector.expect("collector");
    assert_eq!(collector.args.len(), 2);
    assert_eq!(collector.settle(), Duration::from_secs(2));
    let cmdb = cfg.cmdb.expect("cmdb");
    assert_eq!(cmdb.data_source, "ServiceNow");
    assert_eq!(cmdb.timeout(), Duration::from_secs(30));
}

#[test]
fn rejects_unsupported_version() {
    assert!(config::load_from_str("version: 2\n").is_err());
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 1\nrelay:\n  idle_timeout_ms: 0\n",
        "version: 1\nrelay:\n  sink_capacity: 0\n",
        "version: 1\nfetch:\n  path: metrics\n",
        "version: 1\ncmdb:\n  url: ftp://x\n",
        "version: 1\ncmdb:\n  url: https://x\n  password: p\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert!(err.is_fatal());
    }
}

#[test]
fn missing_file_is_config_error() {
    let err = config::load_from_file("/nonexistent/otelcheck.yaml").expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}
