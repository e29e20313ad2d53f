use weerelay_client::config;
use weerelay_proto::ErrorKind;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
relay:
  address: "127.0.0.1:9000"
  passwrod: "typo should fail"
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
relay:
  address: "relay.example.net:9000"
  password: "hunter2"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.relay.address, "relay.example.net:9000");
    assert!(cfg.relay.compression);
    assert_eq!(cfg.session.max_lines_per_buffer, 1000);
}

#[test]
fn range_validation_is_enforced() {
    let bad = r#"
version: 1
relay:
  ping_interval_ms: 100
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);

    let bad = r#"
version: 1
session:
  lines_per_buffer: 5000
  max_lines_per_buffer: 100
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn unsupported_version_is_rejected() {
    let err = config::load_from_str("version: 2").expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn resume_token_is_carried_opaquely() {
    let ok = r#"
version: 1
session:
  resume_token: "whatever-the-relay-said"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(
        cfg.session.resume_token.as_deref(),
        Some("whatever-the-relay-said")
    );
}
