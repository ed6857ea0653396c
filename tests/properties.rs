//! Property pipeline end to end: file loading, environment layering,
//! placeholder resolution, and typed conversion.

use std::io::Write;

use armature::properties::{parse_duration, parse_std_duration};
use armature::{ConverterRegistry, PropertyError, PropertyResolver, PropertySource};
use chrono::{DateTime, NaiveDate, Utc};
use serial_test::serial;

fn file_with(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("armature-test")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_properties_file_loading() {
    let file = file_with(
        ".properties",
        "# mail settings\nmail.host=smtp.example.org\nmail.port: 2525\n! trailing note\n",
    );
    let source = PropertySource::from_file(file.path()).unwrap();
    assert_eq!(source.get("mail.host"), Some("smtp.example.org"));
    assert_eq!(source.get("mail.port"), Some("2525"));
    assert_eq!(source.len(), 2);
}

#[test]
fn test_json_file_loading() {
    let file = file_with(
        ".json",
        r#"{"mail": {"host": "smtp.example.org", "port": 2525, "tls": true}}"#,
    );
    let source = PropertySource::from_file(file.path()).unwrap();
    assert_eq!(source.get("mail.host"), Some("smtp.example.org"));
    assert_eq!(source.get("mail.port"), Some("2525"));
    assert_eq!(source.get("mail.tls"), Some("true"));
}

#[test]
fn test_yaml_file_loading() {
    let file = file_with(
        ".yaml",
        "mail:\n  host: smtp.example.org\n  retries:\n    - first\n    - second\n",
    );
    let source = PropertySource::from_file(file.path()).unwrap();
    assert_eq!(source.get("mail.host"), Some("smtp.example.org"));
    assert_eq!(source.get("mail.retries.0"), Some("first"));
    assert_eq!(source.get("mail.retries.1"), Some("second"));
}

#[test]
fn test_unknown_extension_is_rejected() {
    let file = file_with(".txt", "mail.host=nope\n");
    let err = PropertySource::from_file(file.path()).unwrap_err();
    assert!(matches!(err, PropertyError::UnknownFormat { .. }));
}

#[test]
fn test_malformed_properties_line_reports_position() {
    let file = file_with(".properties", "ok=1\nthis line has no separator\n");
    let err = PropertySource::from_file(file.path()).unwrap_err();
    match err {
        PropertyError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
#[serial]
fn test_environment_layering() {
    std::env::set_var("ARMATURE_TEST_REGION", "eu-west");
    std::env::set_var("ARMATURE_TEST_LAYERED", "from-env");

    let source = PropertySource::with_properties([("ARMATURE_TEST_LAYERED", "explicit")]);
    assert_eq!(source.get("ARMATURE_TEST_REGION"), Some("eu-west"));
    assert_eq!(source.get("ARMATURE_TEST_LAYERED"), Some("explicit"));

    // explicit-only sources never see the environment
    let isolated = PropertySource::of([("other", "value")]);
    assert_eq!(isolated.get("ARMATURE_TEST_REGION"), None);

    let resolver = PropertyResolver::new(source);
    assert_eq!(
        resolver.get_string("${ARMATURE_TEST_REGION}").as_deref(),
        Some("eu-west")
    );

    std::env::remove_var("ARMATURE_TEST_REGION");
    std::env::remove_var("ARMATURE_TEST_LAYERED");
}

#[test]
#[serial]
fn test_file_over_environment() {
    std::env::set_var("ARMATURE_TEST_SHADOWED", "from-env");
    let file = file_with(".properties", "ARMATURE_TEST_SHADOWED=from-file\n");
    let source = PropertySource::with_file(file.path()).unwrap();
    assert_eq!(source.get("ARMATURE_TEST_SHADOWED"), Some("from-file"));
    std::env::remove_var("ARMATURE_TEST_SHADOWED");
}

#[test]
fn test_placeholder_defaults_end_to_end() {
    let file = file_with(
        ".properties",
        "app.title=Messaging\nsmtp.timeout=${smtp.timeout.custom:${smtp.timeout.base:PT30S}}\nsmtp.timeout.base=PT10S\n",
    );
    let resolver = PropertyResolver::new(PropertySource::from_file(file.path()).unwrap());

    assert_eq!(resolver.get_string("${app.title}").as_deref(), Some("Messaging"));
    assert_eq!(
        resolver.get_string("${app.missing:fallback}").as_deref(),
        Some("fallback")
    );
    // stored value is itself a placeholder chain ending in a present key
    let timeout: chrono::Duration = resolver.get_required("${smtp.timeout}").unwrap();
    assert_eq!(timeout, chrono::Duration::try_seconds(10).unwrap());
}

#[test]
fn test_typed_lookups() {
    let resolver = PropertyResolver::new(PropertySource::of([
        ("server.port", "8080"),
        ("server.threads", "4"),
        ("launch.date", "2026-03-01"),
        ("build.stamp", "2026-03-01T08:30:00Z"),
        ("window", "P2DT8H21M"),
    ]));

    assert_eq!(resolver.get::<u16>("${server.port}").unwrap(), Some(8080));
    assert_eq!(resolver.get_or::<usize>("${server.workers}", 8).unwrap(), 8);
    assert_eq!(
        resolver.get_required::<NaiveDate>("${launch.date}").unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    );
    let stamp: DateTime<Utc> = resolver.get_required("${build.stamp}").unwrap();
    assert_eq!(stamp.to_rfc3339(), "2026-03-01T08:30:00+00:00");

    let window: chrono::Duration = resolver.get_required("${window}").unwrap();
    assert_eq!(
        window,
        chrono::Duration::try_days(2).unwrap()
            + chrono::Duration::try_hours(8).unwrap()
            + chrono::Duration::try_minutes(21).unwrap()
    );

    let err = resolver.get_required::<u16>("${server.missing}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Required property 'server.missing' not found"
    );
}

#[test]
fn test_duration_parsing_directly() {
    assert_eq!(
        parse_duration("PT1.5S").unwrap(),
        chrono::Duration::nanoseconds(1_500_000_000)
    );
    assert_eq!(
        parse_std_duration("PT90S").unwrap(),
        std::time::Duration::from_secs(90)
    );
    assert!(parse_duration("one hour").is_err());
    assert!(parse_std_duration("-PT1S").is_err());
}

#[test]
fn test_custom_converter_through_resolver() {
    #[derive(Debug, PartialEq)]
    struct Endpoint {
        host: String,
        port: u16,
    }

    let mut converters = ConverterRegistry::with_defaults();
    converters.register(|text: &str| {
        let (host, port) = text
            .split_once(':')
            .ok_or_else(|| PropertyError::convert(text, "Endpoint", "expected host:port"))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| PropertyError::convert(text, "Endpoint", e.to_string()))?;
        Ok(Endpoint {
            host: host.to_string(),
            port,
        })
    });

    let resolver = PropertyResolver::with_converters(
        PropertySource::of([("mail.endpoint", "smtp.example.org:2525")]),
        converters,
    );
    let endpoint: Endpoint = resolver.get_required("${mail.endpoint}").unwrap();
    assert_eq!(
        endpoint,
        Endpoint {
            host: "smtp.example.org".to_string(),
            port: 2525,
        }
    );
}
