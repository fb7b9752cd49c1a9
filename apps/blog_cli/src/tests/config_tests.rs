use super::*;

use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_backend() {
    let settings = Settings::default();
    assert_eq!(settings.api_url, "http://localhost:5000/api");
    assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    assert_eq!(settings.posts_per_page, 10);
    assert_eq!(settings.comments_per_page, 20);
    assert_eq!(settings.users_per_page, 10);
    settings.validate().expect("defaults are valid");
}

#[test]
fn file_overrides_only_present_keys() {
    let mut settings = Settings::default();
    settings
        .apply_file("api_url = \"https://blog.example.com/api\"\nposts_per_page = 5\n")
        .expect("parse");

    assert_eq!(settings.api_url, "https://blog.example.com/api");
    assert_eq!(settings.posts_per_page, 5);
    assert_eq!(settings.comments_per_page, 20);
}

#[test]
fn file_with_unknown_key_is_rejected() {
    let mut settings = Settings::default();
    assert!(settings.apply_file("bind_addr = \"0.0.0.0\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_short_name() {
    let mut settings = Settings::default();
    settings.apply_env(env(&[
        ("BLOG_API_URL", "http://short:1/api"),
        ("APP__API_URL", "http://long:2/api"),
        ("DATABASE_URL", "./other.db"),
    ]));

    assert_eq!(settings.api_url, "http://long:2/api");
    assert_eq!(settings.database_url, "./other.db");
}

#[test]
fn unparseable_numeric_env_is_ignored() {
    let mut settings = Settings::default();
    settings.apply_env(env(&[
        ("APP__REQUEST_TIMEOUT_SECS", "soon"),
        ("APP__COMMENTS_PER_PAGE", " 50 "),
    ]));

    assert_eq!(settings.request_timeout_secs, 10);
    assert_eq!(settings.comments_per_page, 50);
}

#[test]
fn cli_overrides_apply_last() {
    let mut settings = Settings::default();
    settings.apply_env(env(&[("APP__API_URL", "http://env:1/api")]));
    settings.apply_overrides(Some("http://flag:2/api".into()), None, Some(3));

    assert_eq!(settings.api_url, "http://flag:2/api");
    assert_eq!(settings.request_timeout_secs, 3);
    assert_eq!(settings.database_url, Settings::default().database_url);
}

#[test]
fn validate_rejects_bad_values() {
    let mut settings = Settings {
        api_url: "not a url".into(),
        ..Settings::default()
    };
    assert!(settings.validate().is_err());

    settings.api_url = "ftp://example.com/api".into();
    assert!(settings.validate().is_err());

    settings.api_url = "http://example.com/api".into();
    settings.posts_per_page = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("C:\\Users\\ann\\blog.db"),
        "sqlite://C:/Users/ann/blog.db"
    );
}

#[test]
fn keeps_sqlite_urls_and_falls_back_when_blank() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("sqlite://./x.db?mode=rwc"),
        "sqlite://./x.db?mode=rwc"
    );
    assert_eq!(normalize_database_url("   "), "sqlite://./data/blog.db");
}

#[test]
fn users_page_size_is_configured_separately() {
    let mut settings = Settings::default();
    settings
        .apply_file("users_per_page = 25\n")
        .expect("parse");
    assert_eq!(settings.users_per_page, 25);
    assert_eq!(settings.posts_per_page, 10);

    settings.apply_env(env(&[("APP__USERS_PER_PAGE", "5")]));
    assert_eq!(settings.users_per_page, 5);

    settings.users_per_page = 0;
    assert!(settings.validate().is_err());
}
