use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_point_at_local_service() {
    let settings = ClientSettings::default();
    assert_eq!(settings.api_url, "http://localhost:8000");
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(120)));
    assert_eq!(settings.compare_sources.ground_truth, "/1.png");
}

#[test]
fn normalizes_trailing_slashes_and_blank_values() {
    assert_eq!(
        normalize_api_url(" https://stain.example/api/ "),
        "https://stain.example/api"
    );
    assert_eq!(normalize_api_url("   "), DEFAULT_API_URL);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file(
        &mut settings,
        r#"
api_url = "http://10.0.0.5:9000/"
request_timeout_secs = 0
brightfield_src = "/bf_demo.png"
"#,
    );

    assert_eq!(settings.api_url, "http://10.0.0.5:9000");
    assert_eq!(settings.request_timeout(), None);
    assert_eq!(settings.compare_sources.brightfield, "/bf_demo.png");
    assert_eq!(settings.compare_sources.ai_inferred, "/2.png");
}

#[test]
fn malformed_values_keep_previous_layer() {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, "request_timeout_secs = -4\napi_url = 12\n");
    assert_eq!(settings, ClientSettings::default());

    apply_file(&mut settings, "this is not toml = = =");
    assert_eq!(settings, ClientSettings::default());

    apply_env(&mut settings, env_from(&[("APP__REQUEST_TIMEOUT_SECS", "soon")]));
    assert_eq!(settings.request_timeout_secs, 120);
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = ClientSettings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("STAINVIZ_API_URL", "http://plain:1"),
            ("APP__API_URL", "http://prefixed:2/"),
            ("APP__REQUEST_TIMEOUT_SECS", "15"),
        ]),
    );
    assert_eq!(settings.api_url, "http://prefixed:2");
    assert_eq!(settings.request_timeout_secs, 15);
}

#[test]
fn loads_settings_file_from_explicit_path() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("stainviz_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("custom.toml");
    fs::write(&path, "request_timeout_secs = \"45\"\nground_truth_src = \"/gt.png\"\n")
        .expect("write settings");

    let settings = load_settings_from(Some(&path));
    assert_eq!(settings.compare_sources.ground_truth, "/gt.png");
    if env::var("APP__REQUEST_TIMEOUT_SECS").is_err() {
        assert_eq!(settings.request_timeout_secs, 45);
    }

    fs::remove_dir_all(temp_root).expect("cleanup");
}
