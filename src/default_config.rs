/// Seed configuration written to `~/.qa-console/config.toml` on first launch
/// and deep-merged with any user overrides found there.
pub const DEFAULT_CONFIG_TOML: &str = r#"[api]
base_url = "http://localhost:8000/api/v1"
timeout_secs = 120

[downloads]
dir = "~/.qa-console/scripts"
"#;
