use std::io::Write;
use std::time::Duration;

use clap::Parser;
use serial_test::serial;
use seo_svc::config::{self, CacheBackendKind, CliArgs, DatabaseBackend};
use tempfile::NamedTempFile;

struct EnvVarGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        // SAFETY: every test touching the environment runs under `#[serial]`.
        unsafe { std::env::set_var(key, value) };
        Self { key, original }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: see `EnvVarGuard::set`.
        unsafe {
            match self.original.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

const FILE: &str = r#"
[server]
http_port = 9100
grpc_port = 9101

[database]
backend = "memory"

[cache]
backend = "memory"
ttl_seconds = 120
key_prefix = "from-file"
"#;

#[test]
#[serial]
fn file_values_are_loaded() {
    let file = config_file(FILE);
    let path = file.path().to_str().expect("utf-8 path");
    let cli = CliArgs::parse_from(["seo-svc", "--config-file", path, "serve"]);

    let settings = config::load(&cli).expect("settings");
    assert_eq!(settings.server.http_addr.port(), 9100);
    assert_eq!(settings.server.grpc_addr.port(), 9101);
    assert_eq!(settings.database.backend, DatabaseBackend::Memory);
    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.cache.ttl, Duration::from_secs(120));
    assert_eq!(settings.cache.key_prefix, "from-file");
}

#[test]
#[serial]
fn environment_overrides_file_and_cli_overrides_environment() {
    let file = config_file(FILE);
    let path = file.path().to_str().expect("utf-8 path");
    let _ttl = EnvVarGuard::set("SEO_SVC__CACHE__TTL_SECONDS", "30");
    let _prefix = EnvVarGuard::set("SEO_SVC__CACHE__KEY_PREFIX", "from-env");

    let cli = CliArgs::parse_from([
        "seo-svc",
        "--config-file",
        path,
        "serve",
        "--cache-key-prefix",
        "from-cli",
    ]);

    let settings = config::load(&cli).expect("settings");
    assert_eq!(settings.cache.ttl, Duration::from_secs(30));
    assert_eq!(settings.cache.key_prefix, "from-cli");
}

#[test]
#[serial]
fn missing_config_file_is_an_error() {
    let cli = CliArgs::parse_from([
        "seo-svc",
        "--config-file",
        "/definitely/not/here/seo-svc.toml",
        "serve",
    ]);

    assert!(config::load(&cli).is_err());
}
