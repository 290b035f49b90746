use dataservice::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const KEYS: &[&str] = &[
    "DATASERVICE_PROFILE",
    "DATASERVICE_API_BIND_ADDR",
    "DATASERVICE_LOG_LEVEL",
    "DATASERVICE_DEFAULT_PAGE_LIMIT",
    "DATASERVICE_MAX_PAGE_LIMIT",
    "DATASERVICE_INDEXD_URL",
    "DATASERVICE_INDEXD_MAX_BACKFILL_ROUNDS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for key in KEYS {
        unsafe {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_files_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load()
        .expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:5000");
    assert_eq!(cfg.pagination.default_page_limit, 10);
    assert_eq!(cfg.pagination.max_page_limit, 100);
    assert_eq!(cfg.indexd.url, "http://localhost:8089/index");
    assert_eq!(cfg.indexd.max_backfill_rounds, 10);
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "DATASERVICE_API_BIND_ADDR=127.0.0.1:3000\nDATASERVICE_MAX_PAGE_LIMIT=50\n",
    );
    write_env_file(
        &temp_dir,
        ".env.local",
        "DATASERVICE_PROFILE=test\nDATASERVICE_API_BIND_ADDR=127.0.0.1:4000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test",
        "DATASERVICE_API_BIND_ADDR=192.168.0.10:5000\nDATASERVICE_DEFAULT_PAGE_LIMIT=25\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "DATASERVICE_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    let cfg = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.pagination.default_page_limit, 25);
    assert_eq!(cfg.pagination.max_page_limit, 50);
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "DATASERVICE_INDEXD_URL=http://indexd.local/index\n",
    );

    unsafe {
        env::set_var("DATASERVICE_INDEXD_URL", "https://gen3.example.org/index");
    }

    let cfg = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load()
        .expect("config loads with env override");
    assert_eq!(cfg.indexd.url, "https://gen3.example.org/index");

    clear_env();
}

#[test]
fn default_limit_above_max_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "DATASERVICE_DEFAULT_PAGE_LIMIT=200\nDATASERVICE_MAX_PAGE_LIMIT=100\n",
    );

    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load()
        .expect_err("default above max should fail");
    assert!(matches!(
        err,
        ConfigError::InvalidDefaultPageLimit { value: 200, max: 100 }
    ));
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("DATASERVICE_API_BIND_ADDR", "not-an-addr");
    }
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()))
        .load()
        .expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}
