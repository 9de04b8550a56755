use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

const PORTAL_VARS: &[&str] = &[
    "PORTAL_SERVER__PORT",
    "PORTAL_SERVER__BIND",
    "PORTAL_SERVER__SHUTDOWN_GRACE_SECS",
    "PORTAL_RECEIVER__MAX_WIDTH",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvRestore {
    saved: Vec<(&'static str, Option<std::ffi::OsString>)>,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (name, value) in self.saved.drain(..) {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with a config file containing `config_toml` and a clean
/// `PORTAL_*` environment. Env changes made inside `f` are rolled back.
pub fn with_config_env<T>(config_toml: &str, f: impl FnOnce(&Path) -> T) -> T {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, config_toml).expect("write config");

    let restore = EnvRestore {
        saved: PORTAL_VARS
            .iter()
            .map(|name| (*name, std::env::var_os(name)))
            .collect(),
    };
    for name in PORTAL_VARS {
        std::env::remove_var(name);
    }

    let result = f(&path);
    drop(restore);
    result
}
