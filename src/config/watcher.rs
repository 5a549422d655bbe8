//! Config file watching for `--watch`.
//!
//! Editors emit several events per save, and some replace the file by rename,
//! so the parent directory is watched and a reload is only published when the
//! contents actually changed and still validate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::GatewayConfig;

/// Publishes validated configs whenever the watched file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
    last_contents: Arc<Mutex<Option<String>>>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for reloaded configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let initial = fs::read_to_string(path).ok();

        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
            last_contents: Arc::new(Mutex::new(initial)),
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let tx = self.update_tx.clone();
        let last = self.last_contents.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_file || !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if let Some(config) = reload(&path, &last) {
                        let _ = tx.send(config);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read `path`; `Some` only for new contents that validate.
fn reload(path: &Path, last: &Mutex<Option<String>>) -> Option<GatewayConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(error = %e, "Config file unreadable, keeping current configuration");
            return None;
        }
    };

    let mut last = last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if last.as_deref() == Some(contents.as_str()) {
        return None;
    }

    match parse_config(&contents) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Config file changed, reloading");
            *last = Some(contents);
            Some(config)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            None
        }
    }
}
