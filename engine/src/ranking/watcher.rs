//! Config file watcher driving weight hot-reload
//!
//! Watches the config file's parent directory rather than the file
//! itself, since editors typically replace the file on save. Events are
//! pushed through a channel to a single consumer task that performs the
//! write-locked reload, so the update path stays single-threaded.

use std::path::Path;
use std::sync::Arc;

use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{EngineError, EngineResult};

use super::Ranker;

impl Ranker {
    /// Start watching the active config file for weight changes.
    ///
    /// A no-op when the config store has no backing file. Watcher and
    /// reload failures are logged; prior weights stay intact.
    pub fn watch_config(self: &Arc<Self>) -> EngineResult<()> {
        let Some(config_file) = self.config.file_path().map(Path::to_path_buf) else {
            debug!("no config file in use, skipping watcher setup");
            return Ok(());
        };
        let config_dir = config_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher =
            notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
                let _ = tx.send(event);
            })
            .map_err(|e| EngineError::Watcher { message: e.to_string() })?;
        watcher
            .watch(&config_dir, RecursiveMode::NonRecursive)
            .map_err(|e| EngineError::Watcher { message: e.to_string() })?;

        *self.watcher.lock().unwrap_or_else(|e| e.into_inner()) = Some(watcher);

        let ranker = Arc::clone(self);
        let watched_file = config_file.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Ok(event) if is_reload_event(&event, &watched_file) => {
                        debug!(?event, "config file changed, reloading weights");
                        if let Err(e) = ranker.config.reload() {
                            error!(error = %e, "failed to re-read config file");
                            continue;
                        }
                        if let Err(e) = ranker.reload_weights().await {
                            error!(error = %e, "failed to reload weights");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "config watcher error"),
                }
            }
        });

        info!(config_file = %config_file.display(), "config file watcher started");
        Ok(())
    }
}

/// A write or create touching the active config file.
///
/// Matched by file name within the watched directory; notify may report
/// canonicalized paths that differ from the configured one.
fn is_reload_event(event: &notify::Event, config_file: &Path) -> bool {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }
    let Some(target) = config_file.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, Event, EventKind, ModifyKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event {
            kind,
            paths: vec![PathBuf::from(path)],
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_modify_of_config_file_triggers_reload() {
        let config = Path::new("/etc/kiln/config.toml");
        let e = event(EventKind::Modify(ModifyKind::Any), "/etc/kiln/config.toml");
        assert!(is_reload_event(&e, config));
    }

    #[test]
    fn test_create_counts_as_reload_event() {
        // Editors replace files on save, which surfaces as a create
        let config = Path::new("/etc/kiln/config.toml");
        let e = event(EventKind::Create(CreateKind::File), "/etc/kiln/config.toml");
        assert!(is_reload_event(&e, config));
    }

    #[test]
    fn test_unrelated_file_is_ignored() {
        let config = Path::new("/etc/kiln/config.toml");
        let e = event(EventKind::Modify(ModifyKind::Any), "/etc/kiln/other.toml");
        assert!(!is_reload_event(&e, config));
    }

    #[test]
    fn test_remove_events_are_ignored() {
        let config = Path::new("/etc/kiln/config.toml");
        let e = event(EventKind::Remove(notify::event::RemoveKind::File), "/etc/kiln/config.toml");
        assert!(!is_reload_event(&e, config));
    }
}
