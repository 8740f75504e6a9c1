//! Keeps a [`ConfigStore`] in sync with a configuration file.

use crate::core::{ConfigSnapshot, ConfigStore, SnapshotLoader};
use crate::error::{ErrorChannel, LoggerError, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[cfg(feature = "file-watch")]
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};

/// Tunables for a [`ConfigWatcher`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// How often the file is re-read when no filesystem event arrives.
    pub poll_interval: Duration,
    /// Quiet period after a filesystem event before the file is re-read.
    pub debounce: Duration,
    /// Wake up on filesystem events in addition to polling.
    pub fs_events: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            debounce: Duration::from_millis(100),
            fs_events: cfg!(feature = "file-watch"),
        }
    }
}

/// Background task that reloads a configuration file into a [`ConfigStore`].
///
/// The file is polled every `poll_interval`; with the `file-watch` feature the
/// task also wakes early on filesystem events for the file's directory, so
/// deleting and recreating the file is picked up too.
///
/// A change is detected by comparing a fingerprint of the file contents. A
/// changed file that fails to parse is reported on the error channel and the
/// previously installed snapshot stays live.
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::core::{ConfigStore, SnapshotLoader};
/// use mqtt_hotlog::error::ErrorChannel;
/// use mqtt_hotlog::notify::{ConfigWatcher, WatchOptions};
/// use std::sync::Arc;
///
/// # async fn example() -> mqtt_hotlog::error::Result<()> {
/// let store = Arc::new(ConfigStore::new());
/// let watcher = ConfigWatcher::start(
///     SnapshotLoader::new("logging.yaml")?,
///     Arc::clone(&store),
///     WatchOptions::default(),
///     ErrorChannel::new(),
///     &tokio::runtime::Handle::current(),
/// )?;
///
/// // The first read never races the initial load.
/// println!("{}", store.read()?);
///
/// watcher.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
    options: WatchOptions,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Load the file into `store`, then keep watching it in the background.
    ///
    /// The initial load happens before this returns. If it fails, `store` is
    /// left untouched and no background task is started.
    ///
    /// # Errors
    ///
    /// Returns `WatcherIo` if the file cannot be read and `ConfigParse` if it
    /// is not a valid configuration.
    pub fn start(
        loader: SnapshotLoader,
        store: Arc<ConfigStore>,
        options: WatchOptions,
        errors: ErrorChannel,
        runtime: &Handle,
    ) -> Result<Self> {
        let content = loader.read()?;
        let snapshot = loader.parse(&content)?;
        Ok(Self::start_with(
            loader, &content, snapshot, store, options, errors, runtime,
        ))
    }

    /// Install `snapshot`, already parsed from `content`, and keep watching
    /// the file in the background.
    ///
    /// The file is not read again here, so this cannot fail. Later polls
    /// compare against `content` to detect a change.
    pub fn start_with(
        loader: SnapshotLoader,
        content: &[u8],
        snapshot: ConfigSnapshot,
        store: Arc<ConfigStore>,
        options: WatchOptions,
        errors: ErrorChannel,
        runtime: &Handle,
    ) -> Self {
        store.replace(snapshot);

        let path = loader.path().to_path_buf();

        let events = if options.fs_events {
            match FsEvents::subscribe(&path) {
                Ok(events) => Some(events),
                Err(err) => {
                    // Polling alone still satisfies the reload contract.
                    errors.report(&err);
                    None
                }
            }
        } else {
            None
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let state = PollState {
            loader,
            store,
            errors,
            fingerprint: Some(fingerprint(content)),
            io_failing: false,
        };
        let task = runtime.spawn(run(state, options.clone(), shutdown_rx, events));

        tracing::debug!(path = %path.display(), "started config watcher");

        Self {
            path,
            options,
            shutdown,
            task: Some(task),
        }
    }

    /// The file being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The options this watcher was started with.
    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Whether the background task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop watching and wait for the background task to exit.
    ///
    /// A check already in progress runs to completion first, so the store is
    /// never left mid-update. Returns within about one polling interval.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        tracing::debug!(path = %self.path.display(), "stopped config watcher");
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

enum Wake {
    Shutdown,
    Poll,
    FsEvent,
    EventsClosed,
}

async fn run(
    mut state: PollState,
    options: WatchOptions,
    mut shutdown: watch::Receiver<bool>,
    mut events: Option<FsEvents>,
) {
    loop {
        let wake = tokio::select! {
            biased;
            _ = shutdown.changed() => Wake::Shutdown,
            event = next_event(&mut events) => match event {
                Some(()) => Wake::FsEvent,
                None => Wake::EventsClosed,
            },
            _ = sleep(options.poll_interval) => Wake::Poll,
        };

        match wake {
            Wake::Shutdown => break,
            Wake::EventsClosed => {
                events = None;
                continue;
            }
            Wake::FsEvent => {
                // Let a burst of writes settle before re-reading.
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = sleep(options.debounce) => {}
                }
                if let Some(events) = events.as_mut() {
                    events.drain();
                }
            }
            Wake::Poll => {}
        }

        if *shutdown.borrow() {
            break;
        }

        state.check().await;
    }
}

async fn next_event(events: &mut Option<FsEvents>) -> Option<()> {
    match events {
        Some(events) => events.rx.recv().await,
        None => std::future::pending().await,
    }
}

/// State owned exclusively by the watcher task.
struct PollState {
    loader: SnapshotLoader,
    store: Arc<ConfigStore>,
    errors: ErrorChannel,
    fingerprint: Option<u64>,
    io_failing: bool,
}

impl PollState {
    async fn check(&mut self) {
        let path = self.loader.path();
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(source) => {
                // Forget the fingerprint so a recreated file is always re-parsed.
                self.fingerprint = None;
                if !self.io_failing {
                    self.io_failing = true;
                    self.errors.report(&LoggerError::WatcherIo {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                return;
            }
        };
        self.io_failing = false;

        let current = fingerprint(&content);
        if self.fingerprint == Some(current) {
            return;
        }
        self.fingerprint = Some(current);

        match self.loader.parse(&content) {
            Ok(snapshot) => {
                let unchanged = self
                    .store
                    .read()
                    .is_ok_and(|installed| *installed == snapshot);
                if !unchanged {
                    tracing::debug!(path = %path.display(), "configuration file changed, reloading");
                    self.store.replace(snapshot);
                }
            }
            Err(err) => self.errors.report(&err),
        }
    }
}

fn fingerprint(content: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Filesystem events for one file, delivered as wake-up signals.
#[cfg_attr(not(feature = "file-watch"), allow(dead_code))]
struct FsEvents {
    #[cfg(feature = "file-watch")]
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<()>,
}

impl FsEvents {
    /// Watch the file's parent directory so delete-and-recreate is seen.
    #[cfg(feature = "file-watch")]
    fn subscribe(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| LoggerError::Watch(format!("not a file path: {}", path.display())))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = dir
            .canonicalize()
            .map_err(|e| LoggerError::Watch(format!("Failed to resolve path: {}", e)))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let relevant = matches!(
                    event.kind,
                    notify::EventKind::Modify(_)
                        | notify::EventKind::Create(_)
                        | notify::EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));

                if relevant {
                    let _ = tx.send(());
                }
            }
        })
        .map_err(|e| LoggerError::Watch(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| LoggerError::Watch(format!("Failed to watch path: {}", e)))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    #[cfg(not(feature = "file-watch"))]
    fn subscribe(_path: &Path) -> Result<Self> {
        Err(LoggerError::Watch(
            "built without the `file-watch` feature".to_string(),
        ))
    }

    fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn fast_options() -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_millis(20),
            debounce: Duration::from_millis(10),
            fs_events: false,
        }
    }

    fn write_config(path: &Path, topic: &str, port: u16) {
        fs::write(
            path,
            format!("topic: {}\nbroker: localhost\nport: {}\nsource: tests\n", topic, port),
        )
        .unwrap();
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_start_loads_synchronously() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "first", 1883);

        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::new(),
            &Handle::current(),
        )
        .unwrap();

        assert_eq!(store.read().unwrap().topic(), "first");
        assert!(watcher.is_running());
        assert_eq!(watcher.path(), config_path.as_path());
        watcher.stop().await;
    }

    #[tokio::test]
    async fn test_start_with_invalid_file_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        fs::write(&config_path, "topic: only-a-topic\n").unwrap();

        let store = Arc::new(ConfigStore::new());
        let result = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::new(),
            &Handle::current(),
        );

        assert!(matches!(result, Err(LoggerError::ConfigParse { .. })));
        assert!(!store.is_configured());
    }

    #[tokio::test]
    async fn test_start_with_missing_file() {
        let store = Arc::new(ConfigStore::new());
        let result = ConfigWatcher::start(
            SnapshotLoader::new("/nonexistent/logging.yaml").unwrap(),
            store,
            fast_options(),
            ErrorChannel::new(),
            &Handle::current(),
        );
        assert!(matches!(result, Err(LoggerError::WatcherIo { .. })));
    }

    #[tokio::test]
    async fn test_poll_picks_up_change() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "first", 1883);

        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::new(),
            &Handle::current(),
        )
        .unwrap();

        write_config(&config_path, "second", 8883);

        assert!(wait_for(|| store.read().unwrap().topic() == "second").await);
        assert_eq!(store.read().unwrap().port(), 8883);
        watcher.stop().await;
    }

    #[tokio::test]
    async fn test_bad_edit_keeps_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "first", 1883);

        let errors = Arc::new(AtomicUsize::new(0));
        let errors_clone = Arc::clone(&errors);
        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::with_handler(move |err| {
                if matches!(err, LoggerError::ConfigParse { .. }) {
                    errors_clone.fetch_add(1, Ordering::SeqCst);
                }
            }),
            &Handle::current(),
        )
        .unwrap();

        // Rename into place so the watcher never sees a half-written file.
        let staged = temp_dir.path().join("logging.yaml.tmp");
        fs::write(&staged, "topic: second\nbroker: [unterminated\n").unwrap();
        fs::rename(&staged, &config_path).unwrap();

        assert!(wait_for(|| errors.load(Ordering::SeqCst) > 0).await);
        let snapshot = store.read().unwrap();
        assert_eq!(
            *snapshot,
            ConfigSnapshot::new("first", "localhost", 1883, "tests").unwrap()
        );

        // The same bad content is reported once, not on every poll.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        watcher.stop().await;
    }

    #[tokio::test]
    async fn test_delete_and_recreate() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "first", 1883);

        let io_errors = Arc::new(AtomicUsize::new(0));
        let io_errors_clone = Arc::clone(&io_errors);
        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::with_handler(move |err| {
                if matches!(err, LoggerError::WatcherIo { .. }) {
                    io_errors_clone.fetch_add(1, Ordering::SeqCst);
                }
            }),
            &Handle::current(),
        )
        .unwrap();

        fs::remove_file(&config_path).unwrap();
        assert!(wait_for(|| io_errors.load(Ordering::SeqCst) > 0).await);
        assert_eq!(store.read().unwrap().topic(), "first");

        // A missing file is reported once per outage, not on every poll.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(io_errors.load(Ordering::SeqCst), 1);

        write_config(&config_path, "recreated", 1884);
        assert!(wait_for(|| store.read().unwrap().topic() == "recreated").await);

        watcher.stop().await;
    }

    #[tokio::test]
    async fn test_start_with_installs_given_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "on-disk", 1883);

        let loader = SnapshotLoader::new(&config_path).unwrap();
        let content = b"topic: parsed\nbroker: localhost\nport: 1883\nsource: tests\n";
        let snapshot = loader.parse(content).unwrap();

        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start_with(
            loader,
            content,
            snapshot,
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::new(),
            &Handle::current(),
        );

        // Installed without touching the file.
        assert_eq!(store.read().unwrap().topic(), "parsed");

        // The file differs from the content it was started with.
        assert!(wait_for(|| store.read().unwrap().topic() == "on-disk").await);
        watcher.stop().await;
    }

    #[tokio::test]
    async fn test_stop_ends_task() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "first", 1883);

        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            fast_options(),
            ErrorChannel::new(),
            &Handle::current(),
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(1), watcher.stop())
            .await
            .unwrap();

        write_config(&config_path, "after-stop", 1883);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(store.read().unwrap().topic(), "first");
    }

    #[cfg(feature = "file-watch")]
    #[tokio::test]
    async fn test_fs_event_triggers_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        write_config(&config_path, "first", 1883);

        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::start(
            SnapshotLoader::new(&config_path).unwrap(),
            Arc::clone(&store),
            WatchOptions {
                // Long enough that only a filesystem event can explain the reload.
                poll_interval: Duration::from_secs(60),
                debounce: Duration::from_millis(20),
                fs_events: true,
            },
            ErrorChannel::new(),
            &Handle::current(),
        )
        .unwrap();

        write_config(&config_path, "second", 1883);

        assert!(wait_for(|| store.read().unwrap().topic() == "second").await);
        watcher.stop().await;
    }
}
