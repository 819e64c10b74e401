//! Watching hosts files for changes.
//!
//! The [`FileWatcher`] observes the primary hosts file and all override
//! directories through the platform’s native notification mechanism and
//! runs a reload action whenever their content has been written to.
//!
//! Two tasks are involved. The first one receives the raw events from the
//! notification mechanism, drops everything that isn’t a write, and
//! forwards the rest into a small, bounded queue. The second one waits for
//! events on that queue. When one arrives, it keeps taking events off the
//! queue until none have arrived for a short while and then runs the
//! action once. This way, a burst of writes leads to a single reload.

use core::future::Future;
use core::time::Duration;

use std::path::Path;
use std::sync::Arc;

use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::conf::Config;
use crate::error::Error;

//------------ FileWatcher ---------------------------------------------------

/// Watches hosts files and reloads them on change.
///
/// The watcher keeps running until [`close`](Self::close) is called or the
/// value is dropped.
pub struct FileWatcher {
    /// The native watcher feeding raw events to the filter task.
    watcher: RecommendedWatcher,

    /// Tells the filter task to stop.
    shutdown: watch::Sender<bool>,

    /// The task filtering raw events.
    filter: JoinHandle<()>,

    /// The task running reloads.
    reload: JoinHandle<()>,
}

impl FileWatcher {
    /// Starts watching the files named in `conf`.
    ///
    /// The `reload` closure runs on Tokio’s blocking thread pool once for
    /// every burst of write events. The watcher must be started from
    /// within a Tokio runtime.
    ///
    /// If the native watcher cannot be created, an error is returned. If
    /// only some of the paths cannot be watched, the failures are logged
    /// and the remaining paths are watched.
    pub fn start<F>(conf: &Config, reload: F) -> Result<Self, Error>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<Event>| {
                // The receiver is gone only after shutdown.
                let _ = raw_tx.send(res);
            },
        )?;

        watch_path(&mut watcher, conf.hosts_path());
        for dir in conf.override_dirs() {
            watch_path(&mut watcher, dir);
        }

        let (writes_tx, writes_rx) = mpsc::channel(conf.queue_capacity());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let filter =
            handle.spawn(filter_writes(raw_rx, writes_tx, shutdown_rx));

        let reload = Arc::new(reload);
        let reload = handle.spawn(coalesce(
            writes_rx,
            conf.settle_delay(),
            move || {
                let reload = reload.clone();
                async move {
                    if let Err(err) =
                        tokio::task::spawn_blocking(move || (*reload)()).await
                    {
                        error!("hosts reload panicked: {err}");
                    }
                }
            },
        ));

        Ok(FileWatcher {
            watcher,
            shutdown,
            filter,
            reload,
        })
    }

    /// Stops watching.
    ///
    /// Resolves once both background tasks have finished. A reload that
    /// is already in progress is run to completion first.
    pub async fn close(self) {
        let FileWatcher {
            watcher,
            shutdown,
            filter,
            reload,
        } = self;
        let _ = shutdown.send(true);
        drop(watcher);
        if let Err(err) = filter.await {
            error!("hosts watcher filter task failed: {err}");
        }
        if let Err(err) = reload.await {
            error!("hosts watcher reload task failed: {err}");
        }
        debug!("hosts watcher closed");
    }
}

//------------ is_write ------------------------------------------------------

/// Returns whether an event kind changes the content of the watched files.
///
/// Data modifications count, as do files being created or removed, since
/// both change what is read from an override directory. Metadata changes,
/// renames, and plain accesses do not.
pub fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
            | EventKind::Create(_)
            | EventKind::Remove(_)
    )
}

//------------ coalesce ------------------------------------------------------

/// Runs `action` once for every burst of events received on `writes`.
///
/// While idle, waits for the next event. Once one arrives, keeps taking
/// events off the queue until none has arrived for `settle`, then runs the
/// action exactly once before becoming idle again. With a zero `settle`,
/// only the events already queued are taken. Returns when the queue has
/// been closed and drained.
pub async fn coalesce<F, Fut>(
    mut writes: mpsc::Receiver<Event>,
    settle: Duration,
    mut action: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    while let Some(mut event) = writes.recv().await {
        let mut superseded = 0usize;
        while let Some(next) = next_in_burst(&mut writes, settle).await {
            event = next;
            superseded += 1;
        }
        debug!(
            superseded,
            "hosts modified: {}",
            DisplayPaths(&event.paths)
        );
        action().await;
    }
    trace!("write queue closed");
}

/// Returns the next event if it arrives within `settle`.
async fn next_in_burst(
    writes: &mut mpsc::Receiver<Event>,
    settle: Duration,
) -> Option<Event> {
    if settle.is_zero() {
        return writes.try_recv().ok();
    }
    tokio::time::timeout(settle, writes.recv())
        .await
        .ok()
        .flatten()
}

//------------ Helper Functions ----------------------------------------------

/// Forwards write events from `raw` to `writes`.
///
/// If the write queue is full, the event is dropped: a full queue already
/// guarantees another reload. Errors from the native watcher are logged.
async fn filter_writes(
    mut raw: mpsc::UnboundedReceiver<notify::Result<Event>>,
    writes: mpsc::Sender<Event>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let res = tokio::select! {
            res = raw.recv() => match res {
                Some(res) => res,
                None => break,
            },
            _ = shutdown.changed() => break,
        };
        match res {
            Ok(event) if is_write(&event.kind) => {
                match writes.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => {
                        trace!("write queue full, dropping {:?}", event.kind);
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            Ok(event) => {
                trace!("ignoring {:?} event", event.kind);
            }
            Err(err) => {
                error!("hosts watcher: {err}");
            }
        }
    }
    trace!("hosts watcher filter stopped");
}

/// Adds a path to the watcher, logging failure.
fn watch_path(watcher: &mut RecommendedWatcher, path: &Path) {
    match watcher.watch(path, RecursiveMode::NonRecursive) {
        Ok(()) => debug!("watching {}", path.display()),
        Err(err) => {
            let err = Error::from(err);
            if err.is_not_found() {
                debug!("not watching missing {}", path.display());
            } else {
                error!("watching {}: {err}", path.display());
            }
        }
    }
}

/// Helper for displaying the paths of an event.
struct DisplayPaths<'a>(&'a [std::path::PathBuf]);

impl std::fmt::Display for DisplayPaths<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for path in self.0 {
            if first {
                first = false;
            } else {
                f.write_str(", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

//============ Testing =======================================================
