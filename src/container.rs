//! The hosts container.
//!
//! A [`HostsContainer`] ties everything together: it loads the configured
//! hosts files into a [`HostTable`], publishes it, keeps it up to date
//! via a [`FileWatcher`], and answers forward and reverse queries from
//! whatever table is current.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::vec::Vec;

use arc_swap::ArcSwapOption;
use domain::base::iana::Rtype;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::conf::Config;
use crate::reverse::addr_from_reverse_name;
use crate::store::SnapshotStore;
use crate::table::{HostTable, ReverseTable};
use crate::watch::FileWatcher;

//------------ OnChanged -----------------------------------------------------

/// The type of the callback invoked after the table was reloaded.
type OnChanged = Box<dyn Fn() + Send + Sync>;

//------------ HostsContainer ------------------------------------------------

/// A live host table backed by hosts files.
///
/// Creating a container loads the configured files once. Calling
/// [`start`](Self::start) from within a Tokio runtime additionally starts
/// watching the files and reloads them whenever they are written to.
///
/// All lookup methods can be called concurrently from any number of
/// threads. They never wait for a reload; each lookup sees the table of
/// one complete reload.
pub struct HostsContainer {
    /// The state shared with the watcher tasks.
    shared: Arc<Shared>,

    /// The file watcher if it is running.
    watcher: Mutex<Option<FileWatcher>>,
}

/// # Creation and Lifecycle
///
impl HostsContainer {
    /// Creates a new container and loads the hosts files.
    pub fn new(conf: Config) -> Self {
        let shared = Shared {
            store: SnapshotStore::new(load(&conf)),
            conf,
            on_changed: ArcSwapOption::empty(),
        };
        HostsContainer {
            shared: Arc::new(shared),
            watcher: Mutex::new(None),
        }
    }

    /// Creates a container for the platform with a different hosts file.
    pub fn with_hosts_path(path: impl Into<PathBuf>) -> Self {
        let mut conf = Config::default();
        conf.set_hosts_path(path);
        Self::new(conf)
    }

    /// Returns the configuration of the container.
    pub fn config(&self) -> &Config {
        &self.shared.conf
    }

    /// Sets the callback invoked after each reload.
    ///
    /// There can only be one callback. Setting a new one replaces the
    /// previous one. The callback is invoked on the thread that did the
    /// reload right after the new table was published.
    pub fn set_on_changed<F>(&self, on_changed: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let on_changed: OnChanged = Box::new(on_changed);
        self.shared.on_changed.store(Some(Arc::new(on_changed)));
    }

    /// Removes the callback.
    pub fn clear_on_changed(&self) {
        self.shared.on_changed.store(None);
    }

    /// Reloads the table and starts watching the hosts files.
    ///
    /// If watching isn’t possible, for instance because there is no Tokio
    /// runtime or the platform’s notification mechanism is unavailable,
    /// the failure is logged and the container keeps serving the table it
    /// has. Calling this method again while watching only reloads.
    pub fn start(&self) {
        debug!("starting hosts container");
        self.shared.reload();

        let mut watcher = self.watcher.lock();
        if watcher.is_some() {
            return;
        }
        let shared = self.shared.clone();
        let reload = move || shared.reload();
        match FileWatcher::start(&self.shared.conf, reload) {
            Ok(started) => *watcher = Some(started),
            Err(err) => {
                error!("hosts files will not be reloaded: {err}");
            }
        }
    }

    /// Returns whether the hosts files are being watched.
    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }

    /// Reloads the table right away.
    pub fn reload(&self) {
        self.shared.reload()
    }

    /// Stops watching the hosts files.
    ///
    /// The current table stays in place and lookups keep working.
    pub async fn close(&self) {
        let watcher = self.watcher.lock().take();
        if let Some(watcher) = watcher {
            watcher.close().await;
        }
    }
}

/// # Lookups
///
impl HostsContainer {
    /// Returns the addresses for a host name.
    ///
    /// Returns `None` if the host is unknown or if `qtype` is
    /// [`Rtype::PTR`], which is answered by
    /// [`process_reverse`](Self::process_reverse) instead.
    pub fn process(&self, host: &str, qtype: Rtype) -> Option<Vec<IpAddr>> {
        if qtype == Rtype::PTR {
            return None;
        }
        let table = self.shared.store.current();
        let addrs = table.lookup_host(host)?.to_vec();
        debug!("answer: {host} -> {addrs:?}");
        Some(addrs)
    }

    /// Returns the host names for a reverse lookup name.
    ///
    /// The `qname` is a name under `in-addr.arpa` or `ip6.arpa`. Returns
    /// `None` if `qtype` isn’t [`Rtype::PTR`], if `qname` doesn’t encode
    /// an address, or if the address is unknown.
    pub fn process_reverse(
        &self,
        qname: &str,
        qtype: Rtype,
    ) -> Option<Vec<String>> {
        if qtype != Rtype::PTR {
            return None;
        }
        let addr = addr_from_reverse_name(qname)?;
        let table = self.shared.store.current();
        let names = table.lookup_addr(addr)?;
        if names.is_empty() {
            return None;
        }
        debug!("reverse-lookup: {qname} -> {names:?}");
        Some(names.to_vec())
    }

    /// Returns a copy of the complete address to host names table.
    pub fn list(&self) -> ReverseTable {
        self.shared.store.current().reverse().clone()
    }

    /// Returns the current table.
    ///
    /// The table stays valid and unchanged for as long as it is held even
    /// if the container reloads in the meantime.
    pub fn snapshot(&self) -> Arc<HostTable> {
        self.shared.store.current()
    }
}

//--- Default

impl Default for HostsContainer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

//------------ Shared --------------------------------------------------------

/// The part of a container shared with the watcher tasks.
struct Shared {
    conf: Config,
    store: SnapshotStore,
    on_changed: ArcSwapOption<OnChanged>,
}

impl Shared {
    /// Runs a complete reload cycle.
    fn reload(&self) {
        self.store.publish(load(&self.conf));
        if let Some(on_changed) = self.on_changed.load_full() {
            (**on_changed)();
        }
    }
}

//------------ Helper Functions ----------------------------------------------

fn load(conf: &Config) -> HostTable {
    let table =
        HostTable::load_sources(conf.hosts_path(), conf.override_dirs());
    debug!(
        hosts = table.len(),
        addrs = table.reverse().len(),
        "loaded hosts files"
    );
    table
}
