//! Configuration of a hosts container.
//!
//! Which files are read by default depends on the platform. The platform
//! is described by a [`Platform`] value that is consulted exactly once
//! when creating a [`Config`] via [`Config::for_platform`]. After that,
//! nothing in the crate looks at the platform again.

use std::cmp;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::vec::Vec;

//------------ Module Configuration ------------------------------------------

/// The default hosts file on Unix-y systems.
const UNIX_HOSTS_PATH: &str = "/etc/hosts";

/// The hosts file on Windows relative to the system root directory.
const WINDOWS_HOSTS_PATH: &str = r"system32\drivers\etc\hosts";

/// The system root directory on Windows if `SystemRoot` isn’t set.
const WINDOWS_SYSTEM_ROOT: &str = r"C:\Windows";

/// The directory OpenWrt’s dnsmasq writes additional hosts files to.
///
/// It contains files like `/tmp/hosts/dhcp.cfg01411c`.
const OPENWRT_HOSTS_DIR: &str = "/tmp/hosts";

/// The capacity of the queue for pending write events.
///
/// The value has to be between 1 and 1024. The default value is 2.
const QUEUE_CAPACITY: DefMinMax<usize> = DefMinMax::new(2, 1, 1024);

/// The time without write events that ends a burst.
///
/// The value has to be between zero and ten seconds. The default value is
/// 100 milliseconds. With zero, only the events already queued when the
/// first one is picked up are folded into a reload.
const SETTLE_DELAY: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_millis(100),
    Duration::ZERO,
    Duration::from_secs(10),
);

//------------ Platform ------------------------------------------------------

/// A description of the platform the container runs on.
///
/// Only the properties that influence where hosts files are looked for
/// are included.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Platform {
    /// The platform is Windows.
    pub windows: bool,

    /// The platform is OpenWrt which keeps additional hosts files in
    /// `/tmp/hosts`.
    pub openwrt: bool,
}

impl Platform {
    /// Determines the platform the process is running on.
    ///
    /// OpenWrt is detected by its name appearing in `/etc/os-release`.
    pub fn detect() -> Self {
        Platform {
            windows: cfg!(windows),
            openwrt: !cfg!(windows) && Self::os_release_mentions("OpenWrt"),
        }
    }

    fn os_release_mentions(name: &str) -> bool {
        fs::read_to_string("/etc/os-release")
            .map(|content| content.contains(name))
            .unwrap_or(false)
    }
}

//------------ Config --------------------------------------------------------

/// Configuration for a [`HostsContainer`].
///
/// [`HostsContainer`]: crate::HostsContainer
#[derive(Clone, Debug)]
pub struct Config {
    /// The path of the primary hosts file.
    hosts_path: PathBuf,

    /// Directories whose files are additional hosts files.
    override_dirs: Vec<PathBuf>,

    /// The capacity of the queue of pending write events.
    queue_capacity: usize,

    /// The time without write events that ends a burst.
    settle_delay: Duration,
}

impl Config {
    /// Creates a new config for the given hosts file.
    ///
    /// The config has no override directories.
    pub fn new(hosts_path: impl Into<PathBuf>) -> Self {
        Config {
            hosts_path: hosts_path.into(),
            override_dirs: Vec::new(),
            queue_capacity: QUEUE_CAPACITY.default(),
            settle_delay: SETTLE_DELAY.default(),
        }
    }

    /// Creates the default config for the given platform.
    ///
    /// On Windows, the hosts file is
    /// `%SystemRoot%\system32\drivers\etc\hosts`, everywhere else it is
    /// `/etc/hosts`. On OpenWrt, the files in `/tmp/hosts` are read as
    /// well.
    pub fn for_platform(platform: Platform) -> Self {
        let mut res = if platform.windows {
            let root = env::var_os("SystemRoot")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(WINDOWS_SYSTEM_ROOT));
            Self::new(root.join(WINDOWS_HOSTS_PATH))
        } else {
            Self::new(UNIX_HOSTS_PATH)
        };
        if platform.openwrt {
            res.add_override_dir(OPENWRT_HOSTS_DIR);
        }
        res
    }

    /// Returns the path of the primary hosts file.
    pub fn hosts_path(&self) -> &Path {
        &self.hosts_path
    }

    /// Sets the path of the primary hosts file.
    pub fn set_hosts_path(&mut self, path: impl Into<PathBuf>) {
        self.hosts_path = path.into();
    }

    /// Returns the override directories.
    pub fn override_dirs(&self) -> &[PathBuf] {
        &self.override_dirs
    }

    /// Adds an override directory.
    ///
    /// Directories are read in the order they were added, all of them
    /// after the primary hosts file. They don’t need to exist.
    pub fn add_override_dir(&mut self, dir: impl Into<PathBuf>) {
        self.override_dirs.push(dir.into())
    }

    /// Returns the capacity of the queue of pending write events.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Sets the capacity of the queue of pending write events.
    ///
    /// The value has to be between 1 and 1024. The default value is 2.
    /// Since queued events are collapsed into a single reload anyway, there
    /// is little point in a large queue.
    pub fn set_queue_capacity(&mut self, value: usize) {
        self.queue_capacity = QUEUE_CAPACITY.limit(value);
    }

    /// Returns the time without write events that ends a burst.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Sets the time without write events that ends a burst.
    ///
    /// A reload only happens once no write event has arrived for this
    /// long, so all writes of a burst are folded into a single reload.
    /// The value has to be at most ten seconds. The default value is 100
    /// milliseconds.
    pub fn set_settle_delay(&mut self, value: Duration) {
        self.settle_delay = SETTLE_DELAY.limit(value);
    }
}

//--- Default

impl Default for Config {
    fn default() -> Self {
        Self::for_platform(Platform::detect())
    }
}

//------------ DefMinMax -----------------------------------------------------

/// The default, minimum, and maximum values for a config variable.
#[derive(Clone, Copy)]
struct DefMinMax<T> {
    def: T,
    min: T,
    max: T,
}

impl<T> DefMinMax<T> {
    const fn new(def: T, min: T, max: T) -> Self {
        Self { def, min, max }
    }

    fn default(self) -> T {
        self.def
    }

    /// Trims the given value to fit into the minimum/maximum range.
    fn limit(self, value: T) -> T
    where
        T: Ord,
    {
        cmp::max(self.min, cmp::min(self.max, value))
    }
}

//============ Testing =======================================================
