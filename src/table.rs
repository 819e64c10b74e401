//! The static host table.
//!
//! A [`HostTable`] holds the forward and reverse mappings built from a set
//! of hosts files. Tables are built completely off to the side and then
//! published as a whole, so once built they are never modified again.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::vec::Vec;

use tracing::{debug, error, trace};

use crate::error::Error;
use crate::parse::{canonical_addr, HostEntry};

//------------ ForwardTable and ReverseTable ---------------------------------

/// The mapping from host names to their addresses.
pub type ForwardTable = HashMap<String, Vec<IpAddr>>;

/// The mapping from the string form of addresses to their host names.
pub type ReverseTable = HashMap<String, Vec<String>>;

//------------ HostTable -----------------------------------------------------

/// A forward and reverse host table.
///
/// The forward table maps a host name, compared exactly as written, to the
/// addresses listed for it. The reverse table maps the canonical string
/// form of an address to the host names listed for it. In both, entries
/// keep the order in which they were first seen and duplicates are
/// dropped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HostTable {
    forward: ForwardTable,
    reverse: ReverseTable,
}

/// # Creation and Manipulation
///
impl HostTable {
    /// Creates a new, empty host table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host name to address mapping in both directions.
    ///
    /// The address is only added to the list of the host name if no equal
    /// address is already present. Likewise, the host name is only added
    /// to the list of the address if it isn't there yet.
    pub fn add(&mut self, addr: IpAddr, name: &str) {
        let addr = canonical_addr(addr);
        self.add_forward(name, addr);
        self.add_reverse(addr, name);
    }

    /// Adds all the pairs of a parsed line.
    pub fn add_entry(&mut self, entry: &HostEntry) {
        for (addr, name) in entry.pairs() {
            self.add(addr, name);
        }
    }

    fn add_forward(&mut self, name: &str, addr: IpAddr) {
        let addrs = self.forward.entry(name.into()).or_default();
        if !addrs.contains(&addr) {
            addrs.push(addr);
            trace!("added {addr} -> {name}");
        }
    }

    fn add_reverse(&mut self, addr: IpAddr, name: &str) {
        let names = self.reverse.entry(addr.to_string()).or_default();
        if !names.iter().any(|item| item == name) {
            names.push(name.into());
            trace!("added reverse-address {addr} -> {name}");
        }
    }
}

/// # Lookups
///
impl HostTable {
    /// Returns the addresses of a host.
    pub fn lookup_host(&self, name: &str) -> Option<&[IpAddr]> {
        self.forward.get(name).map(Vec::as_slice)
    }

    /// Returns the host names of an address.
    pub fn lookup_addr(&self, addr: IpAddr) -> Option<&[String]> {
        self.reverse
            .get(&canonical_addr(addr).to_string())
            .map(Vec::as_slice)
    }

    /// Returns a reference to the forward table.
    pub fn forward(&self) -> &ForwardTable {
        &self.forward
    }

    /// Returns a reference to the reverse table.
    pub fn reverse(&self) -> &ReverseTable {
        &self.reverse
    }

    /// Returns the number of host names in the table.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// # Parsing Hosts Files
///
impl HostTable {
    /// Reads hosts from a reader and adds them.
    ///
    /// Lines that cannot be parsed are skipped. Lines that aren’t valid
    /// UTF-8 are decoded lossily, so that stray bytes in a comment don’t
    /// cost the entry before it. Returns the number of lines that
    /// contributed at least one host name.
    pub fn parse<R: BufRead>(
        &mut self,
        mut reader: R,
    ) -> Result<usize, io::Error> {
        let mut count = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                trace!("line with invalid UTF-8: {line:?}");
            }
            if let Some(entry) = HostEntry::parse_line(&line) {
                self.add_entry(&entry);
                count += 1;
            }
        }
        Ok(count)
    }

    /// Adds the hosts listed in a file.
    ///
    /// If reading fails half way through, the lines read so far stay in
    /// the table.
    pub fn parse_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<usize, Error> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|err| Error::io(path, err))?;
        debug!("loading hosts from file {}", path.display());
        self.parse(io::BufReader::new(file))
            .map_err(|err| Error::io(path, err))
    }

    /// Builds a complete table from a hosts file and override directories.
    ///
    /// This is one full refresh cycle. The hosts file is read first, then
    /// the direct children of each directory in the given order, sorted
    /// by file name within each directory. Subdirectories are not
    /// descended into.
    ///
    /// Files that cannot be read are logged and skipped. A directory that
    /// doesn’t exist is skipped silently since override directories are
    /// optional.
    pub fn load_sources<P: AsRef<Path>>(
        hosts_path: &Path,
        dirs: &[P],
    ) -> Self {
        let mut res = Self::new();
        res.load_logged(hosts_path);
        for dir in dirs {
            let dir = dir.as_ref();
            match dir_files(dir) {
                Ok(files) => {
                    for path in files {
                        res.load_logged(&path);
                    }
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    error!("opening directory: {err}");
                }
            }
        }
        res
    }

    fn load_logged(&mut self, path: &Path) {
        if let Err(err) = self.parse_file(path) {
            error!("{err}");
        }
    }
}

//------------ Helper Functions ----------------------------------------------

/// Returns the paths of all files directly inside `dir` sorted by name.
fn dir_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut res = Vec::new();
    let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| Error::io(dir, err))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        res.push(path);
    }
    res.sort();
    Ok(res)
}

//============ Testing =======================================================
