//! A live static host table for DNS resolvers.
//!
//! This crate reads host names and addresses from files in the format of
//! the system’s `/etc/hosts` file and answers forward and reverse queries
//! from them. The files are watched for changes and the table is rebuilt
//! whenever one of them is written to.
//!
//! The main type is [`HostsContainer`]. It is created from a [`Config`]
//! which names a primary hosts file and optionally a number of override
//! directories whose files are read after the primary file. By default,
//! the config is derived from the platform the process is running on.
//!
//! ```no_run
//! use domain::base::iana::Rtype;
//! use domain_hosts::{Config, HostsContainer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hosts = HostsContainer::new(Config::new("/etc/hosts"));
//!     hosts.set_on_changed(|| println!("hosts reloaded"));
//!     hosts.start();
//!
//!     let addrs = hosts.process("localhost", Rtype::A);
//!     let names =
//!         hosts.process_reverse("1.0.0.127.in-addr.arpa.", Rtype::PTR);
//!     println!("{addrs:?} {names:?}");
//!
//!     hosts.close().await;
//! }
//! ```
//!
//! # Modules
//!
//! * [parse] parses single lines of hosts files,
//! * [table] contains the [`HostTable`] built from a set of files,
//! * [store] publishes complete tables to concurrent readers,
//! * [watch] observes the files and triggers reloads,
//! * [reverse] converts between addresses and reverse lookup names,
//! * [conf] contains the configuration, and
//! * [error] contains the error type.
//!
//! The crate logs through [tracing](https://docs.rs/tracing). Problems
//! with individual files never cause lookups to fail; they are logged and
//! the files in question are skipped.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod conf;
pub mod container;
pub mod error;
pub mod parse;
pub mod reverse;
pub mod store;
pub mod table;
pub mod watch;

pub use self::conf::{Config, Platform};
pub use self::container::HostsContainer;
pub use self::error::Error;
pub use self::table::HostTable;
