//! Parsing lines of hosts files.
//!
//! The format is that of the `/etc/hosts` file: one record per line, an
//! address followed by one or more host names, with `#` starting a
//! comment either at the beginning of the line or within the list of
//! names.

use std::net::IpAddr;
use std::str::FromStr;
use std::vec::Vec;

use tracing::trace;

//------------ HostEntry -----------------------------------------------------

/// A single parsed line of a hosts file.
///
/// An entry always has at least one host name. Entries only live for as
/// long as it takes to fold them into a [`HostTable`].
///
/// [`HostTable`]: crate::table::HostTable
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostEntry {
    addr: IpAddr,
    names: Vec<String>,
}

impl HostEntry {
    /// Parses a single line.
    ///
    /// Returns `None` for blank lines, comment lines, lines whose first
    /// field isn't an IP address, and lines without any host names.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut fields = line.split_whitespace();
        let addr = fields.next()?;
        let addr = match IpAddr::from_str(addr) {
            Ok(addr) => canonical_addr(addr),
            Err(_) => {
                trace!("skipping line with malformed address: {line:?}");
                return None;
            }
        };

        let mut names = Vec::new();
        for name in fields {
            if name.is_empty() {
                break;
            }
            match name.find('#') {
                Some(0) => break,
                Some(pos) => {
                    names.push(name[..pos].into());
                    break;
                }
                None => names.push(name.into()),
            }
        }

        if names.is_empty() {
            return None;
        }
        Some(HostEntry { addr, names })
    }

    /// Returns the address of the entry.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the host names of the entry in the order they appeared.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns an iterator over the address and host name pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (IpAddr, &str)> + '_ {
        self.names.iter().map(move |name| (self.addr, name.as_str()))
    }
}

//------------ canonical_addr ------------------------------------------------

/// Returns the canonical form of an address.
///
/// IPv4-mapped IPv6 addresses are turned into plain IPv4 addresses so that
/// `::ffff:127.0.0.1` and `127.0.0.1` are considered the same address.
/// Everything else is returned unchanged.
pub fn canonical_addr(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => addr,
        },
        IpAddr::V4(_) => addr,
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[rstest]
    #[case("1.2.3.4 alpha beta", &["alpha", "beta"])]
    #[case("  1.2.3.4\talpha   beta  ", &["alpha", "beta"])]
    #[case("1.2.3.4 name #comment", &["name"])]
    #[case("1.2.3.4 name#comment other", &["name"])]
    #[case("1.2.3.4 one two#x three", &["one", "two"])]
    fn names(#[case] line: &str, #[case] expected: &[&str]) {
        let entry = HostEntry::parse_line(line).unwrap();
        assert_eq!(entry.addr(), IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)));
        assert_eq!(entry.names(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# 1.2.3.4 commented")]
    #[case("   # indented comment")]
    #[case("1.2.3.4")]
    #[case("5.5.5.5 #name")]
    #[case("5.5.5.5 #name other")]
    #[case("not-an-address host")]
    #[case("1.2.3 host")]
    #[case("300.1.1.1 host")]
    #[case("001.002.003.004 host")]
    fn nothing(#[case] line: &str) {
        assert_eq!(HostEntry::parse_line(line), None);
    }

    #[test]
    fn ipv6() {
        let entry =
            HostEntry::parse_line("::1 localhost ip6-localhost").unwrap();
        assert_eq!(entry.addr(), IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(
            entry.pairs().collect::<Vec<_>>(),
            [
                (IpAddr::V6(Ipv6Addr::LOCALHOST), "localhost"),
                (IpAddr::V6(Ipv6Addr::LOCALHOST), "ip6-localhost"),
            ]
        );
    }

    #[test]
    fn mapped_ipv4() {
        let entry = HostEntry::parse_line("::ffff:10.0.0.1 mapped").unwrap();
        assert_eq!(entry.addr(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));

        // IPv4-compatible addresses are deprecated and left alone.
        let entry = HostEntry::parse_line("::10.0.0.1 compat").unwrap();
        assert!(entry.addr().is_ipv6());
    }
}
