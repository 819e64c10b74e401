//! Reverse lookup domain names.
//!
//! PTR queries for an address ask for a domain name made from the address
//! in reverse order under a special suffix: the four decimal octets of an
//! IPv4 address under `in-addr.arpa`, and the 32 hex nibbles of an IPv6
//! address under `ip6.arpa`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::{self, FromStr};
use std::string::{String, ToString};
use std::vec::Vec;

use domain::base::name::{Label, Name};

/// Converts a reverse lookup name back into the address it encodes.
///
/// The name is read in presentation format and may be absolute, i.e., end
/// in a dot. The suffix is matched ignoring ASCII case. Returns `None` if
/// the name isn’t a complete reverse name for a single address.
pub fn addr_from_reverse_name(name: &str) -> Option<IpAddr> {
    let name = Name::<Vec<u8>>::from_str(name).ok()?;
    let labels: Vec<&Label> =
        name.iter().filter(|label| !label.is_root()).collect();
    let (arpa, rest) = labels.split_last()?;
    let (kind, labels) = rest.split_last()?;
    if !arpa.as_slice().eq_ignore_ascii_case(b"arpa") {
        return None;
    }
    let kind = kind.as_slice();
    if kind.eq_ignore_ascii_case(b"in-addr") {
        addr_from_v4_labels(labels).map(IpAddr::V4)
    } else if kind.eq_ignore_ascii_case(b"ip6") {
        addr_from_v6_labels(labels).map(IpAddr::V6)
    } else {
        None
    }
}

/// Creates the reverse lookup name for an address.
///
/// The returned name is relative, i.e., has no final dot, and uses lower
/// case hex digits for IPv6.
pub fn reverse_name(addr: IpAddr) -> String {
    // At most 74 octets, well below the limit for names.
    Name::<Vec<u8>>::reverse_from_addr(addr)
        .expect("long reverse name")
        .to_string()
}

//------------ Helper Functions ----------------------------------------------

fn addr_from_v4_labels(labels: &[&Label]) -> Option<Ipv4Addr> {
    if labels.len() != 4 {
        return None;
    }
    let mut octets = [0u8; 4];
    for (idx, label) in labels.iter().enumerate() {
        let label = label.as_slice();
        if label.is_empty()
            || label.len() > 3
            || !label.iter().all(u8::is_ascii_digit)
        {
            return None;
        }
        octets[3 - idx] = str::from_utf8(label).ok()?.parse().ok()?;
    }
    Some(Ipv4Addr::from(octets))
}

fn addr_from_v6_labels(labels: &[&Label]) -> Option<Ipv6Addr> {
    if labels.len() != 32 {
        return None;
    }
    let mut octets = [0u8; 16];
    for (idx, label) in labels.iter().enumerate() {
        let nibble = match label.as_slice() {
            [ch] => char::from(*ch).to_digit(16)? as u8,
            _ => return None,
        };
        // Labels start with the least significant nibble.
        let pos = 15 - idx / 2;
        if idx % 2 == 0 {
            octets[pos] = nibble;
        } else {
            octets[pos] |= nibble << 4;
        }
    }
    Some(Ipv6Addr::from(octets))
}

//============ Testing =======================================================
