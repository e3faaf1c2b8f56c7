//! CIDR containment tests for address verification.

use ipnet::IpNet;
use std::net::IpAddr;

/// A preparsed set of CIDR prefixes.
///
/// Malformed prefixes are skipped at construction rather than surfaced;
/// a definition with only malformed prefixes simply never contains any
/// address.
#[derive(Debug, Clone, Default)]
pub struct PrefixSet {
    nets: Vec<IpNet>,
}

impl PrefixSet {
    /// Parse a list of CIDR prefix strings, skipping ones that fail to parse.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nets = prefixes
            .into_iter()
            .filter_map(|p| p.as_ref().parse().ok())
            .collect();
        Self { nets }
    }

    /// Test whether any prefix in the set contains the address.
    pub fn contains(&self, address: IpAddr) -> bool {
        self.nets.iter().any(|net| net.contains(&address))
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }
}
