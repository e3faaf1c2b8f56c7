//! Network resolution capability.
//!
//! The verification engine depends only on the [`NetworkResolver`]
//! trait; production binds [`DnsResolver`], tests substitute scripted
//! doubles. Every operation swallows its own failures and degrades to
//! an empty result — a failed lookup is indistinguishable from "nothing
//! found" at the trait boundary, by contract (the engine treats both as
//! inconclusive). Failures are still visible at `debug` level in the
//! traces.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::config::ResolverSettings;

/// Network lookups used to verify a claimed bot identity.
///
/// Implementations may block on external I/O. None of the operations
/// return errors: resolution failure degrades to an empty/`false`/`None`
/// result.
#[async_trait]
pub trait NetworkResolver: Send + Sync {
    /// Reverse-resolve an address to its hostnames (PTR lookup).
    /// Empty on failure or when no records exist.
    async fn reverse_hosts(&self, address: IpAddr) -> Vec<String>;

    /// Resolve `hostname` forward and report whether any resulting
    /// address equals `address`. Defeats forged reverse records.
    async fn forward_confirms(&self, address: IpAddr, hostname: &str) -> bool;

    /// Look up the ASN owning the address. `None` on failure.
    async fn lookup_asn(&self, address: IpAddr) -> Option<String>;
}

/// Production resolver over system DNS.
///
/// ASN lookups go through the Team Cymru IP-to-ASN mapping service
/// (`origin.asn.cymru.com` TXT records), so everything rides the same
/// DNS transport.
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Create a resolver with the system default configuration.
    pub fn system() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    /// Create a resolver with explicit timeout and retry settings.
    pub fn new(settings: &ResolverSettings) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(settings.timeout_ms);
        opts.attempts = settings.attempts;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

#[async_trait]
impl NetworkResolver for DnsResolver {
    async fn reverse_hosts(&self, address: IpAddr) -> Vec<String> {
        match self.resolver.reverse_lookup(address).await {
            Ok(names) => names.iter().map(|name| name.to_string()).collect(),
            Err(error) => {
                debug!(%address, %error, "reverse lookup failed");
                Vec::new()
            }
        }
    }

    async fn forward_confirms(&self, address: IpAddr, hostname: &str) -> bool {
        match self.resolver.lookup_ip(hostname).await {
            Ok(addresses) => addresses.iter().any(|resolved| resolved == address),
            Err(error) => {
                debug!(hostname, %error, "forward lookup failed");
                false
            }
        }
    }

    async fn lookup_asn(&self, address: IpAddr) -> Option<String> {
        let query = cymru_origin_query(address);
        let records = match self.resolver.txt_lookup(query).await {
            Ok(records) => records,
            Err(error) => {
                debug!(%address, %error, "asn lookup failed");
                return None;
            }
        };
        let record = records.iter().next()?.to_string();
        parse_cymru_asn(&record)
    }
}

/// Build the Cymru origin query name for an address.
///
/// IPv4 `8.8.8.8` becomes `8.8.8.8.origin.asn.cymru.com.` with octets
/// reversed; IPv6 uses nibble-reversed `origin6` form.
fn cymru_origin_query(address: IpAddr) -> String {
    match address {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            format!("{}.{}.{}.{}.origin.asn.cymru.com.", o[3], o[2], o[1], o[0])
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(64 + 24);
            for byte in v6.octets().iter().rev() {
                name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
            }
            name.push_str("origin6.asn.cymru.com.");
            name
        }
    }
}

/// Extract the ASN from a Cymru origin TXT record.
///
/// Records look like `"15169 | 8.8.8.0/24 | US | arin | 1992-12-01"`;
/// multi-origin prefixes list several ASNs in the first field, the
/// first one wins.
fn parse_cymru_asn(record: &str) -> Option<String> {
    record
        .split('|')
        .next()?
        .split_whitespace()
        .next()
        .map(|asn| asn.to_string())
}
