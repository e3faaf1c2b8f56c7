//! Crawler identity verification.
//!
//! Classifies an HTTP client from its claimed crawler identity (the
//! User-Agent string) and its source address. Known bots are verified
//! with the method their operator supports and classified as friendly,
//! potentially friendly, or a potential imposter; unrecognized clients
//! stay unknown.
//!
//! # Verification methods
//!
//! - Forward-confirmed reverse DNS against authorized domain suffixes
//! - Source address containment in authorized CIDR prefixes
//! - Source ASN membership
//! - Identity-only trust for bots without a verifiable origin
//!
//! Checks for all matching definitions run concurrently; the first
//! conclusive result wins and cancels the rest.
//!
//! # Example
//!
//! ```ignore
//! use botvet::check_bot_status;
//!
//! let outcome = check_bot_status(
//!     "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
//!     "66.249.66.1".parse()?,
//! )
//! .await;
//! println!("{} {}", outcome.status.as_str(), outcome.bot_name);
//! ```

pub mod bulk;
pub mod config;
pub mod engine;
pub mod matcher;
pub mod outcome;
pub mod ranges;
pub mod registry;
pub mod resolver;

pub use config::VerifierConfig;
pub use engine::{check_bot_status, default_verifier, BotVerifier};
pub use outcome::{BotStatus, VerificationOutcome};
pub use registry::{BotDefinition, HostilePattern, Registry, VerificationMethod};
pub use resolver::{DnsResolver, NetworkResolver};
