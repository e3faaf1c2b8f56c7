//! Known-bot registry.
//!
//! Definitions are loaded once from a JSON document (the bundled one or
//! caller-supplied files) and compiled into an immutable registry:
//! User-Agent regexes precompiled, CIDR prefixes preparsed. The
//! registry is read-only after construction and safe for concurrent
//! reads without synchronization.

use crate::config::RegistrySettings;
use crate::matcher;
use crate::ranges::PrefixSet;
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BUNDLED_BOTS: &str = include_str!("../data/bots.json");
static BUNDLED_HOSTILE: &str = include_str!("../data/hostile.json");

/// How a bot's claimed identity is verified against its network origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    /// The User-Agent match alone is sufficient
    #[serde(rename = "identityOnly")]
    IdentityOnly,
    /// Forward-confirmed reverse DNS against authorized domain suffixes
    #[serde(rename = "reverseDnsForwardConfirm")]
    ReverseDnsForwardConfirm,
    /// Source address containment in authorized CIDR prefixes
    #[serde(rename = "cidrMatch")]
    CidrMatch,
    /// Source address ASN membership in authorized ASNs
    #[serde(rename = "asnMatch")]
    AsnMatch,
}

/// A bot definition as it appears in the registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDefinition {
    /// Display name (e.g., "Googlebot")
    pub name: String,

    /// Verification method for this bot
    pub method: VerificationMethod,

    /// Authorized sources; meaning depends on `method`: domain suffixes
    /// (reverseDnsForwardConfirm), CIDR prefixes (cidrMatch), ASN
    /// numbers (asnMatch). Unused for identityOnly.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Regex tested case-insensitively against the User-Agent
    pub ua_pattern: String,
}

/// A hostile User-Agent pattern (scanners, attack tools).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostilePattern {
    pub name: String,
    pub pattern: String,
}

/// A bot definition with its pattern and prefixes compiled.
#[derive(Debug)]
pub struct CompiledBot {
    pub name: String,
    pub method: VerificationMethod,
    pub sources: Vec<String>,
    pub prefixes: PrefixSet,
    ua_pattern: Regex,
}

impl CompiledBot {
    /// Compile a definition. Returns `None` when the User-Agent pattern
    /// fails to compile; the definition is then absent from the
    /// registry rather than failing the load.
    fn compile(def: BotDefinition) -> Option<Self> {
        let ua_pattern = matcher::compile_ua_pattern(&def.ua_pattern)?;
        let prefixes = match def.method {
            VerificationMethod::CidrMatch => PrefixSet::new(&def.sources),
            _ => PrefixSet::default(),
        };
        Some(Self {
            name: def.name,
            method: def.method,
            sources: def.sources,
            prefixes,
            ua_pattern,
        })
    }

    /// Test a User-Agent string against this definition's pattern.
    pub fn matches_user_agent(&self, user_agent: &str) -> bool {
        self.ua_pattern.is_match(user_agent)
    }
}

#[derive(Debug)]
struct CompiledHostile {
    name: String,
    pattern: Regex,
}

/// Immutable set of known-bot definitions and hostile patterns.
pub struct Registry {
    bots: Vec<CompiledBot>,
    hostile: Vec<CompiledHostile>,
}

impl Registry {
    /// Build a registry from already-deserialized definitions.
    ///
    /// Entries whose pattern fails to compile are dropped.
    pub fn new(definitions: Vec<BotDefinition>, hostile: Vec<HostilePattern>) -> Self {
        let bots = definitions.into_iter().filter_map(CompiledBot::compile).collect();
        let hostile = hostile
            .into_iter()
            .filter_map(|h| {
                let pattern = matcher::compile_ua_pattern(&h.pattern)?;
                Some(CompiledHostile { name: h.name, pattern })
            })
            .collect();
        Self { bots, hostile }
    }

    /// Parse registry documents. A malformed document is an error; the
    /// process cannot start without a valid registry.
    pub fn from_json(bots_json: &str, hostile_json: &str) -> anyhow::Result<Self> {
        let definitions: Vec<BotDefinition> =
            serde_json::from_str(bots_json).context("failed to parse bot registry document")?;
        let hostile: Vec<HostilePattern> = serde_json::from_str(hostile_json)
            .context("failed to parse hostile pattern document")?;
        Ok(Self::new(definitions, hostile))
    }

    /// Load registry documents per the configured overrides, falling
    /// back to the bundled documents where no path is given.
    pub fn load(settings: &RegistrySettings) -> anyhow::Result<Self> {
        let bots_json = match &settings.bots_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => BUNDLED_BOTS.to_string(),
        };
        let hostile_json = match &settings.hostile_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => BUNDLED_HOSTILE.to_string(),
        };
        Self::from_json(&bots_json, &hostile_json)
    }

    /// The registry bundled into the binary.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_BOTS, BUNDLED_HOSTILE).expect("bundled registry documents are well-formed")
    }

    /// All compiled definitions.
    pub fn bots(&self) -> &[CompiledBot] {
        &self.bots
    }

    /// Indices of definitions whose pattern matches the User-Agent.
    pub fn candidates(&self, user_agent: &str) -> Vec<usize> {
        self.bots
            .iter()
            .enumerate()
            .filter(|(_, bot)| bot.matches_user_agent(user_agent))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Name of the first hostile pattern matching the User-Agent.
    pub fn hostile_match(&self, user_agent: &str) -> Option<&str> {
        self.hostile
            .iter()
            .find(|h| h.pattern.is_match(user_agent))
            .map(|h| h.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}
