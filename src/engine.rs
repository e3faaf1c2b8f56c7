//! Verification engine.
//!
//! Classifies a claimed crawler identity plus its source address by
//! running the verification method of every matching registry
//! definition concurrently and taking the first conclusive result.

use crate::outcome::{BotStatus, VerificationOutcome};
use crate::registry::{CompiledBot, Registry, VerificationMethod};
use crate::resolver::{DnsResolver, NetworkResolver};
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Bot verification engine.
///
/// Holds shared ownership of an immutable [`Registry`] and a
/// [`NetworkResolver`]; a single instance serves any number of
/// concurrent [`classify`](Self::classify) calls.
pub struct BotVerifier {
    registry: Arc<Registry>,
    resolver: Arc<dyn NetworkResolver>,
}

impl BotVerifier {
    /// Create an engine bound to a registry and resolver.
    pub fn new(registry: Arc<Registry>, resolver: Arc<dyn NetworkResolver>) -> Self {
        Self { registry, resolver }
    }

    /// Classify a User-Agent / source address pair.
    pub async fn classify(&self, user_agent: &str, address: IpAddr) -> VerificationOutcome {
        self.classify_with_cancel(user_agent, address, &CancellationToken::new())
            .await
    }

    /// Classify with a caller-supplied cancellation token.
    ///
    /// One verification task is spawned per registry definition whose
    /// pattern matches the User-Agent; the first task to produce a
    /// conclusive status decides the outcome and the remaining tasks
    /// are cancelled. When `deadline` fires first, the call returns
    /// `Unknown` immediately and every in-flight task is abandoned.
    ///
    /// The bundled registry keeps its patterns mutually exclusive, so
    /// at most one task ever reaches a conclusive status and the
    /// outcome is deterministic; with overlapping patterns in a custom
    /// registry, whichever conclusive task finishes first wins.
    pub async fn classify_with_cancel(
        &self,
        user_agent: &str,
        address: IpAddr,
        deadline: &CancellationToken,
    ) -> VerificationOutcome {
        if deadline.is_cancelled() {
            return VerificationOutcome::unknown();
        }

        if let Some(name) = self.registry.hostile_match(user_agent) {
            debug!(user_agent, bot = name, "hostile pattern match");
            return VerificationOutcome::new(BotStatus::Unfriendly, name);
        }

        let candidates = self.registry.candidates(user_agent);
        if candidates.is_empty() {
            return VerificationOutcome::unknown();
        }

        let cancel = deadline.child_token();
        let (tx, mut rx) = mpsc::channel(candidates.len());

        for index in candidates {
            let registry = Arc::clone(&self.registry);
            let resolver = Arc::clone(&self.resolver);
            let token = cancel.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let bot = &registry.bots()[index];
                let status = tokio::select! {
                    _ = token.cancelled() => None,
                    status = verify_candidate(bot, resolver.as_ref(), address) => status,
                };
                if let Some(status) = status {
                    let _ = tx.send(VerificationOutcome::new(status, bot.name.clone())).await;
                }
            });
        }
        drop(tx);

        // First conclusive task wins; a closed channel means every task
        // concluded inconclusively.
        let outcome = tokio::select! {
            _ = cancel.cancelled() => VerificationOutcome::unknown(),
            first = rx.recv() => first.unwrap_or_else(VerificationOutcome::unknown),
        };
        cancel.cancel();

        debug!(
            user_agent,
            %address,
            status = outcome.status.as_str(),
            bot = %outcome.bot_name,
            "classification complete"
        );
        outcome
    }
}

/// Run one definition's verification method. `None` is inconclusive;
/// resolver failures surface here as empty results and therefore also
/// conclude inconclusively.
async fn verify_candidate(
    bot: &CompiledBot,
    resolver: &dyn NetworkResolver,
    address: IpAddr,
) -> Option<BotStatus> {
    match bot.method {
        VerificationMethod::IdentityOnly => Some(BotStatus::PotentiallyFriendly),

        VerificationMethod::ReverseDnsForwardConfirm => {
            for hostname in resolver.reverse_hosts(address).await {
                // PTR results are dot-terminated FQDNs
                let host = hostname.strip_suffix('.').unwrap_or(&hostname);
                if bot.sources.iter().any(|suffix| host.ends_with(suffix.as_str())) {
                    return if resolver.forward_confirms(address, host).await {
                        Some(BotStatus::Friendly)
                    } else {
                        Some(BotStatus::PotentialImposter)
                    };
                }
            }
            None
        }

        VerificationMethod::CidrMatch => {
            bot.prefixes.contains(address).then_some(BotStatus::Friendly)
        }

        VerificationMethod::AsnMatch => {
            let asn = resolver.lookup_asn(address).await?;
            bot.sources
                .iter()
                .any(|source| *source == asn)
                .then_some(BotStatus::Friendly)
        }
    }
}

static DEFAULT_VERIFIER: OnceLock<BotVerifier> = OnceLock::new();

/// Process-wide engine bound to the bundled registry and the system
/// DNS resolver, built on first use.
pub fn default_verifier() -> &'static BotVerifier {
    DEFAULT_VERIFIER.get_or_init(|| {
        BotVerifier::new(
            Arc::new(Registry::bundled()),
            Arc::new(DnsResolver::system()),
        )
    })
}

/// Classify with the process-wide default engine.
pub async fn check_bot_status(user_agent: &str, address: IpAddr) -> VerificationOutcome {
    default_verifier().classify(user_agent, address).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BotDefinition, HostilePattern};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedResolver {
        hosts: HashMap<IpAddr, Vec<String>>,
        forwards: HashMap<String, Vec<IpAddr>>,
        asns: HashMap<IpAddr, String>,
    }

    #[async_trait]
    impl NetworkResolver for ScriptedResolver {
        async fn reverse_hosts(&self, address: IpAddr) -> Vec<String> {
            self.hosts.get(&address).cloned().unwrap_or_default()
        }

        async fn forward_confirms(&self, address: IpAddr, hostname: &str) -> bool {
            self.forwards
                .get(hostname)
                .is_some_and(|addresses| addresses.contains(&address))
        }

        async fn lookup_asn(&self, address: IpAddr) -> Option<String> {
            self.asns.get(&address).cloned()
        }
    }

    /// Resolver that never completes a lookup.
    struct HangingResolver;

    #[async_trait]
    impl NetworkResolver for HangingResolver {
        async fn reverse_hosts(&self, _address: IpAddr) -> Vec<String> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Vec::new()
        }

        async fn forward_confirms(&self, _address: IpAddr, _hostname: &str) -> bool {
            tokio::time::sleep(Duration::from_secs(600)).await;
            false
        }

        async fn lookup_asn(&self, _address: IpAddr) -> Option<String> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            None
        }
    }

    fn test_registry() -> Arc<Registry> {
        let definitions = vec![
            BotDefinition {
                name: "Googlebot".to_string(),
                method: VerificationMethod::ReverseDnsForwardConfirm,
                sources: vec!["googlebot.com".to_string(), "google.com".to_string()],
                ua_pattern: "googlebot".to_string(),
            },
            BotDefinition {
                name: "OracleCrawler".to_string(),
                method: VerificationMethod::CidrMatch,
                sources: vec!["132.145.0.0/16".to_string()],
                ua_pattern: "oraclecrawler".to_string(),
            },
            BotDefinition {
                name: "Twitterbot".to_string(),
                method: VerificationMethod::AsnMatch,
                sources: vec!["13414".to_string()],
                ua_pattern: "twitterbot".to_string(),
            },
            BotDefinition {
                name: "UptimeRobot".to_string(),
                method: VerificationMethod::IdentityOnly,
                sources: vec![],
                ua_pattern: "uptimerobot".to_string(),
            },
        ];
        let hostile = vec![HostilePattern {
            name: "sqlmap".to_string(),
            pattern: "sqlmap".to_string(),
        }];
        Arc::new(Registry::new(definitions, hostile))
    }

    fn verifier_with(resolver: impl NetworkResolver + 'static) -> BotVerifier {
        BotVerifier::new(test_registry(), Arc::new(resolver))
    }

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_fcrdns_verified() {
        let address = addr("66.249.66.1");
        let resolver = ScriptedResolver {
            hosts: HashMap::from([(
                address,
                vec!["crawl-66-249-66-1.googlebot.com.".to_string()],
            )]),
            forwards: HashMap::from([(
                "crawl-66-249-66-1.googlebot.com".to_string(),
                vec![address],
            )]),
            ..Default::default()
        };

        let outcome = verifier_with(resolver).classify("Googlebot/2.1", address).await;
        assert_eq!(outcome, VerificationOutcome::new(BotStatus::Friendly, "Googlebot"));
    }

    #[tokio::test]
    async fn test_fcrdns_forward_mismatch_is_imposter() {
        let address = addr("203.0.113.9");
        let resolver = ScriptedResolver {
            hosts: HashMap::from([(address, vec!["fake.googlebot.com.".to_string()])]),
            // forward record points elsewhere
            forwards: HashMap::from([("fake.googlebot.com".to_string(), vec![addr("203.0.113.10")])]),
            ..Default::default()
        };

        let outcome = verifier_with(resolver).classify("Googlebot/2.1", address).await;
        assert_eq!(
            outcome,
            VerificationOutcome::new(BotStatus::PotentialImposter, "Googlebot")
        );
    }

    #[tokio::test]
    async fn test_fcrdns_unrelated_hostname_is_unknown() {
        let address = addr("198.51.100.4");
        let resolver = ScriptedResolver {
            hosts: HashMap::from([(address, vec!["host.example.net.".to_string()])]),
            ..Default::default()
        };

        let outcome = verifier_with(resolver).classify("Googlebot/2.1", address).await;
        assert_eq!(outcome, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_fcrdns_resolver_failure_degrades_to_unknown() {
        let outcome = verifier_with(ScriptedResolver::default())
            .classify("Googlebot/2.1", addr("66.249.66.1"))
            .await;
        assert_eq!(outcome, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_cidr_match() {
        let verifier = verifier_with(ScriptedResolver::default());

        let inside = verifier.classify("OracleCrawler/1.0", addr("132.145.9.5")).await;
        assert_eq!(inside, VerificationOutcome::new(BotStatus::Friendly, "OracleCrawler"));

        let outside = verifier.classify("OracleCrawler/1.0", addr("10.1.2.3")).await;
        assert_eq!(outside, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_asn_match() {
        let address = addr("104.244.42.1");
        let resolver = ScriptedResolver {
            asns: HashMap::from([(address, "13414".to_string())]),
            ..Default::default()
        };
        let verifier = verifier_with(resolver);

        let outcome = verifier.classify("Twitterbot/1.0", address).await;
        assert_eq!(outcome, VerificationOutcome::new(BotStatus::Friendly, "Twitterbot"));

        // same identity from an address in someone else's network
        let elsewhere = verifier.classify("Twitterbot/1.0", addr("8.8.8.8")).await;
        assert_eq!(elsewhere, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_identity_only() {
        let outcome = verifier_with(ScriptedResolver::default())
            .classify("UptimeRobot/2.0", addr("192.0.2.1"))
            .await;
        assert_eq!(
            outcome,
            VerificationOutcome::new(BotStatus::PotentiallyFriendly, "UptimeRobot")
        );
    }

    #[tokio::test]
    async fn test_unrecognized_identity() {
        let outcome = verifier_with(ScriptedResolver::default())
            .classify("Mozilla/5.0 Chrome/120", addr("66.249.66.1"))
            .await;
        assert_eq!(outcome, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_identity_match_is_case_insensitive() {
        let outcome = verifier_with(ScriptedResolver::default())
            .classify("UPTIMEROBOT/2.0", addr("192.0.2.1"))
            .await;
        assert_eq!(outcome.status, BotStatus::PotentiallyFriendly);
    }

    #[tokio::test]
    async fn test_hostile_pattern_short_circuits() {
        // the hanging resolver proves no network call is made
        let outcome = verifier_with(HangingResolver)
            .classify("sqlmap/1.7", addr("192.0.2.1"))
            .await;
        assert_eq!(outcome, VerificationOutcome::new(BotStatus::Unfriendly, "sqlmap"));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_returns_unknown() {
        let token = CancellationToken::new();
        token.cancel();

        let outcome = verifier_with(ScriptedResolver::default())
            .classify_with_cancel("UptimeRobot/2.0", addr("192.0.2.1"), &token)
            .await;
        assert_eq!(outcome, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_caller_deadline_short_circuits() {
        let verifier = verifier_with(HangingResolver);
        let token = CancellationToken::new();

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            verifier.classify_with_cancel("Googlebot/2.1", addr("66.249.66.1"), &token),
        )
        .await
        .expect("classification did not observe the deadline");
        assert_eq!(outcome, VerificationOutcome::unknown());
    }

    #[tokio::test]
    async fn test_losing_task_is_cancelled() {
        // Two definitions match; the CIDR one concludes instantly while
        // the FCrDNS one would hang forever. The call must not wait for
        // the loser.
        let definitions = vec![
            BotDefinition {
                name: "FastBot".to_string(),
                method: VerificationMethod::CidrMatch,
                sources: vec!["192.0.2.0/24".to_string()],
                ua_pattern: "mixedbot".to_string(),
            },
            BotDefinition {
                name: "SlowBot".to_string(),
                method: VerificationMethod::ReverseDnsForwardConfirm,
                sources: vec!["example.com".to_string()],
                ua_pattern: "mixedbot".to_string(),
            },
        ];
        let verifier = BotVerifier::new(
            Arc::new(Registry::new(definitions, vec![])),
            Arc::new(HangingResolver),
        );

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            verifier.classify("MixedBot/1.0", addr("192.0.2.7")),
        )
        .await
        .expect("winner did not short-circuit the hanging task");
        assert_eq!(outcome, VerificationOutcome::new(BotStatus::Friendly, "FastBot"));
    }
}
