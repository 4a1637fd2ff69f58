//! Display-name policy gate.
//!
//! Cheap local checks run before anything touching the store, and the store
//! checks run before the external moderation call. Each stage either lets
//! the name through to the next one or ends the request with a verdict.

pub mod cache;
pub mod cooldown;
pub mod denylist;
pub mod ownership;
pub mod validator;
pub mod verdict;

pub use cache::DecisionCache;
pub use cooldown::{CooldownLimiter, DEFAULT_COOLDOWN};
pub use denylist::Denylist;
pub use ownership::OwnershipChecker;
pub use validator::{validate, CandidateName, Validation};
pub use verdict::{DenialReason, Identity, Verdict};

use crate::error::GateError;
use crate::moderation::ModerationClient;
use crate::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Denylist,
    Ownership,
    CacheRead,
    Cooldown,
    Moderation,
}

impl Stage {
    /// Stages between validation and the moderation call, in execution order
    pub const SCREENING: [Stage; 4] = [
        Stage::Denylist,
        Stage::Ownership,
        Stage::CacheRead,
        Stage::Cooldown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Denylist => "denylist",
            Stage::Ownership => "ownership",
            Stage::CacheRead => "cache_read",
            Stage::Cooldown => "cooldown",
            Stage::Moderation => "moderation",
        }
    }
}

/// Result of one screening stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt(Verdict),
}

/// Sole entry point of the decision pipeline
#[derive(Clone)]
pub struct NameGate {
    denylist: Arc<Denylist>,
    ownership: OwnershipChecker,
    cache: DecisionCache,
    cooldown: CooldownLimiter,
    moderation: ModerationClient,
}

impl NameGate {
    pub fn new(
        store: SharedStore,
        denylist: Arc<Denylist>,
        cooldown_window: Duration,
        moderation: ModerationClient,
    ) -> Self {
        Self {
            denylist,
            ownership: OwnershipChecker::new(store.clone()),
            cache: DecisionCache::new(store.clone()),
            cooldown: CooldownLimiter::new(store, cooldown_window),
            moderation,
        }
    }

    /// Decide whether `display_name` may be used by `identity`
    ///
    /// Only empty input is an error; every policy outcome is a verdict.
    pub async fn check(&self, display_name: &str, identity: &Identity) -> Result<Verdict, GateError> {
        let candidate = match validate(display_name)? {
            Validation::Valid(candidate) => {
                debug!(length = candidate.length, "Display name passed validation");
                candidate
            }
            Validation::Denied(reason) => {
                return Ok(finish(Stage::Validate, Verdict::denied(reason)));
            }
        };

        for stage in Stage::SCREENING {
            if let Flow::Halt(verdict) = self.screen(stage, &candidate, identity).await {
                return Ok(finish(stage, verdict));
            }
        }

        let verdict = self.moderate(&candidate, identity).await;
        Ok(finish(Stage::Moderation, verdict))
    }

    async fn screen(&self, stage: Stage, candidate: &CandidateName, identity: &Identity) -> Flow {
        match stage {
            Stage::Denylist => match self.denylist.first_match(&candidate.normalized) {
                Some(word) => {
                    debug!(word, "Display name hit the denylist");
                    Flow::Halt(Verdict::denied(DenialReason::Blocked))
                }
                None => Flow::Continue,
            },
            Stage::Ownership => {
                if identity.user_id().is_none() {
                    return Flow::Continue;
                }
                let ownership = self.ownership.check(&candidate.normalized, identity).await;
                if ownership.is_conflict() {
                    debug!(?ownership, "Display name belongs to another identity");
                    Flow::Halt(Verdict::denied(DenialReason::Taken))
                } else {
                    Flow::Continue
                }
            }
            Stage::CacheRead => match self.cache.get(identity, &candidate.normalized).await {
                Some(verdict) => Flow::Halt(verdict),
                None => Flow::Continue,
            },
            Stage::Cooldown => {
                let result = self.cooldown.check_and_record(identity).await;
                if result.allowed {
                    Flow::Continue
                } else {
                    debug!(retry_after_ms = ?result.retry_after_ms, "Identity is cooling down");
                    Flow::Halt(Verdict::denied(DenialReason::RateLimited))
                }
            }
            Stage::Validate | Stage::Moderation => Flow::Continue,
        }
    }

    /// Fails closed: no classification means `service_unavailable`
    async fn moderate(&self, candidate: &CandidateName, identity: &Identity) -> Verdict {
        match self.moderation.classify(&candidate.raw).await {
            Ok(classification) => {
                let verdict = if classification.flagged {
                    Verdict::denied(DenialReason::Flagged)
                } else {
                    Verdict::allowed()
                };
                self.cache
                    .put(identity, &candidate.normalized, verdict.allowed, verdict.reason)
                    .await;
                verdict
            }
            Err(e) => {
                warn!(error = %e, "Moderation unavailable, denying name");
                Verdict::denied(DenialReason::ServiceUnavailable)
            }
        }
    }
}

fn finish(stage: Stage, verdict: Verdict) -> Verdict {
    debug!(
        stage = stage.as_str(),
        allowed = verdict.allowed,
        outcome = verdict.outcome(),
        "Display name verdict"
    );
    metrics::counter!("display_name_verdicts_total", "outcome" => verdict.outcome()).increment(1);
    verdict
}
