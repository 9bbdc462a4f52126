//! Experiment assignment
//!
//! Places a visitor into one variant of a configured experiment:
//! status gate → sticky lookup → targeting evaluation → deterministic
//! bucketing against the normalized weight distribution.
//!
//! Bucketing hashes `(session_id, experiment_id)` with SHA-256 so the same
//! visitor lands in the same variant even if the session cache is lost
//! before the next page load. Ineligible results are never cached: a later
//! context change (an SPA navigation that alters URL targeting, say) can
//! still become eligible.

use crate::config::{Experiment, ExperimentStatus};
use crate::session::SessionStore;
use crate::targeting::{all_rules_match, TargetingContext};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Buckets used to reduce the hash to a [0, 1) fraction
const HASH_BUCKETS: u64 = 10_000;

/// Deterministic, sticky variant assigner
pub struct ExperimentAssigner;

impl ExperimentAssigner {
    /// Assign the store's session to a variant of `experiment`, or return
    /// `None` when the experiment is not serving or the visitor is not
    /// eligible.
    pub fn assign(
        store: &mut dyn SessionStore,
        experiment: &Experiment,
        context: &TargetingContext,
    ) -> Option<String> {
        if experiment.status != ExperimentStatus::Running {
            return None;
        }

        // Sticky: a session sees one variant for its whole life
        if let Some(existing) = store.session().experiment_assignments.get(&experiment.id) {
            return Some(existing.clone());
        }

        if !all_rules_match(&experiment.targeting_rules, context) {
            return None;
        }

        let session_id = store.session().session_id.clone();
        let variant_id = pick_variant(experiment, &session_id)?;
        debug!(
            experiment = %experiment.id,
            variant = %variant_id,
            "assigned variant"
        );
        store.set_assignment(&experiment.id, &variant_id);
        Some(variant_id)
    }
}

/// Map a session deterministically onto the cumulative normalized weight
/// distribution of the experiment's variants
fn pick_variant(experiment: &Experiment, session_id: &str) -> Option<String> {
    let total_weight = experiment.total_weight();
    if total_weight <= 0.0 {
        return None;
    }

    let point = bucket_fraction(session_id, &experiment.id);
    let mut cumulative = 0.0;
    for variant in &experiment.variants {
        cumulative += variant.weight / total_weight;
        if point < cumulative {
            return Some(variant.id.clone());
        }
    }
    // Float accumulation can leave the last boundary fractionally short
    experiment.variants.last().map(|v| v.id.clone())
}

/// Stable hash of `(session_id, experiment_id)` reduced to [0, 1)
fn bucket_fraction(session_id: &str, experiment_id: &str) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b":");
    hasher.update(experiment_id.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) % HASH_BUCKETS) as f64 / HASH_BUCKETS as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuleOperator, RuleSubject, TargetingRule, Variant};
    use crate::session::MemorySessionStore;
    use std::collections::HashMap;

    fn experiment(id: &str, variants: &[(&str, f64)], status: ExperimentStatus) -> Experiment {
        Experiment {
            id: id.to_string(),
            name: id.to_string(),
            variants: variants
                .iter()
                .map(|(vid, weight)| Variant {
                    id: vid.to_string(),
                    weight: *weight,
                })
                .collect(),
            targeting_rules: Vec::new(),
            status,
        }
    }

    #[test]
    fn single_variant_always_assigned() {
        let exp = experiment("solo", &[("A", 100.0)], ExperimentStatus::Running);
        let context = TargetingContext::default();

        for _ in 0..20 {
            let mut store = MemorySessionStore::new();
            assert_eq!(
                ExperimentAssigner::assign(&mut store, &exp, &context).as_deref(),
                Some("A")
            );
        }
    }

    #[test]
    fn assignment_is_sticky() {
        let exp = experiment(
            "hero_copy",
            &[("control", 50.0), ("benefit_led", 50.0)],
            ExperimentStatus::Running,
        );
        let context = TargetingContext::default();
        let mut store = MemorySessionStore::new();

        let first = ExperimentAssigner::assign(&mut store, &exp, &context);
        let second = ExperimentAssigner::assign(&mut store, &exp, &context);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn non_running_experiments_never_assign() {
        let context = TargetingContext::default();
        for status in [
            ExperimentStatus::Draft,
            ExperimentStatus::Paused,
            ExperimentStatus::Completed,
        ] {
            let exp = experiment("gated", &[("A", 100.0)], status);
            let mut store = MemorySessionStore::new();
            assert_eq!(ExperimentAssigner::assign(&mut store, &exp, &context), None);
        }
    }

    #[test]
    fn targeting_rejection_returns_none_without_caching() {
        let mut exp = experiment("targeted", &[("A", 100.0)], ExperimentStatus::Running);
        exp.targeting_rules.push(TargetingRule {
            subject: RuleSubject::UtmSource,
            operator: RuleOperator::Equals,
            value: "newsletter".to_string(),
            key: None,
        });

        let mut store = MemorySessionStore::new();
        let organic = TargetingContext {
            utm_source: Some("organic".to_string()),
            ..TargetingContext::default()
        };
        assert_eq!(ExperimentAssigner::assign(&mut store, &exp, &organic), None);
        assert!(store.session().experiment_assignments.is_empty());

        // Context change makes the same session eligible
        let newsletter = TargetingContext {
            utm_source: Some("newsletter".to_string()),
            ..TargetingContext::default()
        };
        assert_eq!(
            ExperimentAssigner::assign(&mut store, &exp, &newsletter).as_deref(),
            Some("A")
        );
    }

    #[test]
    fn bucketing_is_deterministic_per_session() {
        let exp = experiment(
            "hero_copy",
            &[("control", 50.0), ("benefit_led", 50.0)],
            ExperimentStatus::Running,
        );
        for i in 0..50 {
            let session_id = format!("session-{i}");
            let a = pick_variant(&exp, &session_id);
            let b = pick_variant(&exp, &session_id);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn weights_need_not_sum_to_one_hundred() {
        // 1:3 split expressed as 5/15 rather than 25/75
        let exp = experiment(
            "normalized",
            &[("light", 5.0), ("heavy", 15.0)],
            ExperimentStatus::Running,
        );

        let mut counts: HashMap<String, usize> = HashMap::new();
        let n = 20_000;
        for i in 0..n {
            let variant = pick_variant(&exp, &format!("session-{i}")).unwrap();
            *counts.entry(variant).or_default() += 1;
        }

        let heavy_share = counts["heavy"] as f64 / n as f64;
        assert!(
            (heavy_share - 0.75).abs() < 0.02,
            "heavy share {heavy_share} outside tolerance"
        );
    }

    #[test]
    fn distribution_approximates_weights() {
        let exp = experiment(
            "split",
            &[("A", 70.0), ("B", 30.0)],
            ExperimentStatus::Running,
        );

        let mut counts: HashMap<String, usize> = HashMap::new();
        let n = 100_000;
        for i in 0..n {
            let variant = pick_variant(&exp, &format!("session-{i}")).unwrap();
            *counts.entry(variant).or_default() += 1;
        }

        let a_share = counts["A"] as f64 / n as f64;
        let b_share = counts["B"] as f64 / n as f64;
        assert!((a_share - 0.70).abs() < 0.02, "A share {a_share}");
        assert!((b_share - 0.30).abs() < 0.02, "B share {b_share}");
    }

    #[test]
    fn zero_weight_variant_is_never_picked() {
        let exp = experiment(
            "holdout",
            &[("live", 100.0), ("dead", 0.0)],
            ExperimentStatus::Running,
        );
        for i in 0..1_000 {
            assert_eq!(
                pick_variant(&exp, &format!("session-{i}")).as_deref(),
                Some("live")
            );
        }
    }
}
