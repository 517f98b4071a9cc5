//! Compatibility migrations applied to stored classifiers at load time.
//!
//! Newer model formats name the estimator template `estimator`; older ones
//! stored it as `base_estimator`. Migrations run in declaration order, once
//! per load, before the classifier is built.

use tracing::debug;

use crate::classifier::{EstimatorSlots, LegacySlot};

/// A named, versioned rewrite of a stored classifier.
pub trait Migration: Sync {
    fn name(&self) -> &'static str;
    fn version(&self) -> u32;
    /// Rewrite `model` in place. Returns whether anything changed.
    fn apply(&self, model: &mut dyn EstimatorSlots) -> bool;
}

/// Copies a legacy `base_estimator` template into an absent `estimator` slot
/// and retires the legacy slot.
pub struct LegacyEstimatorAlias;

impl Migration for LegacyEstimatorAlias {
    fn name(&self) -> &'static str {
        "legacy-estimator-alias"
    }

    fn version(&self) -> u32 {
        1
    }

    fn apply(&self, model: &mut dyn EstimatorSlots) -> bool {
        if model.estimator().is_some() {
            return false;
        }
        let Some(LegacySlot::Template(template)) = model.legacy_estimator().cloned() else {
            return false;
        };
        model.set_estimator(template);
        model.set_legacy_estimator(LegacySlot::DEPRECATED);
        true
    }
}

/// Every known migration, oldest first.
pub const MIGRATIONS: &[&dyn Migration] = &[&LegacyEstimatorAlias];

/// A migration that changed the model, as recorded on the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMigration {
    pub name: &'static str,
    pub version: u32,
}

/// Run all migrations against `model`, returning the ones that applied.
pub fn run_migrations(model: &mut dyn EstimatorSlots) -> Vec<AppliedMigration> {
    let mut applied = Vec::new();
    for m in MIGRATIONS {
        if m.apply(model) {
            debug!(migration = m.name(), version = m.version(), "applied model migration");
            applied.push(AppliedMigration {
                name: m.name(),
                version: m.version(),
            });
        }
    }
    applied
}
