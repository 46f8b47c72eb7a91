// Canonical-phase jump table.
//
// Some phases mark internal bookkeeping states with no card of their own;
// setting one of those is silently advanced to the next phase that renders.
// Jump targets are never themselves keys, which is what makes the lookup
// idempotent.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

static CANONICAL_PHASE_JUMPS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // pre-check acknowledged -> marriage check card
        ("20001", "30000"),
        // marriage answer recorded -> bank sign card
        ("30001", "80000"),
        // spouse data recorded -> account status card
        ("40001", "60000"),
        // account status confirmed -> phone sign card
        ("60001", "70000"),
    ])
});

/// Resolve a requested phase to the one that actually renders. Codes not in
/// the table are the expected default path and come back unchanged.
pub fn resolve_canonical_phase(requested: &str) -> &str {
    CANONICAL_PHASE_JUMPS
        .get(requested)
        .copied()
        .unwrap_or(requested)
}

/// Result of applying the jump function to a phase-update request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseJump {
    pub requested: String,
    pub actual: String,
    pub jumped: bool,
}

impl PhaseJump {
    pub fn resolve(requested: &str) -> Self {
        let actual = resolve_canonical_phase(requested);
        Self {
            requested: requested.to_string(),
            actual: actual.to_string(),
            jumped: actual != requested,
        }
    }
}
