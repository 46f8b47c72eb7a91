//! Phase registry and flow-state derivation tests.

use fundflow_router::phase::{
    derive_flow_state, in_later_phase, resolve_canonical_phase, FlowFlags, FlowStep, PhaseJump,
    StepId,
};

fn completed(steps: &[FlowStep]) -> Vec<StepId> {
    steps
        .iter()
        .filter(|s| s.is_completed)
        .map(|s| s.id)
        .collect()
}

#[test]
fn phase_update_jumps_cardless_codes() {
    let jump = PhaseJump::resolve("30001");
    assert_eq!(jump.requested, "30001");
    assert_eq!(jump.actual, "80000");
    assert!(jump.jumped);

    let jump = PhaseJump::resolve("99999");
    assert_eq!(jump.actual, "99999");
    assert!(!jump.jumped);
}

#[test]
fn resolution_is_idempotent_over_arbitrary_codes() {
    for code in ["20001", "30001", "40001", "60001", "80000", "99999", "0", ""] {
        let once = resolve_canonical_phase(code);
        assert_eq!(resolve_canonical_phase(once), once, "code {:?}", code);
    }
}

#[test]
fn completion_grows_with_band_order() {
    let in_band_order = [
        "500", "20001", "30500", "45000", "61000", "70001", "80001", "90001", "11000", "12500",
        "13999", "14001",
    ];
    let flags = FlowFlags::default();
    let mut previous: Vec<StepId> = Vec::new();
    for code in in_band_order {
        let done = completed(&derive_flow_state(code, &flags, None, false));
        for id in &previous {
            assert!(done.contains(id), "{:?} regressed at code {}", id, code);
        }
        previous = done;
    }
}

#[test]
fn the_later_phase_boundary_is_the_one_allowed_non_monotonicity() {
    // 14001 sits numerically below 90001 yet completes strictly more steps.
    let at_90001 = completed(&derive_flow_state("90001", &FlowFlags::default(), None, false));
    let at_14001 = completed(&derive_flow_state("14001", &FlowFlags::default(), None, false));
    assert!(at_90001.iter().all(|id| at_14001.contains(id)));
    assert!(at_14001.len() > at_90001.len());

    assert!(in_later_phase(14001));
    assert!(in_later_phase(90001));
    assert!(!in_later_phase(80001));
}

#[test]
fn bank_sign_band_vs_later_phase_cases() {
    // phase 80001: phone and bank signing complete, multi-child not yet.
    let steps = derive_flow_state("80001", &FlowFlags::default(), None, false);
    let done = completed(&steps);
    assert!(done.contains(&StepId::PhoneSign));
    assert!(done.contains(&StepId::BankSign));
    assert!(!done.contains(&StepId::MultiChildCheck));

    // phase 11000 (later-phase interpretation): multi-child complete.
    let steps = derive_flow_state("11000", &FlowFlags::default(), None, false);
    assert!(completed(&steps).contains(&StepId::MultiChildCheck));
}

#[test]
fn exactly_one_step_is_active() {
    for code in ["0", "20001", "80001", "11000", "14500"] {
        let steps = derive_flow_state(code, &FlowFlags::default(), None, false);
        let actives = steps.iter().filter(|s| s.is_active).count();
        assert_eq!(actives, 1, "code {}", code);
    }
}
