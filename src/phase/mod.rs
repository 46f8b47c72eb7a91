//! Workflow phase handling.
//!
//! A phase code is an opaque numeric string tracking where the user stands in
//! the housing-fund extraction workflow. The registry compacts codes that
//! have no UI card onto their canonical successor; the flow module derives
//! the per-step display state from a code plus user flags.

pub mod flow;
pub mod registry;

pub use flow::{
    derive_flow_state, in_later_phase, parse_phase_code, stage_of, FlowFlags, FlowStep, StepId,
    WorkflowStage,
};
pub use registry::{resolve_canonical_phase, PhaseJump};
