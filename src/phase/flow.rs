// Derivation of the step checklist from a phase code.
//
// The numeric phase space is banded, and deliberately non-monotonic: the
// low-numbered 11000..15000 bands encode the post-sign eligibility checks
// that happen *after* the 90000 band. The `in_later_phase` flag picks the
// interpretation; the band boundaries below replicate the dictionary the
// upstream service grew organically and must not be "fixed".

use serde::Serialize;

/// Position in the workflow's fixed total order. Declaration order is the
/// comparator: a stage's codes being reached means every earlier step is
/// complete. A band's codes mean that band's own step has just completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStage {
    /// [0, 20000) outside the later-phase bands.
    NotStarted,
    /// [20000, 30000) eligibility pre-check done.
    PreCheck,
    /// [30000, 40000) marriage question answered.
    MarriageCheck,
    /// [40000, 60000) spouse data recorded.
    SpouseCheck,
    /// [60000, 70000) account status confirmed.
    AccountStatus,
    /// [70000, 80000) phone signing done.
    PhoneSign,
    /// [80000, 90000) bank-card signing done.
    BankSign,
    /// [90000, ∞) multi-child check complete.
    MultiChildDone,
    /// [11000, 12000) deposit check done.
    DepositCheck,
    /// [12000, 13000) property check done.
    PropertyCheck,
    /// [13000, 14000) loan check done.
    LoanCheck,
    /// [14000, 15000) extraction eligibility confirmed.
    EligibilityCheck,
}

/// Whether a code belongs to the later-phase interpretation of the space.
pub fn in_later_phase(code: u32) -> bool {
    (11000..15000).contains(&code) || code >= 90000
}

/// Map a numeric code onto its stage. The later bands win over the plain
/// [0, 20000) reading.
pub fn stage_of(code: u32) -> WorkflowStage {
    match code {
        11000..12000 => WorkflowStage::DepositCheck,
        12000..13000 => WorkflowStage::PropertyCheck,
        13000..14000 => WorkflowStage::LoanCheck,
        14000..15000 => WorkflowStage::EligibilityCheck,
        0..20000 => WorkflowStage::NotStarted,
        20000..30000 => WorkflowStage::PreCheck,
        30000..40000 => WorkflowStage::MarriageCheck,
        40000..60000 => WorkflowStage::SpouseCheck,
        60000..70000 => WorkflowStage::AccountStatus,
        70000..80000 => WorkflowStage::PhoneSign,
        80000..90000 => WorkflowStage::BankSign,
        90000.. => WorkflowStage::MultiChildDone,
    }
}

/// Codes are opaque strings; anything unparseable falls back to the lowest
/// defined order.
pub fn parse_phase_code(code: &str) -> u32 {
    code.trim().parse().unwrap_or(0)
}

/// Identity of one checklist step, in presentation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Authorization,
    TypeSelection,
    MarriageCheck,
    PhoneSign,
    BankSign,
    MultiChildCheck,
    DepositCheck,
    PropertyCheck,
    LoanCheck,
    Details,
    Submit,
    Done,
}

/// One derived checklist entry; computed fresh on every observation, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowStep {
    pub id: StepId,
    pub is_active: bool,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_label: Option<String>,
}

/// User attributes that gate individual steps.
#[derive(Debug, Clone, Default)]
pub struct FlowFlags {
    pub is_authorized: bool,
    pub is_married: bool,
    pub permitted_types: Vec<String>,
}

/// Derive the full step checklist for a phase code.
///
/// Completion is monotone in stage order; the multi-child and later check
/// steps are additionally gated on the later-phase interpretation, which the
/// stage ordering already encodes (every later band sorts above
/// `MultiChildDone`).
pub fn derive_flow_state(
    phase_code: &str,
    flags: &FlowFlags,
    selected_type: Option<&str>,
    is_finished: bool,
) -> Vec<FlowStep> {
    let stage = stage_of(parse_phase_code(phase_code));

    let type_label = selected_type
        .map(str::to_string)
        .or_else(|| {
            if flags.permitted_types.is_empty() {
                None
            } else {
                Some(flags.permitted_types.join(" / "))
            }
        });
    let marriage_label = if flags.is_married { "已婚" } else { "未婚" };

    let mut steps = vec![
        FlowStep {
            id: StepId::Authorization,
            is_active: false,
            is_completed: flags.is_authorized || stage >= WorkflowStage::PreCheck,
            sub_label: None,
        },
        FlowStep {
            id: StepId::TypeSelection,
            is_active: false,
            is_completed: selected_type.is_some() || stage >= WorkflowStage::MarriageCheck,
            sub_label: type_label,
        },
        FlowStep {
            id: StepId::MarriageCheck,
            is_active: false,
            is_completed: stage >= WorkflowStage::SpouseCheck,
            sub_label: (stage >= WorkflowStage::SpouseCheck)
                .then(|| marriage_label.to_string()),
        },
        FlowStep {
            id: StepId::PhoneSign,
            is_active: false,
            is_completed: stage >= WorkflowStage::PhoneSign,
            sub_label: None,
        },
        FlowStep {
            id: StepId::BankSign,
            is_active: false,
            is_completed: stage >= WorkflowStage::BankSign,
            sub_label: None,
        },
        FlowStep {
            id: StepId::MultiChildCheck,
            is_active: false,
            is_completed: stage >= WorkflowStage::MultiChildDone,
            sub_label: None,
        },
        FlowStep {
            id: StepId::DepositCheck,
            is_active: false,
            is_completed: stage >= WorkflowStage::DepositCheck,
            sub_label: None,
        },
        FlowStep {
            id: StepId::PropertyCheck,
            is_active: false,
            is_completed: stage >= WorkflowStage::PropertyCheck,
            sub_label: None,
        },
        FlowStep {
            id: StepId::LoanCheck,
            is_active: false,
            is_completed: stage >= WorkflowStage::LoanCheck,
            sub_label: None,
        },
        FlowStep {
            id: StepId::Details,
            is_active: false,
            is_completed: is_finished,
            sub_label: None,
        },
        FlowStep {
            id: StepId::Submit,
            is_active: false,
            is_completed: is_finished,
            sub_label: None,
        },
        FlowStep {
            id: StepId::Done,
            is_active: false,
            is_completed: is_finished,
            sub_label: None,
        },
    ];

    if is_finished {
        for step in &mut steps {
            step.is_completed = true;
        }
        if let Some(done) = steps.last_mut() {
            done.is_active = true;
        }
    } else if let Some(current) = steps.iter_mut().find(|step| !step.is_completed) {
        current.is_active = true;
    }

    steps
}
