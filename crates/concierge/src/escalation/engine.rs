use serde::Serialize;
use std::fmt;
use tracing::{error, info};

use super::categories::EscalationCategory;
use super::classifier::{classify_with, combined_text};
use super::formatter;
use super::patterns::PatternLibrary;
use super::EscalationError;
use crate::state::SessionState;

/// History length at which an unescalated conversation is handed off.
const INTERACTION_THRESHOLD: usize = 3;
/// Distinct human-request patterns needed before handing off.
const HUMAN_REQUEST_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    RepeatedInteractions,
    PreviousEscalation,
    CriticalIssue,
    HighPriority,
    ComplexIssue,
    RepeatedHumanRequests,
    SystemError,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::RepeatedInteractions => {
                "Multiple interaction attempts without resolution"
            }
            EscalationReason::PreviousEscalation => "Previous escalation - requires senior agent",
            EscalationReason::CriticalIssue => {
                "Critical issue detected - immediate escalation required"
            }
            EscalationReason::HighPriority => "High priority issue requiring specialist assistance",
            EscalationReason::ComplexIssue => "Complex issue requiring human expertise",
            EscalationReason::RepeatedHumanRequests => "Multiple requests for human assistance",
            EscalationReason::SystemError => "System error during escalation assessment",
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the escalation rule table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Several turns without any escalation yet.
    RepeatedInteractions,
    /// The customer was already escalated once; route to a senior agent.
    PriorEscalation,
    CriticalPatterns,
    HighPriorityPatterns,
    MediumPriorityPatterns,
    /// At least two distinct ways of asking for a human.
    RepeatedHumanRequests,
}

/// Rules in evaluation order. The first rule that fires decides.
pub const ESCALATION_RULES: [RuleKind; 6] = [
    RuleKind::RepeatedInteractions,
    RuleKind::PriorEscalation,
    RuleKind::CriticalPatterns,
    RuleKind::HighPriorityPatterns,
    RuleKind::MediumPriorityPatterns,
    RuleKind::RepeatedHumanRequests,
];

/// What the rules see for a single call.
struct RuleInput<'a> {
    text: &'a str,
    category: EscalationCategory,
    history_len: usize,
    previous_escalations: u32,
}

impl RuleKind {
    pub fn reason(&self) -> EscalationReason {
        match self {
            RuleKind::RepeatedInteractions => EscalationReason::RepeatedInteractions,
            RuleKind::PriorEscalation => EscalationReason::PreviousEscalation,
            RuleKind::CriticalPatterns => EscalationReason::CriticalIssue,
            RuleKind::HighPriorityPatterns => EscalationReason::HighPriority,
            RuleKind::MediumPriorityPatterns => EscalationReason::ComplexIssue,
            RuleKind::RepeatedHumanRequests => EscalationReason::RepeatedHumanRequests,
        }
    }

    /// The category to escalate under when the rule fires.
    fn evaluate(&self, input: &RuleInput, library: &PatternLibrary) -> Option<EscalationCategory> {
        match self {
            RuleKind::RepeatedInteractions => (input.history_len >= INTERACTION_THRESHOLD
                && input.previous_escalations == 0)
                .then_some(input.category),
            RuleKind::PriorEscalation => {
                (input.previous_escalations >= 1).then_some(EscalationCategory::ComplaintDispute)
            }
            RuleKind::CriticalPatterns => library
                .critical
                .is_match(input.text)
                .then(|| critical_category(input.text, input.category)),
            RuleKind::HighPriorityPatterns => library
                .high_priority
                .is_match(input.text)
                .then_some(input.category),
            RuleKind::MediumPriorityPatterns => library
                .medium_priority
                .is_match(input.text)
                .then_some(input.category),
            RuleKind::RepeatedHumanRequests => (library.human_request.count_matching(input.text)
                >= HUMAN_REQUEST_THRESHOLD)
                .then_some(EscalationCategory::GeneralInquiry),
        }
    }
}

/// Critical issues are re-routed by keyword; anything else keeps its category.
fn critical_category(text: &str, current: EscalationCategory) -> EscalationCategory {
    if text.contains("fraud") || text.contains("unauthorized") {
        EscalationCategory::FraudSecurity
    } else if text.contains("death") || text.contains("bereavement") {
        EscalationCategory::BereavementEstate
    } else if text.contains("legal") {
        EscalationCategory::RegulatoryCompliance
    } else {
        current
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EscalationDecision {
    pub category: EscalationCategory,
    pub reason: EscalationReason,
    pub escalation_id: String,
    /// Rule that fired; `None` for the fail-safe escalation.
    pub rule: Option<RuleKind>,
}

impl EscalationDecision {
    fn new(category: EscalationCategory, reason: EscalationReason, rule: Option<RuleKind>) -> Self {
        Self {
            category,
            reason,
            escalation_id: escalation_id(category),
            rule,
        }
    }
}

/// `{PREFIX}-ESC-{unix seconds}`
pub fn escalation_id(category: EscalationCategory) -> String {
    format!(
        "{}-ESC-{}",
        category.id_prefix(),
        chrono::Utc::now().timestamp()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    Escalated(EscalationDecision),
    NoEscalation,
}

impl EscalationOutcome {
    pub fn decision(&self) -> Option<&EscalationDecision> {
        match self {
            EscalationOutcome::Escalated(decision) => Some(decision),
            EscalationOutcome::NoEscalation => None,
        }
    }
}

/// Decides whether a conversation should be handed to a human.
///
/// The engine holds no per-session state and performs no locking: callers
/// pass the session mutably and must serialize calls for the same session.
pub struct EscalationEngine {
    library: Result<&'static PatternLibrary, EscalationError>,
}

impl EscalationEngine {
    pub fn new() -> Self {
        Self {
            library: PatternLibrary::builtin(),
        }
    }

    /// Evaluate the rule table and record any escalation on the session.
    pub fn assess(
        &self,
        session: &mut SessionState,
        intent: &str,
        user_message: &str,
    ) -> EscalationOutcome {
        let tier = session.user_profile.tier;
        info!(
            intent = %intent,
            message_length = user_message.len(),
            customer_tier = %tier,
            interaction_count = session.conversation_history.len(),
            previous_escalations = session.previous_escalations,
            "checking escalation need"
        );

        let decision = match self.evaluate(session, intent, user_message) {
            Ok(Some((rule, category))) => {
                EscalationDecision::new(category, rule.reason(), Some(rule))
            }
            Ok(None) => return EscalationOutcome::NoEscalation,
            Err(e) => {
                error!(intent = %intent, error = %e, "error in escalation check");
                EscalationDecision::new(
                    EscalationCategory::GeneralInquiry,
                    EscalationReason::SystemError,
                    None,
                )
            }
        };

        session.previous_escalations = session.previous_escalations.saturating_add(1);

        info!(
            category = %decision.category,
            priority = %decision.category.info().priority,
            reason = %decision.reason,
            escalation_id = %decision.escalation_id,
            customer_tier = %tier,
            customer_id = session.user_profile.customer_id.as_deref().unwrap_or(formatter::UNKNOWN_CUSTOMER),
            "escalation triggered"
        );

        EscalationOutcome::Escalated(decision)
    }

    /// Assess and render the customer-facing response text.
    pub fn decide(&self, session: &mut SessionState, intent: &str, user_message: &str) -> String {
        let outcome = self.assess(session, intent, user_message);
        formatter::render(&outcome, &session.user_profile, user_message)
    }

    fn evaluate(
        &self,
        session: &SessionState,
        intent: &str,
        user_message: &str,
    ) -> Result<Option<(RuleKind, EscalationCategory)>, EscalationError> {
        let library = self.library.clone()?;

        let mut category = classify_with(library, intent, user_message);
        if session.user_profile.tier.is_priority() && category != EscalationCategory::GeneralInquiry
        {
            category = EscalationCategory::VipPremier;
        }

        let text = combined_text(intent, user_message);
        let input = RuleInput {
            text: &text,
            category,
            history_len: session.conversation_history.len(),
            previous_escalations: session.previous_escalations,
        };

        Ok(ESCALATION_RULES
            .iter()
            .find_map(|rule| rule.evaluate(&input, library).map(|c| (*rule, c))))
    }
}

impl Default for EscalationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::Priority;
    use crate::state::{ConversationTurn, CustomerTier, UserProfile};

    fn session(tier: CustomerTier) -> SessionState {
        SessionState::new(UserProfile {
            customer_id: Some("HK-0001".to_string()),
            tier,
        })
    }

    fn escalated(outcome: EscalationOutcome) -> EscalationDecision {
        match outcome {
            EscalationOutcome::Escalated(decision) => decision,
            EscalationOutcome::NoEscalation => panic!("expected an escalation"),
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            ESCALATION_RULES,
            [
                RuleKind::RepeatedInteractions,
                RuleKind::PriorEscalation,
                RuleKind::CriticalPatterns,
                RuleKind::HighPriorityPatterns,
                RuleKind::MediumPriorityPatterns,
                RuleKind::RepeatedHumanRequests,
            ]
        );
    }

    #[test]
    fn test_fraud_is_critical() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let decision =
            escalated(engine.assess(&mut state, "fraud", "my card was stolen and used"));

        assert_eq!(decision.category, EscalationCategory::FraudSecurity);
        assert_eq!(decision.category.info().priority, Priority::Critical);
        assert_eq!(decision.reason, EscalationReason::CriticalIssue);
        assert_eq!(decision.rule, Some(RuleKind::CriticalPatterns));
        assert!(decision.escalation_id.starts_with("FRA-ESC-"));
        assert_eq!(state.previous_escalations, 1);
    }

    #[test]
    fn test_neutral_message_does_not_escalate() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let outcome = engine.assess(&mut state, "opening hours", "when do you open?");

        assert_eq!(outcome, EscalationOutcome::NoEscalation);
        assert_eq!(state.previous_escalations, 0);
    }

    #[test]
    fn test_repeated_interactions_keep_category() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);
        for text in ["hi", "still there?", "hello?"] {
            state.record_turn(ConversationTurn::user(text));
        }

        let decision = escalated(engine.assess(&mut state, "refinance", "rates please"));

        assert_eq!(decision.reason, EscalationReason::RepeatedInteractions);
        assert_eq!(decision.category, EscalationCategory::MortgageLoans);
    }

    #[test]
    fn test_previous_escalation_goes_to_complaints() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);
        state.previous_escalations = 1;

        let decision = escalated(engine.assess(&mut state, "fraud", "stolen card"));

        // Prior escalation outranks critical patterns
        assert_eq!(decision.category, EscalationCategory::ComplaintDispute);
        assert_eq!(decision.reason, EscalationReason::PreviousEscalation);
        assert_eq!(state.previous_escalations, 2);
    }

    #[test]
    fn test_history_rule_needs_no_prior_escalation() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);
        state.previous_escalations = 1;
        for _ in 0..4 {
            state.record_turn(ConversationTurn::user("anyone?"));
        }

        let decision = escalated(engine.assess(&mut state, "", "anyone?"));
        assert_eq!(decision.reason, EscalationReason::PreviousEscalation);
    }

    #[test]
    fn test_critical_rederivation() {
        let engine = EscalationEngine::new();

        let mut state = session(CustomerTier::Standard);
        let decision = escalated(engine.assess(&mut state, "", "my mother's death last week"));
        assert_eq!(decision.category, EscalationCategory::BereavementEstate);

        let mut state = session(CustomerTier::Standard);
        let decision =
            escalated(engine.assess(&mut state, "", "I will take legal action over this"));
        assert_eq!(decision.category, EscalationCategory::RegulatoryCompliance);

        // Critical, but none of the re-routing keywords: keep the classified category
        let mut state = session(CustomerTier::Standard);
        let decision =
            escalated(engine.assess(&mut state, "", "emergency, the website keeps failing"));
        assert_eq!(decision.reason, EscalationReason::CriticalIssue);
        assert_eq!(decision.category, EscalationCategory::TechnicalIssue);
    }

    #[test]
    fn test_high_priority() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let decision = escalated(engine.assess(&mut state, "", "I am locked out of online banking"));

        assert_eq!(decision.reason, EscalationReason::HighPriority);
        assert_eq!(decision.category, EscalationCategory::AccountAccess);
    }

    #[test]
    fn test_medium_priority() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let decision = escalated(engine.assess(&mut state, "", "I need investment advice"));

        assert_eq!(decision.reason, EscalationReason::ComplexIssue);
        assert_eq!(decision.category, EscalationCategory::InvestmentAdvisory);
    }

    #[test]
    fn test_repeated_human_requests() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let decision = escalated(engine.assess(
            &mut state,
            "",
            "please connect me with a real person",
        ));

        assert_eq!(decision.reason, EscalationReason::RepeatedHumanRequests);
        assert_eq!(decision.category, EscalationCategory::GeneralInquiry);
        assert!(decision.escalation_id.starts_with("GEN-ESC-"));
    }

    #[test]
    fn test_single_human_request_is_not_enough() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let outcome = engine.assess(&mut state, "", "is there a person around");
        assert_eq!(outcome, EscalationOutcome::NoEscalation);
    }

    #[test]
    fn test_vip_override() {
        let engine = EscalationEngine::new();
        for tier in [CustomerTier::Vip, CustomerTier::Premier] {
            let mut state = session(tier);
            let decision =
                escalated(engine.assess(&mut state, "complaint", "about my mortgage"));
            assert_eq!(decision.category, EscalationCategory::VipPremier);
            assert_eq!(decision.reason, EscalationReason::HighPriority);
        }

        // Premium is not a priority tier
        let mut state = session(CustomerTier::Premium);
        let decision = escalated(engine.assess(&mut state, "complaint", "about my mortgage"));
        assert_eq!(decision.category, EscalationCategory::ComplaintDispute);
    }

    #[test]
    fn test_vip_general_inquiry_not_overridden() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Vip);

        let decision = escalated(engine.assess(&mut state, "", "can I talk to a human"));

        assert_eq!(decision.category, EscalationCategory::GeneralInquiry);
    }

    #[test]
    fn test_counter_increments_once_per_escalation() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        engine.assess(&mut state, "fraud", "unauthorized payment");
        engine.assess(&mut state, "", "what time is it");
        engine.assess(&mut state, "", "thanks");

        // First call is critical; the others fall to the prior-escalation rule
        assert_eq!(state.previous_escalations, 3);
    }

    #[test]
    fn test_fault_falls_back_to_general_escalation() {
        let engine = EscalationEngine {
            library: Err(EscalationError::PatternCompile("boom".to_string())),
        };
        let mut state = session(CustomerTier::Vip);

        let decision = escalated(engine.assess(&mut state, "fraud", "stolen"));

        assert_eq!(decision.category, EscalationCategory::GeneralInquiry);
        assert_eq!(decision.reason, EscalationReason::SystemError);
        assert_eq!(decision.rule, None);
        assert_eq!(state.previous_escalations, 1);
    }

    #[test]
    fn test_decide_renders_text() {
        let engine = EscalationEngine::new();
        let mut state = session(CustomerTier::Standard);

        let text = engine.decide(&mut state, "fraud", "my card was stolen and used");

        assert!(text.contains("**Category:** Fraud & Security"));
        assert!(text.contains("**Priority:** CRITICAL"));
        assert!(text.contains("Critical issue detected - immediate escalation required"));
        assert_eq!(state.previous_escalations, 1);
    }
}
