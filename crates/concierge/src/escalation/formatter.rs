use super::categories::{Priority, PREMIER_SERVICE_LINE};
use super::engine::{EscalationDecision, EscalationOutcome};
use crate::state::{CustomerTier, UserProfile};

pub const UNKNOWN_CUSTOMER: &str = "UNKNOWN";
const QUERY_PREVIEW_CHARS: usize = 150;

const CONTINUE_MESSAGE: &str = "I can continue helping you with your inquiry. If at any point you'd prefer to speak with a human representative, just let me know and I'll be happy to connect you.";

pub fn render(outcome: &EscalationOutcome, profile: &UserProfile, user_message: &str) -> String {
    match outcome {
        EscalationOutcome::Escalated(decision) => {
            render_escalation(decision, profile, user_message)
        }
        EscalationOutcome::NoEscalation => render_no_escalation(profile.tier),
    }
}

/// Customer-facing hand-off notice followed by a reference block for the human agent.
pub fn render_escalation(
    decision: &EscalationDecision,
    profile: &UserProfile,
    user_message: &str,
) -> String {
    let info = decision.category.info();
    let customer_id = profile.customer_id.as_deref().unwrap_or(UNKNOWN_CUSTOMER);

    let mut response = String::from("🔄 **Human Escalation Required**\n\n");
    response.push_str(&format!("**Category:** {}\n", info.name));
    response.push_str(&format!("**Priority:** {}\n", info.priority));
    response.push_str(&format!("**Department:** {}\n", info.department));
    response.push_str(&format!("**Reason:** {}\n", decision.reason));
    response.push_str(&format!("**Escalation ID:** {}\n", decision.escalation_id));
    if profile.tier != CustomerTier::Standard {
        response.push_str(&format!(
            "**Customer Tier:** {}\n",
            profile.tier.as_str().to_uppercase()
        ));
    }
    response.push('\n');

    match info.priority {
        Priority::Critical => {
            response.push_str(
                "🚨 **CRITICAL ISSUE** - I understand this is an extremely urgent matter. \
                 You are being immediately connected to our priority response team.\n\n",
            );
            response.push_str(&format!(
                "⚡ **Expected wait time:** < {} minutes\n",
                info.sla_minutes
            ));
            response.push_str(&format!("📞 **Emergency line:** {}\n", info.escalation_line));
            response.push_str("🔒 **Security verification:** May be required for your protection\n");
        }
        Priority::High => {
            response.push_str(&format!(
                "⚡ I understand this needs urgent attention. I'm connecting you with a \
                 specialist from our {} team.\n\n",
                info.department
            ));
            response.push_str(&format!(
                "🕐 **Expected wait time:** {} minutes\n",
                info.sla_minutes
            ));
            response.push_str(&format!("📞 **Direct line:** {}\n", info.escalation_line));
        }
        Priority::Medium | Priority::Standard => {
            response.push_str(&format!(
                "I'll connect you with a specialist from our {} team who can provide \
                 expert assistance with your inquiry.\n\n",
                info.department
            ));
            response.push_str(&format!(
                "🕐 **Expected wait time:** {} minutes\n",
                info.sla_minutes
            ));
            response.push_str(&format!("📞 **Contact line:** {}\n", info.escalation_line));
        }
    }

    response.push_str("\n**Agent Reference:**\n");
    response.push_str(&format!("- Customer ID: {}\n", customer_id));
    response.push_str(&format!("- Tier: {}\n", profile.tier));
    response.push_str(&format!("- Category: {}\n", decision.category.key()));
    if !user_message.is_empty() {
        response.push_str(&format!("- Query: {}\n", query_preview(user_message)));
    }

    response
}

pub fn render_no_escalation(tier: CustomerTier) -> String {
    let mut response = CONTINUE_MESSAGE.to_string();
    if tier.is_priority() {
        response.push_str(&format!(
            "\n\n💎 As a valued {} customer, you also have access to our dedicated customer \
             service line at {} for immediate assistance.",
            title_case(tier.as_str()),
            PREMIER_SERVICE_LINE
        ));
    }
    response
}

/// First 150 characters, with `...` appended when anything was cut.
fn query_preview(message: &str) -> String {
    if message.chars().count() > QUERY_PREVIEW_CHARS {
        let head: String = message.chars().take(QUERY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::{EscalationCategory, EscalationReason, RuleKind};
    use pretty_assertions::assert_eq;

    fn decision(category: EscalationCategory, reason: EscalationReason) -> EscalationDecision {
        EscalationDecision {
            category,
            reason,
            escalation_id: format!("{}-ESC-1700000000", category.id_prefix()),
            rule: Some(RuleKind::CriticalPatterns),
        }
    }

    fn profile(tier: CustomerTier) -> UserProfile {
        UserProfile {
            customer_id: Some("HK-0001".to_string()),
            tier,
        }
    }

    #[test]
    fn test_critical_layout() {
        let text = render_escalation(
            &decision(
                EscalationCategory::FraudSecurity,
                EscalationReason::CriticalIssue,
            ),
            &profile(CustomerTier::Standard),
            "my card was stolen and used",
        );

        let expected = "🔄 **Human Escalation Required**\n\
\n\
**Category:** Fraud & Security\n\
**Priority:** CRITICAL\n\
**Department:** Security Operations\n\
**Reason:** Critical issue detected - immediate escalation required\n\
**Escalation ID:** FRA-ESC-1700000000\n\
\n\
🚨 **CRITICAL ISSUE** - I understand this is an extremely urgent matter. You are being immediately connected to our priority response team.\n\
\n\
⚡ **Expected wait time:** < 2 minutes\n\
📞 **Emergency line:** +852 2233 3322\n\
🔒 **Security verification:** May be required for your protection\n\
\n\
**Agent Reference:**\n\
- Customer ID: HK-0001\n\
- Tier: standard\n\
- Category: FRAUD_SECURITY\n\
- Query: my card was stolen and used\n";

        assert_eq!(text, expected);
    }

    #[test]
    fn test_high_priority_with_tier_line() {
        let text = render_escalation(
            &decision(EscalationCategory::VipPremier, EscalationReason::HighPriority),
            &profile(CustomerTier::Vip),
            "complaint about my mortgage",
        );

        assert!(text.contains("**Escalation ID:** VIP-ESC-1700000000\n**Customer Tier:** VIP\n\n"));
        assert!(text.contains("specialist from our Premier Banking team.\n\n"));
        assert!(text.contains("🕐 **Expected wait time:** 5 minutes\n"));
        assert!(text.contains("📞 **Direct line:** +852 2233 3900\n"));
        assert!(text.contains("- Tier: vip\n"));
        assert!(text.contains("- Category: VIP_PREMIER\n"));
    }

    #[test]
    fn test_standard_priority_wording() {
        let text = render_escalation(
            &decision(
                EscalationCategory::GeneralInquiry,
                EscalationReason::RepeatedHumanRequests,
            ),
            &UserProfile::default(),
            "",
        );

        assert!(text.contains("who can provide expert assistance with your inquiry."));
        assert!(text.contains("📞 **Contact line:** +852 2233 3000\n"));
        assert!(text.contains("- Customer ID: UNKNOWN\n"));
        assert!(!text.contains("**Customer Tier:**"));
        // Empty message: no query line
        assert!(text.ends_with("- Category: GENERAL_INQUIRY\n"));
    }

    #[test]
    fn test_query_truncated_to_150_chars() {
        let long = "é".repeat(200);
        let text = render_escalation(
            &decision(
                EscalationCategory::GeneralInquiry,
                EscalationReason::SystemError,
            ),
            &profile(CustomerTier::Standard),
            &long,
        );
        let expected_line = format!("- Query: {}...\n", "é".repeat(150));
        assert!(text.ends_with(&expected_line));

        let exact = "a".repeat(150);
        assert_eq!(query_preview(&exact), exact);
    }

    #[test]
    fn test_no_escalation_messages() {
        assert_eq!(render_no_escalation(CustomerTier::Standard), CONTINUE_MESSAGE);
        assert_eq!(render_no_escalation(CustomerTier::Premium), CONTINUE_MESSAGE);

        let premier = render_no_escalation(CustomerTier::Premier);
        assert!(premier.starts_with(CONTINUE_MESSAGE));
        assert!(premier.contains("As a valued Premier customer"));
        assert!(premier.contains("+852 2233 3900"));

        let vip = render_no_escalation(CustomerTier::Vip);
        assert!(vip.contains("As a valued Vip customer"));
    }
}
