//! Escalation category registry.
//!
//! The labels, SLAs and contact lines here are shown verbatim to customers and
//! staff, so they must not drift.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Standard,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Standard => "STANDARD",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static routing record for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub priority: Priority,
    pub department: &'static str,
    pub sla_minutes: u32,
    pub escalation_line: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationCategory {
    FraudSecurity,
    ComplaintDispute,
    TechnicalIssue,
    AccountAccess,
    InvestmentAdvisory,
    BereavementEstate,
    BusinessBanking,
    MortgageLoans,
    RegulatoryCompliance,
    VipPremier,
    GeneralInquiry,
}

impl EscalationCategory {
    /// Registry order. Classification walks this list and the first match wins.
    pub const ALL: [EscalationCategory; 11] = [
        EscalationCategory::FraudSecurity,
        EscalationCategory::ComplaintDispute,
        EscalationCategory::TechnicalIssue,
        EscalationCategory::AccountAccess,
        EscalationCategory::InvestmentAdvisory,
        EscalationCategory::BereavementEstate,
        EscalationCategory::BusinessBanking,
        EscalationCategory::MortgageLoans,
        EscalationCategory::RegulatoryCompliance,
        EscalationCategory::VipPremier,
        EscalationCategory::GeneralInquiry,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EscalationCategory::FraudSecurity => "FRAUD_SECURITY",
            EscalationCategory::ComplaintDispute => "COMPLAINT_DISPUTE",
            EscalationCategory::TechnicalIssue => "TECHNICAL_ISSUE",
            EscalationCategory::AccountAccess => "ACCOUNT_ACCESS",
            EscalationCategory::InvestmentAdvisory => "INVESTMENT_ADVISORY",
            EscalationCategory::BereavementEstate => "BEREAVEMENT_ESTATE",
            EscalationCategory::BusinessBanking => "BUSINESS_BANKING",
            EscalationCategory::MortgageLoans => "MORTGAGE_LOANS",
            EscalationCategory::RegulatoryCompliance => "REGULATORY_COMPLIANCE",
            EscalationCategory::VipPremier => "VIP_PREMIER",
            EscalationCategory::GeneralInquiry => "GENERAL_INQUIRY",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }

    /// Prefix used in escalation IDs, e.g. `FRA` for `FRAUD_SECURITY`.
    pub fn id_prefix(&self) -> String {
        let key = self.key();
        let first = key.split('_').next().unwrap_or(key);
        first.chars().take(3).collect::<String>().to_uppercase()
    }

    pub fn info(&self) -> &'static CategoryInfo {
        match self {
            EscalationCategory::FraudSecurity => &FRAUD_SECURITY,
            EscalationCategory::ComplaintDispute => &COMPLAINT_DISPUTE,
            EscalationCategory::TechnicalIssue => &TECHNICAL_ISSUE,
            EscalationCategory::AccountAccess => &ACCOUNT_ACCESS,
            EscalationCategory::InvestmentAdvisory => &INVESTMENT_ADVISORY,
            EscalationCategory::BereavementEstate => &BEREAVEMENT_ESTATE,
            EscalationCategory::BusinessBanking => &BUSINESS_BANKING,
            EscalationCategory::MortgageLoans => &MORTGAGE_LOANS,
            EscalationCategory::RegulatoryCompliance => &REGULATORY_COMPLIANCE,
            EscalationCategory::VipPremier => &VIP_PREMIER,
            EscalationCategory::GeneralInquiry => &GENERAL_INQUIRY,
        }
    }
}

impl fmt::Display for EscalationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Dedicated line offered to vip/premier customers even when no escalation happens.
pub const PREMIER_SERVICE_LINE: &str = "+852 2233 3900";

static FRAUD_SECURITY: CategoryInfo = CategoryInfo {
    name: "Fraud & Security",
    priority: Priority::Critical,
    department: "Security Operations",
    sla_minutes: 2,
    escalation_line: "+852 2233 3322",
};

static COMPLAINT_DISPUTE: CategoryInfo = CategoryInfo {
    name: "Complaints & Disputes",
    priority: Priority::High,
    department: "Customer Relations",
    sla_minutes: 15,
    escalation_line: "+852 2233 3000",
};

static TECHNICAL_ISSUE: CategoryInfo = CategoryInfo {
    name: "Technical Issues",
    priority: Priority::Medium,
    department: "Technical Support",
    sla_minutes: 30,
    escalation_line: "+852 2233 3100",
};

static ACCOUNT_ACCESS: CategoryInfo = CategoryInfo {
    name: "Account Access Problems",
    priority: Priority::High,
    department: "Account Services",
    sla_minutes: 10,
    escalation_line: "+852 2233 3200",
};

static INVESTMENT_ADVISORY: CategoryInfo = CategoryInfo {
    name: "Investment Advisory",
    priority: Priority::Medium,
    department: "Investment Services",
    sla_minutes: 45,
    escalation_line: "+852 2233 3400",
};

static BEREAVEMENT_ESTATE: CategoryInfo = CategoryInfo {
    name: "Bereavement & Estate",
    priority: Priority::High,
    department: "Estate Services",
    sla_minutes: 20,
    escalation_line: "+852 2233 3500",
};

static BUSINESS_BANKING: CategoryInfo = CategoryInfo {
    name: "Business Banking",
    priority: Priority::Medium,
    department: "Business Services",
    sla_minutes: 30,
    escalation_line: "+852 2233 3600",
};

static MORTGAGE_LOANS: CategoryInfo = CategoryInfo {
    name: "Mortgage & Loans",
    priority: Priority::Medium,
    department: "Lending Services",
    sla_minutes: 60,
    escalation_line: "+852 2233 3700",
};

static REGULATORY_COMPLIANCE: CategoryInfo = CategoryInfo {
    name: "Regulatory & Compliance",
    priority: Priority::High,
    department: "Compliance",
    sla_minutes: 30,
    escalation_line: "+852 2233 3800",
};

static VIP_PREMIER: CategoryInfo = CategoryInfo {
    name: "VIP & Premier Services",
    priority: Priority::High,
    department: "Premier Banking",
    sla_minutes: 5,
    escalation_line: PREMIER_SERVICE_LINE,
};

static GENERAL_INQUIRY: CategoryInfo = CategoryInfo {
    name: "General Customer Service",
    priority: Priority::Standard,
    department: "Customer Service",
    sla_minutes: 20,
    escalation_line: "+852 2233 3000",
};
