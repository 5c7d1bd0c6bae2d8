//! Pattern library for category inference and escalation priority tiers.
//!
//! Every table is compiled once, on first use, and shared read-only for the
//! life of the process.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use super::categories::EscalationCategory;
use super::EscalationError;

/// Category patterns in registry order. `GENERAL_INQUIRY` has none; it is the
/// fallback when nothing matches.
const CATEGORY_PATTERNS: &[(EscalationCategory, &[&str])] = &[
    (
        EscalationCategory::FraudSecurity,
        &[
            r"(fraud|unauthorized|stolen|hacked|security|breach|suspicious)",
            r"(card.*stolen|account.*hacked|unauthorized.*transaction)",
        ],
    ),
    (
        EscalationCategory::ComplaintDispute,
        &[
            r"(complaint|dispute|dissatisfied|unhappy|terrible)",
            r"(poor.*service|bad.*experience|not.*satisfied)",
        ],
    ),
    (
        EscalationCategory::TechnicalIssue,
        &[
            r"(technical|system|website|app|error|broken|not.*working)",
            r"(login.*problem|access.*issue|website.*down)",
        ],
    ),
    (
        EscalationCategory::AccountAccess,
        &[
            r"(cannot.*access|locked.*out|blocked|suspended|frozen)",
            r"(password.*reset|account.*locked|login.*blocked)",
        ],
    ),
    (
        EscalationCategory::InvestmentAdvisory,
        &[
            r"(investment|advisory|financial.*planning|portfolio)",
            r"(wealth.*management|asset.*allocation|retirement.*planning)",
        ],
    ),
    (
        EscalationCategory::BereavementEstate,
        &[
            r"(death|deceased|bereavement|inheritance|estate|probate)",
            r"(passed.*away|family.*member.*died|estate.*planning)",
        ],
    ),
    (
        EscalationCategory::BusinessBanking,
        &[
            r"(business|commercial|corporate|trade|import|export)",
            r"(business.*account|commercial.*banking|corporate.*services)",
        ],
    ),
    (
        EscalationCategory::MortgageLoans,
        &[
            r"(mortgage|loan|lending|credit|refinance|property)",
            r"(home.*loan|mortgage.*rate|loan.*application)",
        ],
    ),
    (
        EscalationCategory::RegulatoryCompliance,
        &[
            r"(regulatory|compliance|legal|lawsuit|court|ombudsman)",
            r"(legal.*action|compliance.*issue|regulatory.*matter)",
        ],
    ),
    (
        EscalationCategory::VipPremier,
        &[
            r"(premier|vip|private.*banking|wealth|high.*net.*worth)",
            r"(premier.*customer|vip.*service|private.*banker)",
        ],
    ),
];

const CRITICAL_PATTERNS: &[&str] = &[
    r"(fraud|unauthorized|stolen|hacked|security breach)",
    r"(emergency|crisis|urgent help|immediate assistance)",
    r"(death|deceased|bereavement|inheritance|estate)",
    r"(legal action|lawsuit|court|solicitor|ombudsman)",
];

const HIGH_PRIORITY_PATTERNS: &[&str] = &[
    r"(complaint|dispute|dissatisfied|terrible service)",
    r"(cannot access|locked out|account blocked)",
    r"(premier|vip|private banking|wealth management)",
    r"(regulatory|compliance|suspicious activity)",
];

const MEDIUM_PRIORITY_PATTERNS: &[&str] = &[
    r"(complex|complicated|multiple accounts|business)",
    r"(investment advice|financial planning|mortgage)",
    r"(technical issue|system error|website problem)",
    r"(speak to manager|supervisor|human agent)",
];

const HUMAN_REQUEST_PATTERNS: &[&str] = &[
    r"(human|person|agent|representative|operator)",
    r"(speak to|talk to|connect me|transfer me)",
    r"(not helping|can't help|unable to help)",
];

/// An ordered group of case-insensitive regexes.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn compile(sources: &[&str]) -> Result<Self, regex::Error> {
        let patterns = sources
            .iter()
            .map(|source| RegexBuilder::new(source).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Number of patterns in the set that match at least once.
    pub fn count_matching(&self, text: &str) -> usize {
        self.patterns.iter().filter(|p| p.is_match(text)).count()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// All compiled tables used by classification and escalation rules.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    pub categories: Vec<(EscalationCategory, PatternSet)>,
    pub critical: PatternSet,
    pub high_priority: PatternSet,
    pub medium_priority: PatternSet,
    pub human_request: PatternSet,
}

impl PatternLibrary {
    fn compile() -> Result<Self, regex::Error> {
        let categories = CATEGORY_PATTERNS
            .iter()
            .map(|(category, sources)| Ok((*category, PatternSet::compile(sources)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            categories,
            critical: PatternSet::compile(CRITICAL_PATTERNS)?,
            high_priority: PatternSet::compile(HIGH_PRIORITY_PATTERNS)?,
            medium_priority: PatternSet::compile(MEDIUM_PRIORITY_PATTERNS)?,
            human_request: PatternSet::compile(HUMAN_REQUEST_PATTERNS)?,
        })
    }

    /// The process-wide library.
    pub fn builtin() -> Result<&'static PatternLibrary, EscalationError> {
        static LIBRARY: LazyLock<Result<PatternLibrary, regex::Error>> =
            LazyLock::new(PatternLibrary::compile);

        LIBRARY
            .as_ref()
            .map_err(|e| EscalationError::PatternCompile(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_compiles() {
        let library = PatternLibrary::builtin().unwrap();
        assert_eq!(library.categories.len(), 10);
        assert_eq!(library.critical.len(), 4);
        assert_eq!(library.human_request.len(), 3);
        assert!(!library
            .categories
            .iter()
            .any(|(c, _)| *c == EscalationCategory::GeneralInquiry));
    }

    #[test]
    fn test_pattern_set_is_case_insensitive() {
        let set = PatternSet::compile(&[r"(fraud)"]).unwrap();
        assert!(set.is_match("FRAUD on my card"));
        assert!(!set.is_match("all good"));
    }

    #[test]
    fn test_count_matching_counts_patterns_not_occurrences() {
        let library = PatternLibrary::builtin().unwrap();
        let text = "agent agent agent, please transfer me";
        assert_eq!(library.human_request.count_matching(text), 2);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(PatternSet::compile(&["(unclosed"]).is_err());
    }
}
