use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration for a single masking pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskPatternConfig {
    pub name: String,
    pub pattern: String,
    pub replacement: String,
}

/// Top-level masking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<MaskPatternConfig>,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: default_patterns(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

// Order matters: the phone pattern is broad enough to swallow card and account
// numbers, so it runs last.
fn default_patterns() -> Vec<MaskPatternConfig> {
    vec![
        MaskPatternConfig {
            name: "email".to_string(),
            pattern: r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b".to_string(),
            replacement: "***@***.com".to_string(),
        },
        MaskPatternConfig {
            name: "credit_card".to_string(),
            pattern: r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b".to_string(),
            replacement: "****-****-****-****".to_string(),
        },
        MaskPatternConfig {
            name: "ssn".to_string(),
            pattern: r"\b\d{3}-\d{2}-\d{4}\b".to_string(),
            replacement: "***-**-****".to_string(),
        },
        MaskPatternConfig {
            name: "hkid".to_string(),
            pattern: r"(?i)\b[A-Z]\d{6}\([A-Z0-9]\)".to_string(),
            replacement: "****(*)".to_string(),
        },
        MaskPatternConfig {
            name: "account_number".to_string(),
            pattern: r"(?i)\baccount\s*(?:number|no\.?)\s*:?\s*\d{6,12}\b".to_string(),
            replacement: "account number: ******".to_string(),
        },
        MaskPatternConfig {
            name: "phone".to_string(),
            pattern: r"(?:\+|\b)\(?\d[\d\s\-()]{5,13}\d\b".to_string(),
            replacement: "***-***-****".to_string(),
        },
    ]
}

/// A compiled masking pattern ready for scanning
struct MaskPattern {
    name: String,
    regex: Regex,
    replacement: String,
}

/// Result of a masking pass
#[derive(Debug)]
pub struct MaskResult {
    /// The text with masks applied (if any)
    pub masked_text: String,
    /// Total number of masked spans
    pub masked_count: usize,
    /// Names of patterns that matched
    pub matched: Vec<String>,
}

/// Replaces sensitive customer data with fixed masks before text reaches the model
pub struct SensitiveContentMasker {
    patterns: Vec<MaskPattern>,
    enabled: bool,
}

impl SensitiveContentMasker {
    /// Create a new masker from configuration.
    /// Compiles all regex patterns once at construction time.
    pub fn new(config: &MaskingConfig) -> Self {
        let patterns = config
            .patterns
            .iter()
            .filter_map(|p| match Regex::new(&p.pattern) {
                Ok(regex) => Some(MaskPattern {
                    name: p.name.clone(),
                    regex,
                    replacement: p.replacement.clone(),
                }),
                Err(e) => {
                    log::warn!("masking pattern '{}' failed to compile: {}", p.name, e);
                    None
                }
            })
            .collect();

        Self {
            patterns,
            enabled: config.enabled,
        }
    }

    /// Mask every configured pattern, in configuration order.
    pub fn mask(&self, text: &str) -> MaskResult {
        if !self.enabled {
            return MaskResult {
                masked_text: text.to_string(),
                masked_count: 0,
                matched: vec![],
            };
        }

        let mut masked = text.to_string();
        let mut masked_count = 0;
        let mut matched = Vec::new();

        for pattern in &self.patterns {
            let hits = pattern.regex.find_iter(&masked).count();
            if hits == 0 {
                continue;
            }
            masked_count += hits;
            matched.push(pattern.name.clone());
            // `NoExpand` keeps `$` in replacements literal
            masked = pattern
                .regex
                .replace_all(&masked, regex::NoExpand(&pattern.replacement))
                .into_owned();
        }

        MaskResult {
            masked_text: masked,
            masked_count,
            matched,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for SensitiveContentMasker {
    fn default() -> Self {
        Self::new(&MaskingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masker() -> SensitiveContentMasker {
        SensitiveContentMasker::default()
    }

    #[test]
    fn test_email_masked() {
        let result = masker().mask("Contact me at user@example.com please");
        assert_eq!(result.masked_text, "Contact me at ***@***.com please");
        assert_eq!(result.matched, vec!["email"]);
    }

    #[test]
    fn test_credit_card_masked_before_phone() {
        let result = masker().mask("Card: 4111 1111 1111 1111");
        assert_eq!(result.masked_text, "Card: ****-****-****-****");
        assert_eq!(result.matched, vec!["credit_card"]);
    }

    #[test]
    fn test_ssn_masked() {
        let result = masker().mask("My SSN is 123-45-6789");
        assert_eq!(result.masked_text, "My SSN is ***-**-****");
    }

    #[test]
    fn test_hkid_masked() {
        let result = masker().mask("ID a123456(7) on file");
        assert_eq!(result.masked_text, "ID ****(*) on file");
    }

    #[test]
    fn test_account_number_masked() {
        let result = masker().mask("My Account No. 123456789 is frozen");
        assert_eq!(
            result.masked_text,
            "My account number: ****** is frozen"
        );
        assert_eq!(result.matched, vec!["account_number"]);
    }

    #[test]
    fn test_phone_masked() {
        let result = masker().mask("Call me on +852 2233 3322 tomorrow");
        assert_eq!(result.masked_text, "Call me on ***-***-**** tomorrow");
        assert_eq!(result.masked_count, 1);
    }

    #[test]
    fn test_clean_text() {
        let result = masker().mask("How do I open a savings account?");
        assert_eq!(result.masked_count, 0);
        assert!(result.matched.is_empty());
        assert_eq!(result.masked_text, "How do I open a savings account?");
    }

    #[test]
    fn test_disabled_masker() {
        let config = MaskingConfig {
            enabled: false,
            ..MaskingConfig::default()
        };
        let result = SensitiveContentMasker::new(&config).mask("user@example.com");
        assert_eq!(result.masked_text, "user@example.com");
        assert!(!SensitiveContentMasker::new(&config).is_enabled());
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let config = MaskingConfig {
            enabled: true,
            patterns: vec![
                MaskPatternConfig {
                    name: "broken".to_string(),
                    pattern: "(".to_string(),
                    replacement: "x".to_string(),
                },
                MaskPatternConfig {
                    name: "ssn".to_string(),
                    pattern: r"\b\d{3}-\d{2}-\d{4}\b".to_string(),
                    replacement: "***-**-****".to_string(),
                },
            ],
        };
        let result = SensitiveContentMasker::new(&config).mask("123-45-6789");
        assert_eq!(result.masked_text, "***-**-****");
    }
}
