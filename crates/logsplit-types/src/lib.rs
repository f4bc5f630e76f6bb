//! Shared types for logsplit
//!
//! This crate contains the rule and channel definitions used across the
//! logsplit crates, plus loading of filter configuration files.

use serde::{Deserialize, Serialize};

mod config;

pub use config::{ConfigError, FilterConfig, Result, DEFAULT_CONFIG_FILES};

// ============================================================================
// Rule Types
// ============================================================================

/// How a single rule's keyword is matched against a line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RuleKind {
    /// Case-sensitive substring containment
    #[default]
    Literal,
    /// Unanchored regular expression search
    Regex,
}

/// One match rule of a filter set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchRule {
    pub keyword: String,
    pub kind: RuleKind,
}

impl MatchRule {
    pub fn literal(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            kind: RuleKind::Literal,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            keyword: pattern.into(),
            kind: RuleKind::Regex,
        }
    }

    pub fn is_regex(&self) -> bool {
        self.kind == RuleKind::Regex
    }
}

/// Rule as written in a configuration file: `{ keyword, reg }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub keyword: String,

    /// Treat `keyword` as a regular expression
    #[serde(default)]
    pub reg: bool,
}

impl From<RuleConfig> for MatchRule {
    fn from(rule: RuleConfig) -> Self {
        Self {
            keyword: rule.keyword,
            kind: if rule.reg {
                RuleKind::Regex
            } else {
                RuleKind::Literal
            },
        }
    }
}

/// How the rules of one filter are combined
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every rule must match
    All,
    /// At least one rule must match
    #[default]
    Any,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }
}

// ============================================================================
// Channel Types
// ============================================================================

/// A named filter set; each one becomes an output channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSetConfig {
    pub name: String,

    #[serde(default)]
    pub filters: Vec<RuleConfig>,

    #[serde(default)]
    pub combinator: Combinator,
}

impl FilterSetConfig {
    pub fn new(name: impl Into<String>, combinator: Combinator) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            combinator,
        }
    }

    /// Add a rule (builder style, mostly for tests and embedded defaults)
    pub fn rule(mut self, keyword: impl Into<String>, reg: bool) -> Self {
        self.filters.push(RuleConfig {
            keyword: keyword.into(),
            reg,
        });
        self
    }

    /// Rules converted to their tagged form, in configuration order
    pub fn match_rules(&self) -> Vec<MatchRule> {
        self.filters.iter().cloned().map(MatchRule::from).collect()
    }
}

/// Which items a bounded buffer keeps once it is full
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RetentionPolicy {
    /// Keep the first N items, ignore the rest
    #[default]
    KeepFirst,
    /// Keep the most recent N items, evicting the oldest
    KeepLast,
}

impl RetentionPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::KeepFirst => "first",
            Self::KeepLast => "last",
        }
    }
}

/// Name of the channel that receives every non-blank line
pub const PASSTHROUGH_CHANNEL: &str = "original";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_config_into_match_rule() {
        let literal: MatchRule = RuleConfig {
            keyword: "error".to_string(),
            reg: false,
        }
        .into();
        assert_eq!(literal, MatchRule::literal("error"));

        let regex: MatchRule = RuleConfig {
            keyword: r"\d+".to_string(),
            reg: true,
        }
        .into();
        assert!(regex.is_regex());
    }

    #[test]
    fn test_filter_set_builder_keeps_order() {
        let set = FilterSetConfig::new("mixed", Combinator::All)
            .rule("b", false)
            .rule("a", true);
        let rules = set.match_rules();
        assert_eq!(rules[0], MatchRule::literal("b"));
        assert_eq!(rules[1], MatchRule::regex("a"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Combinator::default(), Combinator::Any);
        assert_eq!(RetentionPolicy::default(), RetentionPolicy::KeepFirst);
        assert_eq!(RetentionPolicy::KeepLast.label(), "last");
    }
}
