use std::fmt;

use logsplit_types::{Combinator, MatchRule, RuleKind};

use crate::error::{FilterError, Result};

/// Compiled form of a rule's keyword
#[derive(Clone)]
enum Matcher {
    Literal,
    /// Patterns the linear-time engine accepts
    Regex(regex::Regex),
    /// Patterns that need lookaround or backreferences
    Backtracking(fancy_regex::Regex),
}

/// A rule with its pattern compiled once at construction
#[derive(Clone)]
pub struct CompiledRule {
    rule: MatchRule,
    matcher: Matcher,
}

impl CompiledRule {
    /// Compile a rule; `index` is only used for error reporting
    pub fn compile(index: usize, rule: MatchRule) -> Result<Self> {
        let matcher = match rule.kind {
            RuleKind::Literal => Matcher::Literal,
            RuleKind::Regex => match regex::Regex::new(&rule.keyword) {
                Ok(re) => Matcher::Regex(re),
                Err(_) => {
                    let re = fancy_regex::Regex::new(&rule.keyword)
                        .map_err(|e| FilterError::invalid_pattern(index, &rule.keyword, e))?;
                    tracing::debug!(pattern = %rule.keyword, "using backtracking engine");
                    Matcher::Backtracking(re)
                }
            },
        };

        Ok(Self { rule, matcher })
    }

    /// Check whether the rule hits anywhere in `line`
    pub fn is_match(&self, line: &str) -> bool {
        match &self.matcher {
            Matcher::Literal => line.contains(self.rule.keyword.as_str()),
            Matcher::Regex(re) => re.is_match(line),
            Matcher::Backtracking(re) => re.is_match(line).unwrap_or_else(|e| {
                // Only the backtrack limit can fail here
                tracing::warn!(pattern = %self.rule.keyword, error = %e, "pattern gave up on line");
                false
            }),
        }
    }

    fn push_matches(&self, line: &str, out: &mut Vec<(usize, usize)>) {
        match &self.matcher {
            Matcher::Literal => {
                if self.rule.keyword.is_empty() {
                    return;
                }
                let len = self.rule.keyword.len();
                out.extend(
                    line.match_indices(self.rule.keyword.as_str())
                        .map(|(start, _)| (start, start + len)),
                );
            }
            Matcher::Regex(re) => {
                out.extend(
                    re.find_iter(line)
                        .filter(|m| !m.is_empty())
                        .map(|m| (m.start(), m.end())),
                );
            }
            Matcher::Backtracking(re) => {
                out.extend(
                    re.find_iter(line)
                        .map_while(|m| m.ok())
                        .filter(|m| m.start() != m.end())
                        .map(|m| (m.start(), m.end())),
                );
            }
        }
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = match self.matcher {
            Matcher::Literal => "literal",
            Matcher::Regex(_) => "regex",
            Matcher::Backtracking(_) => "backtracking",
        };
        f.debug_struct("CompiledRule")
            .field("keyword", &self.rule.keyword)
            .field("engine", &engine)
            .finish()
    }
}

/// Ordered rules combined with ALL or ANY
///
/// An empty rule set matches every line under [`Combinator::All`] and no
/// line under [`Combinator::Any`].
#[derive(Clone, Debug)]
pub struct Filter {
    rules: Vec<CompiledRule>,
    combinator: Combinator,
}

impl Filter {
    /// Compile every rule, failing on the first invalid pattern
    pub fn new<I>(rules: I, combinator: Combinator) -> Result<Self>
    where
        I: IntoIterator<Item = MatchRule>,
    {
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule::compile(index, rule))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, combinator })
    }

    /// Check if a line passes this filter
    pub fn matches(&self, line: &str) -> bool {
        match self.combinator {
            Combinator::All => self.rules.iter().all(|r| r.is_match(line)),
            Combinator::Any => self.rules.iter().any(|r| r.is_match(line)),
        }
    }

    /// Byte ranges hit by any rule, sorted and merged (for highlighting)
    pub fn find_matches(&self, line: &str) -> Vec<(usize, usize)> {
        let mut hits = Vec::new();
        for rule in &self.rules {
            rule.push_matches(line, &mut hits);
        }
        hits.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(hits.len());
        for (start, end) in hits {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
