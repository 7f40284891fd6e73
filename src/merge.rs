//! Combines parsed policies into one effective policy.
//!
//! Every scalar and every rule keeps the level with the highest precedence
//! across all inputs. Rules are grouped by identifier per list, so the output
//! never repeats an identifier. Inputs are never mutated.

use std::collections::HashMap;

use tracing::trace;

use crate::types::{MatchKind, Policy, ResourceKind, Rule, ScalarKind, ServiceRule};

trait MergeRule: Clone {
    fn name(&self) -> &str;

    /// Fold a same-named rule into `self`, keeping the higher levels.
    fn absorb(&mut self, other: &Self);
}

impl MergeRule for Rule {
    fn name(&self) -> &str {
        &self.name
    }

    fn absorb(&mut self, other: &Self) {
        if other.policy.takes_precedence_over(self.policy) {
            self.policy = other.policy;
        }
    }
}

// `policy` and `intentions` are resolved independently of each other.
impl MergeRule for ServiceRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn absorb(&mut self, other: &Self) {
        if other.policy.takes_precedence_over(self.policy) {
            self.policy = other.policy;
        }
        if other.intentions.takes_precedence_over(self.intentions) {
            self.intentions = other.intentions;
        }
    }
}

/// Identifier-keyed accumulator that keeps first-seen order.
struct RuleMerger<R> {
    index: HashMap<String, usize>,
    rules: Vec<R>,
}

impl<R: MergeRule> RuleMerger<R> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            rules: Vec::new(),
        }
    }

    fn add(&mut self, rule: &R) {
        if let Some(&slot) = self.index.get(rule.name()) {
            self.rules[slot].absorb(rule);
            return;
        }
        self.index.insert(rule.name().to_owned(), self.rules.len());
        self.rules.push(rule.clone());
    }

    fn extend<'a, I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        for rule in rules {
            self.add(rule);
        }
    }

    fn finish(self) -> Vec<R> {
        self.rules
    }
}

/// Merge policies into the effective policy they grant together.
///
/// Merging a single policy yields an equal policy; merging nothing yields an
/// empty one.
pub fn merge_policies<'a, I>(policies: I) -> Policy
where
    I: IntoIterator<Item = &'a Policy>,
{
    let inputs: Vec<&Policy> = policies.into_iter().collect();
    let mut merged = Policy::default();

    for kind in ScalarKind::ALL {
        for policy in &inputs {
            let level = policy.scalar(kind);
            if level.takes_precedence_over(merged.scalar(kind)) {
                *merged.scalar_mut(kind) = level;
            }
        }
    }

    for kind in ResourceKind::ALL {
        for matching in [MatchKind::Exact, MatchKind::Prefix] {
            if kind == ResourceKind::Service {
                let mut merger = RuleMerger::new();
                for policy in &inputs {
                    merger.extend(policy.service_rules(matching));
                }
                *merged.service_rules_mut(matching) = merger.finish();
                continue;
            }

            let mut merger = RuleMerger::new();
            for policy in &inputs {
                merger.extend(policy.rules(kind, matching).unwrap_or_default());
            }
            if let Some(list) = merged.rules_mut(kind, matching) {
                *list = merger.finish();
            }
        }
    }

    trace!(
        target: "acl::merge",
        inputs = inputs.len(),
        rules = merged.rule_count(),
        "merged policies"
    );
    merged
}

impl Policy {
    /// Merge `other` into a copy of `self`.
    #[must_use]
    pub fn merge(&self, other: &Policy) -> Policy {
        merge_policies([self, other])
    }
}
