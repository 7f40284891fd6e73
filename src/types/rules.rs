//! Parsed policy rule model.

use serde::{Deserialize, Serialize};

use super::category::{MatchKind, ResourceKind, ScalarKind};
use super::level::AccessLevel;

/// One rule: an identifier (resource name or prefix) and the level granted on it.
///
/// The empty identifier is legal; as a prefix it matches every resource in the category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub policy: AccessLevel,
}

impl Rule {
    pub fn new(name: impl Into<String>, policy: AccessLevel) -> Self {
        Self {
            name: name.into(),
            policy,
        }
    }
}

/// Service rule with a second, independent level governing traffic intentions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRule {
    pub name: String,
    pub policy: AccessLevel,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub intentions: AccessLevel,
}

impl ServiceRule {
    pub fn new(name: impl Into<String>, policy: AccessLevel) -> Self {
        Self {
            name: name.into(),
            policy,
            intentions: AccessLevel::Unset,
        }
    }

    #[must_use]
    pub fn with_intentions(mut self, intentions: AccessLevel) -> Self {
        self.intentions = intentions;
        self
    }
}

fn is_unset(level: &AccessLevel) -> bool {
    !level.is_set()
}

/// A single parsed policy or the effective result of merging several.
///
/// Every category has an exact-match list and a prefix-match list. A policy
/// with no rules and unset scalars is valid and grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub acl: AccessLevel,
    pub keyring: AccessLevel,
    pub operator: AccessLevel,
    pub agents: Vec<Rule>,
    pub agent_prefixes: Vec<Rule>,
    pub keys: Vec<Rule>,
    pub key_prefixes: Vec<Rule>,
    pub nodes: Vec<Rule>,
    pub node_prefixes: Vec<Rule>,
    pub events: Vec<Rule>,
    pub event_prefixes: Vec<Rule>,
    pub services: Vec<ServiceRule>,
    pub service_prefixes: Vec<ServiceRule>,
    pub sessions: Vec<Rule>,
    pub session_prefixes: Vec<Rule>,
    pub prepared_queries: Vec<Rule>,
    pub prepared_query_prefixes: Vec<Rule>,
}

impl Policy {
    #[must_use]
    pub fn scalar(&self, kind: ScalarKind) -> AccessLevel {
        match kind {
            ScalarKind::Acl => self.acl,
            ScalarKind::Keyring => self.keyring,
            ScalarKind::Operator => self.operator,
        }
    }

    pub fn scalar_mut(&mut self, kind: ScalarKind) -> &mut AccessLevel {
        match kind {
            ScalarKind::Acl => &mut self.acl,
            ScalarKind::Keyring => &mut self.keyring,
            ScalarKind::Operator => &mut self.operator,
        }
    }

    /// Rule list for a non-service category; `None` for [`ResourceKind::Service`],
    /// whose rules live in [`Policy::service_rules`].
    #[must_use]
    pub fn rules(&self, kind: ResourceKind, matching: MatchKind) -> Option<&[Rule]> {
        let list = match (kind, matching) {
            (ResourceKind::Agent, MatchKind::Exact) => &self.agents,
            (ResourceKind::Agent, MatchKind::Prefix) => &self.agent_prefixes,
            (ResourceKind::Key, MatchKind::Exact) => &self.keys,
            (ResourceKind::Key, MatchKind::Prefix) => &self.key_prefixes,
            (ResourceKind::Node, MatchKind::Exact) => &self.nodes,
            (ResourceKind::Node, MatchKind::Prefix) => &self.node_prefixes,
            (ResourceKind::Event, MatchKind::Exact) => &self.events,
            (ResourceKind::Event, MatchKind::Prefix) => &self.event_prefixes,
            (ResourceKind::Session, MatchKind::Exact) => &self.sessions,
            (ResourceKind::Session, MatchKind::Prefix) => &self.session_prefixes,
            (ResourceKind::Query, MatchKind::Exact) => &self.prepared_queries,
            (ResourceKind::Query, MatchKind::Prefix) => &self.prepared_query_prefixes,
            (ResourceKind::Service, _) => return None,
        };
        Some(list)
    }

    pub fn rules_mut(&mut self, kind: ResourceKind, matching: MatchKind) -> Option<&mut Vec<Rule>> {
        let list = match (kind, matching) {
            (ResourceKind::Agent, MatchKind::Exact) => &mut self.agents,
            (ResourceKind::Agent, MatchKind::Prefix) => &mut self.agent_prefixes,
            (ResourceKind::Key, MatchKind::Exact) => &mut self.keys,
            (ResourceKind::Key, MatchKind::Prefix) => &mut self.key_prefixes,
            (ResourceKind::Node, MatchKind::Exact) => &mut self.nodes,
            (ResourceKind::Node, MatchKind::Prefix) => &mut self.node_prefixes,
            (ResourceKind::Event, MatchKind::Exact) => &mut self.events,
            (ResourceKind::Event, MatchKind::Prefix) => &mut self.event_prefixes,
            (ResourceKind::Session, MatchKind::Exact) => &mut self.sessions,
            (ResourceKind::Session, MatchKind::Prefix) => &mut self.session_prefixes,
            (ResourceKind::Query, MatchKind::Exact) => &mut self.prepared_queries,
            (ResourceKind::Query, MatchKind::Prefix) => &mut self.prepared_query_prefixes,
            (ResourceKind::Service, _) => return None,
        };
        Some(list)
    }

    #[must_use]
    pub fn service_rules(&self, matching: MatchKind) -> &[ServiceRule] {
        match matching {
            MatchKind::Exact => &self.services,
            MatchKind::Prefix => &self.service_prefixes,
        }
    }

    pub fn service_rules_mut(&mut self, matching: MatchKind) -> &mut Vec<ServiceRule> {
        match matching {
            MatchKind::Exact => &mut self.services,
            MatchKind::Prefix => &mut self.service_prefixes,
        }
    }

    /// Total number of rules across every category list.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        let plain: usize = ResourceKind::ALL
            .into_iter()
            .flat_map(|kind| [(kind, MatchKind::Exact), (kind, MatchKind::Prefix)])
            .filter_map(|(kind, matching)| self.rules(kind, matching))
            .map(<[Rule]>::len)
            .sum();
        plain + self.services.len() + self.service_prefixes.len()
    }

    /// True when the policy has no rules and every scalar is unset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0 && ScalarKind::ALL.iter().all(|kind| !self.scalar(*kind).is_set())
    }
}
