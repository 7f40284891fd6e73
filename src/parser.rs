//! Maps decoded sources onto the rule model and validates every level.
//!
//! Decoding is encoding-specific (see [`crate::syntax`]); mapping is
//! syntax-specific and shared by both encodings. The keyword table in
//! [`crate::types::category`] decides which top-level keys are rules or
//! scalars for each syntax version, which list a rule lands in, and which
//! levels it may carry.

use tracing::debug;

use crate::error::{AclError, Result, SourceLocation};
use crate::syntax::{self, DecodeError, Entry, Value};
use crate::types::category::{TopLevelKey, lookup_top_level};
use crate::types::{
    AccessLevel, INTENTIONS_LEVELS, MatchKind, ParseOptions, Policy, ResourceKind, Rule,
    ScalarKind, ServiceRule, SourceFormat, SyntaxVersion,
};

/// View of one parsed rule handed to a [`PolicyValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCheck<'a> {
    /// Keyword the rule was declared under (`key`, `node_prefix`, ...).
    pub category: &'static str,
    pub kind: ResourceKind,
    pub matching: MatchKind,
    pub name: &'a str,
    pub policy: AccessLevel,
    /// Only present for service rules.
    pub intentions: Option<AccessLevel>,
}

/// Hook for checks the core does not know about.
///
/// Runs after built-in validation for every rule; an `Err` aborts the parse.
pub trait PolicyValidator {
    fn check(&self, rule: &RuleCheck<'_>) -> std::result::Result<(), String>;
}

/// Validator that accepts every rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PolicyValidator for AcceptAll {
    fn check(&self, _rule: &RuleCheck<'_>) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl Policy {
    /// Parse one policy source (block text or JSON, detected automatically).
    pub fn from_source(source: &str, options: &ParseOptions) -> Result<Policy> {
        Self::from_source_with(source, options, &AcceptAll)
    }

    /// Like [`Policy::from_source`], additionally running `validator` on each rule.
    pub fn from_source_with(
        source: &str,
        options: &ParseOptions,
        validator: &dyn PolicyValidator,
    ) -> Result<Policy> {
        let format = SourceFormat::detect(source, options.syntax);
        let entries = syntax::decode(source, format.encoding())
            .map_err(|err| syntax_error(options, err))?;

        let mut mapper = PolicyMapper {
            options,
            validator,
            policy: Policy::default(),
        };
        for entry in &entries {
            mapper.apply(entry)?;
        }

        let policy = mapper.policy;
        debug!(
            target: "acl::parse",
            path = options.path.as_deref().unwrap_or(""),
            format = ?format,
            rules = policy.rule_count(),
            "parsed policy source"
        );
        Ok(policy)
    }
}

/// Parse a policy from source text; `path` and `base_line` only appear in errors.
pub fn parse_policy(
    path: &str,
    base_line: usize,
    source: &str,
    syntax: SyntaxVersion,
    validator: Option<&dyn PolicyValidator>,
) -> Result<Policy> {
    let options = ParseOptions {
        path: (!path.is_empty()).then(|| path.to_owned()),
        base_line,
        syntax,
    };
    Policy::from_source_with(source, &options, validator.unwrap_or(&AcceptAll))
}

fn syntax_error(options: &ParseOptions, err: DecodeError) -> AclError {
    AclError::Syntax {
        location: location(options, err.line),
        reason: err.reason,
    }
}

fn location(options: &ParseOptions, line: Option<usize>) -> SourceLocation {
    SourceLocation::new(
        options.path.as_deref(),
        line.map(|line| line + options.base_line),
    )
}

struct PolicyMapper<'a> {
    options: &'a ParseOptions,
    validator: &'a dyn PolicyValidator,
    policy: Policy,
}

/// Raw fields of one rule body before validation.
#[derive(Default)]
struct RuleFields<'e> {
    policy: Option<&'e str>,
    intentions: Option<&'e str>,
}

impl PolicyMapper<'_> {
    fn apply(&mut self, entry: &Entry) -> Result<()> {
        let Some((label, target)) = lookup_top_level(self.options.syntax, &entry.key) else {
            debug!(
                target: "acl::parse",
                key = %entry.key,
                syntax = %self.options.syntax,
                "ignoring unknown top-level key"
            );
            return Ok(());
        };
        match target {
            TopLevelKey::Scalar(kind) => self.apply_scalar(label, kind, entry),
            TopLevelKey::Rules { kind, matching } => {
                self.apply_rules(label, kind, matching, entry)
            }
        }
    }

    fn apply_scalar(&mut self, label: &'static str, kind: ScalarKind, entry: &Entry) -> Result<()> {
        let Value::Str(raw) = &entry.value else {
            return Err(self.structure_error(
                entry.line,
                format!("`{label}` must be a string, found {}", entry.value.kind_label()),
            ));
        };
        let level = AccessLevel::parse(raw)
            .filter(|level| !level.is_set() || kind.allowed_levels().contains(level))
            .ok_or_else(|| AclError::InvalidPolicy {
                category: label,
                detail: format!("{raw:?}"),
                location: location(self.options, entry.line),
            })?;
        *self.policy.scalar_mut(kind) = level;
        Ok(())
    }

    fn apply_rules(
        &mut self,
        label: &'static str,
        kind: ResourceKind,
        matching: MatchKind,
        entry: &Entry,
    ) -> Result<()> {
        let Value::Object(rules) = &entry.value else {
            return Err(self.structure_error(
                entry.line,
                format!("`{label}` must contain rules keyed by name, found a string"),
            ));
        };

        for rule in rules {
            let fields = self.rule_fields(label, kind, rule)?;
            let line = rule.line.or(entry.line);

            let policy = fields
                .policy
                .and_then(AccessLevel::parse)
                .filter(|level| kind.allowed_levels().contains(level))
                .ok_or_else(|| AclError::InvalidPolicy {
                    category: label,
                    detail: format!("{:?} = {:?}", rule.key, fields.policy.unwrap_or("")),
                    location: location(self.options, line),
                })?;

            let intentions = match fields.intentions {
                None | Some("") => AccessLevel::Unset,
                Some(raw) => AccessLevel::parse(raw)
                    .filter(|level| INTENTIONS_LEVELS.contains(level))
                    .ok_or_else(|| AclError::InvalidIntentions {
                        detail: format!("{:?} = {raw:?}", rule.key),
                        location: location(self.options, line),
                    })?,
            };

            let check = RuleCheck {
                category: label,
                kind,
                matching,
                name: &rule.key,
                policy,
                intentions: (kind == ResourceKind::Service).then_some(intentions),
            };
            self.validator
                .check(&check)
                .map_err(|reason| AclError::Rejected {
                    category: label,
                    name: rule.key.clone(),
                    reason,
                })?;

            self.push(kind, matching, &rule.key, policy, intentions);
        }
        Ok(())
    }

    fn rule_fields<'e>(
        &self,
        label: &'static str,
        kind: ResourceKind,
        rule: &'e Entry,
    ) -> Result<RuleFields<'e>> {
        let Value::Object(fields) = &rule.value else {
            return Err(self.structure_error(
                rule.line,
                format!("`{label}` rule {:?} must be a block, found a string", rule.key),
            ));
        };

        let mut out = RuleFields::default();
        for field in fields {
            let slot = match field.key.as_str() {
                "policy" => &mut out.policy,
                "intentions" if kind == ResourceKind::Service => &mut out.intentions,
                other => {
                    debug!(
                        target: "acl::parse",
                        category = label,
                        rule = %rule.key,
                        field = other,
                        "ignoring unknown rule field"
                    );
                    continue;
                }
            };
            let Value::Str(raw) = &field.value else {
                return Err(self.structure_error(
                    field.line.or(rule.line),
                    format!("`{}` in `{label}` rule {:?} must be a string", field.key, rule.key),
                ));
            };
            *slot = Some(raw.as_str());
        }
        Ok(out)
    }

    fn push(
        &mut self,
        kind: ResourceKind,
        matching: MatchKind,
        name: &str,
        policy: AccessLevel,
        intentions: AccessLevel,
    ) {
        if let Some(list) = self.policy.rules_mut(kind, matching) {
            list.push(Rule::new(name, policy));
        } else {
            self.policy
                .service_rules_mut(matching)
                .push(ServiceRule::new(name, policy).with_intentions(intentions));
        }
    }

    fn structure_error(&self, line: Option<usize>, reason: String) -> AclError {
        AclError::Structure {
            location: location(self.options, line),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str, syntax: SyntaxVersion) -> Result<Policy> {
        Policy::from_source(src, &ParseOptions::new(syntax))
    }

    #[test]
    fn current_block_splits_exact_and_prefix() {
        let policy = parse(
            r#"
            key "foo" { policy = "list" }
            key_prefix "foo/" { policy = "write" }
            acl = "read"
            "#,
            SyntaxVersion::Current,
        )
        .unwrap();
        assert_eq!(policy.keys, vec![Rule::new("foo", AccessLevel::List)]);
        assert_eq!(policy.key_prefixes, vec![Rule::new("foo/", AccessLevel::Write)]);
        assert_eq!(policy.acl, AccessLevel::Read);
    }

    #[test]
    fn legacy_ignores_acl_and_prefix_keywords() {
        let policy = parse(
            r#"
            acl = "write"
            node_prefix "" { policy = "read" }
            node "" { policy = "write" }
            "#,
            SyntaxVersion::Legacy,
        )
        .unwrap();
        assert_eq!(policy.acl, AccessLevel::Unset);
        assert!(policy.nodes.is_empty());
        assert_eq!(policy.node_prefixes, vec![Rule::new("", AccessLevel::Write)]);
    }

    #[test]
    fn rule_policy_is_required() {
        let err = parse(r#"node "x" { }"#, SyntaxVersion::Current).unwrap_err();
        assert!(err.to_string().starts_with("Invalid node policy"), "{err}");
        let err = parse(r#"node "x" { policy = "" }"#, SyntaxVersion::Current).unwrap_err();
        assert!(err.to_string().starts_with("Invalid node policy"), "{err}");
    }

    #[test]
    fn scalar_rejects_list() {
        let err = parse(r#"acl = "list""#, SyntaxVersion::Current).unwrap_err();
        assert!(err.to_string().starts_with("Invalid acl policy"), "{err}");
    }

    #[test]
    fn intentions_only_read_on_services() {
        let policy = parse(
            r#"node "n" { policy = "read" intentions = "whatever" }"#,
            SyntaxVersion::Current,
        )
        .unwrap();
        assert_eq!(policy.nodes, vec![Rule::new("n", AccessLevel::Read)]);
    }

    #[test]
    fn empty_intentions_is_unset() {
        let policy = parse(
            r#"service "web" { policy = "read" intentions = "" }"#,
            SyntaxVersion::Current,
        )
        .unwrap();
        assert_eq!(policy.services[0].intentions, AccessLevel::Unset);
    }

    #[test]
    fn wrong_shapes_are_structure_errors() {
        let err = parse(r#"keyring = { a = "b" }"#, SyntaxVersion::Current).unwrap_err();
        assert!(matches!(err, AclError::Structure { .. }), "{err}");
        let err = parse(r#"key = "read""#, SyntaxVersion::Current).unwrap_err();
        assert!(matches!(err, AclError::Structure { .. }), "{err}");
        let err = parse(r#"{"key": {"a": "read"}}"#, SyntaxVersion::Current).unwrap_err();
        assert!(matches!(err, AclError::Structure { .. }), "{err}");
        assert!(err.to_string().starts_with("Failed to parse ACL rules"), "{err}");
    }

    #[test]
    fn location_includes_path_and_base_line() {
        let options = ParseOptions::builder()
            .path("team.hcl")
            .base_line(10)
            .syntax(SyntaxVersion::Current)
            .build();
        let err = Policy::from_source("\nagent \"a\" {\n policy = \"nope\"\n}", &options)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Invalid agent policy: "a" = "nope" (team.hcl:12)"#
        );
    }

    struct NoWildcards;

    impl PolicyValidator for NoWildcards {
        fn check(&self, rule: &RuleCheck<'_>) -> std::result::Result<(), String> {
            if rule.matching == MatchKind::Prefix && rule.name.is_empty() {
                return Err("wildcard prefixes are not allowed".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn validator_can_reject_rules() {
        let err = parse_policy(
            "",
            0,
            r#"service_prefix "" { policy = "read" }"#,
            SyntaxVersion::Current,
            Some(&NoWildcards),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AclError::Rejected {
                category: "service_prefix",
                ..
            }
        ));

        let policy = parse_policy(
            "",
            0,
            r#"service "" { policy = "read" }"#,
            SyntaxVersion::Current,
            Some(&NoWildcards),
        )
        .unwrap();
        assert_eq!(policy.services.len(), 1);
    }
}
