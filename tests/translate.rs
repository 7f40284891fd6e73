//! Integration tests for rewriting legacy rules into current syntax.
//! Tests: comment preservation, JSON ordering, meaning-preserving round trips

use acl_policy::{AclError, ParseOptions, Policy, SyntaxVersion, translate_legacy_rules};

fn translate(source: &str) -> String {
    let output = translate_legacy_rules(source.as_bytes()).expect("translation succeeds");
    String::from_utf8(output).expect("translation emits UTF-8")
}

fn parse(source: &str, syntax: SyntaxVersion) -> Policy {
    Policy::from_source(source, &ParseOptions::new(syntax)).expect("source parses")
}

const COMMENTED_LEGACY: &str = r#"
# top level comment

# block comment
agent "" {
  # policy comment
  policy = "write"
}

# block comment
key "" {
  # policy comment
  policy = "write"
}

# block comment
node "" {
  # policy comment
  policy = "write"
}

# block comment
event "" {
  # policy comment
  policy = "write"
}

# block comment
service "" {
  # policy comment
  policy = "write"
}

# block comment
session "" {
  # policy comment
  policy = "write"
}

# block comment
query "" {
  # policy comment
  policy = "write"
}

# comment
keyring = "write"

# comment
operator = "write"
"#;

#[test]
fn block_rewrite_keeps_comments_and_layout() {
    let expected = COMMENTED_LEGACY
        .replace("\nagent \"\"", "\nagent_prefix \"\"")
        .replace("\nkey \"\"", "\nkey_prefix \"\"")
        .replace("\nnode \"\"", "\nnode_prefix \"\"")
        .replace("\nevent \"\"", "\nevent_prefix \"\"")
        .replace("\nservice \"\"", "\nservice_prefix \"\"")
        .replace("\nsession \"\"", "\nsession_prefix \"\"")
        .replace("\nquery \"\"", "\nquery_prefix \"\"");

    let output = translate(COMMENTED_LEGACY);
    assert_eq!(output, expected.trim_matches('\n'));
    assert!(output.starts_with("# top level comment"));
    assert!(output.ends_with("operator = \"write\""));
    assert_eq!(output.matches("# policy comment").count(), 7);
}

#[test]
fn json_keeps_source_key_order() {
    let input = r#"
{
	"key": {
		"": { "policy": "read" },
		"key": { "policy": "read" },
		"policy": { "policy": "read" },
		"privatething1/": { "policy": "deny" },
		"anapplication/private/": { "policy": "deny" },
		"privatething2/": { "policy": "deny" }
	},
	"session": { "": { "policy": "write" } },
	"node": { "": { "policy": "read" } },
	"agent": { "": { "policy": "read" } },
	"service": { "": { "policy": "read" } },
	"event": { "": { "policy": "read" } },
	"query": { "": { "policy": "read" } }
}"#;

    let blocks = [
        ("key_prefix", "", "read"),
        ("key_prefix", "key", "read"),
        ("key_prefix", "policy", "read"),
        ("key_prefix", "privatething1/", "deny"),
        ("key_prefix", "anapplication/private/", "deny"),
        ("key_prefix", "privatething2/", "deny"),
        ("session_prefix", "", "write"),
        ("node_prefix", "", "read"),
        ("agent_prefix", "", "read"),
        ("service_prefix", "", "read"),
        ("event_prefix", "", "read"),
        ("query_prefix", "", "read"),
    ];
    let expected = blocks
        .iter()
        .map(|(keyword, id, level)| format!("{keyword} \"{id}\" {{\n  policy = \"{level}\"\n}}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    assert_eq!(translate(input), expected);
}

#[test]
fn empty_identifier_json_rule() {
    assert_eq!(
        translate(r#"{"node": {"": {"policy": "read"}}}"#),
        "node_prefix \"\" {\n  policy = \"read\"\n}"
    );
}

#[test]
fn translated_rules_mean_the_same() {
    let sources = [
        COMMENTED_LEGACY,
        r#"
        keyring = "read"
        key "team/" { policy = "list" }
        key "team/secret" { policy = "deny" }
        service "api" {
          policy = "write"
          intentions = "read"
        }
        "#,
        r#"{"operator": "read", "event": {"deploy": {"policy": "write"}}, "service": {"": {"policy": "read", "intentions": "deny"}}}"#,
    ];

    for source in sources {
        let legacy = parse(source, SyntaxVersion::Legacy);
        let translated = translate(source);
        let current = parse(&translated, SyntaxVersion::Current);
        assert_eq!(current, legacy, "translation of {source:?}");
    }
}

#[test]
fn translation_output_is_current_syntax_only() {
    let translated = translate(r#"node "" { policy = "read" } keyring = "write""#);
    let policy = parse(&translated, SyntaxVersion::Current);
    assert!(policy.nodes.is_empty());
    assert_eq!(policy.node_prefixes.len(), 1);
}

#[test]
fn crlf_sources_lose_no_content_and_gain_no_stray_returns() {
    let output = translate("\r\nnode \"\" { policy = \"read\" }\r\nkeyring = \"write\"\r\n");
    assert_eq!(output, "node_prefix \"\" { policy = \"read\" }\r\nkeyring = \"write\"");

    let json = translate("\u{FEFF}{\"node\": {\"\": {\"policy\": \"read\"}}}\r\n");
    assert_eq!(json, "node_prefix \"\" {\n  policy = \"read\"\n}");
}

#[test]
fn empty_source_translates_to_nothing() {
    assert_eq!(translate(""), "");
    assert_eq!(translate("\n\n# only a comment\n"), "# only a comment");
}

#[test]
fn malformed_sources_are_translation_errors() {
    let sources: [&[u8]; 3] = [b"key \"\" { policy = ", b"{\"key\": [", b"\xc3\x28"];
    for source in sources {
        match translate_legacy_rules(source) {
            Err(AclError::Translation { reason }) => assert!(!reason.is_empty()),
            other => panic!("expected translation error, got {other:?}"),
        }
    }
}
