//! Integration tests for loading agent definitions from text and files.

use lodestar_mcp::{AgentConfig, ConfigLoadError, ProvisioningMode, SandboxConfig};
use std::path::PathBuf;

const AGENT: &str = r#"{
    "system_prompt": "You triage incoming support tickets.",
    "model": "anthropic/claude-sonnet-4-5",
    "mcp_servers": {
        "tickets": {
            "transport": "streamable_http",
            "url": "https://tickets.example.com/mcp",
            "headers": { "Authorization": "Bearer {{TICKETS_TOKEN}}" },
            "auth_from_context": true
        },
        "local": { "transport": "http", "url": "http://127.0.0.1:8931/mcp" }
    },
    "mcp_tools": {
        "tickets": ["list_tickets", "update_ticket"],
        "local": ["lookup"]
    },
    "recursion_limit": 40,
    "temperature": 0.3,
    "max_tokens": 2048,
    "sandbox_config": { "type": "filesystem", "root_dir": "/workspace" }
}"#;

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lodestar-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_a_complete_definition_from_text() {
    let config = AgentConfig::from_json_str(AGENT).unwrap();

    assert_eq!(config.max_iterations(), 40);
    assert_eq!(config.temperature(), Some(0.3));
    assert_eq!(config.max_tokens(), Some(2048));
    assert_eq!(
        config.providers().keys().collect::<Vec<_>>(),
        ["tickets", "local"]
    );
    assert_eq!(
        config.provider("tickets").unwrap().mode(),
        ProvisioningMode::Dynamic
    );
    assert_eq!(
        config.provider("local").unwrap().mode(),
        ProvisioningMode::Static
    );
    assert!(config.requires_substitutions());
    assert_eq!(
        config.placeholder_names().into_iter().collect::<Vec<_>>(),
        ["TICKETS_TOKEN"]
    );
    assert_eq!(config.sandbox(), Some(&SandboxConfig::filesystem("/workspace")));
    assert!(config.warnings().is_empty());
}

#[test]
fn loads_from_a_file() {
    let path = scratch_file("agent.json", AGENT);
    let config = AgentConfig::from_path(&path).unwrap();
    assert_eq!(config.tools_for("local").unwrap(), ["lookup"]);
}

#[test]
fn unreadable_file_is_an_io_error() {
    let path = std::env::temp_dir().join("lodestar-does-not-exist/agent.json");
    let err = AgentConfig::from_path(&path).unwrap_err();

    assert!(matches!(err, ConfigLoadError::Io { .. }));
    assert!(err.to_string().contains("agent.json"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = AgentConfig::from_json_str("{ \"model\": ").unwrap_err();
    assert!(matches!(err, ConfigLoadError::Json(_)));
}

#[test]
fn invalid_definition_lists_every_violation() {
    let path = scratch_file(
        "invalid.json",
        r#"{
            "system_prompt": "short",
            "model": "",
            "mcp_servers": {
                "plain": { "transport": "http", "url": "http://tools.example.com/mcp" },
                "orphan": { "transport": "websocket", "url": "https://o.example.com" }
            },
            "mcp_tools": { "plain": [], "ghost": ["x"] },
            "temperature": 3.5,
            "sandbox_config": { "type": "runloop" }
        }"#,
    );
    let err = AgentConfig::from_path(&path).unwrap_err();

    let ConfigLoadError::Invalid(invalid) = &err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(invalid.mentions("system_prompt"));
    assert!(invalid.mentions("model"));
    assert!(invalid.mentions("orphan"));
    assert!(invalid.mentions("ghost"));
    assert!(invalid.mentions("websocket"));
    assert!(invalid.mentions("mcp_tools.plain"));
    assert!(invalid.mentions("use https"));
    assert!(invalid.mentions("temperature"));
    assert!(invalid.mentions("'runloop' sandboxes are not available yet"));
    assert!(invalid.violations().len() >= 9);
}

#[test]
fn builder_runs_the_same_rules() {
    let err = AgentConfig::builder()
        .system_prompt("You summarise pull requests.")
        .model("anthropic/claude-sonnet-4-5")
        .provider("review", "ftp://review.example.com")
        .tools("review", ["diff", "diff"])
        .max_tokens(0)
        .build()
        .unwrap_err();

    assert!(err.mentions("unsupported scheme 'ftp'"));
    assert!(err.mentions("duplicate tool names: diff"));
    assert!(err.mentions("max_tokens"));
    assert_eq!(err.violations().len(), 3);
}
