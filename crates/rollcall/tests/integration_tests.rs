//! End-to-end tests through the protocol dispatcher: JSON-RPC line in,
//! JSON-RPC response out, with the real registry and in-memory store.

use std::sync::Arc;

use rollcall::db::Database;
use rollcall::protocol;
use rollcall::tools::Registry;
use serde_json::{json, Value};

fn setup() -> Registry {
    let db = Arc::new(Database::in_memory().unwrap());
    Registry::with_user_tools(db)
}

fn call_tool(registry: &Registry, name: &str, arguments: Value) -> Value {
    let line = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
    .to_string();
    let response = protocol::handle_line(registry, &line).expect("expected a response");
    serde_json::to_value(&response).unwrap()
}

/// Unwrap the tool envelope from the MCP content wrapper.
fn envelope(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

fn user_args(username: &str, email: &str) -> Value {
    json!({
        "firstname": "Ada",
        "lastname": "Lovelace",
        "username": username,
        "email": email
    })
}

#[test]
fn test_add_then_get_roundtrip() {
    let registry = setup();

    let added = call_tool(&registry, "addUser", user_args("adal", "ada@example.com"));
    let env = envelope(&added);
    assert_eq!(env["success"], true);
    assert_eq!(env["message"], "User adal added successfully");

    let listed = call_tool(&registry, "getUsers", json!({}));
    let env = envelope(&listed);
    assert_eq!(env["success"], true);
    let users = env["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["firstname"], "Ada");
    assert_eq!(users[0]["lastname"], "Lovelace");
    assert_eq!(users[0]["username"], "adal");
    assert_eq!(users[0]["email"], "ada@example.com");
    assert!(users[0]["id"].is_i64());
    assert!(users[0]["created_at"].is_string());
}

#[test]
fn test_get_users_on_empty_store() {
    let registry = setup();

    let listed = call_tool(&registry, "getUsers", json!({}));
    let env = envelope(&listed);
    assert_eq!(env, json!({ "success": true, "users": [] }));
}

#[test]
fn test_validation_failure_leaves_store_untouched() {
    let registry = setup();

    let added = call_tool(
        &registry,
        "addUser",
        json!({
            "firstname": "Jo",
            "lastname": "Lovelace",
            "username": "adal",
            "email": "not-an-email"
        }),
    );
    assert_eq!(added["result"]["isError"], true);
    let env = envelope(&added);
    assert_eq!(env["success"], false);
    assert!(env["message"]
        .as_str()
        .unwrap()
        .starts_with("Validation failed: "));

    let listed = call_tool(&registry, "getUsers", json!({}));
    assert_eq!(envelope(&listed)["users"].as_array().unwrap().len(), 0);
}

#[test]
fn test_duplicate_username_rejected() {
    let registry = setup();

    call_tool(&registry, "addUser", user_args("adal", "ada@example.com"));
    let second = call_tool(&registry, "addUser", user_args("adal", "other@example.com"));

    let env = envelope(&second);
    assert_eq!(env["success"], false);
    assert!(env["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to add user: "));

    let listed = call_tool(&registry, "getUsers", json!({}));
    assert_eq!(envelope(&listed)["users"].as_array().unwrap().len(), 1);
}

#[test]
fn test_duplicate_email_rejected() {
    let registry = setup();

    call_tool(&registry, "addUser", user_args("adal", "ada@example.com"));
    let second = call_tool(&registry, "addUser", user_args("countess", "ada@example.com"));

    let env = envelope(&second);
    assert_eq!(env["success"], false);

    let listed = call_tool(&registry, "getUsers", json!({}));
    assert_eq!(envelope(&listed)["users"].as_array().unwrap().len(), 1);
}

#[test]
fn test_many_inserts_ids_unique_and_increasing() {
    let registry = setup();

    for i in 0..8 {
        let added = call_tool(
            &registry,
            "addUser",
            user_args(&format!("user{i}"), &format!("user{i}@example.com")),
        );
        assert_eq!(envelope(&added)["success"], true);
    }

    let listed = call_tool(&registry, "getUsers", json!({}));
    let env = envelope(&listed);
    let users = env["users"].as_array().unwrap();
    assert_eq!(users.len(), 8);

    let ids: Vec<i64> = users.iter().map(|u| u["id"].as_i64().unwrap()).collect();
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "ids must increase: {ids:?}");
    }
    assert_eq!(users[0]["username"], "user0");
    assert_eq!(users[7]["username"], "user7");
}

#[test]
fn test_tools_list_exposes_both_tools() {
    let registry = setup();

    let response = protocol::handle_line(
        &registry,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
    )
    .unwrap();
    let response = serde_json::to_value(&response).unwrap();

    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["addUser", "getUsers"]);

    let add_user = &tools[0];
    assert_eq!(add_user["description"], "Add a new user to the database");
    assert_eq!(add_user["inputSchema"]["type"], "object");
    assert_eq!(
        add_user["inputSchema"]["required"],
        json!(["firstname", "lastname", "username", "email"])
    );
}

#[test]
fn test_initialize_handshake() {
    let registry = setup();

    let init = protocol::handle_line(
        &registry,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#,
    )
    .unwrap();
    let init = serde_json::to_value(&init).unwrap();

    assert_eq!(init["jsonrpc"], "2.0");
    assert_eq!(init["id"], 1);
    assert!(init["result"]["serverInfo"].is_object());
    assert!(init["result"]["capabilities"]["tools"].is_object());

    // The initialized notification completes the handshake, no response owed
    let notified = protocol::handle_line(
        &registry,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    );
    assert!(notified.is_none());
}
