//! Tool registry and handlers.
//!
//! Each tool is registered as a name, description, input schema, and handler
//! function. The dispatcher validates input before any storage access and
//! wraps every outcome in the uniform `Envelope`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::db::Database;
use crate::schema;
use crate::types::User;

/// Uniform response envelope every tool returns.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            users: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            users: None,
        }
    }

    pub fn users(users: Vec<User>) -> Self {
        Self {
            success: true,
            message: None,
            users: Some(users),
        }
    }
}

type Handler = Box<dyn Fn(&Database, &Value) -> Envelope + Send + Sync>;

/// A named operation. Name, description, and input schema are surfaced
/// through `tools/list`; the handler runs on `tools/call`.
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub handler: Handler,
}

/// Registry owning the storage handle and the set of registered tools.
pub struct Registry {
    db: Arc<Database>,
    tools: Vec<ToolDef>,
}

impl Registry {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            tools: Vec::new(),
        }
    }

    pub fn register(&mut self, tool: ToolDef) {
        self.tools.push(tool);
    }

    /// Registry with the two user tools installed.
    pub fn with_user_tools(db: Arc<Database>) -> Self {
        let mut registry = Self::new(db);
        registry.register(ToolDef {
            name: "addUser",
            description: "Add a new user to the database",
            input_schema: schema::add_user_schema(),
            handler: Box::new(add_user),
        });
        registry.register(ToolDef {
            name: "getUsers",
            description: "Get all users from the database",
            input_schema: schema::empty_schema(),
            handler: Box::new(get_users),
        });
        registry
    }

    /// Tool metadata in the shape `tools/list` expects.
    pub fn tool_listing(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                })
            })
            .collect()
    }

    /// Dispatch a tool call. Returns None when no tool with that name is
    /// registered.
    pub fn call(&self, name: &str, arguments: &Value) -> Option<Envelope> {
        let tool = self.tools.iter().find(|t| t.name == name)?;
        Some((tool.handler)(&self.db, arguments))
    }
}

/// addUser: validate, then insert. Validation failures never touch storage.
fn add_user(db: &Database, args: &Value) -> Envelope {
    let user = match schema::validate_new_user(args) {
        Ok(user) => user,
        Err(violations) => {
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%details, "addUser rejected by validation");
            return Envelope::fail(format!("Validation failed: {details}"));
        }
    };

    match db.insert_user(&user) {
        Ok(()) => {
            info!(username = %user.username, "user added");
            Envelope::ok(format!("User {} added successfully", user.username))
        }
        Err(e) => {
            warn!(username = %user.username, error = %e, "insert rejected");
            Envelope::fail(format!("Failed to add user: {e}"))
        }
    }
}

/// getUsers: arguments are ignored (the schema declares none).
fn get_users(db: &Database, _args: &Value) -> Envelope {
    match db.list_users() {
        Ok(users) => Envelope::users(users),
        Err(e) => {
            error!(error = %e, "listing users failed");
            Envelope::fail(format!("Failed to get users: {e}"))
        }
    }
}
