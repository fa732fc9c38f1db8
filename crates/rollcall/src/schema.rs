//! Validation contract for user records.
//!
//! Declares the per-field constraints, a pure validation function that
//! either parses the input or returns every violated constraint, and the
//! JSON Schemas published through `tools/list`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::types::NewUser;

/// Length bounds for firstname, lastname, and username.
/// Inclusive, counted in characters.
pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 20;

/// A single failed constraint and the field it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

/// Validate tool arguments for addUser.
///
/// Pure and single-pass. All violations are collected rather than stopping
/// at the first, so the caller gets one complete report.
pub fn validate_new_user(args: &Value) -> Result<NewUser, Vec<Violation>> {
    let mut violations = Vec::new();

    let firstname = bounded_string(args, "firstname", &mut violations);
    let lastname = bounded_string(args, "lastname", &mut violations);
    let username = bounded_string(args, "username", &mut violations);
    let email = email_field(args, &mut violations);

    match (firstname, lastname, username, email) {
        (Some(firstname), Some(lastname), Some(username), Some(email))
            if violations.is_empty() =>
        {
            Ok(NewUser {
                firstname,
                lastname,
                username,
                email,
            })
        }
        _ => Err(violations),
    }
}

fn string_field(
    args: &Value,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match args.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            violations.push(Violation {
                field,
                message: "must be a string".to_string(),
            });
            None
        }
        None => {
            violations.push(Violation {
                field,
                message: "is required".to_string(),
            });
            None
        }
    }
}

fn bounded_string(
    args: &Value,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let s = string_field(args, field, violations)?;
    let len = s.chars().count();
    if len < NAME_MIN || len > NAME_MAX {
        violations.push(Violation {
            field,
            message: format!("length must be between {NAME_MIN} and {NAME_MAX} characters"),
        });
    }
    Some(s)
}

fn email_field(args: &Value, violations: &mut Vec<Violation>) -> Option<String> {
    let s = string_field(args, "email", violations)?;
    if !email_regex().is_match(&s) {
        violations.push(Violation {
            field: "email",
            message: "must be a valid email address".to_string(),
        });
    }
    Some(s)
}

/// JSON Schema for the addUser tool.
pub fn add_user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "firstname": {
                "type": "string",
                "minLength": NAME_MIN,
                "maxLength": NAME_MAX,
                "description": "Given name"
            },
            "lastname": {
                "type": "string",
                "minLength": NAME_MIN,
                "maxLength": NAME_MAX,
                "description": "Family name"
            },
            "username": {
                "type": "string",
                "minLength": NAME_MIN,
                "maxLength": NAME_MAX,
                "description": "Unique login name"
            },
            "email": {
                "type": "string",
                "format": "email",
                "description": "Unique email address"
            }
        },
        "required": ["firstname", "lastname", "username", "email"]
    })
}

/// Schema for tools that take no arguments.
pub fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}
