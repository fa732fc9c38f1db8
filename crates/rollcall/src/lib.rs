pub mod db;
pub mod protocol;
pub mod schema;
pub mod serve;
pub mod tools;
pub mod types;

pub use db::{Database, StoreError};
pub use tools::{Envelope, Registry, ToolDef};
pub use types::{NewUser, User};
