//! Rule file lifecycle.
//!
//! # Data Flow
//! ```text
//! create: name → validate → atomic write → settle → reload ─ok──▶ committed
//!                                                          └fail─▶ roll back
//! delete: exists? → remove → reload ─ok──▶ committed
//!                                   └fail─▶ reported, file stays removed
//! ```

pub mod lifecycle;
pub mod validator;

pub use lifecycle::{
    RuleCommit, RuleDirectory, RuleFileInfo, RuleFileManager, CREATED_MESSAGE, DELETED_MESSAGE, REPLACED_MESSAGE,
};
pub use validator::{JsonSchemaValidator, SchemaError, ValidationReport, Validator, RULES_SCHEMA};
