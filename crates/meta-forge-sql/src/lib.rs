//! # meta-forge-sql
//!
//! SQL generation for meta-forge schemas.
//!
//! - [`SqlGenerator`] renders a full `CREATE` script for one target dialect
//! - [`MigrationGenerator`] renders the migration between two schema
//!   snapshots, ending with the version-marker update
//! - [`dialect`] holds the [`Dialect`] strategy trait and its nine
//!   implementations
//!
//! References between artifacts are resolved when generation starts; an
//! unresolvable reference or a change the dialect cannot express is a
//! [`GenerateError`] and no script is produced.
//!
//! # Example
//!
//! ```
//! use meta_forge_core::types::DialectKind;
//! use meta_forge_sql::SqlGenerator;
//!
//! let meta = meta_forge_dsl::parse(
//!     "CREATE TABLE Customer (Id INTEGER NOT NULL PRIMARY KEY, Name VARCHAR(80));",
//! )
//! .expect("parse failed");
//!
//! let sql = SqlGenerator::new(DialectKind::Oracle)
//!     .generate_full_script(&meta)
//!     .expect("generation failed");
//! assert!(sql.contains("Name VARCHAR2(80 CHAR)"));
//! ```

pub mod dialect;
pub mod error;
pub mod generator;
pub mod identifier;
pub mod migrate;
pub mod resolve;
pub mod script;
pub mod trigger;

pub use dialect::{dialect_for, Capabilities, CommentStyle, Dialect, TypeContext};
pub use error::GenerateError;
pub use generator::SqlGenerator;
pub use migrate::{MigrationGenerator, MigrationOptions};
pub use resolve::resolve;
pub use script::{Script, Statement, StatementDelimiter};
pub use trigger::TriggerStrategy;
