//! # meta-forge-dsl
//!
//! Parser and printer for the `.meta` schema definition language.
//!
//! This crate provides:
//! - A lexer that tokenizes `.meta` source files
//! - A recursive descent parser that produces a validated [`SqlMeta`]
//! - A printer that converts a [`SqlMeta`] back to `.meta` text
//! - Error recovery: one pass reports every syntax error it can find
//!
//! # Example
//!
//! ```
//! use meta_forge_dsl::{parse, print};
//!
//! let source = r#"
//! CREATE TABLE Customer (
//!     Id INTEGER NOT NULL PRIMARY KEY,
//!     Name VARCHAR(80) NOT NULL
//! );
//! "#;
//!
//! let meta = parse(source).expect("parse failed");
//! assert_eq!(meta.tables().len(), 1);
//! assert_eq!(meta.tables()[0].name(), "Customer");
//!
//! let text = print(&meta);
//! assert!(text.contains("CREATE TABLE Customer ("));
//! ```
//!
//! [`SqlMeta`]: meta_forge_core::types::SqlMeta

pub mod error;
mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

pub use error::{DslError, Span};
pub use parser::{parse, parse_expression};
pub use printer::{print, print_table, print_view};
