//! # meta-forge-core
//!
//! Schema model for the meta-forge schema-definition language.
//!
//! - [`types`]: the frozen schema model (`SqlMeta`, tables, columns, views,
//!   statement templates, typed dialect hints) and the builders that produce it
//! - [`migration`]: the structural diff between two schema snapshots
//! - [`error`]: model construction and resolution errors
//!
//! A schema is assembled once through [`types::SqlMetaBuilder`] and is
//! read-only afterwards; every generator receives `&SqlMeta`.

pub mod error;
pub mod migration;
pub mod types;
