pub mod column;
pub mod constraint;
pub mod data_type;
pub mod dialect_kind;
pub mod dml;
pub mod expression;
pub mod hint;
pub mod identifier;
pub mod literal;
pub mod sql_meta;
pub mod table;
pub mod view;

pub use column::{Column, ColumnBuilder};
pub use constraint::{
    foreign_key_name, primary_key_name, unique_name, ForeignKey, Index, PrimaryKey,
    Reference, ReferentialAction, UniqueConstraint,
};
pub use data_type::{DataType, TypeFamily};
pub use dialect_kind::{DialectKind, UnknownDialect};
pub use dml::{Delete, Dml, DmlStatement, Insert, Update};
pub use expression::{render, BinaryOp, Canonical, Expr, SqlStyle, UnaryOp};
pub use hint::{Hint, HintKey, HintScope, HintTarget, Hints, ScopedHint};
pub use identifier::{is_identifier, validate_identifier};
pub use literal::{DefaultValue, Literal};
pub use sql_meta::{SqlMeta, SqlMetaBuilder};
pub use table::{Table, TableBuilder};
pub use view::{Join, JoinKind, Query, Select, TableRef, UnionKind, View, ViewBuilder};
