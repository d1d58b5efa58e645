use std::fmt;

use serde::{Deserialize, Serialize};

use super::literal::Literal;

/// Binary operators, loosest-binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    Plus,
    Minus,
    Concat,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Concat => "||",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq
            | Self::NotEq
            | Self::Lt
            | Self::LtEq
            | Self::Gt
            | Self::GtEq
            | Self::Like => 4,
            Self::Plus | Self::Minus | Self::Concat => 5,
            Self::Multiply | Self::Divide => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn precedence(self) -> u8 {
        match self {
            Self::Not => 3,
            Self::Neg => 7,
        }
    }
}

const PRIMARY: u8 = 8;

/// An expression tree used by view selects, DML templates, and triggers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// A `:name` placeholder in a statement template.
    Parameter {
        name: String,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    IsNull {
        operand: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    pub fn literal(value: Literal) -> Self {
        Self::Literal { value }
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { op, .. } => op.precedence(),
            Self::IsNull { .. } => 4,
            Self::Literal {
                value: Literal::Integer(i),
            } if *i < 0 => UnaryOp::Neg.precedence(),
            _ => PRIMARY,
        }
    }

    /// Visits this expression and every sub-expression, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match self {
            Self::Function { args, .. } => args.iter().for_each(|a| a.walk(visit)),
            Self::Case {
                operand,
                branches,
                otherwise,
            } => {
                if let Some(op) = operand {
                    op.walk(visit);
                }
                for (when, then) in branches {
                    when.walk(visit);
                    then.walk(visit);
                }
                if let Some(e) = otherwise {
                    e.walk(visit);
                }
            }
            Self::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Self::Unary { operand, .. } | Self::IsNull { operand, .. } => operand.walk(visit),
            Self::Literal { .. } | Self::Column { .. } | Self::Parameter { .. } => {}
        }
    }

    /// Every column reference in the tree as `(qualifier, name)`.
    pub fn column_refs(&self) -> Vec<(Option<&str>, &str)> {
        let mut refs = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Column { qualifier, name } = e {
                refs.push((qualifier.as_deref(), name.as_str()));
            }
        });
        refs
    }
}

/// Rendering hooks for [`render`]. The defaults produce schema-definition syntax.
pub trait SqlStyle {
    fn identifier(&self, name: &str) -> String {
        name.to_string()
    }

    fn column(&self, qualifier: Option<&str>, name: &str) -> String {
        match qualifier {
            Some(q) => format!("{}.{}", self.identifier(q), self.identifier(name)),
            None => self.identifier(name),
        }
    }

    fn parameter(&self, name: &str) -> String {
        format!(":{name}")
    }

    fn function(&self, name: &str, args: Vec<String>) -> String {
        format!("{name}({})", args.join(", "))
    }

    fn concat(&self, left: String, right: String) -> String {
        format!("{left} || {right}")
    }

    fn literal(&self, value: &Literal) -> String {
        value.to_string()
    }
}

/// Schema-definition syntax with no identifier quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonical;

impl SqlStyle for Canonical {}

/// Renders an expression tree, adding parentheses only where precedence requires.
pub fn render(expr: &Expr, style: &dyn SqlStyle) -> String {
    match expr {
        Expr::Literal { value } => style.literal(value),
        Expr::Column { qualifier, name } => style.column(qualifier.as_deref(), name),
        Expr::Parameter { name } => style.parameter(name),
        Expr::Function { name, args } => {
            let args = args.iter().map(|a| render(a, style)).collect();
            style.function(name, args)
        }
        Expr::Case {
            operand,
            branches,
            otherwise,
        } => {
            let mut out = String::from("CASE");
            if let Some(op) = operand {
                out.push(' ');
                out.push_str(&render(op, style));
            }
            for (when, then) in branches {
                out.push_str(" WHEN ");
                out.push_str(&render(when, style));
                out.push_str(" THEN ");
                out.push_str(&render(then, style));
            }
            if let Some(e) = otherwise {
                out.push_str(" ELSE ");
                out.push_str(&render(e, style));
            }
            out.push_str(" END");
            out
        }
        Expr::Binary { op, left, right } => {
            let p = op.precedence();
            let l = wrap(left, style, left.precedence() < p);
            let r = wrap(right, style, right.precedence() <= p);
            match op {
                BinaryOp::Concat => style.concat(l, r),
                _ => format!("{l} {} {r}", op.symbol()),
            }
        }
        Expr::Unary { op, operand } => {
            let inner = wrap(operand, style, operand.precedence() < op.precedence());
            match op {
                UnaryOp::Not => format!("NOT {inner}"),
                UnaryOp::Neg if inner.starts_with('-') => format!("- {inner}"),
                UnaryOp::Neg => format!("-{inner}"),
            }
        }
        Expr::IsNull { operand, negated } => {
            let inner = wrap(operand, style, operand.precedence() <= 4);
            if *negated {
                format!("{inner} IS NOT NULL")
            } else {
                format!("{inner} IS NULL")
            }
        }
    }
}

fn wrap(expr: &Expr, style: &dyn SqlStyle, parens: bool) -> String {
    let text = render(expr, style);
    if parens {
        format!("({text})")
    } else {
        text
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self, &Canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Expr {
        Expr::literal(Literal::Integer(i))
    }

    #[test]
    fn precedence_adds_parentheses_only_when_needed() {
        let sum = Expr::binary(BinaryOp::Plus, Expr::column("a"), Expr::column("b"));
        let product = Expr::binary(BinaryOp::Multiply, sum.clone(), Expr::column("c"));
        assert_eq!(product.to_string(), "(a + b) * c");

        let flat = Expr::binary(BinaryOp::Plus, Expr::column("a"), Expr::binary(BinaryOp::Multiply, Expr::column("b"), Expr::column("c")));
        assert_eq!(flat.to_string(), "a + b * c");
    }

    #[test]
    fn right_operand_of_same_precedence_is_wrapped() {
        let e = Expr::binary(
            BinaryOp::Minus,
            Expr::column("a"),
            Expr::binary(BinaryOp::Minus, Expr::column("b"), Expr::column("c")),
        );
        assert_eq!(e.to_string(), "a - (b - c)");
    }

    #[test]
    fn case_and_functions() {
        let e = Expr::Case {
            operand: None,
            branches: vec![(
                Expr::binary(BinaryOp::Eq, Expr::qualified("c", "Kind"), int(1)),
                Expr::literal(Literal::String("A".into())),
            )],
            otherwise: Some(Box::new(Expr::Function {
                name: "UPPER".into(),
                args: vec![Expr::column("Name")],
            })),
        };
        assert_eq!(e.to_string(), "CASE WHEN c.Kind = 1 THEN 'A' ELSE UPPER(Name) END");
    }

    #[test]
    fn negation_of_negative_literal_keeps_a_space() {
        let e = Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(int(-1)),
        };
        assert_eq!(e.to_string(), "- -1");
    }

    #[test]
    fn is_null_and_not() {
        let e = Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(Expr::IsNull {
                operand: Box::new(Expr::column("x")),
                negated: true,
            }),
        };
        assert_eq!(e.to_string(), "NOT x IS NOT NULL");
    }

    struct Upper;

    impl SqlStyle for Upper {
        fn identifier(&self, name: &str) -> String {
            format!("\"{}\"", name.to_uppercase())
        }

        fn concat(&self, left: String, right: String) -> String {
            format!("CONCAT({left}, {right})")
        }
    }

    #[test]
    fn style_hooks_are_applied() {
        let e = Expr::binary(BinaryOp::Concat, Expr::qualified("t", "a"), Expr::column("b"));
        assert_eq!(render(&e, &Upper), "CONCAT(\"T\".\"A\", \"B\")");
    }

    #[test]
    fn column_refs_collects_all() {
        let e = Expr::binary(
            BinaryOp::And,
            Expr::binary(BinaryOp::Eq, Expr::qualified("OLD", "Id"), Expr::column("ParentId")),
            Expr::IsNull {
                operand: Box::new(Expr::column("Name")),
                negated: false,
            },
        );
        assert_eq!(
            e.column_refs(),
            vec![(Some("OLD"), "Id"), (None, "ParentId"), (None, "Name")]
        );
    }
}
