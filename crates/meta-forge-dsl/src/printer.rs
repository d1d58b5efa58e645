use meta_forge_core::types::{
    Column, DmlStatement, Hints, Reference, SqlMeta, SqlStyle, Table, UnionKind, View,
};

use crate::token::is_keyword;

const INDENT: &str = "    ";

/// Expression style for `.meta` text: identifiers that collide with
/// keywords are double-quoted.
struct DslStyle;

impl SqlStyle for DslStyle {
    fn identifier(&self, name: &str) -> String {
        ident(name)
    }
}

fn ident(name: &str) -> String {
    if is_keyword(name) {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

fn ident_list(names: &[String]) -> String {
    names.iter().map(|n| ident(n)).collect::<Vec<_>>().join(", ")
}

/// Print a whole schema as `.meta` text.
///
/// Tables come first, then views, then statement templates, each separated
/// by a blank line. Parsing the output yields an equal schema.
pub fn print(meta: &SqlMeta) -> String {
    let mut blocks: Vec<String> = Vec::new();
    blocks.extend(meta.tables().iter().map(print_table));
    blocks.extend(meta.views().iter().map(print_view));
    blocks.extend(meta.statements().iter().map(print_statement));
    blocks.join("\n")
}

/// Print a single `CREATE TABLE` statement.
pub fn print_table(table: &Table) -> String {
    let mut elements: Vec<String> = table.columns().iter().map(print_column).collect();

    let pk = table.primary_key();
    elements.push(format!(
        "CONSTRAINT {} PRIMARY KEY ({})",
        ident(&pk.name),
        ident_list(&pk.columns)
    ));
    for unique in table.unique_constraints() {
        elements.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            ident(&unique.name),
            ident_list(&unique.columns)
        ));
    }
    for fk in table.declared_foreign_keys() {
        elements.push(format!(
            "CONSTRAINT {} FOREIGN KEY ({}) {}",
            ident(&fk.name),
            ident(&fk.column),
            print_reference(&fk.reference)
        ));
    }
    for index in table.indexes() {
        let mut element = format!(
            "INDEX {} ({})",
            ident(&index.name),
            ident_list(&index.columns)
        );
        push_hints(&mut element, &index.hints);
        elements.push(element);
    }

    let mut output = format!("CREATE TABLE {} (\n", ident(table.name()));
    output.push_str(&indent_lines(&elements, ",\n"));
    output.push_str("\n)");

    if let Some(comment) = table.comment() {
        output.push_str(&format!("\nCOMMENT {}", quote(comment)));
    }
    if table.has_trigger() {
        output.push_str("\nON DELETE (\n");
        for statement in table.on_delete() {
            output.push_str(INDENT);
            output.push_str(&statement.render(&DslStyle));
            output.push_str(";\n");
        }
        output.push(')');
    }
    if !table.hints().is_empty() {
        output.push('\n');
        output.push_str(&hints_text(table.hints()));
    }
    output.push_str(";\n");
    output
}

fn print_column(column: &Column) -> String {
    let mut output = format!("{} {}", ident(column.name()), column.data_type());
    if !column.is_nullable() {
        output.push_str(" NOT NULL");
    }
    if let Some(default) = column.default_value() {
        output.push_str(&format!(" DEFAULT {default}"));
    }
    if let Some(reference) = column.reference() {
        output.push(' ');
        output.push_str(&print_reference(reference));
    }
    if let Some(comment) = column.comment() {
        output.push_str(&format!(" COMMENT {}", quote(comment)));
    }
    push_hints(&mut output, column.hints());
    output
}

fn print_reference(reference: &Reference) -> String {
    let mut output = format!(
        "REFERENCES {}({})",
        ident(&reference.table),
        ident(&reference.column)
    );
    if let Some(action) = reference.on_delete {
        output.push_str(&format!(" ON DELETE {}", action.as_sql()));
    }
    if let Some(action) = reference.on_update {
        output.push_str(&format!(" ON UPDATE {}", action.as_sql()));
    }
    output
}

/// Print a single `CREATE VIEW` statement.
pub fn print_view(view: &View) -> String {
    let mut output = format!(
        "CREATE VIEW {} ({}) AS\n",
        ident(view.name()),
        ident_list(view.columns())
    );
    output.push_str(INDENT);
    output.push_str(&view.query().first().render(&DslStyle));
    for (kind, select) in view.query().unions() {
        let keyword = match kind {
            UnionKind::Distinct => "UNION",
            UnionKind::All => "UNION ALL",
        };
        output.push_str(&format!("\n{INDENT}{keyword}\n{INDENT}"));
        output.push_str(&select.render(&DslStyle));
    }
    if let Some(comment) = view.comment() {
        output.push_str(&format!("\nCOMMENT {}", quote(comment)));
    }
    if !view.hints().is_empty() {
        output.push('\n');
        output.push_str(&hints_text(view.hints()));
    }
    output.push_str(";\n");
    output
}

/// Print a single `CREATE STATEMENT` template.
pub fn print_statement(statement: &DmlStatement) -> String {
    format!(
        "CREATE STATEMENT {} AS\n{INDENT}{};\n",
        ident(statement.name()),
        statement.body().render(&DslStyle)
    )
}

fn hints_text(hints: &Hints) -> String {
    let entries: Vec<String> = hints
        .iter()
        .map(|entry| match entry.hint.value() {
            Some(value) => format!("{} {} = {}", entry.scope, entry.hint.key(), quote(value)),
            None => format!("{} {}", entry.scope, entry.hint.key()),
        })
        .collect();
    format!("DBMS HINTS ({})", entries.join(", "))
}

fn push_hints(output: &mut String, hints: &Hints) {
    if !hints.is_empty() {
        output.push(' ');
        output.push_str(&hints_text(hints));
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn indent_lines(lines: &[String], separator: &str) -> String {
    lines
        .iter()
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join(separator)
}
