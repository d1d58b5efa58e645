use meta_forge_core::types::{
    BinaryOp, Column, DataType, DefaultValue, Delete, DialectKind, Dml, DmlStatement, Expr,
    Hint, HintKey, HintScope, HintTarget, Hints, Index, Insert, JoinKind, Literal, Reference,
    ReferentialAction, ScopedHint, Select, SqlMeta, SqlMetaBuilder, Table, TableBuilder, TableRef,
    UnaryOp, UnionKind, Update, View, ViewBuilder,
};

use crate::error::{DslError, Span};
use crate::lexer::SpannedToken;
use crate::token::Token;

/// Recursive descent parser for the `.meta` grammar.
///
/// Consumes a flat list of spanned tokens produced by the lexer. Errors
/// inside a table element, hint entry, or `ON DELETE` statement are recorded
/// and parsing resumes at the next separator; any other error abandons the
/// current statement and resumes at the next `;` or `CREATE`.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    errors: Vec<DslError>,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // -- Cursor helpers --

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|st| &st.token)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek_token() == Some(token)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        if self.pos < self.tokens.len() {
            let tok = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(tok)
        } else {
            None
        }
    }

    /// Consumes the next token if it is `token`.
    fn eat(&mut self, token: &Token) -> Option<SpannedToken> {
        if self.at(token) {
            self.advance()
        } else {
            None
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<SpannedToken, DslError> {
        match self.advance() {
            Some(st) if st.token == *expected => Ok(st),
            Some(st) => Err(unexpected(expected.description(), &st)),
            None => Err(self.end_of_input(expected.description())),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span), DslError> {
        match self.advance() {
            Some(st) if st.token.is_identifier() => Ok((ident_text(&st), st.span)),
            Some(st) => Err(unexpected(what, &st)),
            None => Err(self.end_of_input(what)),
        }
    }

    fn expect_string(&mut self) -> Result<(String, Span), DslError> {
        let st = self.expect(&Token::StringLiteral)?;
        Ok((unquote_string(&st.text), st.span))
    }

    fn expect_u32(&mut self) -> Result<u32, DslError> {
        let st = self.expect(&Token::IntegerLiteral)?;
        st.text
            .parse::<u32>()
            .map_err(|_| DslError::InvalidIntegerLiteral {
                text: st.text.clone(),
                span: st.span.clone(),
            })
    }

    fn end_span(&self) -> Span {
        self.tokens
            .last()
            .map(|st| Span::new(st.span.end, st.span.end))
            .unwrap_or(Span::new(0, 0))
    }

    fn end_of_input(&self, expected: &str) -> DslError {
        DslError::UnexpectedEndOfInput {
            expected: expected.to_string(),
            span: self.end_span(),
        }
    }

    /// An error describing the next token, without consuming it.
    fn unexpected_here(&self, expected: &str) -> DslError {
        match self.peek() {
            Some(st) => unexpected(expected, st),
            None => self.end_of_input(expected),
        }
    }

    // -- Error recovery --

    /// Skips a whole statement starting at the current position: up to and
    /// including the next `;` at nesting depth zero, or up to the next `CREATE`.
    fn recover_to_next_statement(&mut self) {
        self.advance();
        let mut depth: usize = 0;
        while let Some(token) = self.peek_token() {
            match token {
                Token::Create => return,
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips to `separator` or the enclosing `)` at the current depth,
    /// leaving either unconsumed.
    fn skip_to_separator(&mut self, separator: &Token) {
        let mut depth: usize = 0;
        while let Some(token) = self.peek_token() {
            match token {
                Token::RParen if depth == 0 => return,
                Token::RParen => depth -= 1,
                Token::LParen => depth += 1,
                Token::Create => return,
                t if depth == 0 && (t == separator || *t == Token::Semicolon) => return,
                _ => {}
            }
            self.advance();
        }
    }

    // -- Grammar productions --

    /// file = statement*
    fn parse_file(&mut self) -> Result<SqlMeta, Vec<DslError>> {
        let mut meta = SqlMetaBuilder::new();

        while self.peek().is_some() {
            let start = self.pos;
            if let Err(e) = self.parse_statement(&mut meta) {
                self.errors.push(e);
                self.pos = start;
                self.recover_to_next_statement();
            }
        }

        if !self.errors.is_empty() {
            return Err(std::mem::take(&mut self.errors));
        }
        meta.build().map_err(|source| {
            vec![DslError::CoreSchemaError {
                source,
                span: Span::new(0, 0),
            }]
        })
    }

    /// statement = "CREATE" (table | view | template) ";"
    fn parse_statement(&mut self, meta: &mut SqlMetaBuilder) -> Result<(), DslError> {
        self.expect(&Token::Create)?;
        let kind = self
            .advance()
            .ok_or_else(|| self.end_of_input("TABLE, VIEW, or STATEMENT"))?;

        match kind.token {
            Token::Table => {
                let parsed = self.parse_table()?;
                self.expect(&Token::Semicolon)?;
                if let Some((table, span)) = parsed {
                    if meta.contains_table(table.name()) {
                        self.duplicate("table", table.name(), span);
                    } else {
                        tracing::trace!(table = table.name(), "parsed table");
                        meta.add_table(table);
                    }
                }
            }
            Token::View => {
                let parsed = self.parse_view()?;
                self.expect(&Token::Semicolon)?;
                if let Some((view, span)) = parsed {
                    if meta.contains_view(view.name()) {
                        self.duplicate("view", view.name(), span);
                    } else {
                        meta.add_view(view);
                    }
                }
            }
            Token::Statement => {
                let (statement, span) = self.parse_template()?;
                self.expect(&Token::Semicolon)?;
                if meta.contains_statement(statement.name()) {
                    self.duplicate("statement", statement.name(), span);
                } else {
                    meta.add_statement(statement);
                }
            }
            _ => return Err(unexpected("TABLE, VIEW, or STATEMENT", &kind)),
        }
        Ok(())
    }

    fn duplicate(&mut self, kind: &'static str, name: &str, span: Span) {
        self.errors.push(DslError::DuplicateArtifact {
            kind,
            name: name.to_string(),
            span,
        });
    }

    /// table = IDENT "(" element ("," element)* ")" table_tail*
    ///
    /// Returns `None` when errors were recorded for the table.
    fn parse_table(&mut self) -> Result<Option<(Table, Span)>, DslError> {
        let (name, name_span) = self.expect_ident("table name")?;
        let errors_before = self.errors.len();
        let mut table = TableBuilder::new(name);

        self.expect(&Token::LParen)?;
        loop {
            let start = self.pos;
            if let Err(e) = self.parse_table_element(&mut table) {
                self.errors.push(e);
                self.pos = start;
                self.skip_to_separator(&Token::Comma);
            }
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        if self.errors.len() > errors_before && self.at(&Token::Semicolon) {
            // Element recovery already ran past the closing `)`.
            return Ok(None);
        }
        self.expect(&Token::RParen)?;

        loop {
            match self.peek_token() {
                Some(Token::Comment) => {
                    self.advance();
                    let (comment, _) = self.expect_string()?;
                    table.set_comment(comment);
                }
                Some(Token::On) => {
                    self.advance();
                    self.expect(&Token::Delete)?;
                    let statements = self.parse_dml_block()?;
                    table.set_on_delete(statements);
                }
                Some(Token::Dbms) => {
                    let hints = self.parse_hints(HintTarget::Table)?;
                    table.set_hints(hints);
                }
                _ => break,
            }
        }

        if self.errors.len() > errors_before {
            return Ok(None);
        }
        match table.build() {
            Ok(table) => Ok(Some((table, name_span))),
            Err(source) => {
                self.errors.push(DslError::CoreSchemaError {
                    source,
                    span: name_span,
                });
                Ok(None)
            }
        }
    }

    /// element = column | ["CONSTRAINT" IDENT] key_constraint | "INDEX" IDENT columns [hints]
    fn parse_table_element(&mut self, table: &mut TableBuilder) -> Result<(), DslError> {
        let constraint_name = match self.eat(&Token::Constraint) {
            Some(_) => Some(self.expect_ident("constraint name")?.0),
            None => None,
        };

        match self.peek_token() {
            Some(Token::Primary) => {
                self.advance();
                self.expect(&Token::Key)?;
                let columns = self.parse_column_list()?;
                table.add_primary_key(constraint_name, columns);
            }
            Some(Token::Unique) => {
                self.advance();
                let columns = self.parse_column_list()?;
                table.add_unique(constraint_name, columns);
            }
            Some(Token::Foreign) => {
                self.advance();
                self.expect(&Token::Key)?;
                self.expect(&Token::LParen)?;
                let (column, _) = self.expect_ident("column name")?;
                self.expect(&Token::RParen)?;
                let reference = self.parse_references()?;
                table.add_foreign_key(constraint_name, column, reference);
            }
            Some(Token::Index) if constraint_name.is_none() => {
                self.advance();
                let (name, _) = self.expect_ident("index name")?;
                let columns = self.parse_column_list()?;
                let hints = if self.at(&Token::Dbms) {
                    self.parse_hints(HintTarget::Index)?
                } else {
                    Hints::default()
                };
                table.add_index(Index {
                    name,
                    columns,
                    hints,
                });
            }
            _ if constraint_name.is_some() => {
                return Err(self.unexpected_here("PRIMARY KEY, UNIQUE, or FOREIGN KEY"));
            }
            _ => self.parse_column(table)?,
        }
        Ok(())
    }

    /// column = IDENT data_type column_option*
    fn parse_column(&mut self, table: &mut TableBuilder) -> Result<(), DslError> {
        let (name, name_span) = self.expect_ident("column definition or table constraint")?;
        let data_type = self.parse_data_type()?;
        let mut column = Column::builder(name.clone(), data_type);

        loop {
            match self.peek_token() {
                Some(Token::Not) => {
                    self.advance();
                    self.expect(&Token::Null)?;
                    column = column.not_null();
                }
                Some(Token::Null) => {
                    self.advance();
                    column = column.nullable(true);
                }
                Some(Token::Default) => {
                    self.advance();
                    column = column.default_value(self.parse_default()?);
                }
                Some(Token::Primary) => {
                    self.advance();
                    self.expect(&Token::Key)?;
                    column = column.not_null();
                    table.add_primary_key(None, vec![name.clone()]);
                }
                Some(Token::Unique) => {
                    self.advance();
                    table.add_unique(None, vec![name.clone()]);
                }
                Some(Token::References) => {
                    column = column.references(self.parse_references()?);
                }
                Some(Token::Comment) => {
                    self.advance();
                    let (comment, _) = self.expect_string()?;
                    column = column.comment(comment);
                }
                Some(Token::Dbms) => {
                    column = column.hints(self.parse_hints(HintTarget::Column)?);
                }
                _ => break,
            }
        }

        let column = column
            .build()
            .map_err(|source| DslError::CoreSchemaError {
                source,
                span: name_span,
            })?;
        table.add_column(column);
        Ok(())
    }

    /// data_type = BIT | INTEGER | BIGINT | FLOAT | DECIMAL "(" p ["," s] ")"
    ///           | NUMBER ["(" p ["," s] ")"] | CHAR "(" n ")" | VARCHAR "(" n ")"
    ///           | CLOB | DATE | TIME | DATETIME | BLOB
    fn parse_data_type(&mut self) -> Result<DataType, DslError> {
        let tok = self
            .advance()
            .ok_or_else(|| self.end_of_input("data type"))?;
        let core = |source| DslError::CoreSchemaError {
            source,
            span: tok.span.clone(),
        };

        match tok.token {
            Token::Bit => Ok(DataType::Bit),
            Token::Integer => Ok(DataType::Integer),
            Token::BigInt => Ok(DataType::BigInt),
            Token::Float => Ok(DataType::Float),
            Token::Clob => Ok(DataType::Clob),
            Token::Date => Ok(DataType::Date),
            Token::Time => Ok(DataType::Time),
            Token::DateTime => Ok(DataType::DateTime),
            Token::Blob => Ok(DataType::Blob),
            Token::Decimal => {
                self.expect(&Token::LParen)?;
                let precision = self.expect_u32()?;
                let scale = match self.eat(&Token::Comma) {
                    Some(_) => self.expect_u32()?,
                    None => 0,
                };
                self.expect(&Token::RParen)?;
                DataType::decimal(precision, scale).map_err(core)
            }
            Token::Number => {
                if self.eat(&Token::LParen).is_none() {
                    return Ok(DataType::Number {
                        precision: None,
                        scale: None,
                    });
                }
                let precision = self.expect_u32()?;
                let scale = match self.eat(&Token::Comma) {
                    Some(_) => Some(self.expect_u32()?),
                    None => None,
                };
                self.expect(&Token::RParen)?;
                if let Some(s) = scale {
                    DataType::decimal(precision, s).map_err(core)?;
                }
                Ok(DataType::Number {
                    precision: Some(precision),
                    scale,
                })
            }
            Token::Char | Token::Varchar => {
                self.expect(&Token::LParen)?;
                let length = self.expect_u32()?;
                self.expect(&Token::RParen)?;
                if tok.token == Token::Char {
                    DataType::char(length).map_err(core)
                } else {
                    DataType::varchar(length).map_err(core)
                }
            }
            _ => Err(unexpected("data type", &tok)),
        }
    }

    /// default = CURRENT_TIMESTAMP | literal
    fn parse_default(&mut self) -> Result<DefaultValue, DslError> {
        if self.eat(&Token::CurrentTimestamp).is_some() {
            return Ok(DefaultValue::CurrentTimestamp);
        }
        Ok(DefaultValue::Literal(self.parse_literal()?))
    }

    /// literal = NULL | STRING | ["-"] INTEGER | ["-"] DECIMAL
    fn parse_literal(&mut self) -> Result<Literal, DslError> {
        let negative = self.eat(&Token::Minus).is_some();
        let tok = self.advance().ok_or_else(|| self.end_of_input("literal"))?;
        match tok.token {
            Token::IntegerLiteral | Token::DecimalLiteral => number_literal(&tok, negative),
            Token::Null if !negative => Ok(Literal::Null),
            Token::StringLiteral if !negative => Ok(Literal::String(unquote_string(&tok.text))),
            _ => Err(unexpected("literal", &tok)),
        }
    }

    /// references = "REFERENCES" IDENT "(" IDENT ")" (("ON DELETE" | "ON UPDATE") action)*
    fn parse_references(&mut self) -> Result<Reference, DslError> {
        self.expect(&Token::References)?;
        let (table, _) = self.expect_ident("referenced table")?;
        self.expect(&Token::LParen)?;
        let (column, _) = self.expect_ident("referenced column")?;
        self.expect(&Token::RParen)?;

        let mut reference = Reference::new(table, column);
        while self.eat(&Token::On).is_some() {
            match self.advance() {
                Some(st) if st.token == Token::Delete => {
                    reference = reference.on_delete(self.parse_referential_action()?);
                }
                Some(st) if st.token == Token::Update => {
                    reference = reference.on_update(self.parse_referential_action()?);
                }
                Some(st) => return Err(unexpected("DELETE or UPDATE", &st)),
                None => return Err(self.end_of_input("DELETE or UPDATE")),
            }
        }
        Ok(reference)
    }

    /// action = CASCADE | SET NULL | NO ACTION | RESTRICT
    fn parse_referential_action(&mut self) -> Result<ReferentialAction, DslError> {
        let tok = self
            .advance()
            .ok_or_else(|| self.end_of_input("referential action"))?;
        match tok.token {
            Token::Cascade => Ok(ReferentialAction::Cascade),
            Token::Restrict => Ok(ReferentialAction::Restrict),
            Token::Set => {
                self.expect(&Token::Null)?;
                Ok(ReferentialAction::SetNull)
            }
            Token::No => {
                self.expect(&Token::Action)?;
                Ok(ReferentialAction::NoAction)
            }
            _ => Err(unexpected(
                "CASCADE, SET NULL, NO ACTION, or RESTRICT",
                &tok,
            )),
        }
    }

    /// columns = "(" IDENT ("," IDENT)* ")"
    fn parse_column_list(&mut self) -> Result<Vec<String>, DslError> {
        self.expect(&Token::LParen)?;
        let mut columns = vec![self.expect_ident("column name")?.0];
        while self.eat(&Token::Comma).is_some() {
            columns.push(self.expect_ident("column name")?.0);
        }
        self.expect(&Token::RParen)?;
        Ok(columns)
    }

    /// hints = "DBMS" "HINTS" "(" hint ("," hint)* ")"
    fn parse_hints(&mut self, target: HintTarget) -> Result<Hints, DslError> {
        self.expect(&Token::Dbms)?;
        self.expect(&Token::Hints)?;
        self.expect(&Token::LParen)?;

        let mut entries = Vec::new();
        loop {
            let start = self.pos;
            match self.parse_hint(target) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    self.errors.push(e);
                    self.pos = start;
                    self.skip_to_separator(&Token::Comma);
                }
            }
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(Hints::new(entries))
    }

    /// hint = (DIALECT | "ALL") KEY ["=" STRING]
    fn parse_hint(&mut self, target: HintTarget) -> Result<ScopedHint, DslError> {
        let scope_tok = self
            .advance()
            .ok_or_else(|| self.end_of_input("dialect name or ALL"))?;
        let scope = match scope_tok.token {
            Token::All => HintScope::All,
            Token::Ident => DialectKind::from_keyword(&scope_tok.text)
                .map(HintScope::Dialect)
                .ok_or_else(|| DslError::UnknownDialect {
                    name: scope_tok.text.clone(),
                    span: scope_tok.span.clone(),
                })?,
            _ => return Err(unexpected("dialect name or ALL", &scope_tok)),
        };

        let key_tok = self
            .advance()
            .ok_or_else(|| self.end_of_input("hint key"))?;
        if key_tok.token != Token::Ident {
            return Err(unexpected("hint key", &key_tok));
        }
        let key = HintKey::from_keyword(&key_tok.text).ok_or_else(|| DslError::UnknownHint {
            key: key_tok.text.clone(),
            span: key_tok.span.clone(),
        })?;
        if !key.allowed_on(target) {
            return Err(DslError::MisplacedHint {
                key: key_tok.text,
                target: target.to_string(),
                span: key_tok.span,
            });
        }

        let value = match self.eat(&Token::Eq) {
            Some(_) => Some(self.expect_string()?.0),
            None => None,
        };
        match (key.takes_value(), &value) {
            (true, None) => {
                return Err(DslError::MissingHintValue {
                    key: key_tok.text,
                    span: key_tok.span,
                })
            }
            (false, Some(_)) => {
                return Err(DslError::UnexpectedHintValue {
                    key: key_tok.text,
                    span: key_tok.span,
                })
            }
            _ => {}
        }

        let hint = Hint::from_parts(key, value).ok_or_else(|| DslError::MissingHintValue {
            key: key_tok.text.clone(),
            span: key_tok.span.clone(),
        })?;
        Ok(ScopedHint { scope, hint })
    }

    /// on_delete = "(" dml (";" dml)* [";"] ")"
    fn parse_dml_block(&mut self) -> Result<Vec<Dml>, DslError> {
        self.expect(&Token::LParen)?;
        let mut statements = Vec::new();
        while !self.at(&Token::RParen) && self.peek().is_some() {
            let start = self.pos;
            match self.parse_dml() {
                Ok(dml) => statements.push(dml),
                Err(e) => {
                    self.errors.push(e);
                    self.pos = start;
                    self.skip_to_separator(&Token::Semicolon);
                }
            }
            if self.eat(&Token::Semicolon).is_none() {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(statements)
    }

    /// view = IDENT columns "AS" select ("UNION" ["ALL"] select)* view_tail*
    fn parse_view(&mut self) -> Result<Option<(View, Span)>, DslError> {
        let (name, name_span) = self.expect_ident("view name")?;
        let errors_before = self.errors.len();
        let mut view = ViewBuilder::new(name);

        view.set_columns(self.parse_column_list()?);
        self.expect(&Token::As)?;
        view.add_select(None, self.parse_select()?);
        while self.eat(&Token::Union).is_some() {
            let kind = match self.eat(&Token::All) {
                Some(_) => UnionKind::All,
                None => UnionKind::Distinct,
            };
            view.add_select(Some(kind), self.parse_select()?);
        }

        loop {
            match self.peek_token() {
                Some(Token::Comment) => {
                    self.advance();
                    let (comment, _) = self.expect_string()?;
                    view.set_comment(comment);
                }
                Some(Token::Dbms) => {
                    let hints = self.parse_hints(HintTarget::View)?;
                    view.set_hints(hints);
                }
                _ => break,
            }
        }

        if self.errors.len() > errors_before {
            return Ok(None);
        }
        match view.build() {
            Ok(view) => Ok(Some((view, name_span))),
            Err(source) => {
                self.errors.push(DslError::CoreSchemaError {
                    source,
                    span: name_span,
                });
                Ok(None)
            }
        }
    }

    /// select = "SELECT" expr ("," expr)* "FROM" table_ref join* ["WHERE" expr]
    fn parse_select(&mut self) -> Result<Select, DslError> {
        self.expect(&Token::Select)?;
        let mut items = vec![self.parse_expr()?];
        while self.eat(&Token::Comma).is_some() {
            items.push(self.parse_expr()?);
        }
        self.expect(&Token::From)?;
        let mut select = Select::new(items, self.parse_table_ref()?);

        loop {
            let kind = match self.peek_token() {
                Some(Token::Join) => JoinKind::Inner,
                Some(Token::Inner) => {
                    self.advance();
                    JoinKind::Inner
                }
                Some(Token::Left) => {
                    self.advance();
                    self.eat(&Token::Outer);
                    JoinKind::Left
                }
                _ => break,
            };
            self.expect(&Token::Join)?;
            let table = self.parse_table_ref()?;
            self.expect(&Token::On)?;
            let on = self.parse_expr()?;
            select = select.join(kind, table, on);
        }

        if self.eat(&Token::Where).is_some() {
            select = select.filter(self.parse_expr()?);
        }
        Ok(select)
    }

    /// table_ref = IDENT [["AS"] IDENT]
    fn parse_table_ref(&mut self) -> Result<TableRef, DslError> {
        let (table, _) = self.expect_ident("table name")?;
        if self.eat(&Token::As).is_some() {
            let (alias, _) = self.expect_ident("table alias")?;
            return Ok(TableRef::aliased(table, alias));
        }
        if self.peek_token().is_some_and(Token::is_identifier) {
            let (alias, _) = self.expect_ident("table alias")?;
            return Ok(TableRef::aliased(table, alias));
        }
        Ok(TableRef::new(table))
    }

    /// template = IDENT "AS" dml
    fn parse_template(&mut self) -> Result<(DmlStatement, Span), DslError> {
        let (name, span) = self.expect_ident("statement name")?;
        self.expect(&Token::As)?;
        let body = self.parse_dml()?;
        Ok((DmlStatement::new(name, body), span))
    }

    /// dml = insert | update | delete
    fn parse_dml(&mut self) -> Result<Dml, DslError> {
        match self.peek_token() {
            Some(Token::Insert) => self.parse_insert(),
            Some(Token::Update) => self.parse_update(),
            Some(Token::Delete) => self.parse_delete(),
            _ => Err(self.unexpected_here("INSERT, UPDATE, or DELETE")),
        }
    }

    /// insert = "INSERT" "INTO" IDENT columns "VALUES" "(" expr ("," expr)* ")"
    fn parse_insert(&mut self) -> Result<Dml, DslError> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;
        let (table, span) = self.expect_ident("table name")?;
        let columns = self.parse_column_list()?;
        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;
        let mut values = vec![self.parse_expr()?];
        while self.eat(&Token::Comma).is_some() {
            values.push(self.parse_expr()?);
        }
        let close = self.expect(&Token::RParen)?;
        let insert = Insert::new(table, columns, values).map_err(|source| {
            DslError::CoreSchemaError {
                source,
                span: span.to(&close.span),
            }
        })?;
        Ok(Dml::Insert(insert))
    }

    /// update = "UPDATE" IDENT "SET" IDENT "=" expr ("," IDENT "=" expr)* ["WHERE" expr]
    fn parse_update(&mut self) -> Result<Dml, DslError> {
        self.expect(&Token::Update)?;
        let (table, _) = self.expect_ident("table name")?;
        self.expect(&Token::Set)?;
        let mut assignments = Vec::new();
        loop {
            let (column, _) = self.expect_ident("column name")?;
            self.expect(&Token::Eq)?;
            assignments.push((column, self.parse_expr()?));
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        let filter = match self.eat(&Token::Where) {
            Some(_) => Some(self.parse_expr()?),
            None => None,
        };
        Ok(Dml::Update(Update::new(table, assignments, filter)))
    }

    /// delete = "DELETE" "FROM" IDENT ["WHERE" expr]
    fn parse_delete(&mut self) -> Result<Dml, DslError> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;
        let (table, _) = self.expect_ident("table name")?;
        let filter = match self.eat(&Token::Where) {
            Some(_) => Some(self.parse_expr()?),
            None => None,
        };
        Ok(Dml::Delete(Delete::new(table, filter)))
    }

    // -- Expressions, loosest binding first --

    fn parse_expr(&mut self) -> Result<Expr, DslError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, DslError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or).is_some() {
            let right = self.parse_and()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, DslError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And).is_some() {
            let right = self.parse_not()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, DslError> {
        if self.eat(&Token::Not).is_some() {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// comparison = additive (cmp_op additive | "IS" ["NOT"] "NULL")*
    fn parse_comparison(&mut self) -> Result<Expr, DslError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                Some(Token::Like) => BinaryOp::Like,
                Some(Token::Is) => {
                    self.advance();
                    let negated = self.eat(&Token::Not).is_some();
                    self.expect(&Token::Null)?;
                    left = Expr::IsNull {
                        operand: Box::new(left),
                        negated,
                    };
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, DslError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Plus,
                Some(Token::Minus) => BinaryOp::Minus,
                Some(Token::Concat) => BinaryOp::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, DslError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    /// A `-` directly before a number folds into a negative literal.
    fn parse_unary(&mut self) -> Result<Expr, DslError> {
        if self.eat(&Token::Minus).is_none() {
            return self.parse_primary();
        }
        if matches!(
            self.peek_token(),
            Some(Token::IntegerLiteral | Token::DecimalLiteral)
        ) {
            let tok = self
                .advance()
                .ok_or_else(|| self.end_of_input("number"))?;
            return Ok(Expr::literal(number_literal(&tok, true)?));
        }
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        })
    }

    /// primary = literal | PARAMETER | IDENT ["." IDENT] | IDENT "(" [expr ("," expr)*] ")"
    ///         | case | "(" expr ")"
    fn parse_primary(&mut self) -> Result<Expr, DslError> {
        let tok = self
            .advance()
            .ok_or_else(|| self.end_of_input("expression"))?;
        match tok.token {
            Token::Null => Ok(Expr::literal(Literal::Null)),
            Token::StringLiteral => Ok(Expr::literal(Literal::String(unquote_string(&tok.text)))),
            Token::IntegerLiteral | Token::DecimalLiteral => {
                Ok(Expr::literal(number_literal(&tok, false)?))
            }
            Token::Parameter => Ok(Expr::Parameter {
                name: tok.text[1..].to_string(),
            }),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Case => self.parse_case(),
            Token::Ident | Token::QuotedIdent => {
                let name = ident_text(&tok);
                if tok.token == Token::Ident && self.eat(&Token::LParen).is_some() {
                    let mut args = Vec::new();
                    if !self.at(&Token::RParen) {
                        args.push(self.parse_expr()?);
                        while self.eat(&Token::Comma).is_some() {
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    return Ok(Expr::Function { name, args });
                }
                if self.eat(&Token::Dot).is_some() {
                    let (column, _) = self.expect_ident("column name")?;
                    return Ok(Expr::qualified(name, column));
                }
                Ok(Expr::column(name))
            }
            _ => Err(unexpected("expression", &tok)),
        }
    }

    /// case = "CASE" [expr] ("WHEN" expr "THEN" expr)+ ["ELSE" expr] "END"
    fn parse_case(&mut self) -> Result<Expr, DslError> {
        let operand = if self.at(&Token::When) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let mut branches = Vec::new();
        loop {
            self.expect(&Token::When)?;
            let when = self.parse_expr()?;
            self.expect(&Token::Then)?;
            let then = self.parse_expr()?;
            branches.push((when, then));
            if !self.at(&Token::When) {
                break;
            }
        }

        let otherwise = match self.eat(&Token::Else) {
            Some(_) => Some(Box::new(self.parse_expr()?)),
            None => None,
        };
        self.expect(&Token::End)?;
        Ok(Expr::Case {
            operand,
            branches,
            otherwise,
        })
    }
}

fn unexpected(expected: &str, found: &SpannedToken) -> DslError {
    let found_text = match found.token {
        Token::Ident
        | Token::QuotedIdent
        | Token::StringLiteral
        | Token::IntegerLiteral
        | Token::DecimalLiteral
        | Token::Parameter => format!("{} '{}'", found.token.description(), found.text),
        _ => found.token.description().to_string(),
    };
    DslError::UnexpectedToken {
        expected: expected.to_string(),
        found: found_text,
        span: found.span.clone(),
    }
}

fn ident_text(tok: &SpannedToken) -> String {
    match tok.token {
        Token::QuotedIdent => tok.text[1..tok.text.len() - 1].to_string(),
        _ => tok.text.clone(),
    }
}

/// Removes the surrounding quotes from a string literal and collapses `''`.
fn unquote_string(s: &str) -> String {
    s[1..s.len() - 1].replace("''", "'")
}

fn number_literal(tok: &SpannedToken, negative: bool) -> Result<Literal, DslError> {
    let text = if negative {
        format!("-{}", tok.text)
    } else {
        tok.text.clone()
    };
    match tok.token {
        Token::DecimalLiteral => Ok(Literal::Decimal(text)),
        _ => text
            .parse::<i64>()
            .map(Literal::Integer)
            .map_err(|_| DslError::InvalidIntegerLiteral {
                text,
                span: tok.span.clone(),
            }),
    }
}

/// Parse `.meta` source text into a schema.
///
/// # Errors
///
/// Returns every lexical, syntax, and local validation error found in one
/// pass, ordered by source position. No schema is returned if any error
/// occurred.
pub fn parse(source: &str) -> Result<SqlMeta, Vec<DslError>> {
    let (tokens, mut lex_errors) = crate::lexer::tokenize_lenient(source);
    let mut parser = Parser::new(tokens);
    let result = match parser.parse_file() {
        Ok(_) if !lex_errors.is_empty() => Err(lex_errors),
        Ok(meta) => Ok(meta),
        Err(mut errors) => {
            errors.append(&mut lex_errors);
            errors.sort_by_key(|e| e.span().start);
            Err(errors)
        }
    };
    match &result {
        Ok(meta) => tracing::debug!(
            tables = meta.tables().len(),
            views = meta.views().len(),
            statements = meta.statements().len(),
            "parsed schema"
        ),
        Err(errors) => tracing::debug!(errors = errors.len(), "schema has syntax errors"),
    }
    result
}

/// Parse a single expression, as used in view selects and DML.
///
/// # Errors
///
/// Returns the syntax errors found, including trailing input.
pub fn parse_expression(source: &str) -> Result<Expr, Vec<DslError>> {
    let tokens = crate::lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr().map_err(|e| vec![e])?;
    if parser.peek().is_some() {
        return Err(vec![parser.unexpected_here("end of expression")]);
    }
    Ok(expr)
}
