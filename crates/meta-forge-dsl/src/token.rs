use logos::Logos;

/// Tokens produced by the `.meta` lexer.
///
/// Keywords are upper case and case-sensitive; `Create` and `create` lex
/// as identifiers. Whitespace and SQL comments are skipped.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    // -- Statement keywords --
    #[token("CREATE")]
    Create,

    #[token("TABLE")]
    Table,

    #[token("VIEW")]
    View,

    #[token("STATEMENT")]
    Statement,

    #[token("AS")]
    As,

    // -- Query keywords --
    #[token("SELECT")]
    Select,

    #[token("FROM")]
    From,

    #[token("WHERE")]
    Where,

    #[token("JOIN")]
    Join,

    #[token("LEFT")]
    Left,

    #[token("INNER")]
    Inner,

    #[token("OUTER")]
    Outer,

    #[token("ON")]
    On,

    #[token("UNION")]
    Union,

    #[token("ALL")]
    All,

    // -- DML keywords --
    #[token("INSERT")]
    Insert,

    #[token("INTO")]
    Into,

    #[token("VALUES")]
    Values,

    #[token("UPDATE")]
    Update,

    #[token("SET")]
    Set,

    #[token("DELETE")]
    Delete,

    // -- Column and constraint keywords --
    #[token("NOT")]
    Not,

    #[token("NULL")]
    Null,

    #[token("DEFAULT")]
    Default,

    #[token("PRIMARY")]
    Primary,

    #[token("KEY")]
    Key,

    #[token("UNIQUE")]
    Unique,

    #[token("REFERENCES")]
    References,

    #[token("FOREIGN")]
    Foreign,

    #[token("CONSTRAINT")]
    Constraint,

    #[token("INDEX")]
    Index,

    #[token("COMMENT")]
    Comment,

    #[token("DBMS")]
    Dbms,

    #[token("HINTS")]
    Hints,

    #[token("CASCADE")]
    Cascade,

    #[token("NO")]
    No,

    #[token("ACTION")]
    Action,

    #[token("RESTRICT")]
    Restrict,

    #[token("CURRENT_TIMESTAMP")]
    CurrentTimestamp,

    // -- Expression keywords --
    #[token("CASE")]
    Case,

    #[token("WHEN")]
    When,

    #[token("THEN")]
    Then,

    #[token("ELSE")]
    Else,

    #[token("END")]
    End,

    #[token("AND")]
    And,

    #[token("OR")]
    Or,

    #[token("IS")]
    Is,

    #[token("LIKE")]
    Like,

    // -- Type keywords --
    #[token("BIT")]
    Bit,

    #[token("INTEGER")]
    Integer,

    #[token("BIGINT")]
    BigInt,

    #[token("FLOAT")]
    Float,

    #[token("DECIMAL")]
    Decimal,

    #[token("NUMBER")]
    Number,

    #[token("CHAR")]
    Char,

    #[token("VARCHAR")]
    Varchar,

    #[token("CLOB")]
    Clob,

    #[token("DATE")]
    Date,

    #[token("TIME")]
    Time,

    #[token("DATETIME")]
    DateTime,

    #[token("BLOB")]
    Blob,

    // -- Punctuation and operators --
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(".")]
    Dot,

    #[token("=")]
    Eq,

    #[token("<>")]
    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("||")]
    Concat,

    // -- Literals --
    /// A single-quoted string, `''` escapes a quote, e.g. `'it''s'`.
    #[regex(r"'([^']|'')*'")]
    StringLiteral,

    /// An unsigned integer, e.g. `42`. Signs are handled by the parser.
    #[regex(r"[0-9]+", priority = 2)]
    IntegerLiteral,

    /// An unsigned decimal, e.g. `3.14`.
    #[regex(r"[0-9]+\.[0-9]+", priority = 3)]
    DecimalLiteral,

    /// A statement-template placeholder, e.g. `:customerId`.
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*")]
    Parameter,

    // -- Identifiers --
    /// A double-quoted identifier, used to name an artifact after a keyword.
    #[regex(r#""[a-zA-Z_][a-zA-Z0-9_]*""#)]
    QuotedIdent,

    /// An identifier: letters, digits, and underscores, starting with a letter or underscore.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl Token {
    /// Returns a human-readable description of this token kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Create => "'CREATE'",
            Self::Table => "'TABLE'",
            Self::View => "'VIEW'",
            Self::Statement => "'STATEMENT'",
            Self::As => "'AS'",
            Self::Select => "'SELECT'",
            Self::From => "'FROM'",
            Self::Where => "'WHERE'",
            Self::Join => "'JOIN'",
            Self::Left => "'LEFT'",
            Self::Inner => "'INNER'",
            Self::Outer => "'OUTER'",
            Self::On => "'ON'",
            Self::Union => "'UNION'",
            Self::All => "'ALL'",
            Self::Insert => "'INSERT'",
            Self::Into => "'INTO'",
            Self::Values => "'VALUES'",
            Self::Update => "'UPDATE'",
            Self::Set => "'SET'",
            Self::Delete => "'DELETE'",
            Self::Not => "'NOT'",
            Self::Null => "'NULL'",
            Self::Default => "'DEFAULT'",
            Self::Primary => "'PRIMARY'",
            Self::Key => "'KEY'",
            Self::Unique => "'UNIQUE'",
            Self::References => "'REFERENCES'",
            Self::Foreign => "'FOREIGN'",
            Self::Constraint => "'CONSTRAINT'",
            Self::Index => "'INDEX'",
            Self::Comment => "'COMMENT'",
            Self::Dbms => "'DBMS'",
            Self::Hints => "'HINTS'",
            Self::Cascade => "'CASCADE'",
            Self::No => "'NO'",
            Self::Action => "'ACTION'",
            Self::Restrict => "'RESTRICT'",
            Self::CurrentTimestamp => "'CURRENT_TIMESTAMP'",
            Self::Case => "'CASE'",
            Self::When => "'WHEN'",
            Self::Then => "'THEN'",
            Self::Else => "'ELSE'",
            Self::End => "'END'",
            Self::And => "'AND'",
            Self::Or => "'OR'",
            Self::Is => "'IS'",
            Self::Like => "'LIKE'",
            Self::Bit => "'BIT'",
            Self::Integer => "'INTEGER'",
            Self::BigInt => "'BIGINT'",
            Self::Float => "'FLOAT'",
            Self::Decimal => "'DECIMAL'",
            Self::Number => "'NUMBER'",
            Self::Char => "'CHAR'",
            Self::Varchar => "'VARCHAR'",
            Self::Clob => "'CLOB'",
            Self::Date => "'DATE'",
            Self::Time => "'TIME'",
            Self::DateTime => "'DATETIME'",
            Self::Blob => "'BLOB'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Dot => "'.'",
            Self::Eq => "'='",
            Self::NotEq => "'<>'",
            Self::Lt => "'<'",
            Self::LtEq => "'<='",
            Self::Gt => "'>'",
            Self::GtEq => "'>='",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Concat => "'||'",
            Self::StringLiteral => "string literal",
            Self::IntegerLiteral => "integer literal",
            Self::DecimalLiteral => "decimal literal",
            Self::Parameter => "parameter",
            Self::QuotedIdent => "quoted identifier",
            Self::Ident => "identifier",
        }
    }

    /// Whether the token can name a table, column, or constraint.
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Ident | Self::QuotedIdent)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Returns true if `word` lexes as a single keyword and must be quoted to
/// be used as an identifier.
pub fn is_keyword(word: &str) -> bool {
    let mut lexer = Token::lexer(word);
    match lexer.next() {
        Some(Ok(token)) => {
            !token.is_identifier() && lexer.span() == (0..word.len()) && lexer.next().is_none()
        }
        _ => false,
    }
}
