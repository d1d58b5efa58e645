use logos::Logos;

use crate::error::{DslError, Span};
use crate::token::Token;

/// A token paired with its source span.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    pub text: String,
}

/// Tokenizes `.meta` source text into a sequence of spanned tokens.
///
/// Every unrecognised character is reported, not only the first.
///
/// # Errors
///
/// Returns one `DslError::InvalidToken` per byte run the lexer cannot match.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, Vec<DslError>> {
    let (tokens, errors) = tokenize_lenient(source);
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Tokenizes `source`, skipping unrecognised byte runs.
///
/// The returned tokens are everything the lexer could match; the errors name
/// each skipped run, so the parser can still report its own mistakes.
pub fn tokenize_lenient(source: &str) -> (Vec<SpannedToken>, Vec<DslError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let lexer = Token::lexer(source);
    for (result, range) in lexer.spanned() {
        let span = Span::new(range.start, range.end);
        match result {
            Ok(token) => {
                tokens.push(SpannedToken {
                    token,
                    span,
                    text: source[range].to_string(),
                });
            }
            Err(()) => {
                errors.push(DslError::InvalidToken {
                    text: source[range].to_string(),
                    span,
                });
            }
        }
    }

    (tokens, errors)
}
