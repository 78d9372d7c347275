use chumsky::prelude::*;

use crate::term::{Term, TermRef};

pub type Span = std::ops::Range<usize>;

#[derive(derive_more::Deref, Clone, Debug)]
pub struct Spanned<T>(#[deref] T, Span);
impl<T> Spanned<T> {
    pub fn value(&self) -> &T {
        &self.0
    }
    pub fn span(&self) -> Span {
        self.1.clone()
    }
}

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = "{}", "_0")]
    Ident(String),
    /// Any other character; the parser decides how to report it.
    #[display(fmt = "{}", "_0")]
    Other(char),
}

#[derive(PartialEq, Eq, Clone, Copy, derive_more::Display, Debug)]
pub enum ParseErrorKind {
    #[display(fmt = "mismatched parentheses")]
    MismatchedParens,
    #[display(fmt = "missing dot")]
    MissingDot,
    #[display(fmt = "unexpected character")]
    UnexpectedChar,
    #[display(fmt = "trailing input")]
    TrailingInput,
    #[display(fmt = "empty expression")]
    EmptyExpression,
}

/// A rejected input. The span counts characters of the input as given,
/// whitespace included.
#[derive(thiserror::Error, PartialEq, Eq, Clone, Debug)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
}
impl ParseError {
    fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
    /// Index of the offending character.
    pub fn position(&self) -> usize {
        self.span.start
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Splits the input into tokens; whitespace only separates them.
///
/// An identifier is one ASCII letter, optionally followed by quote marks.
/// Characters outside the grammar come out as [`Token::Other`].
pub fn lexer() -> impl Parser<char, Vec<Spanned<Token>>, Error = Simple<char>> {
    let ident = filter(char::is_ascii_alphabetic)
        .chain(just('\'').repeated())
        .collect::<String>()
        .map(Token::Ident);
    let token = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('.').to(Token::Dot),
        one_of("\\λ").to(Token::Lambda),
        ident,
        any().map(Token::Other),
    ));
    token
        .map_with_span(Spanned)
        .padded()
        .repeated()
        .padded()
        .then_ignore(end())
}

pub fn tokenize(s: &str) -> Result<Vec<Spanned<Token>>> {
    lexer().parse(s).map_err(|es| {
        let len = s.chars().count();
        match es.into_iter().next() {
            Some(e) => match e.found() {
                Some(c) => ParseError::new(
                    ParseErrorKind::UnexpectedChar,
                    format!("unexpected character '{c}' at position {}", e.span().start),
                    e.span(),
                ),
                None => ParseError::new(
                    ParseErrorKind::UnexpectedChar,
                    "unexpected end of the input",
                    e.span(),
                ),
            },
            None => ParseError::new(
                ParseErrorKind::UnexpectedChar,
                "could not tokenize the input",
                len..len + 1,
            ),
        }
    })
}

struct TermParser<'t> {
    tokens: &'t [Spanned<Token>],
    pos: usize,
    eoi: Span,
}

impl<'t> TermParser<'t> {
    fn peek(&self) -> Option<&'t Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn here(&self) -> Span {
        self.peek().map_or_else(|| self.eoi.clone(), Spanned::span)
    }

    /// Juxtaposed atoms, folded to the left. Stops in front of `)` or at the
    /// end of the input; `None` if there was not a single atom.
    fn sequence(&mut self) -> Result<Option<TermRef>> {
        let mut term: Option<TermRef> = None;
        while let Some(atom) = self.atom()? {
            term = Some(match term {
                Some(lhs) => Term::apply(lhs, atom),
                None => atom,
            });
        }
        Ok(term)
    }

    fn atom(&mut self) -> Result<Option<TermRef>> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        match token.value() {
            Token::RParen => Ok(None),
            Token::Ident(name) => {
                self.pos += 1;
                Ok(Some(Term::var(name.as_str())))
            }
            Token::Lambda => self.abstraction(token.span()).map(Some),
            Token::LParen => self.parenthesized(token.span()).map(Some),
            Token::Dot | Token::Other(_) => Err(ParseError::new(
                ParseErrorKind::UnexpectedChar,
                format!(
                    "unexpected character '{}' at position {}",
                    token.value(),
                    token.span().start
                ),
                token.span(),
            )),
        }
    }

    fn parenthesized(&mut self, open: Span) -> Result<TermRef> {
        self.pos += 1;
        let inner = self.sequence()?;
        let close = match self.peek() {
            Some(token) if token.value() == &Token::RParen => token.span(),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::MismatchedParens,
                    format!("'(' at position {} is never closed", open.start),
                    open,
                ))
            }
        };
        self.pos += 1;
        inner.ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::EmptyExpression,
                format!("empty parentheses at position {}", open.start),
                open.start..close.end,
            )
        })
    }

    /// `λx y z. body`, desugared to nested single-parameter abstractions.
    fn abstraction(&mut self, lambda: Span) -> Result<TermRef> {
        self.pos += 1;
        let mut params = vec![];
        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError::new(
                    ParseErrorKind::MissingDot,
                    "expected '.' after the parameters, found end of the input",
                    self.eoi.clone(),
                ));
            };
            match token.value() {
                Token::Ident(name) => params.push(name.as_str()),
                Token::Dot if params.is_empty() => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedChar,
                        format!(
                            "expected a parameter after 'λ' at position {}",
                            lambda.start
                        ),
                        token.span(),
                    ))
                }
                Token::Dot => break,
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingDot,
                        format!(
                            "expected '.' after the parameters, found '{other}' at position {}",
                            token.span().start
                        ),
                        token.span(),
                    ))
                }
            }
            self.pos += 1;
        }
        self.pos += 1;
        let body = self.sequence()?.ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::EmptyExpression,
                format!("abstraction at position {} has no body", lambda.start),
                lambda.start..self.here().start,
            )
        })?;
        Ok(params
            .into_iter()
            .rev()
            .fold(body, |body, param| Term::abs(param, body)))
    }
}

/// Parses a term. `λ` and `\` both introduce an abstraction.
pub fn parse(s: &str) -> Result<TermRef> {
    let tokens = tokenize(s)?;
    let len = s.chars().count();
    let mut parser = TermParser {
        tokens: &tokens,
        pos: 0,
        eoi: len..len + 1,
    };
    let term = parser.sequence()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::new(
            ParseErrorKind::TrailingInput,
            format!(
                "unexpected '{}' at position {} with no matching '('",
                token.value(),
                token.span().start
            ),
            token.span(),
        ));
    }
    term.ok_or_else(|| ParseError::new(ParseErrorKind::EmptyExpression, "empty expression", 0..len))
}
