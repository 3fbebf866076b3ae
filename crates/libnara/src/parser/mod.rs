//! The parser: recursive descent over the token stream with one-token
//! lookahead.
//!
//! The parser owns the lexer and reports problems straight into the
//! diagnostics sink. A failing production abandons itself and recovery skips
//! to the next top-level boundary (a blank line or a top-level keyword), so a
//! single file can produce multiple syntax errors. Unexpected end of input is
//! always fatal for the call that encountered it.
//!
//! The parser is organised into per-construct submodules:
//!
//! - [`expression`]: binary operators, casts, send chains, postfix forms
//! - [`literal`]: numbers, strings, template strings, array and map literals
//! - [`definition`]: methods, objects, traits, trait implementations
//! - [`import`]: `import` statements
//! - [`type_expr`]: type expressions
//! - [`variable`]: `let`, reassignments, `return`, `throw`, `try`

mod definition;
mod expression;
mod import;
mod literal;
mod type_expr;
mod variable;

use crate::{
    ast::{Body, Documentation, Node},
    diagnostics::Diagnostics,
    file::SourceFile,
    lexer::{Lexer, Token, TokenKind},
    span::Span,
};

/// Why a production was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseAbort {
    /// A syntax error was reported; skip to the next top-level boundary.
    Recover,
    /// The input ended; stop parsing the file.
    EndOfInput,
}

pub(crate) type PResult<T> = Result<T, ParseAbort>;

pub struct Parser<'a> {
    lexer: Lexer,
    diagnostics: &'a mut Diagnostics,
    /// Line and end offset of the last consumed token, for the same-line and
    /// adjacency rules.
    last_line: u32,
    last_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(file: SourceFile, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            lexer: Lexer::new(file),
            diagnostics,
            last_line: 1,
            last_end: 0,
        }
    }

    /// A parser that keeps comments as [`Documentation`] nodes.
    pub fn with_comments(file: SourceFile, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            lexer: Lexer::with_comments(file),
            diagnostics,
            last_line: 1,
            last_end: 0,
        }
    }

    /// Parses the whole file into the module's body.
    pub fn parse_module(&mut self) -> Body {
        let location = Span::start_of(self.lexer.file().clone());
        let mut expressions = Vec::new();

        loop {
            while self.peek_kind() == TokenKind::SemiColon {
                self.advance_token();
            }

            if !self.lexer.peek().is_valid() {
                break;
            }

            match self.top_level() {
                Ok(node) => expressions.push(node),
                Err(ParseAbort::EndOfInput) => break,
                Err(ParseAbort::Recover) => self.recover(),
            }
        }

        Body::new(expressions, location)
    }

    fn top_level(&mut self) -> PResult<Node> {
        match self.peek_kind() {
            TokenKind::Import => self.import(),
            TokenKind::Object => self.object_definition(),
            TokenKind::Trait => self.trait_definition(),
            TokenKind::Impl => self.trait_implementation(),
            TokenKind::Comment => self.documentation(),
            _ => self.expression(),
        }
    }

    /// Skips to the next top-level boundary: a blank line, a top-level
    /// keyword, or the end of input. Always makes progress.
    fn recover(&mut self) {
        let mut consumed = 0;

        loop {
            let peeked = self.lexer.peek();

            if !peeked.is_valid() {
                return;
            }

            if consumed > 0 {
                if matches!(
                    peeked.kind,
                    TokenKind::Import
                        | TokenKind::Object
                        | TokenKind::Trait
                        | TokenKind::Impl
                        | TokenKind::Def
                        | TokenKind::Let
                ) {
                    return;
                }

                if peeked.location.line >= self.last_line + 2 {
                    return;
                }
            }

            self.advance_token();
            consumed += 1;
        }
    }

    pub(crate) fn documentation(&mut self) -> PResult<Node> {
        let token = self.advance_token();

        Ok(Node::Documentation(Box::new(Documentation {
            text: token.lexeme,
            location: token.location,
        })))
    }

    // Token plumbing

    pub(crate) fn peek(&mut self) -> &Token {
        self.lexer.peek()
    }

    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    pub(crate) fn advance_token(&mut self) -> Token {
        let token = self.lexer.advance();

        if token.is_valid() {
            self.last_line = token.location.line;
            self.last_end = token.location.range.end;
        }

        token
    }

    /// True when the next token starts on the same line as the last consumed
    /// token.
    pub(crate) fn next_on_same_line(&mut self) -> bool {
        let line = self.last_line;

        self.lexer.peek().location.line == line
    }

    /// True when the next token begins immediately after the last consumed
    /// token, with no bytes in between.
    pub(crate) fn next_adjacent(&mut self) -> bool {
        let end = self.last_end;
        let peeked = self.lexer.peek();

        peeked.is_valid() && peeked.location.range.start == end
    }

    /// True when the next token starts a value on the same line, separated by
    /// at least one space: the parenthesis-less call rule.
    pub(crate) fn next_starts_call_arguments(&mut self) -> bool {
        let line = self.last_line;
        let end = self.last_end;
        let peeked = self.lexer.peek();

        peeked.is_valid()
            && peeked.kind.starts_value()
            && peeked.location.line == line
            && peeked.location.range.start > end
    }

    /// Consumes a token of the given kind, or reports a syntax error.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance_token())
        } else {
            let token = self.lexer.peek().clone();

            self.unexpected(&token)
        }
    }

    /// Reports the token as unexpected and aborts the current production.
    pub(crate) fn unexpected<T>(&mut self, token: &Token) -> PResult<T> {
        if token.is_valid() {
            self.diagnostics.unexpected_token(
                &format!("token {:?}", token.lexeme),
                token.location.clone(),
            );

            Err(ParseAbort::Recover)
        } else {
            self.diagnostics
                .unexpected_end_of_input(token.location.clone());

            Err(ParseAbort::EndOfInput)
        }
    }

    /// Parses a `{ … }` body: a sequence of expressions and method
    /// definitions.
    pub(crate) fn braced_body(&mut self) -> PResult<Body> {
        let open = self.expect(TokenKind::CurlyOpen)?;
        let mut expressions = Vec::new();

        loop {
            while self.peek_kind() == TokenKind::SemiColon {
                self.advance_token();
            }

            match self.peek_kind() {
                TokenKind::CurlyClose => {
                    self.advance_token();
                    break;
                }
                TokenKind::Null => {
                    let token = self.lexer.peek().clone();

                    return self.unexpected(&token);
                }
                TokenKind::Def | TokenKind::Static => {
                    expressions.push(self.method_definition()?);
                }
                TokenKind::Comment => expressions.push(self.documentation()?),
                _ => expressions.push(self.expression()?),
            }
        }

        Ok(Body::new(expressions, open.location))
    }
}
