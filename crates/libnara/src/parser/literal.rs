//! Literal parsing: numbers, strings, template strings, and the array and
//! hash-map literals together with their desugarings.
//!
//! Array literals become `Array.new(…)` sends on a distinguished `Array`
//! global; hash-map literals become `Map.from_array([keys…], [values…])`.

use crate::{
    ast::{FloatLiteral, Global, IntegerLiteral, Node, Send, StringLiteral, TemplateString},
    lexer::TokenKind,
    span::Span,
    types::TypeId,
};

use super::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn integer_literal(&mut self) -> PResult<Node> {
        let token = self.advance_token();
        let parsed = if let Some(hex) = token
            .lexeme
            .strip_prefix("0x")
            .or_else(|| token.lexeme.strip_prefix("0X"))
        {
            i64::from_str_radix(hex, 16)
        } else {
            token.lexeme.parse()
        };

        let value = match parsed {
            Ok(value) => value,
            Err(_) => {
                self.diagnostics
                    .malformed_number(&token.lexeme, token.location.clone());
                0
            }
        };

        Ok(Node::IntegerLiteral(Box::new(IntegerLiteral {
            value,
            location: token.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    pub(crate) fn float_literal(&mut self) -> PResult<Node> {
        let token = self.advance_token();
        let value = match token.lexeme.parse() {
            Ok(value) => value,
            Err(_) => {
                self.diagnostics
                    .malformed_number(&token.lexeme, token.location.clone());
                0.0
            }
        };

        Ok(Node::FloatLiteral(Box::new(FloatLiteral {
            value,
            location: token.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    pub(crate) fn string_literal(&mut self) -> PResult<Node> {
        let token = self.advance_token();

        Ok(Node::StringLiteral(Box::new(StringLiteral {
            value: token.lexeme,
            location: token.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// A template string: literal fragments and `{…}` interpolations.
    pub(crate) fn template_string(&mut self) -> PResult<Node> {
        let open = self.expect(TokenKind::TstringOpen)?;
        let mut parts = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::TstringBody => {
                    let token = self.advance_token();

                    parts.push(Node::StringLiteral(Box::new(StringLiteral {
                        value: token.lexeme,
                        location: token.location,
                        resolved_type: TypeId::UNDEFINED,
                    })));
                }
                TokenKind::TstringExprOpen => {
                    self.advance_token();
                    parts.push(self.expression()?);
                    self.expect(TokenKind::TstringExprClose)?;
                }
                TokenKind::TstringClose => {
                    self.advance_token();
                    break;
                }
                _ => {
                    let token = self.peek().clone();

                    return self.unexpected(&token);
                }
            }
        }

        Ok(Node::TemplateString(Box::new(TemplateString {
            parts,
            location: open.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// `[e1, e2, …]` desugars to `Array.new(e1, e2, …)`.
    pub(crate) fn array_literal(&mut self) -> PResult<Node> {
        let open = self.expect(TokenKind::BracketOpen)?;
        let mut values = Vec::new();

        loop {
            if self.peek_kind() == TokenKind::BracketClose {
                break;
            }

            values.push(self.expression()?);

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                break;
            }
        }

        self.expect(TokenKind::BracketClose)?;
        Ok(Self::array_new(values, open.location))
    }

    pub(crate) fn array_new(values: Vec<Node>, location: Span) -> Node {
        let receiver = Node::Global(Box::new(Global::new("Array", location.clone())));

        Node::Send(Box::new(Send::new("new", Some(receiver), values, location)))
    }

    /// `%[k1: v1, k2: v2]` desugars to a `Map.from_array` send receiving the
    /// keys and values as two arrays.
    pub(crate) fn map_literal(&mut self) -> PResult<Node> {
        let open = self.expect(TokenKind::HashOpen)?;
        let mut keys = Vec::new();
        let mut values = Vec::new();

        loop {
            if self.peek_kind() == TokenKind::BracketClose {
                break;
            }

            keys.push(self.expression()?);
            self.expect(TokenKind::Colon)?;
            values.push(self.expression()?);

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                break;
            }
        }

        self.expect(TokenKind::BracketClose)?;

        let receiver = Node::Global(Box::new(Global::new("Map", open.location.clone())));
        let arguments = vec![
            Self::array_new(keys, open.location.clone()),
            Self::array_new(values, open.location.clone()),
        ];

        Ok(Node::Send(Box::new(Send::new(
            "from_array",
            Some(receiver),
            arguments,
            open.location,
        ))))
    }
}
