//! Parsing of type expressions.
//!
//! A type is `?Type` (optional), a constant chain with optional type
//! arguments (`A::B!(C)`), or a block type (`do (A, B) !! E -> R`,
//! `lambda (A) -> R`).

use crate::{
    ast::{BlockKind, BlockTypeExpr, NamedType, OptionalType, TypeExpr},
    lexer::TokenKind,
};

use super::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn type_expression(&mut self) -> PResult<TypeExpr> {
        match self.peek_kind() {
            TokenKind::Question => {
                let token = self.advance_token();
                let inner = self.type_expression()?;

                Ok(TypeExpr::Optional(Box::new(OptionalType {
                    inner,
                    location: token.location,
                })))
            }
            TokenKind::Do => self.block_type(BlockKind::Closure),
            TokenKind::Lambda => self.block_type(BlockKind::Lambda),
            TokenKind::Constant => self.named_type(),
            _ => {
                let token = self.peek().clone();

                self.unexpected(&token)
            }
        }
    }

    fn named_type(&mut self) -> PResult<TypeExpr> {
        let first = self.expect(TokenKind::Constant)?;
        let location = first.location.clone();
        let mut steps = vec![first.lexeme];

        while self.peek_kind() == TokenKind::ColonColon {
            self.advance_token();

            let step = self.expect(TokenKind::Constant)?;

            steps.push(step.lexeme);
        }

        let type_arguments = if self.peek_kind() == TokenKind::Bang && self.next_adjacent() {
            self.advance_token();
            self.type_argument_list_body()?
        } else {
            Vec::new()
        };

        Ok(TypeExpr::Named(Box::new(NamedType {
            steps,
            type_arguments,
            location,
        })))
    }

    fn block_type(&mut self, kind: BlockKind) -> PResult<TypeExpr> {
        let keyword = self.advance_token();
        let mut arguments = Vec::new();

        if self.peek_kind() == TokenKind::ParenOpen {
            self.advance_token();

            loop {
                if self.peek_kind() == TokenKind::ParenClose {
                    break;
                }

                arguments.push(self.type_expression()?);

                if self.peek_kind() == TokenKind::Comma {
                    self.advance_token();
                } else {
                    break;
                }
            }

            self.expect(TokenKind::ParenClose)?;
        }

        let throw_annotation = if self.peek_kind() == TokenKind::Throws {
            self.advance_token();
            Some(self.type_expression()?)
        } else {
            None
        };

        let return_annotation = if self.peek_kind() == TokenKind::Arrow {
            self.advance_token();
            Some(self.type_expression()?)
        } else {
            None
        };

        Ok(TypeExpr::Block(Box::new(BlockTypeExpr {
            kind,
            arguments,
            throw_annotation,
            return_annotation,
            location: keyword.location,
        })))
    }

    /// A parenthesised list of type expressions, with the `(` still pending.
    pub(crate) fn type_argument_list(&mut self) -> PResult<Vec<TypeExpr>> {
        self.type_argument_list_body()
    }

    fn type_argument_list_body(&mut self) -> PResult<Vec<TypeExpr>> {
        self.expect(TokenKind::ParenOpen)?;

        let mut arguments = Vec::new();

        loop {
            if self.peek_kind() == TokenKind::ParenClose {
                break;
            }

            arguments.push(self.type_expression()?);

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                break;
            }
        }

        self.expect(TokenKind::ParenClose)?;
        Ok(arguments)
    }
}
