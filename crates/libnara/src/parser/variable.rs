//! Parsing of `let` bindings, reassignments, `return`, `throw`, and `try`.

use crate::{
    ast::{
        Body, Constant, DefineVariable, Identifier, Node, ReassignVariable, Return, Send, Throw,
        Try, VariableKind,
    },
    lexer::{Token, TokenKind},
    types::{TypeId, RAW_RECEIVER},
};

use super::{PResult, Parser};

impl Parser<'_> {
    /// `let [mut] target [: Type] = value`. The target decides the binding
    /// kind: an identifier defines a local, `@name` an attribute, a constant
    /// a constant.
    pub(crate) fn define_variable(&mut self) -> PResult<Node> {
        let keyword = self.expect(TokenKind::Let)?;
        let mutable = if self.peek_kind() == TokenKind::Mut {
            self.advance_token();
            true
        } else {
            false
        };

        let target = self.advance_token();
        let (name, kind) = match target.kind {
            TokenKind::Identifier => (target.lexeme.clone(), VariableKind::Local),
            TokenKind::Attribute => (target.lexeme.clone(), VariableKind::Attribute),
            TokenKind::Constant => (target.lexeme.clone(), VariableKind::Constant),
            _ => return self.unexpected(&target),
        };

        let annotation = if self.peek_kind() == TokenKind::Colon {
            self.advance_token();
            Some(self.type_expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Assign)?;

        let value = self.expression()?;

        Ok(Node::DefineVariable(Box::new(DefineVariable {
            name,
            kind,
            mutable,
            annotation,
            value,
            binding: Default::default(),
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// `name = value` for an already consumed identifier token.
    pub(crate) fn reassign_local(&mut self, target: Token) -> PResult<Node> {
        self.expect(TokenKind::Assign)?;

        let value = self.expression()?;

        Ok(Node::ReassignVariable(Box::new(ReassignVariable {
            name: target.lexeme,
            kind: VariableKind::Local,
            value,
            binding: Default::default(),
            location: target.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// `name op= value` rewrites to a send of the operator followed by a
    /// plain reassignment: `a += b` becomes `a = a.+(b)`.
    pub(crate) fn compound_reassign_local(&mut self, target: Token) -> PResult<Node> {
        let operator = self.advance_token();
        let rhs = self.expression()?;
        let message = operator.kind.message_name().unwrap();
        let current = Node::Identifier(Box::new(Identifier::new(
            target.lexeme.clone(),
            target.location.clone(),
        )));
        let value = Node::Send(Box::new(Send::new(
            message,
            Some(current),
            vec![rhs],
            operator.location,
        )));

        Ok(Node::ReassignVariable(Box::new(ReassignVariable {
            name: target.lexeme,
            kind: VariableKind::Local,
            value,
            binding: Default::default(),
            location: target.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// `@name`, `@name = value`, or `@name op= value`.
    pub(crate) fn attribute_value(&mut self) -> PResult<Node> {
        let token = self.advance_token();

        if self.peek_kind() == TokenKind::Assign && self.next_on_same_line() {
            self.advance_token();

            let value = self.expression()?;

            return Ok(Node::ReassignVariable(Box::new(ReassignVariable {
                name: token.lexeme,
                kind: VariableKind::Attribute,
                value,
                binding: Default::default(),
                location: token.location,
                resolved_type: TypeId::UNDEFINED,
            })));
        }

        if self.peek_kind().is_compound_assign() && self.next_on_same_line() {
            let operator = self.advance_token();
            let rhs = self.expression()?;
            let message = operator.kind.message_name().unwrap();
            let current = Node::Attribute(Box::new(crate::ast::AttributeRef {
                name: token.lexeme.clone(),
                location: token.location.clone(),
                resolved_type: TypeId::UNDEFINED,
            }));
            let value = Node::Send(Box::new(Send::new(
                message,
                Some(current),
                vec![rhs],
                operator.location,
            )));

            return Ok(Node::ReassignVariable(Box::new(ReassignVariable {
                name: token.lexeme,
                kind: VariableKind::Attribute,
                value,
                binding: Default::default(),
                location: token.location,
                resolved_type: TypeId::UNDEFINED,
            })));
        }

        Ok(Node::Attribute(Box::new(crate::ast::AttributeRef {
            name: token.lexeme,
            location: token.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// `return` with an optional same-line value.
    pub(crate) fn return_expression(&mut self) -> PResult<Node> {
        let keyword = self.advance_token();
        let value = if self.next_starts_call_arguments() {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Node::Return(Box::new(Return {
            value,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    pub(crate) fn throw_expression(&mut self) -> PResult<Node> {
        let keyword = self.advance_token();
        let value = self.expression()?;

        Ok(Node::Throw(Box::new(Throw {
            value,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }

    /// `try expr else (error) { … }`, or `try! expr` which desugars into a
    /// `try` whose handler panics with the error.
    pub(crate) fn try_expression(&mut self, panic_on_error: bool) -> PResult<Node> {
        let keyword = self.advance_token();
        let expression = Self::identifier_to_send(self.expression()?);

        let (else_argument, else_body) = if panic_on_error {
            let location = keyword.location.clone();
            let error = Node::Identifier(Box::new(Identifier::new("error", location.clone())));
            let to_string = Node::Send(Box::new(Send::new(
                "to_string",
                Some(error),
                Vec::new(),
                location.clone(),
            )));
            let receiver = Node::Constant(Box::new(Constant::new(RAW_RECEIVER, location.clone())));
            let panic = Node::Send(Box::new(Send::new(
                "panic",
                Some(receiver),
                vec![to_string],
                location.clone(),
            )));

            (
                Some("error".to_string()),
                Some(Body::new(vec![panic], location)),
            )
        } else if self.peek_kind() == TokenKind::Else {
            self.advance_token();

            let argument = if self.peek_kind() == TokenKind::ParenOpen {
                self.advance_token();

                let name = self.expect(TokenKind::Identifier)?;

                self.expect(TokenKind::ParenClose)?;
                Some(name.lexeme)
            } else {
                None
            };

            (argument, Some(self.braced_body()?))
        } else {
            (None, None)
        };

        Ok(Node::Try(Box::new(Try {
            expression,
            else_argument,
            else_body,
            else_table: crate::symbol::TableId::UNDEFINED,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }
}
