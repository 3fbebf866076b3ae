//! Expression parsing: casts, binary operators, send chains, and the value
//! grammar.
//!
//! Binary operators are parsed with precedence climbing; every operator is
//! left-associative within its level, so `a + b + c` is `(a + b) + c` and
//! `10 + 20 * 30` is `10 + (20 * 30)`. Operators are sends: `a + b` parses
//! as the message `+` sent to `a` with `b` as its argument.
//!
//! The precedence levels, lowest first:
//!
//! 1. `..` `...`
//! 2. `or`
//! 3. `and`
//! 4. `==` `!=`
//! 5. `<` `<=` `>` `>=`
//! 6. `|`
//! 7. `^`
//! 8. `&`
//! 9. `<<` `>>`
//! 10. `+` `-`
//! 11. `*` `/` `%`
//! 12. `**`

use crate::{
    ast::{
        BlockKind, BlockLiteral, Constant, Dereference, Global, Identifier, KeywordArgument,
        Node, SelfObject, Send, TypeCast,
    },
    lexer::TokenKind,
};

use super::{PResult, Parser};

impl Parser<'_> {
    /// Parses a full expression: a binary expression with any number of
    /// trailing `as` casts and cross-line send chain continuations.
    pub(crate) fn expression(&mut self) -> PResult<Node> {
        let mut node = self.binary()?;

        loop {
            match self.peek_kind() {
                TokenKind::As => {
                    let token = self.advance_token();
                    let target = self.type_expression()?;

                    node = Node::TypeCast(Box::new(TypeCast {
                        value: node,
                        target,
                        location: token.location,
                        resolved_type: crate::types::TypeId::UNDEFINED,
                    }));
                }
                // A send chain may continue on the next line once a full
                // expression has been parsed: `(a == b)\n.if_true { … }`.
                TokenKind::Dot => {
                    node = self.chain(node, true)?;
                }
                _ => break,
            }
        }

        Ok(node)
    }

    /// Binary operator precedence levels, lowest first. Every operator in a
    /// level associates to the left.
    const BINARY_LEVELS: &'static [&'static [TokenKind]] = &[
        &[TokenKind::InclusiveRange, TokenKind::ExclusiveRange],
        &[TokenKind::Or],
        &[TokenKind::And],
        &[TokenKind::Equal, TokenKind::NotEqual],
        &[
            TokenKind::Lower,
            TokenKind::LowerEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ],
        &[TokenKind::BitwiseOr],
        &[TokenKind::BitwiseXor],
        &[TokenKind::BitwiseAnd],
        &[TokenKind::ShiftLeft, TokenKind::ShiftRight],
        &[TokenKind::Add, TokenKind::Sub],
        &[TokenKind::Mul, TokenKind::Div, TokenKind::Mod],
        &[TokenKind::Pow],
    ];

    fn binary(&mut self) -> PResult<Node> {
        self.binary_level(0)
    }

    fn binary_level(&mut self, level: usize) -> PResult<Node> {
        let Some(operators) = Self::BINARY_LEVELS.get(level) else {
            return self.postfix();
        };

        let mut lhs = self.binary_level(level + 1)?;

        while operators.contains(&self.peek_kind()) {
            let operator = self.advance_token();
            let rhs = self.binary_level(level + 1)?;
            let name = operator
                .kind
                .message_name()
                .expect("binary operators always have a message name");

            lhs = Node::Send(Box::new(Send::new(
                name,
                Some(lhs),
                vec![rhs],
                operator.location,
            )));

            // After a binary right-hand side, a `.` on any line re-enters
            // the send chain with the binary node as receiver, enabling
            // `(a == b)\n.if_true { … }`.
            if self.peek_kind() == TokenKind::Dot {
                lhs = self.chain(lhs, true)?;
            }
        }

        Ok(lhs)
    }

    /// A value followed by its same-line send chain.
    fn postfix(&mut self) -> PResult<Node> {
        let value = self.value()?;

        self.chain(value, false)
    }

    /// Consumes `.message`, `[index]`, and dereference `!` postfixes. With
    /// `cross_line` set, `.` continues the chain even on a new line.
    pub(crate) fn chain(&mut self, mut node: Node, cross_line: bool) -> PResult<Node> {
        loop {
            let same_line = self.next_on_same_line();
            let adjacent = self.next_adjacent();

            match self.peek_kind() {
                TokenKind::Dot if cross_line || same_line => {
                    self.advance_token();
                    node = self.message_send(node)?;
                }
                TokenKind::BracketOpen if same_line => {
                    node = self.index_access(node)?;
                }
                TokenKind::Bang if adjacent => {
                    let token = self.advance_token();

                    node = Node::Dereference(Box::new(Dereference {
                        value: node,
                        location: token.location,
                        resolved_type: crate::types::TypeId::UNDEFINED,
                    }));
                }
                _ => return Ok(node),
            }
        }
    }

    /// Parses `name(args)`, `name args`, `name`, or `name!(T)(args)` after a
    /// consumed `.`, with `receiver` as the receiver.
    fn message_send(&mut self, receiver: Node) -> PResult<Node> {
        let name = match self.peek_kind() {
            TokenKind::Identifier => self.advance_token(),
            _ => {
                let token = self.peek().clone();

                if !token.is_valid() {
                    return self.unexpected(&token);
                }

                self.diagnostics
                    .invalid_message_name(&format!("{:?}", token.lexeme), token.location.clone());

                return Err(super::ParseAbort::Recover);
            }
        };

        let mut send = Send::new(name.lexeme.clone(), Some(receiver), Vec::new(), name.location);
        let mut dereference = false;

        // A `!` glued to the message name introduces type arguments when
        // followed by `(`; otherwise it dereferences the send's result.
        if self.peek_kind() == TokenKind::Bang && self.next_adjacent() {
            self.advance_token();

            if self.peek_kind() == TokenKind::ParenOpen {
                send.type_arguments = self.type_argument_list()?;
            } else {
                dereference = true;
            }
        }

        if self.peek_kind() == TokenKind::ParenOpen && self.next_on_same_line() {
            self.parenthesised_arguments(&mut send)?;
        } else if !dereference && self.next_starts_call_arguments() {
            self.plain_arguments(&mut send)?;
        }

        let mut node = Node::Send(Box::new(send));

        if dereference {
            node = Node::Dereference(Box::new(Dereference {
                location: node.location().clone(),
                value: node,
                resolved_type: crate::types::TypeId::UNDEFINED,
            }));
        }

        Ok(node)
    }

    /// `( arg, … )` plus an optional trailing block on the same line as the
    /// closing parenthesis.
    fn parenthesised_arguments(&mut self, send: &mut Send) -> PResult<()> {
        self.expect(TokenKind::ParenOpen)?;

        loop {
            if self.peek_kind() == TokenKind::ParenClose {
                break;
            }

            send.arguments.push(self.argument()?);

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                break;
            }
        }

        self.expect(TokenKind::ParenClose)?;

        if self.next_on_same_line() {
            match self.peek_kind() {
                TokenKind::CurlyOpen | TokenKind::Do | TokenKind::Lambda => {
                    let block = self.value()?;

                    send.arguments.push(block);
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Parenthesis-less arguments: values on the same line until the list
    /// stops continuing with commas. A block literal is always the final
    /// argument and is parsed without its own send chain, so that
    /// `foo { … }.bar` chains on the outer send.
    fn plain_arguments(&mut self, send: &mut Send) -> PResult<()> {
        loop {
            if matches!(
                self.peek_kind(),
                TokenKind::CurlyOpen | TokenKind::Do | TokenKind::Lambda
            ) {
                let block = self.value()?;

                send.arguments.push(block);
                return Ok(());
            }

            send.arguments.push(self.argument()?);

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                return Ok(());
            }
        }
    }

    /// A positional or `name: value` keyword argument.
    fn argument(&mut self) -> PResult<Node> {
        let node = self.expression()?;

        if self.peek_kind() == TokenKind::Colon {
            if let Node::Identifier(identifier) = &node {
                let name = identifier.name.clone();
                let location = identifier.location.clone();

                self.advance_token();

                let value = self.expression()?;

                return Ok(Node::KeywordArgument(Box::new(KeywordArgument {
                    name,
                    value,
                    location,
                })));
            }
        }

        Ok(node)
    }

    /// `receiver[index]`, and the `receiver[index] = value` assignment forms,
    /// both of which are sugar for sends.
    fn index_access(&mut self, receiver: Node) -> PResult<Node> {
        let open = self.expect(TokenKind::BracketOpen)?;
        let index = self.expression()?;

        self.expect(TokenKind::BracketClose)?;

        if self.peek_kind() == TokenKind::Assign {
            self.advance_token();

            let value = self.expression()?;

            return Ok(Node::Send(Box::new(Send::new(
                "[]=",
                Some(receiver),
                vec![index, value],
                open.location,
            ))));
        }

        if self.peek_kind().is_compound_assign() {
            let operator = self.advance_token();
            let rhs = self.expression()?;
            let name = operator.kind.message_name().unwrap();
            let current = Node::Send(Box::new(Send::new(
                "[]",
                Some(receiver.clone()),
                vec![index.clone()],
                open.location.clone(),
            )));
            let combined = Node::Send(Box::new(Send::new(
                name,
                Some(current),
                vec![rhs],
                operator.location,
            )));

            return Ok(Node::Send(Box::new(Send::new(
                "[]=",
                Some(receiver),
                vec![index, combined],
                open.location,
            ))));
        }

        Ok(Node::Send(Box::new(Send::new(
            "[]",
            Some(receiver),
            vec![index],
            open.location,
        ))))
    }

    /// The value grammar: the highest precedence level.
    pub(crate) fn value(&mut self) -> PResult<Node> {
        match self.peek_kind() {
            TokenKind::Integer => self.integer_literal(),
            TokenKind::Float => self.float_literal(),
            TokenKind::String => self.string_literal(),
            TokenKind::TstringOpen => self.template_string(),
            TokenKind::Identifier => self.identifier_value(),
            TokenKind::Constant => self.constant_value(),
            TokenKind::Attribute => self.attribute_value(),
            TokenKind::SelfObject => {
                let token = self.advance_token();

                Ok(Node::SelfObject(Box::new(SelfObject {
                    location: token.location,
                    resolved_type: crate::types::TypeId::UNDEFINED,
                })))
            }
            TokenKind::ParenOpen => {
                self.advance_token();

                let node = self.expression()?;

                self.expect(TokenKind::ParenClose)?;
                Ok(node)
            }
            TokenKind::CurlyOpen => self.closure_without_signature(),
            TokenKind::Do => self.block_with_signature(BlockKind::Closure),
            TokenKind::Lambda => self.block_with_signature(BlockKind::Lambda),
            TokenKind::BracketOpen => self.array_literal(),
            TokenKind::HashOpen => self.map_literal(),
            TokenKind::Def | TokenKind::Static => self.method_definition(),
            TokenKind::Let => self.define_variable(),
            TokenKind::Return => self.return_expression(),
            TokenKind::Throw => self.throw_expression(),
            TokenKind::Try => self.try_expression(false),
            TokenKind::TryBang => self.try_expression(true),
            TokenKind::ColonColon => {
                let colon = self.advance_token();
                let name = self.expect(TokenKind::Constant)?;

                Ok(Node::Global(Box::new(Global::new(
                    name.lexeme,
                    colon.location,
                ))))
            }
            TokenKind::Comment => self.documentation(),
            _ => {
                let token = self.peek().clone();

                self.unexpected(&token)
            }
        }
    }

    /// A bare identifier: a local or method reference, a reassignment, or a
    /// parenthesis-less call.
    fn identifier_value(&mut self) -> PResult<Node> {
        let token = self.advance_token();
        let mut type_arguments = Vec::new();
        let mut dereference = false;

        if self.peek_kind() == TokenKind::Bang && self.next_adjacent() {
            self.advance_token();

            if self.peek_kind() == TokenKind::ParenOpen {
                type_arguments = self.type_argument_list()?;
            } else {
                dereference = true;
            }
        }

        if self.peek_kind() == TokenKind::ParenOpen && self.next_on_same_line() {
            let mut send = Send::new(token.lexeme, None, Vec::new(), token.location);

            send.type_arguments = type_arguments;
            self.parenthesised_arguments(&mut send)?;

            return Ok(Node::Send(Box::new(send)));
        }

        if !dereference {
            if self.peek_kind() == TokenKind::Assign && self.next_on_same_line() {
                return self.reassign_local(token);
            }

            if self.peek_kind().is_compound_assign() && self.next_on_same_line() {
                return self.compound_reassign_local(token);
            }

            if self.next_starts_call_arguments() {
                let mut send = Send::new(token.lexeme, None, Vec::new(), token.location);

                send.type_arguments = type_arguments;
                self.plain_arguments(&mut send)?;

                return Ok(Node::Send(Box::new(send)));
            }
        }

        let mut node = Node::Identifier(Box::new(Identifier::new(token.lexeme, token.location)));

        if dereference {
            node = Node::Dereference(Box::new(Dereference {
                location: node.location().clone(),
                value: node,
                resolved_type: crate::types::TypeId::UNDEFINED,
            }));
        }

        Ok(node)
    }

    /// A constant or a `::`-separated constant chain.
    fn constant_value(&mut self) -> PResult<Node> {
        let token = self.advance_token();
        let mut node = Node::Constant(Box::new(Constant::new(token.lexeme, token.location)));

        while self.peek_kind() == TokenKind::ColonColon {
            self.advance_token();

            let name = self.expect(TokenKind::Constant)?;
            let mut constant = Constant::new(name.lexeme, name.location);

            constant.receiver = Some(node);
            node = Node::Constant(Box::new(constant));
        }

        Ok(node)
    }

    /// `{ … }`: a closure without a signature.
    fn closure_without_signature(&mut self) -> PResult<Node> {
        let location = self.peek().location.clone();
        let body = self.braced_body()?;

        Ok(Node::Block(Box::new(BlockLiteral {
            kind: BlockKind::Closure,
            arguments: Vec::new(),
            throw_annotation: None,
            return_annotation: None,
            body,
            table: crate::symbol::TableId::UNDEFINED,
            location,
            resolved_type: crate::types::TypeId::UNDEFINED,
            captures: false,
        })))
    }

    /// `do (args) !! E -> R { … }` or `lambda (args) -> R { … }`.
    fn block_with_signature(&mut self, kind: BlockKind) -> PResult<Node> {
        let keyword = self.advance_token();
        let arguments = if self.peek_kind() == TokenKind::ParenOpen {
            self.method_arguments()?
        } else {
            Vec::new()
        };

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

        let body = self.braced_body()?;

        Ok(Node::Block(Box::new(BlockLiteral {
            kind,
            arguments,
            throw_annotation,
            return_annotation,
            body,
            table: crate::symbol::TableId::UNDEFINED,
            location: keyword.location,
            resolved_type: crate::types::TypeId::UNDEFINED,
            captures: false,
        })))
    }

    /// Converts a bare identifier into a receiver-less send, used where the
    /// grammar requires a call (`try foo`).
    pub(crate) fn identifier_to_send(node: Node) -> Node {
        match node {
            Node::Identifier(identifier) => Node::Send(Box::new(Send::new(
                identifier.name,
                None,
                Vec::new(),
                identifier.location,
            ))),
            other => other,
        }
    }
}
