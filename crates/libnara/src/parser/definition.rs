//! Parsing of method, object, and trait definitions, and `impl` blocks.
//!
//! The canonical method grammar is
//! `def name!(T, U)(args) !! Throws -> Returns where T: A + B { body }`,
//! with every section optional except the name. Omitting the body declares a
//! required method, which only traits may contain.

use crate::{
    ast::{
        MethodArgument, MethodDefinition, Node, ObjectDefinition, TraitDefinition,
        TraitImplementation, TypeExpr, TypeParameterDef,
    },
    lexer::TokenKind,
    symbol::TableId,
    types::TypeId,
};

use super::{PResult, Parser};

impl Parser<'_> {
    /// `[static] def name … { body }`.
    pub(crate) fn method_definition(&mut self) -> PResult<Node> {
        let first = self.advance_token();
        let static_method = first.kind == TokenKind::Static;
        let keyword = if static_method {
            self.expect(TokenKind::Def)?
        } else {
            first
        };

        let name = self.message_definition_name()?;
        let mut type_parameters = self.type_parameter_list()?;
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

        if self.peek_kind() == TokenKind::Where {
            self.where_clause(&mut type_parameters)?;
        }

        // The body brace must share a line with the header's end; a required
        // method simply stops after its signature.
        let body = if self.peek_kind() == TokenKind::CurlyOpen && self.next_on_same_line() {
            Some(self.braced_body()?)
        } else {
            None
        };

        Ok(Node::MethodDefinition(Box::new(MethodDefinition {
            name,
            static_method,
            type_parameters,
            arguments,
            throw_annotation,
            return_annotation,
            body,
            table: TableId::UNDEFINED,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
            parameter_types: Vec::new(),
            documentation: None,
        })))
    }

    /// A method name: an identifier, an operator, or the index messages
    /// `[]` / `[]=`.
    fn message_definition_name(&mut self) -> PResult<String> {
        let token = self.advance_token();

        match token.kind {
            TokenKind::Identifier => Ok(token.lexeme),
            TokenKind::BracketOpen => {
                self.expect(TokenKind::BracketClose)?;

                if self.peek_kind() == TokenKind::Assign && self.next_adjacent() {
                    self.advance_token();
                    Ok("[]=".to_string())
                } else {
                    Ok("[]".to_string())
                }
            }
            kind => {
                if let Some(name) = kind.message_name() {
                    Ok(name.to_string())
                } else if token.is_valid() {
                    self.diagnostics.invalid_message_name(
                        &format!("{:?}", token.lexeme),
                        token.location.clone(),
                    );

                    Err(super::ParseAbort::Recover)
                } else {
                    self.unexpected(&token)
                }
            }
        }
    }

    /// `!(T, U)` immediately after a definition name.
    fn type_parameter_list(&mut self) -> PResult<Vec<TypeParameterDef>> {
        let mut parameters = Vec::new();

        if !(self.peek_kind() == TokenKind::Bang && self.next_adjacent()) {
            return Ok(parameters);
        }

        self.advance_token();
        self.expect(TokenKind::ParenOpen)?;

        loop {
            if self.peek_kind() == TokenKind::ParenClose {
                break;
            }

            let name = self.expect(TokenKind::Constant)?;

            parameters.push(TypeParameterDef {
                name: name.lexeme,
                bounds: Vec::new(),
                location: name.location,
            });

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                break;
            }
        }

        self.expect(TokenKind::ParenClose)?;
        Ok(parameters)
    }

    /// `where T: A + B, U: C` merges trait bounds into the parameter list.
    fn where_clause(&mut self, parameters: &mut Vec<TypeParameterDef>) -> PResult<()> {
        self.expect(TokenKind::Where)?;

        loop {
            let name = self.expect(TokenKind::Constant)?;

            self.expect(TokenKind::Colon)?;

            let mut bounds = vec![self.type_expression()?];

            while self.peek_kind() == TokenKind::Add {
                self.advance_token();
                bounds.push(self.type_expression()?);
            }

            match parameters
                .iter_mut()
                .find(|parameter| parameter.name == name.lexeme)
            {
                Some(parameter) => parameter.bounds.extend(bounds),
                None => parameters.push(TypeParameterDef {
                    name: name.lexeme,
                    bounds,
                    location: name.location,
                }),
            }

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                return Ok(());
            }
        }
    }

    /// `(name, name: Type, name: Type = default, mut name, *rest)`.
    pub(crate) fn method_arguments(&mut self) -> PResult<Vec<MethodArgument>> {
        self.expect(TokenKind::ParenOpen)?;

        let mut arguments = Vec::new();

        loop {
            if self.peek_kind() == TokenKind::ParenClose {
                break;
            }

            let mutable = if self.peek_kind() == TokenKind::Mut {
                self.advance_token();
                true
            } else {
                false
            };

            let rest = if self.peek_kind() == TokenKind::Mul {
                self.advance_token();
                true
            } else {
                false
            };

            let name = self.expect(TokenKind::Identifier)?;
            let annotation = if self.peek_kind() == TokenKind::Colon {
                self.advance_token();
                Some(self.type_expression()?)
            } else {
                None
            };

            let default = if self.peek_kind() == TokenKind::Assign {
                self.advance_token();
                Some(self.expression()?)
            } else {
                None
            };

            arguments.push(MethodArgument {
                name: name.lexeme,
                annotation,
                default,
                rest,
                mutable,
                location: name.location,
            });

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                break;
            }
        }

        self.expect(TokenKind::ParenClose)?;
        Ok(arguments)
    }

    /// `object Name!(T) { body }`.
    pub(crate) fn object_definition(&mut self) -> PResult<Node> {
        let keyword = self.expect(TokenKind::Object)?;
        let name = self.expect(TokenKind::Constant)?;
        let type_parameters = self.type_parameter_list()?;
        let body = self.braced_body()?;

        Ok(Node::ObjectDefinition(Box::new(ObjectDefinition {
            name: name.lexeme,
            type_parameters,
            body,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
            parameter_types: Vec::new(),
            documentation: None,
        })))
    }

    /// `trait Name!(T): A + B { body }`.
    pub(crate) fn trait_definition(&mut self) -> PResult<Node> {
        let keyword = self.expect(TokenKind::Trait)?;
        let name = self.expect(TokenKind::Constant)?;
        let type_parameters = self.type_parameter_list()?;
        let mut required_traits = Vec::new();

        if self.peek_kind() == TokenKind::Colon {
            self.advance_token();
            required_traits.push(self.type_expression()?);

            while self.peek_kind() == TokenKind::Add {
                self.advance_token();
                required_traits.push(self.type_expression()?);
            }
        }

        let body = self.braced_body()?;

        Ok(Node::TraitDefinition(Box::new(TraitDefinition {
            name: name.lexeme,
            type_parameters,
            required_traits,
            body,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
            parameter_types: Vec::new(),
            documentation: None,
        })))
    }

    /// `impl Trait for Object { body }`. Exactly one target type.
    pub(crate) fn trait_implementation(&mut self) -> PResult<Node> {
        let keyword = self.expect(TokenKind::Impl)?;
        let trait_type: TypeExpr = self.type_expression()?;

        self.expect(TokenKind::For)?;

        let object = self.expect(TokenKind::Constant)?;
        let body = self.braced_body()?;

        Ok(Node::TraitImplementation(Box::new(TraitImplementation {
            trait_type,
            object_name: object.lexeme,
            object_location: object.location,
            body,
            location: keyword.location,
            resolved_type: TypeId::UNDEFINED,
        })))
    }
}
