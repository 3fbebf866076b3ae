//! Parsing of `import` statements.
//!
//! `import a::b` imports module `a::b` itself; `import a::b::(X, y as z,
//! self, *)` imports individual symbols, the module itself, or every public
//! attribute.

use crate::{
    ast::{Import, ImportSymbol, Node},
    lexer::TokenKind,
};

use super::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn import(&mut self) -> PResult<Node> {
        let keyword = self.expect(TokenKind::Import)?;
        let mut steps = Vec::new();
        let mut symbols = Vec::new();

        loop {
            let step = self.expect(TokenKind::Identifier)?;

            steps.push(step.lexeme);

            if self.peek_kind() != TokenKind::ColonColon {
                break;
            }

            self.advance_token();

            if self.peek_kind() == TokenKind::ParenOpen {
                self.advance_token();
                self.import_symbols(&mut symbols)?;
                self.expect(TokenKind::ParenClose)?;
                break;
            }
        }

        Ok(Node::Import(Box::new(Import {
            steps,
            symbols,
            location: keyword.location,
        })))
    }

    fn import_symbols(&mut self, symbols: &mut Vec<ImportSymbol>) -> PResult<()> {
        loop {
            if self.peek_kind() == TokenKind::ParenClose {
                return Ok(());
            }

            let token = self.advance_token();
            let symbol = match token.kind {
                TokenKind::Identifier | TokenKind::Constant => {
                    let alias = self.import_alias()?;

                    ImportSymbol::Symbol {
                        name: token.lexeme,
                        alias,
                        location: token.location,
                    }
                }
                TokenKind::SelfObject => {
                    let alias = self.import_alias()?;

                    ImportSymbol::SelfModule {
                        alias,
                        location: token.location,
                    }
                }
                TokenKind::Mul => ImportSymbol::Glob {
                    location: token.location,
                },
                _ => {
                    if !token.is_valid() {
                        return self.unexpected(&token);
                    }

                    self.diagnostics.invalid_import_path(token.location);
                    return Err(super::ParseAbort::Recover);
                }
            };

            symbols.push(symbol);

            if self.peek_kind() == TokenKind::Comma {
                self.advance_token();
            } else {
                return Ok(());
            }
        }
    }

    fn import_alias(&mut self) -> PResult<Option<String>> {
        if self.peek_kind() != TokenKind::As {
            return Ok(None);
        }

        self.advance_token();

        let alias = self.advance_token();

        match alias.kind {
            TokenKind::Identifier | TokenKind::Constant => Ok(Some(alias.lexeme)),
            _ => self.unexpected(&alias),
        }
    }
}
