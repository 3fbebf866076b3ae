//! The lexer: a single forward pass over the source bytes producing tokens.
//!
//! The lexer is a byte-level state machine with two modes: *default* and
//! *template string body*. Template strings nest expressions (`` `a {b} c` ``)
//! so the modes live on an explicit stack together with the brace depth
//! recorded when each interpolation opened; the lexer never recurses on the
//! call stack.
//!
//! The lexer never reports errors. Malformed input either produces the null
//! token (kind [`TokenKind::Null`]) or is absorbed into the surrounding
//! lexeme, and the parser is responsible for diagnosing the result.

pub mod token;

pub use token::{Token, TokenKind};

use crate::{file::SourceFile, span::Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Default,
    TemplateBody,
}

/// Snapshot of the cursor, used to build spans.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: u32,
    column: u32,
}

/// Produces [`Token`]s for a single source file.
pub struct Lexer {
    file: SourceFile,
    offset: usize,
    line: u32,
    column: u32,
    modes: Vec<Mode>,
    curly_balance: usize,
    tstring_curlies: Vec<usize>,
    peeked: Option<Token>,
    parse_comments: bool,
}

impl Lexer {
    pub fn new(file: SourceFile) -> Self {
        Self {
            file,
            offset: 0,
            line: 1,
            column: 1,
            modes: vec![Mode::Default],
            curly_balance: 0,
            tstring_curlies: Vec::new(),
            peeked: None,
            parse_comments: false,
        }
    }

    /// A lexer that produces [`TokenKind::Comment`] tokens instead of
    /// discarding comments, for documentation tooling.
    pub fn with_comments(file: SourceFile) -> Self {
        let mut lexer = Self::new(file);

        lexer.parse_comments = true;
        lexer
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Consumes and returns the next token. At the end of input this returns
    /// the null token, forever.
    pub fn advance(&mut self) -> Token {
        if let Some(token) = self.peeked.take() {
            return token;
        }

        self.next_token()
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token());
        }

        self.peeked.as_ref().unwrap()
    }

    fn next_token(&mut self) -> Token {
        match self.modes.last().copied().unwrap_or(Mode::Default) {
            Mode::Default => self.default_token(),
            Mode::TemplateBody => self.template_body_token(),
        }
    }

    fn cursor(&self) -> Cursor {
        Cursor {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn span_from(&self, start: Cursor) -> Span {
        Span::new(
            self.file.clone(),
            start.line,
            start.column,
            start.offset..self.offset,
        )
    }

    fn token_from(&self, kind: TokenKind, start: Cursor) -> Token {
        let span = self.span_from(start);
        let lexeme = span.fragment().to_string();

        Token::new(kind, lexeme, span)
    }

    fn null_token(&self) -> Token {
        Token::null(Span::new(
            self.file.clone(),
            self.line,
            self.column,
            self.offset..self.offset,
        ))
    }

    fn byte_at(&self, index: usize) -> Option<u8> {
        self.file.code().as_bytes().get(index).copied()
    }

    fn current(&self) -> Option<u8> {
        self.byte_at(self.offset)
    }

    fn next_byte(&self) -> Option<u8> {
        self.byte_at(self.offset + 1)
    }

    fn bump(&mut self) {
        if let Some(byte) = self.current() {
            self.offset += 1;

            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    // Default mode

    fn default_token(&mut self) -> Token {
        loop {
            while matches!(self.current(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                self.bump();
            }

            let Some(byte) = self.current() else {
                return self.null_token();
            };

            let token = match byte {
                b'#' => {
                    if self.parse_comments {
                        self.comment()
                    } else {
                        while !matches!(self.current(), None | Some(b'\n')) {
                            self.bump();
                        }

                        continue;
                    }
                }
                b'0'..=b'9' => self.number(),
                b'\'' | b'"' => self.string(byte),
                b'`' => {
                    let start = self.cursor();

                    self.bump();
                    self.modes.push(Mode::TemplateBody);
                    self.token_from(TokenKind::TstringOpen, start)
                }
                b'a'..=b'z' | b'_' => self.word(),
                b'A'..=b'Z' => self.constant(),
                b'@' => self.attribute(),
                b'{' => {
                    self.curly_balance += 1;
                    self.single(TokenKind::CurlyOpen)
                }
                b'}' => {
                    if self.tstring_curlies.last() == Some(&self.curly_balance) {
                        let start = self.cursor();

                        self.tstring_curlies.pop();
                        self.bump();
                        self.modes.pop();
                        self.token_from(TokenKind::TstringExprClose, start)
                    } else {
                        self.curly_balance = self.curly_balance.saturating_sub(1);
                        self.single(TokenKind::CurlyClose)
                    }
                }
                b'(' => self.single(TokenKind::ParenOpen),
                b')' => self.single(TokenKind::ParenClose),
                b'[' => self.single(TokenKind::BracketOpen),
                b']' => self.single(TokenKind::BracketClose),
                b',' => self.single(TokenKind::Comma),
                b';' => self.single(TokenKind::SemiColon),
                b'?' => self.single(TokenKind::Question),
                b'+' => self.operator(TokenKind::Add, TokenKind::AddAssign),
                b'/' => self.operator(TokenKind::Div, TokenKind::DivAssign),
                b'&' => self.operator(TokenKind::BitwiseAnd, TokenKind::BitwiseAndAssign),
                b'|' => self.operator(TokenKind::BitwiseOr, TokenKind::BitwiseOrAssign),
                b'^' => self.operator(TokenKind::BitwiseXor, TokenKind::BitwiseXorAssign),
                b'-' => self.minus(),
                b'*' => self.star(),
                b'%' => self.percent(),
                b'=' => self.operator(TokenKind::Assign, TokenKind::Equal),
                b'!' => self.bang(),
                b'<' => self.angle(TokenKind::Lower, TokenKind::LowerEqual, TokenKind::ShiftLeft, TokenKind::ShiftLeftAssign, b'<'),
                b'>' => self.angle(TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::ShiftRight, TokenKind::ShiftRightAssign, b'>'),
                b'.' => self.dot(),
                b':' => self.colon(),
                _ => {
                    // Unknown byte: absorb it and keep going.
                    self.bump();
                    continue;
                }
            };

            return token;
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.cursor();

        self.bump();
        self.token_from(kind, start)
    }

    /// A one-byte operator with an optional `=` suffix form.
    fn operator(&mut self, plain: TokenKind, with_assign: TokenKind) -> Token {
        let start = self.cursor();

        self.bump();

        if self.current() == Some(b'=') {
            self.bump();
            self.token_from(with_assign, start)
        } else {
            self.token_from(plain, start)
        }
    }

    fn minus(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        match self.current() {
            Some(b'>') => {
                self.bump();
                self.token_from(TokenKind::Arrow, start)
            }
            Some(b'=') => {
                self.bump();
                self.token_from(TokenKind::SubAssign, start)
            }
            _ => self.token_from(TokenKind::Sub, start),
        }
    }

    fn star(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        match self.current() {
            Some(b'*') => {
                self.bump();

                if self.current() == Some(b'=') {
                    self.bump();
                    self.token_from(TokenKind::PowAssign, start)
                } else {
                    self.token_from(TokenKind::Pow, start)
                }
            }
            Some(b'=') => {
                self.bump();
                self.token_from(TokenKind::MulAssign, start)
            }
            _ => self.token_from(TokenKind::Mul, start),
        }
    }

    fn percent(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        match self.current() {
            Some(b'[') => {
                self.bump();
                self.token_from(TokenKind::HashOpen, start)
            }
            Some(b'=') => {
                self.bump();
                self.token_from(TokenKind::ModAssign, start)
            }
            _ => self.token_from(TokenKind::Mod, start),
        }
    }

    fn bang(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        match self.current() {
            Some(b'=') => {
                self.bump();
                self.token_from(TokenKind::NotEqual, start)
            }
            Some(b'!') => {
                self.bump();
                self.token_from(TokenKind::Throws, start)
            }
            _ => self.token_from(TokenKind::Bang, start),
        }
    }

    fn angle(
        &mut self,
        plain: TokenKind,
        with_equal: TokenKind,
        shift: TokenKind,
        shift_assign: TokenKind,
        repeat: u8,
    ) -> Token {
        let start = self.cursor();

        self.bump();

        match self.current() {
            Some(b'=') => {
                self.bump();
                self.token_from(with_equal, start)
            }
            Some(byte) if byte == repeat => {
                self.bump();

                if self.current() == Some(b'=') {
                    self.bump();
                    self.token_from(shift_assign, start)
                } else {
                    self.token_from(shift, start)
                }
            }
            _ => self.token_from(plain, start),
        }
    }

    fn dot(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        if self.current() == Some(b'.') {
            self.bump();

            if self.current() == Some(b'.') {
                self.bump();
                self.token_from(TokenKind::ExclusiveRange, start)
            } else {
                self.token_from(TokenKind::InclusiveRange, start)
            }
        } else {
            self.token_from(TokenKind::Dot, start)
        }
    }

    fn colon(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        if self.current() == Some(b':') {
            self.bump();
            self.token_from(TokenKind::ColonColon, start)
        } else {
            self.token_from(TokenKind::Colon, start)
        }
    }

    // Words, constants, attributes

    fn word(&mut self) -> Token {
        let start = self.cursor();

        // A leading underscore run classifies by the first letter after it.
        let mut probe = self.offset;

        while self.byte_at(probe) == Some(b'_') {
            probe += 1;
        }

        if matches!(self.byte_at(probe), Some(b'A'..=b'Z')) {
            return self.constant();
        }

        while matches!(
            self.current(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.bump();
        }

        if self.current() == Some(b'?') {
            self.bump();
        }

        let span = self.span_from(start);
        let word = span.fragment();

        match TokenKind::keyword(word) {
            Some(TokenKind::Try) if self.current() == Some(b'!') => {
                self.bump();
                self.token_from(TokenKind::TryBang, start)
            }
            Some(kind) => Token::new(kind, word.to_string(), span),
            None => Token::new(TokenKind::Identifier, word.to_string(), span),
        }
    }

    fn constant(&mut self) -> Token {
        let start = self.cursor();

        while matches!(
            self.current(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.bump();
        }

        self.token_from(TokenKind::Constant, start)
    }

    fn attribute(&mut self) -> Token {
        let start = self.cursor();

        self.bump();

        while matches!(
            self.current(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.bump();
        }

        self.token_from(TokenKind::Attribute, start)
    }

    // Numbers

    fn number(&mut self) -> Token {
        let start = self.cursor();
        let first = self.current();

        self.bump();

        if first == Some(b'0') && matches!(self.current(), Some(b'x' | b'X')) {
            self.bump();

            while matches!(
                self.current(),
                Some(b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' | b'_')
            ) {
                self.bump();
            }

            return self.number_token(TokenKind::Integer, start);
        }

        let mut float = false;

        while matches!(self.current(), Some(b'0'..=b'9' | b'_')) {
            self.bump();
        }

        if self.current() == Some(b'.') && matches!(self.next_byte(), Some(b'0'..=b'9')) {
            float = true;
            self.bump();

            while matches!(self.current(), Some(b'0'..=b'9' | b'_')) {
                self.bump();
            }
        }

        let exponent_follows = match (self.current(), self.next_byte()) {
            (Some(b'e' | b'E'), Some(b'0'..=b'9')) => true,
            (Some(b'e' | b'E'), Some(b'+')) => {
                matches!(self.byte_at(self.offset + 2), Some(b'0'..=b'9'))
            }
            _ => false,
        };

        if exponent_follows {
            float = true;
            self.bump();

            if self.current() == Some(b'+') {
                self.bump();
            }

            while matches!(self.current(), Some(b'0'..=b'9' | b'_')) {
                self.bump();
            }
        }

        let kind = if float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };

        self.number_token(kind, start)
    }

    /// Builds a number token with in-number underscores stripped from the
    /// lexeme.
    fn number_token(&mut self, kind: TokenKind, start: Cursor) -> Token {
        let span = self.span_from(start);
        let lexeme: String = span.fragment().chars().filter(|&c| c != '_').collect();

        Token::new(kind, lexeme, span)
    }

    // Strings

    fn string(&mut self, quote: u8) -> Token {
        let start = self.cursor();
        let mut buffer = Vec::new();

        self.bump();

        loop {
            match self.current() {
                None => return self.null_token(),
                Some(byte) if byte == quote => {
                    self.bump();

                    let span = self.span_from(start);
                    let lexeme = String::from_utf8_lossy(&buffer).into_owned();

                    return Token::new(TokenKind::String, lexeme, span);
                }
                Some(b'\\') => {
                    let next = self.next_byte();

                    self.bump();

                    match next {
                        None => return self.null_token(),
                        Some(byte) if byte == quote => {
                            buffer.push(quote);
                            self.bump();
                        }
                        Some(b'\\') => {
                            buffer.push(b'\\');
                            self.bump();
                        }
                        Some(escaped) if quote == b'"' => {
                            match escaped {
                                b't' => buffer.push(b'\t'),
                                b'r' => buffer.push(b'\r'),
                                b'n' => buffer.push(b'\n'),
                                b'e' => buffer.push(0x1b),
                                b'0' => buffer.push(0x00),
                                other => {
                                    buffer.push(b'\\');
                                    buffer.push(other);
                                }
                            }

                            self.bump();
                        }
                        Some(other) => {
                            buffer.push(b'\\');
                            buffer.push(other);
                            self.bump();
                        }
                    }
                }
                Some(byte) => {
                    buffer.push(byte);
                    self.bump();
                }
            }
        }
    }

    // Template string bodies

    fn template_body_token(&mut self) -> Token {
        let start = self.cursor();
        let mut buffer: Vec<u8> = Vec::new();

        loop {
            match self.current() {
                None => return self.null_token(),
                Some(b'`') => {
                    if !buffer.is_empty() {
                        return self.body_token(buffer, start);
                    }

                    self.bump();
                    self.modes.pop();

                    return self.token_from(TokenKind::TstringClose, start);
                }
                Some(b'{') => {
                    if !buffer.is_empty() {
                        return self.body_token(buffer, start);
                    }

                    self.bump();
                    self.tstring_curlies.push(self.curly_balance);
                    self.modes.push(Mode::Default);

                    return self.token_from(TokenKind::TstringExprOpen, start);
                }
                Some(b'\\') => self.template_escape(&mut buffer),
                Some(byte) => {
                    buffer.push(byte);
                    self.bump();
                }
            }
        }
    }

    fn body_token(&mut self, buffer: Vec<u8>, start: Cursor) -> Token {
        let span = self.span_from(start);
        let lexeme = String::from_utf8_lossy(&buffer).into_owned();

        Token::new(TokenKind::TstringBody, lexeme, span)
    }

    fn template_escape(&mut self, buffer: &mut Vec<u8>) {
        // A backslash followed by optional inline whitespace, a newline, and
        // more whitespace is a line continuation and disappears entirely.
        let mut probe = self.offset + 1;

        while matches!(self.byte_at(probe), Some(b' ' | b'\t' | b'\r')) {
            probe += 1;
        }

        if self.byte_at(probe) == Some(b'\n') {
            while self.offset <= probe {
                self.bump();
            }

            while matches!(self.current(), Some(b' ' | b'\t')) {
                self.bump();
            }

            return;
        }

        self.bump();

        match self.current() {
            Some(b'`') => {
                buffer.push(b'`');
                self.bump();
            }
            Some(b'{') => {
                buffer.push(b'{');
                self.bump();
            }
            Some(b'\\') => {
                buffer.push(b'\\');
                self.bump();
            }
            Some(b't') => {
                buffer.push(b'\t');
                self.bump();
            }
            Some(b'r') => {
                buffer.push(b'\r');
                self.bump();
            }
            Some(b'n') => {
                buffer.push(b'\n');
                self.bump();
            }
            Some(b'e') => {
                buffer.push(0x1b);
                self.bump();
            }
            Some(b'0') => {
                buffer.push(0x00);
                self.bump();
            }
            // The backslash itself is consumed; the next byte is taken
            // literally on the next loop iteration.
            _ => {}
        }
    }

    // Comments

    fn comment(&mut self) -> Token {
        let start = self.cursor();
        let mut lines: Vec<String> = Vec::new();
        let mut end = self.cursor();

        loop {
            self.bump();

            if self.current() == Some(b' ') {
                self.bump();
            }

            let line_start = self.offset;

            while !matches!(self.current(), None | Some(b'\n')) {
                self.bump();
            }

            lines.push(self.file.code()[line_start..self.offset].to_string());
            end = self.cursor();

            // Consecutive comment lines join into a single token.
            let mut probe = self.offset;

            if self.byte_at(probe) == Some(b'\n') {
                probe += 1;

                while matches!(self.byte_at(probe), Some(b' ' | b'\t')) {
                    probe += 1;
                }

                if self.byte_at(probe) == Some(b'#') {
                    while self.offset < probe {
                        self.bump();
                    }

                    continue;
                }
            }

            break;
        }

        let span = Span::new(
            self.file.clone(),
            start.line,
            start.column,
            start.offset..end.offset,
        );

        Token::new(TokenKind::Comment, lines.join("\n"), span)
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, Token, TokenKind};
    use crate::file::SourceFile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn lex(code: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(SourceFile::new("test.nara", code));
        let mut tokens = Vec::new();

        loop {
            let token = lexer.advance();

            if !token.is_valid() {
                break;
            }

            tokens.push(token);
        }

        tokens
    }

    fn kinds(code: &str) -> Vec<TokenKind> {
        lex(code).into_iter().map(|token| token.kind).collect()
    }

    fn lexemes(code: &str) -> Vec<String> {
        lex(code).into_iter().map(|token| token.lexeme).collect()
    }

    #[rstest]
    #[case("10", TokenKind::Integer, "10")]
    #[case("1_000_000", TokenKind::Integer, "1000000")]
    #[case("0x1F", TokenKind::Integer, "0x1F")]
    #[case("0Xff_ee", TokenKind::Integer, "0Xffee")]
    #[case("10.5", TokenKind::Float, "10.5")]
    #[case("10e2", TokenKind::Float, "10e2")]
    #[case("1.2e+4", TokenKind::Float, "1.2e+4")]
    #[case("1_0.2_5", TokenKind::Float, "10.25")]
    fn numbers(#[case] code: &str, #[case] kind: TokenKind, #[case] lexeme: &str) {
        let tokens = lex(code);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, kind);
        assert_eq!(tokens[0].lexeme, lexeme);
    }

    #[test]
    fn integer_dot_message_is_not_a_float() {
        assert_eq!(
            kinds("10.times"),
            vec![TokenKind::Integer, TokenKind::Dot, TokenKind::Identifier]
        );
    }

    #[rstest]
    #[case("'hello'", "hello")]
    #[case(r#"'it\'s'"#, "it's")]
    #[case(r#"'a\nb'"#, "a\\nb")]
    #[case(r#""a\nb""#, "a\nb")]
    #[case(r#""a\tb""#, "a\tb")]
    #[case(r#""quote \" here""#, "quote \" here")]
    #[case(r#""back\\slash""#, "back\\slash")]
    fn strings(#[case] code: &str, #[case] expected: &str) {
        let tokens = lex(code);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, expected);
    }

    #[test]
    fn unterminated_string_produces_the_null_token() {
        let mut lexer = Lexer::new(SourceFile::new("test.nara", "'oops"));
        let token = lexer.advance();

        assert_eq!(token.kind, TokenKind::Null);
        assert!(!token.is_valid());
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("let mut object trait impl foo class"),
            vec![
                TokenKind::Let,
                TokenKind::Mut,
                TokenKind::Object,
                TokenKind::Trait,
                TokenKind::Impl,
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn try_bang_promotion() {
        assert_eq!(kinds("try! try !"), vec![
            TokenKind::TryBang,
            TokenKind::Try,
            TokenKind::Bang,
        ]);
        assert_eq!(lexemes("try!")[0], "try!");
    }

    #[test]
    fn underscore_prefixes_classify_by_first_letter() {
        assert_eq!(
            kinds("_foo __BAR _ _x"),
            vec![
                TokenKind::Identifier,
                TokenKind::Constant,
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn constants_and_attributes() {
        let tokens = lex("Foo @bar");

        assert_eq!(tokens[0].kind, TokenKind::Constant);
        assert_eq!(tokens[0].lexeme, "Foo");
        assert_eq!(tokens[1].kind, TokenKind::Attribute);
        assert_eq!(tokens[1].lexeme, "@bar");
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            kinds("** *= << <<= .. ... -> !! != :: <="),
            vec![
                TokenKind::Pow,
                TokenKind::MulAssign,
                TokenKind::ShiftLeft,
                TokenKind::ShiftLeftAssign,
                TokenKind::InclusiveRange,
                TokenKind::ExclusiveRange,
                TokenKind::Arrow,
                TokenKind::Throws,
                TokenKind::NotEqual,
                TokenKind::ColonColon,
                TokenKind::LowerEqual,
            ]
        );
    }

    #[test]
    fn word_operators() {
        assert_eq!(
            kinds("a or b and c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Or,
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn hash_open_versus_modulo() {
        assert_eq!(
            kinds("%[ a % b %= c"),
            vec![
                TokenKind::HashOpen,
                TokenKind::Identifier,
                TokenKind::Mod,
                TokenKind::Identifier,
                TokenKind::ModAssign,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn template_string_with_interpolation() {
        assert_eq!(
            kinds("`a {b} c`"),
            vec![
                TokenKind::TstringOpen,
                TokenKind::TstringBody,
                TokenKind::TstringExprOpen,
                TokenKind::Identifier,
                TokenKind::TstringExprClose,
                TokenKind::TstringBody,
                TokenKind::TstringClose,
            ]
        );

        let tokens = lex("`a {b} c`");

        assert_eq!(tokens[1].lexeme, "a ");
        assert_eq!(tokens[5].lexeme, " c");
    }

    #[test]
    fn template_string_nested_braces_inside_interpolation() {
        // The closure braces inside the interpolation must not close it.
        assert_eq!(
            kinds("`x {foo { bar }} y`"),
            vec![
                TokenKind::TstringOpen,
                TokenKind::TstringBody,
                TokenKind::TstringExprOpen,
                TokenKind::Identifier,
                TokenKind::CurlyOpen,
                TokenKind::Identifier,
                TokenKind::CurlyClose,
                TokenKind::TstringExprClose,
                TokenKind::TstringBody,
                TokenKind::TstringClose,
            ]
        );
    }

    #[test]
    fn template_string_escapes() {
        let tokens = lex(r"`a \{b\} \` \\ \t`");

        assert_eq!(tokens[1].kind, TokenKind::TstringBody);
        assert_eq!(tokens[1].lexeme, "a {b} ` \\ \t");
    }

    #[test]
    fn template_string_line_continuation() {
        let tokens = lex("`before \\\n   after`");

        assert_eq!(tokens[1].kind, TokenKind::TstringBody);
        assert_eq!(tokens[1].lexeme, "before after");
    }

    #[test]
    fn empty_template_string() {
        assert_eq!(
            kinds("``"),
            vec![TokenKind::TstringOpen, TokenKind::TstringClose]
        );
    }

    #[test]
    fn comments_are_discarded_by_default() {
        assert_eq!(
            kinds("10 # comment\n20"),
            vec![TokenKind::Integer, TokenKind::Integer]
        );
    }

    #[test]
    fn comments_join_in_comment_mode() {
        let mut lexer = Lexer::with_comments(SourceFile::new(
            "test.nara",
            "# first\n# second\n10\n# other",
        ));

        let first = lexer.advance();

        assert_eq!(first.kind, TokenKind::Comment);
        assert_eq!(first.lexeme, "first\nsecond");

        assert_eq!(lexer.advance().kind, TokenKind::Integer);
        assert_eq!(lexer.advance().kind, TokenKind::Comment);
    }

    #[test]
    fn null_token_at_end_of_input_forever() {
        let mut lexer = Lexer::new(SourceFile::new("test.nara", "10"));

        assert!(lexer.advance().is_valid());
        assert!(!lexer.advance().is_valid());
        assert!(!lexer.advance().is_valid());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new(SourceFile::new("test.nara", "10 20"));

        assert_eq!(lexer.peek().lexeme, "10");
        assert_eq!(lexer.peek().lexeme, "10");
        assert_eq!(lexer.advance().lexeme, "10");
        assert_eq!(lexer.advance().lexeme, "20");
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let tokens = lex("10\n  foo");

        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[0].location.column, 1);
        assert_eq!(tokens[1].location.line, 2);
        assert_eq!(tokens[1].location.column, 3);
    }

    #[test]
    fn lexing_is_deterministic() {
        let code = "let x = `a {1 + 2_0} b` # done\ntry! foo.bar?(10)";
        let first = lex(code);
        let second = lex(code);

        assert_eq!(first, second);
    }

    #[test]
    fn token_ranges_round_trip_to_their_lexemes() {
        let code = "foo Bar @baz 10 'str' + <<";

        for token in lex(code) {
            let source = &code[token.location.to_range()];

            match token.kind {
                TokenKind::String => assert_eq!(source, "'str'"),
                _ => assert_eq!(source, token.lexeme),
            }
        }
    }
}
