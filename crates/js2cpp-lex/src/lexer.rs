//! The tokenizer.
//!
//! Works one line at a time: when the current line buffer is exhausted the
//! lexer asks the active source for another, and when an included source
//! runs dry it pops back to the stream underneath. Tokens carry their
//! coordinates, their interned lexeme, and the newline flag that drives
//! automatic semicolon insertion in the parser.

use std::mem;

use js2cpp_util::diagnostic::codes::{
    E_DIGIT_AFTER_DOT, E_EOF_IN_COMMENT, E_NO_DIGITS_IN_EXP, E_UNK_CHAR, E_UNTERM_REGEX,
    E_UNTERM_STRING,
};
use js2cpp_util::{Coord, DiagnosticCode, Handler, Symbol};

use crate::source::SourceText;
use crate::token::{keyword_kind, Token, TokenKind, KEYWORD_KINDS};

/// Maximum depth of the include stack.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Per-source lexing state, swapped wholesale by the include stack.
struct SourceState {
    src: Box<dyn SourceText>,
    /// Current line, end-of-line characters included.
    buf: String,
    /// Byte position in the line.
    pos: usize,
    /// Current line number (from 1; 0 before the first read).
    line: u32,
    /// True once the source has run dry.
    at_eof: bool,
    /// Interned title of the source stream.
    source_name: Symbol,
}

impl SourceState {
    fn new(src: Box<dyn SourceText>) -> Self {
        let source_name = Symbol::intern(src.title());
        Self {
            src,
            buf: String::new(),
            pos: 0,
            line: 0,
            at_eof: false,
            source_name,
        }
    }

    /// Byte at offset `i` in the line, NUL past the end.
    fn byte_at(&self, i: usize) -> u8 {
        self.buf.as_bytes().get(i).copied().unwrap_or(0)
    }

    fn cur(&self) -> u8 {
        self.byte_at(self.pos)
    }

    /// Pull the next line from the source. False (and `at_eof`) when dry.
    fn next_line(&mut self) -> bool {
        self.pos = 0;
        if self.src.read_line(&mut self.buf) {
            self.line += 1;
            true
        } else {
            self.buf.clear();
            self.at_eof = true;
            false
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// The tokenizer.
///
/// # Example
///
/// ```
/// use js2cpp_lex::{Lexer, StrText, TokenKind};
/// use js2cpp_util::Handler;
///
/// let handler = Handler::new();
/// let mut lexer = Lexer::new(Box::new(StrText::new("demo.js", "var x;")), &handler);
///
/// assert_eq!(lexer.next_token().kind, TokenKind::Var);
/// assert_eq!(lexer.next_token().kind, TokenKind::Ident);
/// assert_eq!(lexer.next_token().kind, TokenKind::Semi);
/// assert_eq!(lexer.next_token().kind, TokenKind::Eof);
/// ```
pub struct Lexer<'a> {
    state: SourceState,
    /// Source stream stack for includes.
    stack: Vec<SourceState>,
    /// Diagnostic sink.
    handler: &'a Handler,
    /// Kind of the previous token; decides regex vs. division.
    prev_kind: TokenKind,
    /// Line of the previously produced token, for the newline flag.
    last_line: u32,
    /// Source of the previously produced token.
    last_source: Symbol,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `src`, reporting lexical errors to `handler`.
    pub fn new(src: Box<dyn SourceText>, handler: &'a Handler) -> Self {
        // The intern table pre-registers every keyword at a fixed index;
        // the kind table must agree entry for entry.
        for (i, kind) in KEYWORD_KINDS.iter().enumerate() {
            debug_assert_eq!(Symbol::intern(kind.text()).as_u32(), i as u32);
        }

        let state = SourceState::new(src);
        let last_source = state.source_name;
        Self {
            state,
            stack: Vec::new(),
            handler,
            prev_kind: TokenKind::Eof,
            last_line: 0,
            last_source,
        }
    }

    /// Insert a text stream at the current token position.
    ///
    /// Tokens come from `src` until it is exhausted, then from the stream
    /// underneath. Exceeding [`MAX_INCLUDE_DEPTH`] is a programming error.
    pub fn include(&mut self, src: Box<dyn SourceText>) {
        assert!(
            self.stack.len() < MAX_INCLUDE_DEPTH,
            "include stack overflow"
        );
        let new_state = SourceState::new(src);
        self.stack.push(mem::replace(&mut self.state, new_state));
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_blank();

        if self.state.at_eof {
            // End of an included stream resumes the one underneath.
            if let Some(prev) = self.stack.pop() {
                self.state = prev;
                return self.next_token();
            }
            let coord = self.coord();
            let newline = self.note_newline(coord);
            self.prev_kind = TokenKind::Eof;
            return Token::eof(coord, newline);
        }

        use TokenKind::*;

        let coord = self.coord();
        let start = self.state.pos;
        let c = self.state.cur();
        self.state.pos += 1;

        let kind = match c {
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            b';' => Semi,
            b',' => Comma,
            b'?' => Question,
            b':' => Colon,
            b'~' => Tilde,
            b'.' => Dot,

            b'!' => {
                if self.eat(b'=') {
                    if self.eat(b'=') {
                        NotEqEq
                    } else {
                        NotEq
                    }
                } else {
                    Bang
                }
            }
            b'=' => {
                if self.eat(b'=') {
                    if self.eat(b'=') {
                        EqEqEq
                    } else {
                        EqEq
                    }
                } else {
                    Eq
                }
            }
            b'<' => {
                if self.eat(b'=') {
                    Le
                } else if self.eat(b'<') {
                    if self.eat(b'=') {
                        ShlEq
                    } else {
                        Shl
                    }
                } else {
                    Lt
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    Ge
                } else if self.eat(b'>') {
                    if self.eat(b'>') {
                        if self.eat(b'=') {
                            UShrEq
                        } else {
                            UShr
                        }
                    } else if self.eat(b'=') {
                        ShrEq
                    } else {
                        Shr
                    }
                } else {
                    Gt
                }
            }
            b'+' => {
                if self.eat(b'+') {
                    PlusPlus
                } else if self.eat(b'=') {
                    PlusEq
                } else {
                    Plus
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    MinusMinus
                } else if self.eat(b'=') {
                    MinusEq
                } else {
                    Minus
                }
            }
            b'*' => {
                if self.eat(b'=') {
                    StarEq
                } else {
                    Star
                }
            }
            b'%' => {
                if self.eat(b'=') {
                    PercentEq
                } else {
                    Percent
                }
            }
            b'^' => {
                if self.eat(b'=') {
                    CaretEq
                } else {
                    Caret
                }
            }
            b'&' => {
                if self.eat(b'&') {
                    if self.eat(b'=') {
                        AmpAmpEq
                    } else {
                        AmpAmp
                    }
                } else if self.eat(b'=') {
                    AmpEq
                } else {
                    Amp
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    if self.eat(b'=') {
                        PipePipeEq
                    } else {
                        PipePipe
                    }
                } else if self.eat(b'=') {
                    PipeEq
                } else {
                    Pipe
                }
            }

            b'"' | b'\'' => return self.lex_string(c, start, coord),
            b'/' => return self.lex_slash(start, coord),
            b'0'..=b'9' => return self.lex_number(start, coord),
            c if is_ident_start(c) => return self.lex_ident(start, coord),

            _ => return self.error_token(coord, E_UNK_CHAR, "unknown character"),
        };

        self.finish_fixed(kind, coord)
    }

    // Whitespace and comments. Leaves the position on the first character
    // of the next token, or `at_eof` set.
    fn skip_blank(&mut self) {
        loop {
            match self.state.cur() {
                b' ' | b'\t' => self.state.pos += 1,

                b'/' if self.state.byte_at(self.state.pos + 1) == b'*' => {
                    if !self.skip_block_comment() {
                        return;
                    }
                }
                b'/' if self.state.byte_at(self.state.pos + 1) == b'/' => {
                    // line comment: the rest of the line is discarded
                    if !self.state.next_line() {
                        return;
                    }
                }

                // end of line buffer
                0 | b'\n' | b'\r' | 0x0C => {
                    if self.state.at_eof || !self.state.next_line() {
                        return;
                    }
                }

                _ => return,
            }
        }
    }

    // Returns false when the comment hit end-of-source (error reported).
    fn skip_block_comment(&mut self) -> bool {
        let coord = self.coord();
        self.state.pos += 2; // over "/*"
        loop {
            match self.state.cur() {
                0 | b'\n' | b'\r' | 0x0C => {
                    if !self.state.next_line() {
                        self.handler
                            .error(coord, E_EOF_IN_COMMENT, "EOF in /*..*/ comment");
                        // error is terminal: no resuming an outer stream
                        self.stack.clear();
                        return false;
                    }
                }
                b'*' if self.state.byte_at(self.state.pos + 1) == b'/' => {
                    self.state.pos += 2;
                    return true;
                }
                _ => self.state.pos += 1,
            }
        }
    }

    fn lex_string(&mut self, quote: u8, start: usize, coord: Coord) -> Token {
        loop {
            let b = self.state.cur();
            if b == quote || b == 0 {
                break;
            }
            if b == b'\\' && self.state.byte_at(self.state.pos + 1) != 0 {
                self.state.pos += 1;
            }
            self.state.pos += 1;
        }
        if self.state.cur() != quote {
            return self.error_token(
                coord,
                E_UNTERM_STRING,
                "string literal, EOL inside string or missing close-quote",
            );
        }
        // eat up ending quote
        self.state.pos += 1;
        self.finish_text(TokenKind::Str, start, coord)
    }

    // Either division operator, division-assignment, or the start of a
    // regular expression, depending on the previous token.
    fn lex_slash(&mut self, start: usize, coord: Coord) -> Token {
        let prev = self.prev_kind;
        let regex_position = prev.is_assign_op()
            || matches!(
                prev,
                TokenKind::LParen | TokenKind::Comma | TokenKind::Colon
            );

        if !regex_position {
            let kind = if self.eat(b'=') {
                TokenKind::SlashEq
            } else {
                TokenKind::Slash
            };
            return self.finish_fixed(kind, coord);
        }

        // regex body ends at the next unescaped '/'
        loop {
            let b = self.state.cur();
            if b == b'/' || b == 0 {
                break;
            }
            if b == b'\\' && self.state.byte_at(self.state.pos + 1) != 0 {
                self.state.pos += 1;
            }
            self.state.pos += 1;
        }
        if self.state.cur() != b'/' {
            return self.error_token(
                coord,
                E_UNTERM_REGEX,
                "regular expression literal: no closing '/'",
            );
        }
        self.state.pos += 1;
        // pick up any flags ('i' 'g' or 'm' following the closing slash)
        while matches!(self.state.cur(), b'i' | b'g' | b'm') {
            self.state.pos += 1;
        }
        self.finish_text(TokenKind::Regex, start, coord)
    }

    fn lex_number(&mut self, start: usize, coord: Coord) -> Token {
        while self.state.cur().is_ascii_digit() {
            self.state.pos += 1;
        }
        if self.state.cur() == b'.' {
            // decimal point, parse fractional digits
            self.state.pos += 1;
            if !self.state.cur().is_ascii_digit() {
                return self.error_token(
                    coord,
                    E_DIGIT_AFTER_DOT,
                    "in number, decimal point not followed by digit",
                );
            }
            while self.state.cur().is_ascii_digit() {
                self.state.pos += 1;
            }
        }
        if matches!(self.state.cur(), b'e' | b'E') {
            // exponent part
            self.state.pos += 1;
            if matches!(self.state.cur(), b'+' | b'-') {
                self.state.pos += 1;
            }
            if !self.state.cur().is_ascii_digit() {
                return self.error_token(
                    coord,
                    E_NO_DIGITS_IN_EXP,
                    "in number, no digits in exponent",
                );
            }
            while self.state.cur().is_ascii_digit() {
                self.state.pos += 1;
            }
        }
        self.finish_text(TokenKind::Number, start, coord)
    }

    fn lex_ident(&mut self, start: usize, coord: Coord) -> Token {
        while is_ident_continue(self.state.cur()) {
            self.state.pos += 1;
        }
        let name = Symbol::intern(&self.state.buf[start..self.state.pos]);
        // If the interned atom carries a keyword tag, retag the token.
        let kind = keyword_kind(name).unwrap_or(TokenKind::Ident);
        self.finish(kind, name, coord)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.state.cur() == b {
            self.state.pos += 1;
            true
        } else {
            false
        }
    }

    fn coord(&self) -> Coord {
        Coord::new(self.state.source_name, self.state.line, self.state.pos as u32)
    }

    // Token whose name is the collected lexeme.
    fn finish_text(&mut self, kind: TokenKind, start: usize, coord: Coord) -> Token {
        let name = Symbol::intern(&self.state.buf[start..self.state.pos]);
        self.finish(kind, name, coord)
    }

    // Token whose name is the kind's own spelling.
    fn finish_fixed(&mut self, kind: TokenKind, coord: Coord) -> Token {
        self.finish(kind, Symbol::intern(kind.text()), coord)
    }

    fn finish(&mut self, kind: TokenKind, name: Symbol, coord: Coord) -> Token {
        let newline = self.note_newline(coord);
        self.prev_kind = kind;
        Token {
            kind,
            name,
            coord,
            newline,
        }
    }

    // Report a lexical error, then yield EOF from here on.
    fn error_token(&mut self, coord: Coord, code: DiagnosticCode, msg: &str) -> Token {
        self.handler.error(coord, code, msg);
        self.state.at_eof = true;
        self.state.buf.clear();
        self.state.pos = 0;
        self.stack.clear();
        let newline = self.note_newline(coord);
        self.prev_kind = TokenKind::Eof;
        Token::eof(coord, newline)
    }

    fn note_newline(&mut self, coord: Coord) -> bool {
        let newline = coord.line != self.last_line || coord.source != self.last_source;
        self.last_line = coord.line;
        self.last_source = coord.source;
        newline
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
