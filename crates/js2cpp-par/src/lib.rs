//! js2cpp-par - Parser
//!
//! Recursive descent for statements and declarators, a Pratt
//! (precedence-climbing) loop for the rich operator set. One token of
//! lookahead is standard; a short peek queue serves the few contexts that
//! need more (labeled statements, `extern var`, `for (var x in e)`).
//!
//! Two things happen at once while parsing:
//!
//! - the tree is built, and
//! - the lexical scope chain is populated: `function` enters a scope,
//!   declarations bind names, every identifier used as a term registers a
//!   reference, and sealing a scope re-exports unresolved references to its
//!   parent. There is no separate semantic-analysis pass; the code
//!   generator consumes exactly what parsing recorded.
//!
//! Statement termination follows automatic semicolon insertion: a literal
//! `;`, or an inferred one when the next token starts a new line or is `}`
//! or end-of-file.

use std::collections::VecDeque;

use js2cpp_lex::{Lexer, StrText, Token, TokenKind};
use js2cpp_util::diagnostic::codes::E_EXPECTED;
use js2cpp_util::{Coord, Handler, Symbol};

pub mod ast;
pub mod scope;

mod expr;
mod stmt;

pub use ast::{
    AssignExpr, AssignOp, BinOp, BinaryExpr, CallExpr, CatchClause, CondExpr, Expr, ForInTarget,
    ForInit, FuncId, Funcs, Function, IndexExpr, MemberExpr, NewExpr, PostfixExpr, PostfixOp,
    Program, Stmt, UnOp, UnaryExpr, VarDecl,
};
pub use scope::{Binding, Scope, ScopeId, ScopeTree};

/// Predefined preamble of external declarations, consumed ahead of the
/// user's source.
pub const PREDEFINED: &str = "\
extern var alert,undefined;
extern var Object, Function, Array, String, Boolean, Number, Date, RegExp;
extern var Error, EvalError, RangeError, ReferenceError, SyntaxError, TypeError, URIError;
extern var Math;
";

/// Maximum lookahead distance.
pub const MAX_PEEK: usize = 6;

/// The parser.
///
/// # Example
///
/// ```
/// use js2cpp_lex::{Lexer, StrText};
/// use js2cpp_par::Parser;
/// use js2cpp_util::Handler;
///
/// let handler = Handler::new();
/// let lexer = Lexer::new(Box::new(StrText::new("demo.js", "var x = 1;")), &handler);
/// let program = Parser::new(lexer, &handler).parse();
///
/// assert!(!handler.has_errors());
/// assert_eq!(program.body.len(), 1);
/// ```
pub struct Parser<'a> {
    /// Token stream.
    lexer: Lexer<'a>,
    /// Diagnostic sink.
    handler: &'a Handler,
    /// Current token.
    token: Token,
    /// Token look-ahead queue.
    peeked: VecDeque<Token>,
    /// Function arena, filled as definitions are parsed.
    funcs: Funcs,
    /// Scope forest, populated during the parse.
    scopes: ScopeTree,
    /// The interned pseudo-keyword `extern`.
    sym_extern: Symbol,
}

impl<'a> Parser<'a> {
    /// Create a parser over `lexer`, reporting syntax errors to `handler`.
    pub fn new(lexer: Lexer<'a>, handler: &'a Handler) -> Self {
        Self {
            lexer,
            handler,
            token: Token::eof(Coord::dummy(), false),
            peeked: VecDeque::new(),
            funcs: Funcs::new(),
            scopes: ScopeTree::new(),
            sym_extern: Symbol::intern("extern"),
        }
    }

    /// Parse the lexical stream and return the program.
    pub fn parse(mut self) -> Program {
        // the predefined external declarations are consumed first
        self.lexer
            .include(Box::new(StrText::new("*predefined*", PREDEFINED)));
        // suck in the first token
        self.advance();

        let body = self.statements();
        let global_scope = self.scopes.current();
        self.scopes.exit_scope();
        self.expect(TokenKind::Eof);

        Program {
            body,
            funcs: self.funcs,
            scopes: self.scopes,
            global_scope,
        }
    }

    /// Parse statements until `}` or end of file.
    pub(crate) fn statements(&mut self) -> Vec<Stmt> {
        let mut list = Vec::new();
        while self.token.kind != TokenKind::Eof && self.token.kind != TokenKind::RBrace {
            let s = self.statement();
            list.push(s);
        }
        list
    }

    /// Read the next token.
    pub(crate) fn advance(&mut self) {
        self.token = match self.peeked.pop_front() {
            Some(tok) => tok,
            None => self.lexer.next_token(),
        };
    }

    /// Token `i` positions ahead of the current token; `peek(0)` is the
    /// current token. Looking further than [`MAX_PEEK`] is a programming
    /// error.
    pub(crate) fn peek(&mut self, i: usize) -> &Token {
        if i == 0 {
            return &self.token;
        }
        assert!(i <= MAX_PEEK, "peek queue overflow");
        while self.peeked.len() < i {
            let tok = self.lexer.next_token();
            self.peeked.push_back(tok);
        }
        &self.peeked[i - 1]
    }

    /// Advance over a token of the given kind, or report `E_EXPECTED`.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.token.kind != kind {
            self.error_expected(kind.text());
            return false;
        }
        self.advance();
        true
    }

    /// Check for a semicolon (or an inferred one).
    ///
    /// A statement ends at a literal `;`, or without one when the current
    /// token begins a new line, or is `}`, or is end-of-file.
    pub(crate) fn soft_semicolon(&mut self) -> bool {
        if self.token.kind == TokenKind::Semi {
            self.advance();
            return true;
        }
        self.token.newline
            || self.token.kind == TokenKind::RBrace
            || self.token.kind == TokenKind::Eof
    }

    /// Report `E_EXPECTED <note>` at the current token.
    pub(crate) fn error_expected(&mut self, note: &str) {
        let msg = format!("Expected {} at {}", note, self.token.name);
        self.handler.error(self.token.coord, E_EXPECTED, msg);
    }

    // Scoping of variables - done during parse

    pub(crate) fn declare_external(&mut self, name: Symbol) {
        self.scopes.declare_external(name);
    }

    pub(crate) fn declare_variable(&mut self, name: Symbol) {
        self.scopes.declare_variable(name);
    }

    pub(crate) fn reference(&mut self, name: Symbol) {
        self.scopes.reference(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn parse_source(source: &str) -> (Program, Handler) {
        let handler = Handler::new();
        let program = {
            let lexer = Lexer::new(Box::new(StrText::new("test.js", source)), &handler);
            Parser::new(lexer, &handler).parse()
        };
        (program, handler)
    }

    #[test]
    fn test_preamble_externs_bound_in_global_scope() {
        let (program, handler) = parse_source("");
        assert!(!handler.has_errors());

        let globals = &program.scopes[program.global_scope];
        for name in ["alert", "undefined", "Object", "Math", "RegExp", "TypeError"] {
            let binding = globals.bindings[&Symbol::intern(name)];
            assert!(binding.is_extern(), "{} should be extern", name);
        }
    }

    #[test]
    fn test_global_scope_is_root() {
        let (program, _) = parse_source("var a;");
        assert_eq!(program.global_scope, program.scopes.root());
        assert_eq!(program.scopes[program.global_scope].depth, 0);
    }

    #[test]
    fn test_scenario_two_variable_bindings() {
        // var x = 1; var y = x + 2;  =>  two Variable bindings in the
        // global scope
        let (program, handler) = parse_source("var x = 1; var y = x + 2;");
        assert!(!handler.has_errors());

        let globals = &program.scopes[program.global_scope];
        assert!(globals.bindings[&Symbol::intern("x")].is_variable());
        assert!(globals.bindings[&Symbol::intern("y")].is_variable());
    }

    #[test]
    fn test_scope_reexport_through_intermediate() {
        // c is declared in outer, used in inner: the middle scope must hold
        // a Reference binding for c after parsing completes.
        let source = "function outer(){ var c; function middle(){ function inner(){ c = 1; } } }";
        let (program, handler) = parse_source(source);
        assert!(!handler.has_errors());

        let c = Symbol::intern("c");
        let outer = program
            .funcs
            .iter()
            .find(|f| f.name == Some(Symbol::intern("outer")))
            .unwrap();
        let middle = program
            .funcs
            .iter()
            .find(|f| f.name == Some(Symbol::intern("middle")))
            .unwrap();
        let inner = program
            .funcs
            .iter()
            .find(|f| f.name == Some(Symbol::intern("inner")))
            .unwrap();

        assert!(program.scopes[outer.scope].bindings[&c].is_variable());
        assert!(program.scopes[middle.scope].bindings[&c].is_reference());
        assert!(program.scopes[inner.scope].bindings[&c].is_reference());
    }

    #[test]
    fn test_undeclared_reference_reaches_global() {
        let (program, handler) = parse_source("function f(){ mystery(); }");
        assert!(!handler.has_errors());

        let globals = &program.scopes[program.global_scope];
        assert!(globals.bindings[&Symbol::intern("mystery")].is_reference());
    }

    #[test]
    fn test_trailing_garbage_reports_expected_eof() {
        let (_, handler) = parse_source("}");
        assert!(handler.has_errors());
    }
}
