//! Statement and declaration parsing.
//!
//! Statement boundaries follow automatic semicolon insertion; a failed
//! expression statement resynchronizes to the next `;`, `}`, line break, or
//! end of file and leaves an `Invalid` node for downstream phases to skip.

use js2cpp_lex::TokenKind;
use js2cpp_util::Symbol;

use crate::ast::{
    CatchClause, Expr, ForInTarget, ForInit, Function, Stmt, VarDecl,
};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse one statement.
    pub(crate) fn statement(&mut self) -> Stmt {
        use TokenKind::*;

        // Is this a labelled statement?
        if self.token.kind == Ident && self.peek(1).kind == Colon {
            let label = self.token.name;
            self.advance(); // label
            self.advance(); // ':'
            let body = self.statement();
            return Stmt::Labeled {
                label,
                body: Box::new(body),
            };
        }

        // The special pseudo-keyword introducing external declarations.
        if self.token.kind == Ident
            && self.token.name == self.sym_extern
            && self.peek(1).kind == Var
        {
            return self.extern_decl();
        }

        let kind = self.token.kind;
        match kind {
            Break | Continue => {
                let is_break = self.token.kind == Break;
                self.advance();
                let mut label = None;
                if !self.soft_semicolon() {
                    if self.token.kind == Ident {
                        label = Some(self.token.name);
                        self.advance();
                    }
                    if !self.soft_semicolon() {
                        self.error_expected(";");
                    }
                }
                if is_break {
                    Stmt::Break(label)
                } else {
                    Stmt::Continue(label)
                }
            }

            Case => {
                self.advance();
                let e = self.expression();
                self.expect(Colon);
                Stmt::Case(e)
            }

            Default => {
                self.advance();
                self.expect(Colon);
                Stmt::Default
            }

            Do => {
                self.advance();
                let body = self.statement();
                if !self.expect(While) {
                    return Stmt::Invalid;
                }
                if !self.expect(LParen) {
                    return Stmt::Invalid;
                }
                let cond = self.expression();
                self.expect(RParen);
                Stmt::DoWhile {
                    body: Box::new(body),
                    cond,
                }
            }

            For => self.for_statement(),

            Function => {
                // function definition
                self.function()
            }

            If => {
                self.advance();
                if !self.expect(LParen) {
                    return Stmt::Invalid;
                }
                let cond = self.expression();
                self.expect(RParen);
                let then_part = Box::new(self.statement());
                let else_part = if self.token.kind == Else {
                    self.advance();
                    Some(Box::new(self.statement()))
                } else {
                    None
                };
                Stmt::If {
                    cond,
                    then_part,
                    else_part,
                }
            }

            Return => {
                self.advance();
                let value = if self.token.kind != Semi && !self.token.newline {
                    Some(self.expression())
                } else {
                    None
                };
                if !self.soft_semicolon() {
                    self.error_expected(";");
                }
                Stmt::Return(value)
            }

            Switch => {
                self.advance();
                if !self.expect(LParen) {
                    return Stmt::Invalid;
                }
                let cond = self.expression();
                self.expect(RParen);
                let body = self.block_stmts();
                Stmt::Switch { cond, body }
            }

            Throw => {
                self.advance();
                let e = self.expression();
                if !self.soft_semicolon() {
                    self.error_expected(";");
                }
                Stmt::Throw(e)
            }

            Try => self.try_statement(),

            Var => {
                let decls = self.var_decl_list();
                if !self.soft_semicolon() {
                    self.error_expected(";");
                }
                Stmt::Var(decls)
            }

            While => {
                self.advance();
                if !self.expect(LParen) {
                    return Stmt::Invalid;
                }
                let cond = self.expression();
                self.expect(RParen);
                let body = Box::new(self.statement());
                Stmt::While { cond, body }
            }

            With => {
                let coord = self.token.coord;
                self.advance();
                if !self.expect(LParen) {
                    return Stmt::Invalid;
                }
                let object = self.expression();
                self.expect(RParen);
                let body = Box::new(self.statement());
                Stmt::With {
                    object,
                    body,
                    coord,
                }
            }

            LBrace => {
                // compound statement
                Stmt::Block(self.block_stmts())
            }

            Semi => {
                // empty statement
                self.advance();
                Stmt::Empty
            }

            _ => {
                // Presumably some kind of expression
                // (which usually means assignment or function call)
                let e = self.expression();
                if !self.soft_semicolon() {
                    self.error_expected(";");
                    // resynchronize to the next statement boundary
                    while !self.token.newline
                        && !matches!(self.token.kind, Semi | RBrace | Eof)
                    {
                        self.advance();
                    }
                    return Stmt::Invalid;
                }
                Stmt::Expr(e)
            }
        }
    }

    /// Named function definition. Binds the name in the enclosing scope.
    fn function(&mut self) -> Stmt {
        let coord = self.token.coord;
        self.advance(); // 'function'
        if self.token.kind != TokenKind::Ident {
            self.error_expected(TokenKind::Ident.text());
            return Stmt::Invalid;
        }
        let name = self.token.name;
        self.scopes.enter_scope(name);
        self.advance();

        let params = self.formal_params();
        let body = self.block_stmts();

        let scope = self.scopes.current();
        self.scopes.exit_scope();

        let id = self.funcs.push(Function {
            name: Some(name),
            params,
            body,
            scope,
            coord,
        });
        self.scopes.set_owner(scope, id);
        self.scopes.declare_function(name, id);
        Stmt::Function(id)
    }

    /// Function expression. The optional name is allowed but ignored; the
    /// function joins the enclosing scope's literal set instead of binding
    /// a name.
    pub(crate) fn function_literal(&mut self) -> Expr {
        let coord = self.token.coord;
        self.advance(); // 'function'
        if self.token.kind == TokenKind::Ident {
            self.advance();
        }
        self.scopes.enter_scope(Symbol::intern("<literal function>"));

        let params = self.formal_params();
        let body = self.block_stmts();

        let scope = self.scopes.current();
        self.scopes.exit_scope();

        let id = self.funcs.push(Function {
            name: None,
            params,
            body,
            scope,
            coord,
        });
        self.scopes.set_owner(scope, id);
        self.scopes.declare_literal_function(id);
        Expr::Function(id)
    }

    /// `( id, id, ... )`; each formal is bound as a variable in the
    /// function's own scope.
    fn formal_params(&mut self) -> Vec<Symbol> {
        let mut params = Vec::new();
        if !self.expect(TokenKind::LParen) {
            return params;
        }
        while self.token.kind == TokenKind::Ident {
            let name = self.token.name;
            self.declare_variable(name);
            params.push(name);
            self.advance();
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::RParen);
        params
    }

    /// `{ statements }`.
    pub(crate) fn block_stmts(&mut self) -> Vec<Stmt> {
        if !self.expect(TokenKind::LBrace) {
            return Vec::new();
        }
        let stmts = self.statements();
        self.expect(TokenKind::RBrace);
        stmts
    }

    /// The declarator list of a `var` statement, terminator excluded.
    /// The `var` is current.
    fn var_decl_list(&mut self) -> Vec<VarDecl> {
        self.advance(); // 'var'
        let mut decls = Vec::new();
        loop {
            if self.token.kind != TokenKind::Ident {
                self.error_expected(TokenKind::Ident.text());
                break;
            }
            let name = self.token.name;
            self.advance();
            let init = if self.token.kind == TokenKind::Eq {
                // initialization clause
                self.advance();
                Some(self.conditional_expr())
            } else {
                None
            };
            self.declare_variable(name);
            decls.push(VarDecl { name, init });
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }
        decls
    }

    /// The two `for` flavors: C-style three-part header, or `in` iteration
    /// with either a plain left-hand side or a fresh `var`.
    fn for_statement(&mut self) -> Stmt {
        use TokenKind::*;

        self.advance(); // 'for'
        if !self.expect(LParen) {
            return Stmt::Invalid;
        }

        // for (var id in e)
        if self.token.kind == Var && self.peek(1).kind == Ident && self.peek(2).kind == In {
            self.advance(); // 'var'
            let name = self.token.name;
            self.declare_variable(name);
            self.advance(); // ident
            self.advance(); // 'in'
            let object = self.expression();
            self.expect(RParen);
            let body = Box::new(self.statement());
            return Stmt::ForIn {
                target: ForInTarget::Var(name),
                object,
                body,
            };
        }

        // C-style init section, possibly empty, possibly a var list
        let init = if self.token.kind == Semi {
            None
        } else if self.token.kind == Var {
            Some(ForInit::Var(self.var_decl_list()))
        } else {
            // for (lhs in e) arrives parsed as a binary `in`
            match self.expression() {
                Expr::Binary(bin) if bin.op == crate::BinOp::In => {
                    let object = *bin.right;
                    self.expect(RParen);
                    let body = Box::new(self.statement());
                    return Stmt::ForIn {
                        target: ForInTarget::Expr(bin.left),
                        object,
                        body,
                    };
                }
                other => Some(ForInit::Expr(other)),
            }
        };

        if !self.expect(Semi) {
            return Stmt::Invalid;
        }
        let test = if self.token.kind != Semi {
            Some(self.expression())
        } else {
            None
        };
        if !self.expect(Semi) {
            return Stmt::Invalid;
        }
        let update = if self.token.kind != RParen {
            Some(self.expression())
        } else {
            None
        };
        self.expect(RParen);
        let body = Box::new(self.statement());
        Stmt::For {
            init,
            test,
            update,
            body,
        }
    }

    /// `try { } [catch (id) { }] [finally { }]`.
    fn try_statement(&mut self) -> Stmt {
        let coord = self.token.coord;
        self.advance(); // 'try'
        let body = self.block_stmts();

        let mut catch = None;
        if self.token.kind == TokenKind::Catch {
            self.advance();
            if !self.expect(TokenKind::LParen) {
                return Stmt::Invalid;
            }
            if self.token.kind != TokenKind::Ident {
                self.error_expected(TokenKind::Ident.text());
                return Stmt::Invalid;
            }
            let param = self.token.name;
            self.reference(param);
            self.advance();
            self.expect(TokenKind::RParen);
            let cbody = self.block_stmts();
            catch = Some(CatchClause { param, body: cbody });
        }

        let mut finally = None;
        if self.token.kind == TokenKind::Finally {
            self.advance();
            finally = Some(self.block_stmts());
        }

        Stmt::Try {
            body,
            catch,
            finally,
            coord,
        }
    }

    /// `extern var id, id, ... ;` - binds each identifier as an external
    /// declaration in the current scope and produces no code.
    fn extern_decl(&mut self) -> Stmt {
        self.advance(); // 'extern'
        self.advance(); // 'var'
        while self.token.kind == TokenKind::Ident {
            self.declare_external(self.token.name);
            self.advance();
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }
        if !self.soft_semicolon() {
            self.error_expected(";");
        }
        Stmt::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::parse_source;

    #[test]
    fn test_asi_newline_separates_statements() {
        // two identifier statements separated only by a newline parse
        let (program, handler) = parse_source("a\nb");
        assert!(!handler.has_errors());
        assert_eq!(program.body.len(), 2);
        assert!(matches!(program.body[0], Stmt::Expr(_)));
        assert!(matches!(program.body[1], Stmt::Expr(_)));
    }

    #[test]
    fn test_asi_space_is_an_error() {
        // replacing the newline with a space produces E_EXPECTED ";"
        let (_, handler) = parse_source("a b");
        assert!(handler.has_errors());
        let diag = &handler.diagnostics()[0];
        assert_eq!(diag.code.0, 2001);
        assert!(diag.message.contains("Expected ;"));
    }

    #[test]
    fn test_asi_before_rbrace_and_eof() {
        let (_, handler) = parse_source("function f() { return 1 }\nvar x = f()");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_failed_statement_becomes_invalid() {
        let (program, handler) = parse_source("a b\nc");
        assert!(handler.has_errors());
        assert!(matches!(program.body[0], Stmt::Invalid));
        // parsing resumed at the next line
        assert!(matches!(program.body[1], Stmt::Expr(_)));
    }

    #[test]
    fn test_if_else() {
        let (program, handler) = parse_source("if (a) b(); else c();");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::If { else_part, .. } => assert!(else_part.is_some()),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_and_do_while() {
        let (program, handler) = parse_source("while (a) b();\ndo b(); while (a)");
        assert!(!handler.has_errors());
        assert!(matches!(program.body[0], Stmt::While { .. }));
        assert!(matches!(program.body[1], Stmt::DoWhile { .. }));
    }

    #[test]
    fn test_c_style_for() {
        let (program, handler) = parse_source("for (i = 0; i < 10; i++) f(i);");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::For {
                init,
                test,
                update,
                ..
            } => {
                assert!(matches!(init, Some(ForInit::Expr(_))));
                assert!(test.is_some());
                assert!(update.is_some());
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_var_init() {
        let (program, handler) = parse_source("for (var i = 0, j = 1; i < j; i++) f();");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::For { init, .. } => match init {
                Some(ForInit::Var(decls)) => assert_eq!(decls.len(), 2),
                other => panic!("expected var init, got {:?}", other),
            },
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_for_header() {
        let (program, handler) = parse_source("for (;;) f();");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::For {
                init,
                test,
                update,
                ..
            } => {
                assert!(init.is_none());
                assert!(test.is_none());
                assert!(update.is_none());
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_for_in() {
        let (program, handler) = parse_source("for (k in obj) f(k);");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::ForIn { target, .. } => assert!(matches!(target, ForInTarget::Expr(_))),
            other => panic!("expected for-in, got {:?}", other),
        }
    }

    #[test]
    fn test_for_var_in() {
        let (program, handler) = parse_source("for (var k in obj) f(k);");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::ForIn { target, .. } => match target {
                ForInTarget::Var(name) => assert_eq!(name.as_str(), "k"),
                other => panic!("expected var target, got {:?}", other),
            },
            other => panic!("expected for-in, got {:?}", other),
        }
        // the loop variable is declared in the enclosing scope
        let globals = &program.scopes[program.global_scope];
        assert!(globals.bindings[&Symbol::intern("k")].is_variable());
    }

    #[test]
    fn test_labeled_statement_and_jumps() {
        let source = "outer: while (a) { if (b) break outer; continue outer; }";
        let (program, handler) = parse_source(source);
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::Labeled { label, body } => {
                assert_eq!(label.as_str(), "outer");
                assert!(matches!(**body, Stmt::While { .. }));
            }
            other => panic!("expected labeled, got {:?}", other),
        }
    }

    #[test]
    fn test_switch_with_cases() {
        let source = "switch (x) { case 1: f(); break; default: g(); }";
        let (program, handler) = parse_source(source);
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::Switch { body, .. } => {
                assert!(matches!(body[0], Stmt::Case(_)));
                assert!(matches!(body[3], Stmt::Default));
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_try_catch_finally() {
        let source = "try { f(); } catch (e) { g(e); } finally { h(); }";
        let (program, handler) = parse_source(source);
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::Try {
                catch, finally, ..
            } => {
                assert_eq!(catch.as_ref().unwrap().param.as_str(), "e");
                assert!(finally.is_some());
            }
            other => panic!("expected try, got {:?}", other),
        }
    }

    #[test]
    fn test_throw() {
        let (program, handler) = parse_source("throw failure;");
        assert!(!handler.has_errors());
        assert!(matches!(program.body[0], Stmt::Throw(_)));
    }

    #[test]
    fn test_with_statement() {
        let (program, handler) = parse_source("with (o) { f(); }");
        assert!(!handler.has_errors());
        assert!(matches!(program.body[0], Stmt::With { .. }));
    }

    #[test]
    fn test_named_function_binds_in_enclosing_scope() {
        let (program, handler) = parse_source("function f(n) { return n; }");
        assert!(!handler.has_errors());

        let globals = &program.scopes[program.global_scope];
        assert!(globals.bindings[&Symbol::intern("f")].is_function());

        let func = &program.funcs[js2cpp_par_func_id(&program, "f")];
        assert_eq!(func.params.len(), 1);
        assert_eq!(program.scopes[func.scope].depth, 1);
        // the formal is a variable of the function's own scope
        assert!(program.scopes[func.scope].bindings[&Symbol::intern("n")].is_variable());
    }

    #[test]
    fn test_nested_function_scope_depths() {
        let (program, handler) =
            parse_source("function outer() { function inner() { return 1; } }");
        assert!(!handler.has_errors());

        let outer = &program.funcs[js2cpp_par_func_id(&program, "outer")];
        let inner = &program.funcs[js2cpp_par_func_id(&program, "inner")];
        assert_eq!(program.scopes[outer.scope].depth, 1);
        assert_eq!(program.scopes[inner.scope].depth, 2);
        // inner is bound inside outer's scope
        assert!(program.scopes[outer.scope].bindings[&Symbol::intern("inner")].is_function());
    }

    #[test]
    fn test_extern_var() {
        let (program, handler) = parse_source("extern var qqq, rrr;");
        assert!(!handler.has_errors());
        let globals = &program.scopes[program.global_scope];
        assert!(globals.bindings[&Symbol::intern("qqq")].is_extern());
        assert!(globals.bindings[&Symbol::intern("rrr")].is_extern());
        // extern is not a reserved word
        assert!(matches!(program.body[0], Stmt::Empty));
    }

    #[test]
    fn test_extern_as_plain_identifier() {
        let (program, handler) = parse_source("extern = 5;");
        assert!(!handler.has_errors());
        assert!(matches!(program.body[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_break_continue_with_and_without_labels() {
        let source = "while (a) { break; }\nwhile (a) { continue top; }";
        let (program, handler) = parse_source(source);
        assert!(!handler.has_errors());

        fn first_inner(stmt: &Stmt) -> &Stmt {
            match stmt {
                Stmt::While { body, .. } => match &**body {
                    Stmt::Block(stmts) => &stmts[0],
                    other => other,
                },
                other => panic!("expected while, got {:?}", other),
            }
        }
        assert!(matches!(first_inner(&program.body[0]), Stmt::Break(None)));
        assert!(matches!(
            first_inner(&program.body[1]),
            Stmt::Continue(Some(_))
        ));
    }

    #[test]
    fn test_var_without_initializer() {
        let (program, handler) = parse_source("var a, b = 2;");
        assert!(!handler.has_errors());
        match &program.body[0] {
            Stmt::Var(decls) => {
                assert_eq!(decls.len(), 2);
                assert!(decls[0].init.is_none());
                assert!(decls[1].init.is_some());
            }
            other => panic!("expected var, got {:?}", other),
        }
    }

    /// Find a function id by name.
    fn js2cpp_par_func_id(program: &crate::Program, name: &str) -> crate::FuncId {
        let want = Symbol::intern(name);
        program
            .funcs
            .iter_enumerated()
            .find(|(_, f)| f.name == Some(want))
            .map(|(id, _)| id)
            .unwrap()
    }
}
