//! Expression parsing.
//!
//! The operator-precedence climb: a term is parsed, then operators of
//! sufficient binding power fold the growing left-hand side with the next
//! right-hand side. Left-associative operators use `(bp, bp + 1)`,
//! right-associative ones (assignments, ternary) use `(bp, bp - 1)`.
//!
//! Comma is only a binary operator in expression-list positions:
//! [`Parser::expression`] parses comma chains, [`Parser::conditional_expr`]
//! stops short of them, and contexts like `var` initializers, object
//! property values, and call arguments use the latter.
//!
//! # Precedence (high to low)
//!
//! | Operators | Associativity |
//! |-----------|---------------|
//! | `*` `/` `%` | Left |
//! | `+` `-` | Left |
//! | `<<` `>>` `>>>` | Left |
//! | `<` `<=` `>` `>=` `instanceof` `in` | Left |
//! | `==` `!=` `===` `!==` | Left |
//! | `&` | Left |
//! | `^` | Left |
//! | `|` | Left |
//! | `&&` | Left |
//! | `||` | Left |
//! | `? :` | Right |
//! | assignments | Right |
//! | `,` | Left (list positions only) |

use js2cpp_lex::TokenKind;

use crate::ast::{
    AssignExpr, AssignOp, BinOp, BinaryExpr, CallExpr, CondExpr, Expr, IndexExpr, MemberExpr,
    NewExpr, PostfixExpr, PostfixOp, UnOp, UnaryExpr,
};
use crate::Parser;

/// Binding power levels. Higher numbers bind tighter.
mod bp {
    /// Minimum binding power (start of expression)
    pub const MIN: u8 = 0;

    /// Assignments (right-associative)
    pub const ASSIGN: u8 = 2;

    /// Ternary `? :` (right-associative)
    pub const TERNARY: u8 = 4;

    /// Logical OR: `||`
    pub const LOGICAL_OR: u8 = 6;

    /// Logical AND: `&&`
    pub const LOGICAL_AND: u8 = 8;

    /// Bitwise OR: `|`
    pub const BITWISE_OR: u8 = 10;

    /// Bitwise XOR: `^`
    pub const BITWISE_XOR: u8 = 12;

    /// Bitwise AND: `&`
    pub const BITWISE_AND: u8 = 14;

    /// Equality: `==`, `!=`, `===`, `!==`
    pub const EQUALITY: u8 = 16;

    /// Relational: `<`, `<=`, `>`, `>=`, `instanceof`, `in`
    pub const RELATIONAL: u8 = 18;

    /// Shift: `<<`, `>>`, `>>>`
    pub const SHIFT: u8 = 20;

    /// Additive: `+`, `-`
    pub const ADDITIVE: u8 = 22;

    /// Multiplicative: `*`, `/`, `%`
    pub const MULTIPLICATIVE: u8 = 24;
}

/// Binding powers of the current token as an infix operator.
///
/// `(left_bp, right_bp)`; left-associative operators return
/// `(bp, bp + 1)`, right-associative ones `(bp, bp - 1)`.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    use TokenKind::*;
    let bp = match kind {
        Star | Slash | Percent => (bp::MULTIPLICATIVE, bp::MULTIPLICATIVE + 1),
        Plus | Minus => (bp::ADDITIVE, bp::ADDITIVE + 1),
        Shl | Shr | UShr => (bp::SHIFT, bp::SHIFT + 1),
        Lt | Le | Gt | Ge | Instanceof | In => (bp::RELATIONAL, bp::RELATIONAL + 1),
        EqEq | NotEq | EqEqEq | NotEqEq => (bp::EQUALITY, bp::EQUALITY + 1),
        Amp => (bp::BITWISE_AND, bp::BITWISE_AND + 1),
        Caret => (bp::BITWISE_XOR, bp::BITWISE_XOR + 1),
        Pipe => (bp::BITWISE_OR, bp::BITWISE_OR + 1),
        AmpAmp => (bp::LOGICAL_AND, bp::LOGICAL_AND + 1),
        PipePipe => (bp::LOGICAL_OR, bp::LOGICAL_OR + 1),
        Question => (bp::TERNARY, bp::TERNARY - 1),
        k if k.is_assign_op() => (bp::ASSIGN, bp::ASSIGN - 1),
        _ => return None,
    };
    Some(bp)
}

fn bin_op_of(kind: TokenKind) -> BinOp {
    use TokenKind::*;
    match kind {
        Star => BinOp::Mul,
        Slash => BinOp::Div,
        Percent => BinOp::Rem,
        Plus => BinOp::Add,
        Minus => BinOp::Sub,
        Shl => BinOp::Shl,
        Shr => BinOp::Shr,
        UShr => BinOp::UShr,
        Lt => BinOp::Lt,
        Le => BinOp::Le,
        Gt => BinOp::Gt,
        Ge => BinOp::Ge,
        Instanceof => BinOp::Instanceof,
        In => BinOp::In,
        EqEq => BinOp::EqEq,
        NotEq => BinOp::NotEq,
        EqEqEq => BinOp::Identical,
        NotEqEq => BinOp::NotIdentical,
        Amp => BinOp::BitAnd,
        Caret => BinOp::BitXor,
        Pipe => BinOp::BitOr,
        AmpAmp => BinOp::LogAnd,
        PipePipe => BinOp::LogOr,
        _ => unreachable!("not a binary operator: {:?}", kind),
    }
}

fn assign_op_of(kind: TokenKind) -> Option<AssignOp> {
    use TokenKind::*;
    Some(match kind {
        Eq => AssignOp::Assign,
        PlusEq => AssignOp::Add,
        MinusEq => AssignOp::Sub,
        SlashEq => AssignOp::Div,
        StarEq => AssignOp::Mul,
        PercentEq => AssignOp::Rem,
        ShlEq => AssignOp::Shl,
        ShrEq => AssignOp::Shr,
        UShrEq => AssignOp::UShr,
        AmpEq => AssignOp::BitAnd,
        CaretEq => AssignOp::BitXor,
        PipeEq => AssignOp::BitOr,
        AmpAmpEq => AssignOp::LogAnd,
        PipePipeEq => AssignOp::LogOr,
        _ => return None,
    })
}

fn prefix_op_of(kind: TokenKind) -> UnOp {
    use TokenKind::*;
    match kind {
        Delete => UnOp::Delete,
        Typeof => UnOp::Typeof,
        Void => UnOp::Void,
        PlusPlus => UnOp::PreInc,
        MinusMinus => UnOp::PreDec,
        Minus => UnOp::Neg,
        Plus => UnOp::Pos,
        Tilde => UnOp::BitNot,
        Bang => UnOp::Not,
        _ => unreachable!("not a prefix operator: {:?}", kind),
    }
}

impl<'a> Parser<'a> {
    /// A full expression, comma chains included.
    pub(crate) fn expression(&mut self) -> Expr {
        let first = self.conditional_expr();
        if self.token.kind == TokenKind::Comma {
            self.advance();
            let rest = self.expression();
            return Expr::Comma(Box::new(first), Box::new(rest));
        }
        first
    }

    /// An expression without top-level comma: assignments and ternary
    /// included. Used for `var` initializers, object property values,
    /// array elements, and call arguments.
    pub(crate) fn conditional_expr(&mut self) -> Expr {
        self.binary_expr(bp::MIN)
    }

    /// The precedence climb.
    ///
    /// Parses a term, then folds while the incoming operator's left
    /// binding power is at least `min_bp`.
    fn binary_expr(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.term();

        loop {
            let kind = self.token.kind;
            let (l_bp, r_bp) = match infix_binding_power(kind) {
                Some(bp) => bp,
                None => break,
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();

            if kind == TokenKind::Question {
                let then_part = self.conditional_expr();
                let else_part = if self.expect(TokenKind::Colon) {
                    self.binary_expr(r_bp)
                } else {
                    Expr::Invalid
                };
                lhs = Expr::Cond(CondExpr {
                    cond: Box::new(lhs),
                    then_part: Box::new(then_part),
                    else_part: Box::new(else_part),
                });
                continue;
            }

            let rhs = self.binary_expr(r_bp);
            lhs = match assign_op_of(kind) {
                Some(op) => Expr::Assign(AssignExpr {
                    op,
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                }),
                None => Expr::Binary(BinaryExpr {
                    op: bin_op_of(kind),
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                }),
            };
        }

        lhs
    }

    /// One operand of a binary expression: prefix operators, a primary,
    /// then the postfix positions (`++` `--` `[ ]` `.` call).
    pub(crate) fn term(&mut self) -> Expr {
        use TokenKind::*;

        let mut r = match self.token.kind {
            PlusPlus | MinusMinus | Minus | Plus | Tilde | Bang | Delete | Typeof | Void => {
                let op = prefix_op_of(self.token.kind);
                self.advance();
                let operand = self.term();
                Expr::Unary(UnaryExpr {
                    op,
                    operand: Box::new(operand),
                })
            }

            New => {
                self.advance();
                let operand = self.term();
                // `new cons(args)` and bare `new cons` normalize to the
                // same construction node
                match operand {
                    Expr::Call(call) => Expr::New(NewExpr {
                        callee: call.callee,
                        args: call.args,
                    }),
                    other => Expr::New(NewExpr {
                        callee: Box::new(other),
                        args: Vec::new(),
                    }),
                }
            }

            LParen => {
                self.advance();
                let e = self.expression();
                self.expect(RParen);
                e
            }

            LBrace => self.object_literal(),
            LBracket => self.array_literal(),

            Ident => {
                let name = self.token.name;
                self.reference(name);
                self.advance();
                Expr::Ident(name)
            }

            Number => {
                let name = self.token.name;
                self.advance();
                Expr::Number(name)
            }
            Str => {
                let name = self.token.name;
                self.advance();
                Expr::Str(name)
            }
            Regex => {
                let name = self.token.name;
                self.advance();
                Expr::Regex(name)
            }
            This => {
                self.advance();
                Expr::This
            }
            True => {
                self.advance();
                Expr::True
            }
            False => {
                self.advance();
                Expr::False
            }
            Null => {
                self.advance();
                Expr::Null
            }

            Function => {
                // function literal
                self.function_literal()
            }

            _ => {
                self.error_expected("<expression>");
                self.advance();
                return Expr::Invalid;
            }
        };

        loop {
            match self.token.kind {
                PlusPlus => {
                    self.advance();
                    r = Expr::Postfix(PostfixExpr {
                        op: PostfixOp::Inc,
                        operand: Box::new(r),
                    });
                }
                MinusMinus => {
                    self.advance();
                    r = Expr::Postfix(PostfixExpr {
                        op: PostfixOp::Dec,
                        operand: Box::new(r),
                    });
                }

                LBracket => {
                    // array index
                    self.advance();
                    let index = self.expression();
                    self.expect(RBracket);
                    r = Expr::Index(IndexExpr {
                        object: Box::new(r),
                        index: Box::new(index),
                    });
                }

                Dot => {
                    self.advance();
                    if self.token.kind != Ident {
                        self.error_expected("<identifier>");
                    } else {
                        // property names are not scope references
                        let property = self.token.name;
                        self.advance();
                        r = Expr::Member(MemberExpr {
                            object: Box::new(r),
                            property,
                        });
                    }
                }

                LParen => {
                    // function call, arguments follow
                    self.advance();
                    let args = if self.token.kind != RParen {
                        self.arguments()
                    } else {
                        Vec::new()
                    };
                    self.expect(RParen);
                    r = Expr::Call(CallExpr {
                        callee: Box::new(r),
                        args,
                    });
                }

                _ => break,
            }
        }

        r
    }

    /// Comma-separated argument expressions (at least one).
    fn arguments(&mut self) -> Vec<Expr> {
        let mut args = vec![self.conditional_expr()];
        while self.token.kind == TokenKind::Comma {
            self.advance();
            args.push(self.conditional_expr());
        }
        args
    }

    /// Object literal `{ name: expr, ... }`. The `{` is current.
    fn object_literal(&mut self) -> Expr {
        self.advance();
        let mut props = Vec::new();
        while self.token.kind == TokenKind::Ident {
            let key = self.token.name;
            self.advance();
            if !self.expect(TokenKind::Colon) {
                break;
            }
            props.push((key, self.conditional_expr()));
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::RBrace);
        Expr::Object(props)
    }

    /// Array literal, elisions included. The `[` is current.
    fn array_literal(&mut self) -> Expr {
        self.advance();
        let mut elems = Vec::new();
        while self.token.kind != TokenKind::RBracket && self.token.kind != TokenKind::Eof {
            if self.token.kind == TokenKind::Comma {
                // elision
                elems.push(None);
                self.advance();
                continue;
            }
            elems.push(Some(self.conditional_expr()));
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.advance();
            if self.token.kind == TokenKind::RBracket {
                // trailing comma adds no element
                break;
            }
        }
        self.expect(TokenKind::RBracket);
        Expr::Array(elems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::parse_source;
    use crate::Stmt;

    fn parse_expr(source: &str) -> Expr {
        let (program, handler) = parse_source(source);
        assert!(
            !handler.has_errors(),
            "errors in {:?}: {:?}",
            source,
            handler.diagnostics()
        );
        match program.body.into_iter().next() {
            Some(Stmt::Expr(e)) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn assert_binary(expr: &Expr, op: BinOp) -> (&Expr, &Expr) {
        match expr {
            Expr::Binary(b) => {
                assert_eq!(b.op, op, "expected operator {:?}", op);
                (&b.left, &b.right)
            }
            _ => panic!("expected Binary expression, got {:?}", expr),
        }
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // a + b * c parses as a + (b * c)
        let e = parse_expr("a + b * c");
        let (_, right) = assert_binary(&e, BinOp::Add);
        assert_binary(right, BinOp::Mul);
    }

    #[test]
    fn test_left_associativity() {
        // a - b - c parses as (a - b) - c
        let e = parse_expr("a - b - c");
        let (left, _) = assert_binary(&e, BinOp::Sub);
        assert_binary(left, BinOp::Sub);
    }

    #[test]
    fn test_shift_vs_additive() {
        // a + b << c parses as (a + b) << c
        let e = parse_expr("a + b << c");
        let (left, _) = assert_binary(&e, BinOp::Shl);
        assert_binary(left, BinOp::Add);
    }

    #[test]
    fn test_relational_keywords() {
        let e = parse_expr("a instanceof b");
        assert_binary(&e, BinOp::Instanceof);

        let e = parse_expr("k in o == true");
        // in binds tighter than ==
        let (left, _) = assert_binary(&e, BinOp::EqEq);
        assert_binary(left, BinOp::In);
    }

    #[test]
    fn test_logical_hierarchy() {
        // a && b == c || d parses as (a && (b == c)) || d
        let e = parse_expr("a && b == c || d");
        let (left, _) = assert_binary(&e, BinOp::LogOr);
        let (_, and_right) = assert_binary(left, BinOp::LogAnd);
        assert_binary(and_right, BinOp::EqEq);
    }

    #[test]
    fn test_bitwise_hierarchy() {
        // a | b ^ c & d parses as a | (b ^ (c & d))
        let e = parse_expr("a | b ^ c & d");
        let (_, right) = assert_binary(&e, BinOp::BitOr);
        let (_, xor_right) = assert_binary(right, BinOp::BitXor);
        assert_binary(xor_right, BinOp::BitAnd);
    }

    #[test]
    fn test_assignment_right_associative() {
        // a = b = c parses as a = (b = c)
        let e = parse_expr("a = b = c");
        match e {
            Expr::Assign(outer) => {
                assert_eq!(outer.op, AssignOp::Assign);
                assert!(matches!(*outer.value, Expr::Assign(_)));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_ternary_binds_tighter_than_assignment() {
        // x = c ? a : b parses as x = (c ? a : b)
        let e = parse_expr("x = c ? a : b");
        match e {
            Expr::Assign(a) => assert!(matches!(*a.value, Expr::Cond(_))),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_ternary_right_associative() {
        // a ? b : c ? d : e parses as a ? b : (c ? d : e)
        let e = parse_expr("a ? b : c ? d : e");
        match e {
            Expr::Cond(c) => assert!(matches!(*c.else_part, Expr::Cond(_))),
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment_ops() {
        for (src, op) in [
            ("a += b", AssignOp::Add),
            ("a >>>= b", AssignOp::UShr),
            ("a &&= b", AssignOp::LogAnd),
            ("a ||= b", AssignOp::LogOr),
        ] {
            match parse_expr(src) {
                Expr::Assign(a) => assert_eq!(a.op, op, "{:?}", src),
                other => panic!("expected assignment for {:?}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn test_comma_expression() {
        let e = parse_expr("a, b, c");
        match e {
            Expr::Comma(_, rest) => assert!(matches!(*rest, Expr::Comma(_, _))),
            other => panic!("expected comma chain, got {:?}", other),
        }
    }

    #[test]
    fn test_prefix_unary_chain() {
        // -!~x parses as -(!(~x))
        let e = parse_expr("-!~x");
        match e {
            Expr::Unary(u) => {
                assert_eq!(u.op, UnOp::Neg);
                match *u.operand {
                    Expr::Unary(ref inner) => assert_eq!(inner.op, UnOp::Not),
                    ref other => panic!("expected unary, got {:?}", other),
                }
            }
            other => panic!("expected unary, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_operand_position() {
        let e = parse_expr("x++");
        match e {
            Expr::Postfix(p) => {
                assert_eq!(p.op, PostfixOp::Inc);
                assert!(matches!(*p.operand, Expr::Ident(_)));
            }
            other => panic!("expected postfix, got {:?}", other),
        }

        let e = parse_expr("--x");
        match e {
            Expr::Unary(u) => assert_eq!(u.op, UnOp::PreDec),
            other => panic!("expected prefix, got {:?}", other),
        }
    }

    #[test]
    fn test_member_chain_and_call() {
        let e = parse_expr("a.b.c(1, 2)");
        match e {
            Expr::Call(call) => {
                assert_eq!(call.args.len(), 2);
                match *call.callee {
                    Expr::Member(ref m) => {
                        assert_eq!(m.property.as_str(), "c");
                        assert!(matches!(*m.object, Expr::Member(_)));
                    }
                    ref other => panic!("expected member, got {:?}", other),
                }
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_index_expression() {
        let e = parse_expr("a[i + 1]");
        match e {
            Expr::Index(idx) => assert!(matches!(*idx.index, Expr::Binary(_))),
            other => panic!("expected index, got {:?}", other),
        }
    }

    #[test]
    fn test_new_with_arguments() {
        let e = parse_expr("new Date(1, 2)");
        match e {
            Expr::New(n) => {
                assert_eq!(n.args.len(), 2);
                assert!(matches!(*n.callee, Expr::Ident(_)));
            }
            other => panic!("expected new, got {:?}", other),
        }
    }

    #[test]
    fn test_new_without_arguments() {
        let e = parse_expr("new Thing");
        match e {
            Expr::New(n) => assert!(n.args.is_empty()),
            other => panic!("expected new, got {:?}", other),
        }
    }

    #[test]
    fn test_array_literal_with_elision() {
        // [10, , 30] has length 3 with a hole in the middle
        let e = parse_expr("[10, , 30]");
        match e {
            Expr::Array(elems) => {
                assert_eq!(elems.len(), 3);
                assert!(elems[0].is_some());
                assert!(elems[1].is_none());
                assert!(elems[2].is_some());
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_array_literal_trailing_comma() {
        match parse_expr("[1,]") {
            Expr::Array(elems) => assert_eq!(elems.len(), 1),
            other => panic!("expected array, got {:?}", other),
        }
        match parse_expr("[,1]") {
            Expr::Array(elems) => assert_eq!(elems.len(), 2),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_object_literal() {
        let e = parse_expr("x = {a: 1, b: 2}");
        match e {
            Expr::Assign(a) => match *a.value {
                Expr::Object(ref props) => {
                    assert_eq!(props.len(), 2);
                    assert_eq!(props[0].0.as_str(), "a");
                }
                ref other => panic!("expected object, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_regex_literal_after_assign() {
        // a slash after '=' begins a regex, not division
        let e = parse_expr("x = /abc/i + 1");
        match e {
            Expr::Assign(a) => {
                let (left, _) = match *a.value {
                    Expr::Binary(ref b) => (&b.left, &b.right),
                    ref other => panic!("expected binary, got {:?}", other),
                };
                match **left {
                    Expr::Regex(r) => assert_eq!(r.as_str(), "/abc/i"),
                    ref other => panic!("expected regex, got {:?}", other),
                }
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_function_expression_registers_literal() {
        let (program, handler) = parse_source("var f = function (a) { return a; };");
        assert!(!handler.has_errors());
        assert_eq!(program.funcs.len(), 1);

        let globals = &program.scopes[program.global_scope];
        assert_eq!(globals.lit_funcs.len(), 1);

        let func = &program.funcs[globals.lit_funcs[0]];
        assert!(func.name.is_none());
        assert_eq!(func.params.len(), 1);
    }

    #[test]
    fn test_named_function_expression_name_ignored() {
        let (program, handler) = parse_source("var f = function helper(a) { return a; };");
        assert!(!handler.has_errors());
        let globals = &program.scopes[program.global_scope];
        assert_eq!(globals.lit_funcs.len(), 1);
        assert!(!globals
            .bindings
            .contains_key(&js2cpp_util::Symbol::intern("helper")));
    }
}
