//! The C++ emitter.

use js2cpp_par::{
    AssignOp, BinOp, CallExpr, Expr, ForInTarget, ForInit, FuncId, PostfixOp, Program, ScopeId,
    Stmt, UnOp, VarDecl,
};
use js2cpp_par::Binding;
use js2cpp_util::diagnostic::codes::E_SEMANTIC;
use js2cpp_util::{Coord, Handler, Symbol};

/// Emits a parsed program as one C++ translation unit.
///
/// The generator buffers the emitted text internally; [`CodeGenerator::generate`]
/// returns the finished unit and the driver owns writing it out.
pub struct CodeGenerator<'a> {
    program: &'a Program,
    handler: &'a Handler,
    out: String,
    /// Current indentation level.
    depth: usize,
    /// Scope of the function being compiled, `None` at top level.
    local_scope: Option<ScopeId>,
    /// Counter for synthesized labels and temporaries.
    next_tmp: u32,
}

impl<'a> CodeGenerator<'a> {
    /// Create a generator for `program`, reporting semantic rejections to
    /// `handler`.
    pub fn new(program: &'a Program, handler: &'a Handler) -> Self {
        Self {
            program,
            handler,
            out: String::new(),
            depth: 0,
            local_scope: None,
            next_tmp: 0,
        }
    }

    /// Translate the whole program and return the emitted unit.
    pub fn generate(mut self) -> String {
        self.emit_program();
        self.out
    }

    fn emit_program(&mut self) {
        let program = self.program;
        self.emit("// js2cpp code generator\n");
        self.emit("#include \"jscpprt.h\"\n");
        self.emit("#include <cstdarg>\n");
        self.emit("\n");
        self.emit("// definitions\n\n");

        self.local_scope = None;
        self.top_level_defs();

        self.emit("\n");
        self.emit("int jsmain_(...)\n");
        self.emit("{\n");
        self.depth += 1;
        self.pad();
        self.emit("// dynamic global initialization\n");
        self.emit("\n");
        self.top_level_statements(&program.body);
        self.pad();
        self.emit("return 0;\n");
        self.depth -= 1;
        self.emit("} // jsmain_\n\n");
        self.emit("//------- end of module\n");
    }

    /// The globals region: one declaration per global binding, then the
    /// literal functions of the global scope, then the named function
    /// bodies.
    fn top_level_defs(&mut self) {
        let program = self.program;
        let globals = &program.scopes[program.global_scope];

        for (&name, &binding) in globals.bindings.iter() {
            match binding {
                Binding::Reference => {
                    // referenced but never defined: an implicitly declared
                    // global
                    self.emit(&format!("value_ {};\n", name));
                }
                Binding::Extern => {
                    self.emit(&format!("extern value_ {};\n", name));
                }
                Binding::Variable => {
                    self.emit(&format!("value_ {};\n", name));
                }
                Binding::Function(fid) => {
                    // forward the closure class, then a static closure
                    // instance, then the variable holding the function value
                    self.declare_function_class(fid);
                    let fname = self.func_name(fid);
                    self.emit(&format!("{}_foc_ {}_func_;\n", fname, fname));
                    self.emit(&format!("value_ {}(&{}_func_);\n", name, fname));
                }
            }
        }

        self.emit("\n// literal functions\n");
        for &fid in &globals.lit_funcs {
            self.declare_function_class(fid);
            let fname = self.func_name(fid);
            self.emit(&format!("{}_foc_ {}_func_;\n\n", fname, fname));
            self.emit_function_body(fid);
            self.emit("\n");
        }

        self.emit("// named functions\n\n");
        for (_, &binding) in globals.bindings.iter() {
            if let Binding::Function(fid) = binding {
                self.emit("\n");
                self.emit_function_body(fid);
                self.emit("\n");
            }
        }
    }

    /// The closure class of a function: one `nlngK_` link per strict
    /// ancestor activation, a constructor wiring them, and the virtual
    /// `call`.
    fn declare_function_class(&mut self, fid: FuncId) {
        let program = self.program;
        let fname = self.func_name(fid);
        let scope = program.funcs[fid].scope;
        let depth = program.scopes[scope].depth;

        self.emit("\n");
        self.emit(&format!("class {}_foc_ : public func_ {{\n", fname));
        self.emit("public:\n");
        for d in 1..depth {
            let outer = program.scopes.at_depth(scope, d);
            let outer_name = self.locals_name(outer);
            self.emit(&format!("  {}_locals_& nlng{}_;\n", outer_name, d));
        }
        self.emit(&format!("  {}_foc_(", fname));
        for d in 1..depth {
            if d > 1 {
                self.emit(",");
            }
            let outer = program.scopes.at_depth(scope, d);
            let outer_name = self.locals_name(outer);
            self.emit(&format!("{}_locals_* pl{}_", outer_name, d));
        }
        self.emit(")");
        for d in 1..depth {
            self.emit(if d == 1 { " : " } else { "," });
            self.emit(&format!("nlng{}_(*pl{}_)", d, d));
        }
        self.emit(&format!(" {{ length={}; }}\n", program.funcs[fid].params.len()));
        self.emit("  virtual value_ call(value_,int,...);\n");
        self.emit("};\n\n");
    }

    /// The activation record type: one `value_` field per variable or
    /// nested function declared in the scope.
    fn declare_local_struct(&mut self, fid: FuncId) {
        let program = self.program;
        let fname = self.func_name(fid);
        let scope = &program.scopes[program.funcs[fid].scope];

        self.pad();
        self.emit(&format!("class {}_locals_ {{\n", fname));
        self.pad();
        self.emit("public:\n");
        for (&name, &binding) in scope.bindings.iter() {
            if binding.is_variable() || binding.is_function() {
                self.pad();
                self.emit(&format!("  value_ {};\n", name));
            }
        }
        self.pad();
        self.emit("};\n\n");
    }

    /// Emit a function: its locals record, its nested functions, then the
    /// body of its `call` method.
    fn emit_function_body(&mut self, fid: FuncId) {
        let program = self.program;
        let func = &program.funcs[fid];

        self.declare_local_struct(fid);

        // nested functions come first so their classes and bodies are
        // defined before this body constructs them
        let scope = &program.scopes[func.scope];
        let mut has_nested = false;
        for (_, &binding) in scope.bindings.iter() {
            if let Binding::Function(nested) = binding {
                has_nested = true;
                self.declare_function_class(nested);
                self.emit_function_body(nested);
            }
        }
        for &nested in &scope.lit_funcs {
            has_nested = true;
            self.declare_function_class(nested);
            self.emit_function_body(nested);
        }

        // any nested callable may outlive this activation
        let heap_locals = has_nested;

        let fname = self.func_name(fid);
        self.pad();
        self.emit(&format!(
            "value_ {}_foc_::call(value_ this_,int nargs_,...) {{\n",
            fname
        ));
        self.depth += 1;
        let old_local = self.local_scope;
        self.local_scope = Some(func.scope);

        self.emit_locals(fid, heap_locals);
        self.bind_formals(&func.params);
        self.emit("\n");
        self.statements(&func.body);
        // safety return in case the body falls thru without a value
        self.pad();
        self.emit("return undefined;\n");
        self.depth -= 1;
        self.pad();
        self.emit("} // call\n\n");

        self.local_scope = old_local;
    }

    /// Construct the activation record and initialize nested function
    /// slots.
    fn emit_locals(&mut self, fid: FuncId, heap: bool) {
        let program = self.program;
        let fname = self.func_name(fid);

        self.pad();
        if heap {
            self.emit(&format!(
                "{}_locals_& locals_ = *(new {}_locals_);\n",
                fname, fname
            ));
        } else {
            self.emit(&format!("{}_locals_ locals_;\n", fname));
        }

        let scope = &program.scopes[program.funcs[fid].scope];
        for (_, &binding) in scope.bindings.iter() {
            if let Binding::Function(nested) = binding {
                self.pad();
                let nested_name = self.func_name(nested);
                self.emit(&format!("locals_.{} = ", nested_name));
                self.emit_func_val(nested);
                self.emit(";\n");
            }
        }
    }

    /// Bind formal parameters out of the variadic argument area.
    fn bind_formals(&mut self, params: &[Symbol]) {
        if params.is_empty() {
            return;
        }
        self.pad();
        self.emit("va_list args_;\n");
        self.pad();
        self.emit("va_start(args_, nargs_);\n");
        for (i, name) in params.iter().enumerate() {
            self.pad();
            self.emit(&format!(
                "locals_.{} = ({} < nargs_) ? va_arg(args_, value_) : undefined;\n",
                name, i
            ));
        }
        self.pad();
        self.emit("va_end(args_);\n");
    }

    /// The value of a function: top-level closures are static instances,
    /// nested ones are constructed with links to every enclosing
    /// activation.
    fn emit_func_val(&mut self, fid: FuncId) {
        let program = self.program;
        let fname = self.func_name(fid);
        let nesting = program.scopes[program.funcs[fid].scope].depth - 1;

        if nesting == 0 {
            self.emit(&format!("value_((func_*)&{}_func_)", fname));
        } else {
            self.emit(&format!("value_(new {}_foc_(", fname));
            for d in 1..nesting {
                self.emit(&format!("&nlng{}_,", d));
            }
            self.emit("&locals_))");
        }
    }

    // Statements

    fn top_level_statements(&mut self, body: &[Stmt]) {
        for stmt in body {
            match stmt {
                // function definitions already live in the globals region
                Stmt::Function(_) => {}
                other => self.statement(other),
            }
        }
    }

    fn statements(&mut self, list: &[Stmt]) {
        for stmt in list {
            self.statement(stmt);
        }
    }

    /// A loop body in braces, with the continuation label of a labeled
    /// loop placed at its end.
    fn loop_body(&mut self, body: &Stmt, continue_label: Option<Symbol>) {
        self.pad();
        self.emit("{\n");
        self.depth += 1;
        match body {
            Stmt::Block(stmts) => self.statements(stmts),
            other => self.statement(other),
        }
        if let Some(label) = continue_label {
            self.pad();
            self.emit(&format!("{}_continue: ;\n", label));
        }
        self.depth -= 1;
        self.pad();
        self.emit("}\n");
    }

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Invalid | Stmt::Empty => {}
            Stmt::Case(_) | Stmt::Default => {
                // only meaningful inside a switch body; not checked here
            }

            Stmt::Block(stmts) => {
                self.pad();
                self.emit("{\n");
                self.depth += 1;
                self.statements(stmts);
                self.depth -= 1;
                self.pad();
                self.emit("}\n");
            }

            Stmt::Expr(e) => {
                self.pad();
                self.expr_value(e);
                self.emit(";\n");
            }

            Stmt::Var(decls) => self.var_assignments(decls),

            Stmt::Function(fid) => {
                // the definition was emitted at function entry
                let fname = self.func_name(*fid);
                self.pad();
                self.emit(&format!("//nested function {}()...\n", fname));
            }

            Stmt::If {
                cond,
                then_part,
                else_part,
            } => {
                self.pad();
                self.emit("if (");
                self.expr_value(cond);
                self.emit(") {\n");
                self.depth += 1;
                self.statement(then_part);
                self.depth -= 1;
                if let Some(else_part) = else_part {
                    self.pad();
                    self.emit("} else {\n");
                    self.depth += 1;
                    self.statement(else_part);
                    self.depth -= 1;
                }
                self.pad();
                self.emit("}\n");
            }

            Stmt::While { cond, body } => self.emit_while(cond, body, None),
            Stmt::DoWhile { body, cond } => self.emit_do_while(body, cond, None),
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.emit_for(init.as_ref(), test.as_ref(), update.as_ref(), body, None),
            Stmt::ForIn {
                target,
                object,
                body,
            } => self.emit_for_in(target, object, body, None),

            Stmt::Break(None) => {
                self.pad();
                self.emit("break;\n");
            }
            Stmt::Break(Some(label)) => {
                self.pad();
                self.emit(&format!("goto break_{};\n", label));
            }
            Stmt::Continue(None) => {
                self.pad();
                self.emit("continue;\n");
            }
            Stmt::Continue(Some(label)) => {
                self.pad();
                self.emit(&format!("goto {}_continue;\n", label));
            }

            Stmt::Return(value) => {
                self.pad();
                self.emit("return ");
                match value {
                    Some(e) => self.expr_value(e),
                    None => self.emit("undefined"),
                }
                self.emit(";\n");
            }

            Stmt::Labeled { label, body } => {
                // loops get their continuation label planted inside
                match &**body {
                    Stmt::While { cond, body } => self.emit_while(cond, body, Some(*label)),
                    Stmt::DoWhile { body, cond } => self.emit_do_while(body, cond, Some(*label)),
                    Stmt::For {
                        init,
                        test,
                        update,
                        body,
                    } => self.emit_for(
                        init.as_ref(),
                        test.as_ref(),
                        update.as_ref(),
                        body,
                        Some(*label),
                    ),
                    Stmt::ForIn {
                        target,
                        object,
                        body,
                    } => self.emit_for_in(target, object, body, Some(*label)),
                    other => self.statement(other),
                }
                self.pad();
                self.emit(&format!("break_{}: ;\n", label));
            }

            Stmt::Switch { cond, body } => self.emit_switch(cond, body),

            Stmt::Throw(e) => {
                self.pad();
                self.emit("throw ");
                self.expr_value(e);
                self.emit(";\n");
            }

            Stmt::Try {
                body,
                catch,
                finally,
                coord,
            } => self.emit_try(body, catch.as_ref(), finally.as_ref(), *coord),

            Stmt::With { coord, .. } => {
                self.error(*coord, "with statement is not supported");
            }
        }
    }

    /// Variable declarations are executable: each initialized declarator
    /// becomes an assignment to its slot.
    fn var_assignments(&mut self, decls: &[VarDecl]) {
        for decl in decls {
            if let Some(init) = &decl.init {
                self.pad();
                self.emit_ident(decl.name);
                self.emit("=");
                self.expr_value(init);
                self.emit(";\n");
            }
        }
    }

    fn emit_while(&mut self, cond: &Expr, body: &Stmt, label: Option<Symbol>) {
        self.pad();
        self.emit("while (");
        self.expr_value(cond);
        self.emit(")\n");
        self.loop_body(body, label);
    }

    fn emit_do_while(&mut self, body: &Stmt, cond: &Expr, label: Option<Symbol>) {
        self.pad();
        self.emit("do\n");
        self.loop_body(body, label);
        self.pad();
        self.emit("while (");
        self.expr_value(cond);
        self.emit(");\n");
    }

    fn emit_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        label: Option<Symbol>,
    ) {
        self.pad();
        self.emit("for (");
        match init {
            None => {}
            Some(ForInit::Expr(e)) => self.expr_value(e),
            Some(ForInit::Var(decls)) => {
                let mut first = true;
                for decl in decls {
                    if let Some(init) = &decl.init {
                        if !first {
                            self.emit(",");
                        }
                        self.emit_ident(decl.name);
                        self.emit("=");
                        self.expr_value(init);
                        first = false;
                    }
                }
            }
        }
        self.emit(";");
        if let Some(test) = test {
            self.expr_value(test);
        }
        self.emit(";");
        if let Some(update) = update {
            self.expr_value(update);
        }
        self.emit(")\n");
        self.loop_body(body, label);
    }

    /// `for (x in e)`: iterate the property keys of `e`, assigning each to
    /// `x` before each body execution.
    fn emit_for_in(
        &mut self,
        target: &ForInTarget,
        object: &Expr,
        body: &Stmt,
        label: Option<Symbol>,
    ) {
        let id = self.fresh_tmp();
        self.pad();
        self.emit(&format!("for (keyiter_ it{}_(", id));
        self.expr_value(object);
        self.emit(&format!("); it{}_.more(); ) {{\n", id));
        self.depth += 1;
        self.pad();
        match target {
            ForInTarget::Var(name) => self.emit_ident(*name),
            ForInTarget::Expr(e) => self.ref_expr(e),
        }
        self.emit(&format!(" = it{}_.next();\n", id));
        match body {
            Stmt::Block(stmts) => self.statements(stmts),
            other => self.statement(other),
        }
        if let Some(label) = label {
            self.pad();
            self.emit(&format!("{}_continue: ;\n", label));
        }
        self.depth -= 1;
        self.pad();
        self.emit("}\n");
    }

    /// `switch` lowers to a dispatch ladder inside a `do { } while (false)`
    /// wrapper: `===` comparisons pick a `goto` target, fallthrough between
    /// sections is the natural fallthrough of the emitted labels, and
    /// `break` exits the wrapper.
    fn emit_switch(&mut self, cond: &Expr, body: &[Stmt]) {
        let id = self.fresh_tmp();

        self.pad();
        self.emit("do {\n");
        self.depth += 1;
        self.pad();
        self.emit(&format!("value_ sw{}_ = ", id));
        self.expr_value(cond);
        self.emit(";\n");

        // carve the body into case/default sections
        let mut sections: Vec<(Option<&Expr>, Vec<&Stmt>)> = Vec::new();
        for stmt in body {
            match stmt {
                Stmt::Case(e) => sections.push((Some(e), Vec::new())),
                Stmt::Default => sections.push((None, Vec::new())),
                other => {
                    if let Some(last) = sections.last_mut() {
                        last.1.push(other);
                    }
                }
            }
        }

        for (k, (case, _)) in sections.iter().enumerate() {
            if let Some(case) = case {
                self.pad();
                self.emit(&format!("if (identical_(sw{}_,(", id));
                self.expr_value(case);
                self.emit(&format!("))) goto sw{}_case{}_;\n", id, k));
            }
        }
        match sections.iter().position(|(case, _)| case.is_none()) {
            Some(k) => {
                self.pad();
                self.emit(&format!("goto sw{}_case{}_;\n", id, k));
            }
            None => {
                self.pad();
                self.emit("break;\n");
            }
        }

        for (k, (_, stmts)) in sections.iter().enumerate() {
            self.pad();
            self.emit(&format!("sw{}_case{}_: ;\n", id, k));
            for stmt in stmts {
                self.statement(stmt);
            }
        }

        self.depth -= 1;
        self.pad();
        self.emit("} while (false);\n");
    }

    fn emit_try(
        &mut self,
        body: &[Stmt],
        catch: Option<&js2cpp_par::CatchClause>,
        finally: Option<&Vec<Stmt>>,
        coord: Coord,
    ) {
        self.pad();
        self.emit("try {\n");
        self.depth += 1;
        self.statements(body);
        self.depth -= 1;
        self.pad();
        self.emit("}\n");

        match catch {
            Some(clause) => {
                let id = self.fresh_tmp();
                self.pad();
                self.emit(&format!("catch (value_ ex{}_) {{\n", id));
                self.depth += 1;
                self.pad();
                self.emit_ident(clause.param);
                self.emit(&format!(" = ex{}_;\n", id));
                self.statements(&clause.body);
                self.depth -= 1;
                self.pad();
                self.emit("}\n");
            }
            None => {
                // a try block needs a handler clause
                self.pad();
                self.emit("catch (value_) { throw; }\n");
            }
        }

        if finally.is_some() {
            self.error(coord, "finally clause is not supported");
        }
    }

    // Expressions

    /// Emit an expression in reference (l-value) position.
    fn ref_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Invalid => {}
            Expr::Member(m) => {
                self.emit("(");
                self.expr_value(&m.object);
                self.emit(&format!(").dotref(\"{}\")", m.property));
            }
            Expr::Index(ix) => {
                // indexing operation
                self.emit("(");
                self.expr_value(&ix.object);
                self.emit(").atref(");
                self.expr_value(&ix.index);
                self.emit(")");
            }
            other => self.expr_value(other),
        }
    }

    /// Emit code that computes the value of an expression.
    fn expr_value(&mut self, expr: &Expr) {
        match expr {
            Expr::Invalid => {}

            Expr::Number(lexeme) => self.emit(&format!("value_({})", lexeme)),
            Expr::Str(lexeme) => {
                self.emit("value_(");
                self.emit_string(lexeme.as_str());
                self.emit(")");
            }
            Expr::Regex(lexeme) => {
                self.emit(&format!("rx_(\"{}\")", escape_cpp(lexeme.as_str())));
            }
            Expr::Ident(name) => self.emit_ident(*name),
            Expr::True => self.emit("true_"),
            Expr::False => self.emit("false_"),
            Expr::This => self.emit("this_"),
            Expr::Null => self.emit("null_"),

            Expr::Function(fid) => self.emit_func_val(*fid),

            Expr::Array(elems) => {
                self.emit(&format!("MakeArray_({}", elems.len()));
                for elem in elems {
                    self.emit(",");
                    match elem {
                        Some(e) => self.expr_value(e),
                        None => self.emit("undefined"),
                    }
                }
                self.emit(")");
            }

            Expr::Object(props) => {
                if props.is_empty() {
                    self.emit("value_(new obj_)");
                } else {
                    self.emit(&format!("MakeObject_({}", props.len()));
                    for (key, value) in props {
                        self.emit(&format!(",\"{}\",", key));
                        self.expr_value(value);
                    }
                    self.emit(")");
                }
            }

            Expr::Unary(u) => match u.op {
                UnOp::PreInc => {
                    self.emit("preinc_(");
                    self.ref_expr(&u.operand);
                    self.emit(")");
                }
                UnOp::PreDec => {
                    self.emit("predec_(");
                    self.ref_expr(&u.operand);
                    self.emit(")");
                }
                UnOp::Neg => {
                    self.emit("-(");
                    self.expr_value(&u.operand);
                    self.emit(")");
                }
                UnOp::Pos => {
                    // numeric coercion is the runtime's problem; unary plus
                    // emits its operand
                    self.expr_value(&u.operand);
                }
                UnOp::BitNot => {
                    self.emit("~(");
                    self.expr_value(&u.operand);
                    self.emit(")");
                }
                UnOp::Not => {
                    self.emit("!(");
                    self.expr_value(&u.operand);
                    self.emit(")");
                }
                UnOp::Typeof => {
                    self.emit("(");
                    self.expr_value(&u.operand);
                    self.emit(").typeof()");
                }
                UnOp::Void => {
                    // evaluate the operand for effect, produce undefined
                    self.emit("((");
                    self.expr_value(&u.operand);
                    self.emit("),undefined)");
                }
                UnOp::Delete => {
                    self.emit("delete_(");
                    self.ref_expr(&u.operand);
                    self.emit(")");
                }
            },

            Expr::Postfix(p) => {
                let helper = match p.op {
                    PostfixOp::Inc => "postinc_",
                    PostfixOp::Dec => "postdec_",
                };
                self.emit(helper);
                self.emit("(");
                self.ref_expr(&p.operand);
                self.emit(")");
            }

            Expr::Binary(b) => match b.op {
                BinOp::Identical => {
                    self.emit("identical_(");
                    self.expr_value(&b.left);
                    self.emit(",");
                    self.expr_value(&b.right);
                    self.emit(")");
                }
                BinOp::NotIdentical => {
                    self.emit("!identical_(");
                    self.expr_value(&b.left);
                    self.emit(",");
                    self.expr_value(&b.right);
                    self.emit(")");
                }
                BinOp::UShr => self.emit_helper2("srzx_", &b.left, &b.right),
                BinOp::Instanceof => self.emit_helper2("instanceof_", &b.left, &b.right),
                BinOp::In => self.emit_helper2("in_", &b.left, &b.right),
                op => {
                    self.emit("(");
                    self.expr_value(&b.left);
                    self.emit(")");
                    self.emit(op.as_str());
                    self.emit("(");
                    self.expr_value(&b.right);
                    self.emit(")");
                }
            },

            Expr::Assign(a) => match a.op {
                // no C++ spelling for these three; runtime helpers take the
                // reference directly
                AssignOp::UShr => self.emit_assign_helper("asssrzx_", &a.target, &a.value),
                AssignOp::LogAnd => self.emit_assign_helper("assland_", &a.target, &a.value),
                AssignOp::LogOr => self.emit_assign_helper("asslor_", &a.target, &a.value),
                op => {
                    self.ref_expr(&a.target);
                    self.emit(op.as_str());
                    self.expr_value(&a.value);
                }
            },

            Expr::Cond(c) => {
                self.emit("((");
                self.expr_value(&c.cond);
                self.emit(")?(");
                self.expr_value(&c.then_part);
                self.emit("):(");
                self.expr_value(&c.else_part);
                self.emit("))");
            }

            Expr::Comma(left, right) => {
                self.emit("((");
                self.expr_value(left);
                self.emit("),(");
                self.expr_value(right);
                self.emit("))");
            }

            Expr::Member(m) => {
                self.emit("(");
                self.expr_value(&m.object);
                self.emit(&format!(").dot(\"{}\")", m.property));
            }

            Expr::Index(ix) => {
                self.emit("(");
                self.expr_value(&ix.object);
                self.emit(").at(");
                self.expr_value(&ix.index);
                self.emit(")");
            }

            Expr::Call(call) => self.emit_call(call),

            Expr::New(n) => {
                self.emit("(");
                self.expr_value(&n.callee);
                self.emit(&format!(").toFunc()->call(value_(new obj_),{}", n.args.len()));
                for arg in &n.args {
                    self.emit(",");
                    self.expr_value(arg);
                }
                self.emit(")");
            }
        }
    }

    /// Method, element, and free calls each bind their receiver their own
    /// way.
    fn emit_call(&mut self, call: &CallExpr) {
        match &*call.callee {
            Expr::Member(m) => {
                // named method call with bound receiver
                self.emit("(");
                self.expr_value(&m.object);
                self.emit(&format!(").dotcall(\"{}\",", m.property));
            }
            Expr::Index(ix) => {
                // indexed method call
                self.emit("(");
                self.expr_value(&ix.object);
                self.emit(").eltcall(");
                self.expr_value(&ix.index);
                self.emit(",");
            }
            other => {
                // free call with the global object as receiver
                self.emit("(");
                self.expr_value(other);
                self.emit(").toFunc()->call(global_,");
            }
        }
        self.emit(&call.args.len().to_string());
        for arg in &call.args {
            self.emit(",");
            self.expr_value(arg);
        }
        self.emit(")");
    }

    fn emit_helper2(&mut self, helper: &str, left: &Expr, right: &Expr) {
        self.emit(helper);
        self.emit("(");
        self.expr_value(left);
        self.emit(",");
        self.expr_value(right);
        self.emit(")");
    }

    fn emit_assign_helper(&mut self, helper: &str, target: &Expr, value: &Expr) {
        self.emit(helper);
        self.emit("(");
        self.ref_expr(target);
        self.emit(",");
        self.expr_value(value);
        self.emit(")");
    }

    /// Resolve an identifier through the scope chain, innermost outward:
    /// a local of the active function, a bare global, or an intermediate
    /// (NLNG) activation link.
    fn emit_ident(&mut self, name: Symbol) {
        let program = self.program;
        let active = self.local_scope.unwrap_or(program.global_scope);

        if let Some((owner, _)) = program.scopes.find_declaration(active, name) {
            if Some(owner) == self.local_scope {
                self.emit("locals_.");
            } else if owner == program.global_scope {
                // bare reference
            } else {
                // NLNG reference
                self.emit(&format!("nlng{}_.", program.scopes[owner].depth));
            }
        }
        // not found anywhere: an implicitly declared global, also bare
        self.emit(name.as_str());
    }

    /// Single-quoted strings are rewritten into double-quoted form;
    /// double-quoted strings pass through verbatim. The lexeme arrives with
    /// its original quotes.
    fn emit_string(&mut self, lexeme: &str) {
        if lexeme.starts_with('"') {
            self.emit(lexeme);
            return;
        }

        let inner: Vec<char> = lexeme[1..lexeme.len() - 1].chars().collect();
        let mut out = String::from("\"");
        let mut i = 0;
        while i < inner.len() {
            let ch = inner[i];
            i += 1;
            if ch == '\\' && i < inner.len() {
                let esc = inner[i];
                i += 1;
                match esc {
                    // escaped single-quote, unescape it
                    '\'' => out.push('\''),
                    // standard escape letters pass through
                    'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' => {
                        out.push('\\');
                        out.push(esc);
                    }
                    // hex and octal sequences copy through
                    'x' | '0'..='7' => {
                        out.push('\\');
                        out.push(esc);
                    }
                    // unicode escape: normalize to the native hex form
                    'u' => {
                        let end = (i + 4).min(inner.len());
                        let digits: String = inner[i..end].iter().collect();
                        let v = u32::from_str_radix(&digits, 16).unwrap_or(0);
                        i = end;
                        out.push_str(&format!("\\x{:04x}", v));
                    }
                    // non-standard escape: octal byte escape of the letter
                    other => out.push_str(&format!("\\{:03o}", other as u32)),
                }
            } else if ch == '"' {
                // naked double-quote needs escaping now
                out.push('\\');
                out.push('"');
            } else {
                out.push(ch);
            }
        }
        out.push('"');
        self.emit(&out);
    }

    // Plumbing

    fn emit(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn pad(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn fresh_tmp(&mut self) -> u32 {
        let id = self.next_tmp;
        self.next_tmp += 1;
        id
    }

    /// The emitted name of a function: its declared name, or a
    /// deterministic `LitFunc_<n>` for function expressions.
    fn func_name(&self, fid: FuncId) -> String {
        match self.program.funcs[fid].name {
            Some(name) => name.as_str().to_string(),
            None => format!("LitFunc_{}", fid.0),
        }
    }

    /// The locals-record base name of a function scope.
    fn locals_name(&self, scope: ScopeId) -> String {
        let owner = self.program.scopes[scope]
            .owner
            .expect("function scope without an owner");
        self.func_name(owner)
    }

    fn error(&mut self, coord: Coord, msg: &str) {
        self.handler.error(coord, E_SEMANTIC, msg);
    }
}

/// Escape a lexeme for inclusion inside a C++ string literal.
fn escape_cpp(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}
