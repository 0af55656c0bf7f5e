use tracing::{debug, trace};

use crate::parser::{
    BinOpKind, ClassDef, Declaration, Expr, ExprKind, MethodDef, Program, Stmt, StmtKind,
    TypeName, UnaryOpKind,
};

use super::{
    ClassTable, SemanticError, SemanticErrorKind as E, SemanticResult, Symbol, SymbolTable, Ty,
};

/// Tables produced by a successful check and read by the code generator.
#[derive(Clone, Debug)]
pub struct SemanticTables {
    pub symbol_table: SymbolTable,
    pub class_table: ClassTable,
}

/// Single-pass checker: registers classes, fills the scopes and annotates
/// every expression with its type. Stops at the first violated rule.
pub struct TypeChecker {
    symbol_table: SymbolTable,
    class_table: ClassTable,
    current_class: String,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn error<T>(kind: E, line: u32) -> SemanticResult<T> {
    Err(SemanticError::new(kind, line))
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            class_table: ClassTable::new(),
            current_class: String::new(),
        }
    }

    pub fn visit_program(mut self, program: &mut Program) -> SemanticResult<SemanticTables> {
        for (index, class) in program.classes.iter_mut().enumerate() {
            self.symbol_table.open_scope();
            self.visit_class(index, class)?;
            self.symbol_table.close_scope();
        }

        self.check_entry_point(program)?;

        Ok(SemanticTables {
            symbol_table: self.symbol_table,
            class_table: self.class_table,
        })
    }

    /// The last class must be `Program` and define `nothing start()`.
    fn check_entry_point(&self, program: &Program) -> SemanticResult<()> {
        let Some(last) = program.classes.last() else {
            return error(E::NoProgram, program.line);
        };
        if last.name != "Program" {
            return error(E::NoProgram, last.line);
        }

        let start = self
            .class_table
            .lookup(&last.name)
            .and_then(|class| self.symbol_table.lookup_in_scope(class.scope, "start"));
        let Some(signature) = start
            .map(|symbol| &symbol.ty)
            .filter(|ty| ty.get_return_type() == Some(&Ty::Nothing))
        else {
            return error(E::NoStart, last.line);
        };
        if signature.get_params().is_some_and(|params| !params.is_empty()) {
            return error(E::StartArgs, last.line);
        }
        Ok(())
    }

    fn visit_class(&mut self, index: usize, class: &mut ClassDef) -> SemanticResult<()> {
        if let Some(parent) = &class.superclass {
            if !self.class_table.exists(parent) {
                return error(E::SymbolUndefined, class.line);
            }
        }
        if self.class_table.exists(&class.name) {
            return error(E::DuplicateIdent, class.line);
        }

        self.class_table.insert(
            &class.name,
            class.superclass.as_deref(),
            index,
            self.symbol_table.get_current_scope(),
        );
        debug!(class = %class.name, parent = ?class.superclass, "registered class");
        self.current_class = class.name.clone();

        for decl in &class.fields {
            let ty = self.resolve_type_name(&decl.ty, decl.line)?;
            if ty.class_name() == Some(class.name.as_str()) {
                return error(E::RecursiveLayout, decl.line);
            }
            self.declare(decl, ty)?;
        }

        for method in class.methods.iter_mut() {
            self.visit_method(method)?;
        }

        Ok(())
    }

    fn resolve_type_name(&self, type_name: &TypeName, line: u32) -> SemanticResult<Ty> {
        if let TypeName::Class(name) = type_name {
            if !self.class_table.exists(name) {
                return error(E::SymbolUndefined, line);
            }
        }
        Ok(Ty::from(type_name))
    }

    fn declare(&mut self, decl: &Declaration, ty: Ty) -> SemanticResult<()> {
        for name in &decl.names {
            if !self.symbol_table.insert(name, Symbol::new(ty.clone())) {
                return error(E::DuplicateIdent, decl.line);
            }
        }
        Ok(())
    }

    fn visit_method(&mut self, method: &mut MethodDef) -> SemanticResult<()> {
        self.symbol_table.open_scope();

        let return_type = self.resolve_type_name(&method.return_type, method.line)?;

        let mut params = vec![];
        for param in &method.params {
            let ty = self.resolve_type_name(&param.ty, param.line)?;
            if !self.symbol_table.insert(&param.name, Symbol::new(ty.clone())) {
                return error(E::DuplicateIdent, param.line);
            }
            params.push(ty);
        }

        for decl in &method.body.locals {
            let ty = self.resolve_type_name(&decl.ty, decl.line)?;
            self.declare(decl, ty)?;
        }

        for stmt in method.body.stmts.iter_mut() {
            self.visit_stmt(stmt)?;
        }

        let ret = self.visit_expr(&mut method.body.ret)?;
        if !self.is_assignable(&ret, &return_type) {
            return error(E::ReturnType, method.body.ret.line);
        }

        let signature = Ty::Func(Box::new(return_type), params);
        debug!(class = %self.current_class, method = %method.name, %signature, "checked method");
        if !self
            .symbol_table
            .insert_in_parent_scope(&method.name, Symbol::new(signature))
        {
            return error(E::DuplicateIdent, method.line);
        }

        self.symbol_table.close_scope();
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) -> SemanticResult<()> {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Assign(name, expr) => {
                let right = self.visit_expr(expr)?;
                let left = self.resolve_variable(name, line)?;
                self.check_assignment(&left, &right, line)
            }
            StmtKind::If(pred, body) => {
                if self.visit_expr(pred)? != Ty::Bool {
                    return error(E::IfPredicate, line);
                }
                for s in body.iter_mut() {
                    self.visit_stmt(s)?;
                }
                Ok(())
            }
            StmtKind::Print(expr) => match self.visit_expr(expr)? {
                Ty::Int | Ty::Bool => Ok(()),
                _ => error(E::ExprType, line),
            },
        }
    }

    fn check_assignment(&self, left: &Ty, right: &Ty, line: u32) -> SemanticResult<()> {
        if !left.is_variable() {
            return error(E::SymbolTypeMismatch, line);
        }

        if let (Ty::Object(left_class), Ty::Object(right_class)) = (left, right) {
            if !self.class_table.exists(left_class) || !self.class_table.exists(right_class) {
                return error(E::SymbolTypeMismatch, line);
            }
            if !self.class_table.is_subclass(right_class, left_class) {
                return error(E::IncompatibleAssign, line);
            }
        }

        if !left.same_kind(right) {
            return error(E::IncompatibleAssign, line);
        }
        Ok(())
    }

    /// Same kind, and for objects the source class is the target class or
    /// one of its descendants.
    fn is_assignable(&self, from: &Ty, to: &Ty) -> bool {
        match (from, to) {
            (Ty::Object(from), Ty::Object(to)) => self.class_table.is_subclass(from, to),
            _ => from.same_kind(to),
        }
    }

    /// Local scopes first, then the members of the current class and its
    /// ancestors.
    fn resolve_variable(&self, name: &str, line: u32) -> SemanticResult<Ty> {
        if let Some(symbol) = self.symbol_table.lookup(name) {
            return Ok(symbol.ty.clone());
        }

        match self
            .class_table
            .resolve_member(&self.symbol_table, &self.current_class, name)
        {
            Some((_, symbol)) => Ok(symbol.ty.clone()),
            None => error(E::SymbolUndefined, line),
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) -> SemanticResult<Ty> {
        let line = expr.line;
        let mut callee = None;
        let ty = match &mut expr.kind {
            ExprKind::Binary(kind, left, right) => {
                let left = self.visit_expr(left)?;
                let right = self.visit_expr(right)?;
                Self::check_binary(kind, &left, &right, line)?
            }
            ExprKind::Unary(kind, operand) => {
                let operand = self.visit_expr(operand)?;
                let expected = match kind {
                    UnaryOpKind::Neg => Ty::Int,
                    UnaryOpKind::Not => Ty::Bool,
                };
                if operand != expected {
                    return error(E::ExprType, line);
                }
                expected
            }
            ExprKind::MethodCall(receiver, method, args) => {
                let Ty::Object(class) = self.visit_expr(receiver)? else {
                    return error(E::SymbolTypeMismatch, line);
                };
                let (ret, defining_class) = self.visit_call(&class, method, args, line)?;
                callee = Some(defining_class);
                ret
            }
            ExprKind::SelfCall(method, args) => {
                let class = self.current_class.clone();
                let (ret, defining_class) = self.visit_call(&class, method, args, line)?;
                callee = Some(defining_class);
                ret
            }
            ExprKind::Variable(name) => {
                let ty = self.resolve_variable(name, line)?;
                if !ty.is_variable() {
                    return error(E::SymbolTypeMismatch, line);
                }
                ty
            }
            ExprKind::Num(_) => Ty::Int,
            ExprKind::Bool(_) => Ty::Bool,
            ExprKind::Nothing => Ty::Nothing,
            ExprKind::New(class) => {
                if !self.class_table.exists(class) {
                    return error(E::SymbolUndefined, line);
                }
                Ty::Object(class.clone())
            }
        };

        trace!(line, %ty, "typed expression");
        if let Some(class) = callee {
            expr.set_callee(class);
        }
        expr.set_ty(ty.clone());
        Ok(ty)
    }

    fn check_binary(kind: &BinOpKind, left: &Ty, right: &Ty, line: u32) -> SemanticResult<Ty> {
        let (operands_ok, result) = match kind {
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div => {
                (*left == Ty::Int && *right == Ty::Int, Ty::Int)
            }
            BinOpKind::And => (*left == Ty::Bool && *right == Ty::Bool, Ty::Bool),
            BinOpKind::LessThan | BinOpKind::LessEqual => {
                (*left == Ty::Int && *right == Ty::Int, Ty::Bool)
            }
            BinOpKind::Equal | BinOpKind::NotEqual => (
                matches!((left, right), (Ty::Int, Ty::Int) | (Ty::Bool, Ty::Bool)),
                Ty::Bool,
            ),
        };

        if !operands_ok {
            return error(E::ExprType, line);
        }
        Ok(result)
    }

    /// Types a call of `method` on a receiver whose static class is `class`.
    /// Returns the call's type and the class defining the method that was
    /// checked against, which is the body the call will run.
    fn visit_call(
        &mut self,
        class: &str,
        method: &str,
        args: &mut [Expr],
        line: u32,
    ) -> SemanticResult<(Ty, String)> {
        let mut arg_types = vec![];
        for arg in args.iter_mut() {
            arg_types.push(self.visit_expr(arg)?);
        }

        let Some((defining_class, symbol)) = self
            .class_table
            .resolve_member(&self.symbol_table, class, method)
        else {
            return error(E::NoClassMethod, line);
        };
        let Ty::Func(ret, params) = &symbol.ty else {
            return error(E::SymbolTypeMismatch, line);
        };

        if params.len() != arg_types.len() {
            return error(E::CallArgCount, line);
        }
        for (arg, param) in arg_types.iter().zip(params) {
            if !self.is_assignable(arg, param) {
                return error(E::CallArgType, line);
            }
        }

        Ok(((**ret).clone(), defining_class.name.clone()))
    }
}
