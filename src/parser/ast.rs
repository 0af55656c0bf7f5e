use crate::analyzer::Ty;

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub classes: Vec<ClassDef>,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<Declaration>,
    pub methods: Vec<MethodDef>,
    pub line: u32,
}

/// `int a, b;` declares every name in `names` with the same type.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub ty: TypeName,
    pub names: Vec<String>,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeName {
    Int,
    Bool,
    Nothing,
    Class(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub ty: TypeName,
    pub name: String,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeName,
    pub body: MethodBody,
    pub line: u32,
}

impl MethodDef {
    pub fn local_names(&self) -> impl Iterator<Item = (&String, &TypeName)> {
        self.body
            .locals
            .iter()
            .flat_map(|d| d.names.iter().map(move |n| (n, &d.ty)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodBody {
    pub locals: Vec<Declaration>,
    pub stmts: Vec<Stmt>,
    pub ret: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Assign(String, Expr),
    If(Expr, Vec<Stmt>),
    Print(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    And,
    LessThan,
    LessEqual,
    Equal,
    NotEqual,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnaryOpKind {
    Neg,
    Not,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Binary(BinOpKind, Box<Expr>, Box<Expr>),
    Unary(UnaryOpKind, Box<Expr>),
    /// `receiver.method(args)`; the receiver is always a variable reference.
    MethodCall(Box<Expr>, String, Vec<Expr>),
    SelfCall(String, Vec<Expr>),
    Variable(String),
    Num(i32),
    Bool(bool),
    Nothing,
    New(String),
}

/// An expression node. `ty` and, for calls, `callee` are filled in exactly
/// once by the type checker and only read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
    ty: Option<Ty>,
    callee: Option<String>,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self {
            kind,
            line,
            ty: None,
            callee: None,
        }
    }

    pub fn ty(&self) -> Option<&Ty> {
        self.ty.as_ref()
    }

    pub fn set_ty(&mut self, ty: Ty) {
        assert!(
            self.ty.is_none(),
            "type attribute of {:?} was already resolved",
            self.kind
        );
        self.ty = Some(ty);
    }

    /// Class whose body a call runs, as resolved when the call was checked.
    pub fn callee(&self) -> Option<&str> {
        self.callee.as_deref()
    }

    pub fn set_callee(&mut self, class: String) {
        assert!(
            self.callee.is_none(),
            "callee of {:?} was already resolved",
            self.kind
        );
        self.callee = Some(class);
    }
}
