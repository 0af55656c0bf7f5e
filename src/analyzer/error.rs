use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SemanticErrorKind {
    #[error("no Program class")]
    NoProgram,
    #[error("no start function in Program class")]
    NoStart,
    #[error("start function has arguments")]
    StartArgs,

    #[error("duplicate identifier name in same scope")]
    DuplicateIdent,
    #[error("symbol by name undefined")]
    SymbolUndefined,
    #[error("symbol by name defined, but of unexpected type")]
    SymbolTypeMismatch,
    #[error("function call has different number of args than the declaration")]
    CallArgCount,
    #[error("type mismatch in function call args")]
    CallArgType,
    #[error("type mismatch in return statement")]
    ReturnType,

    #[error("types of right and left hand side do not match in assignment")]
    IncompatibleAssign,
    #[error("predicate of if statement is not boolean")]
    IfPredicate,

    #[error("incompatible types used in expression")]
    ExprType,

    #[error("function doesn't exist in object")]
    NoClassMethod,

    #[error("class cannot contain a field of its own type")]
    RecursiveLayout,
}

/// The first semantic rule a program violates.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("on line number {line}, error: {kind}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub line: u32,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, line: u32) -> Self {
        Self { kind, line }
    }
}

pub type SemanticResult<T> = Result<T, SemanticError>;
