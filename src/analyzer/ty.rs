use std::fmt;
use std::mem::discriminant;

use crate::parser::TypeName;

#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    Int,
    Bool,
    Nothing,
    Object(String),
    Func(Box<Ty>, Vec<Ty>),
}

impl Ty {
    /// True when both types have the same base kind, ignoring class names
    /// and signatures.
    pub fn same_kind(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Ty::Int | Ty::Bool | Ty::Object(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Ty::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn get_return_type(&self) -> Option<&Ty> {
        match self {
            Ty::Func(ty, _) => Some(ty),
            _ => None,
        }
    }

    pub fn get_params(&self) -> Option<&[Ty]> {
        match self {
            Ty::Func(_, params) => Some(params),
            _ => None,
        }
    }
}

impl From<&TypeName> for Ty {
    fn from(type_name: &TypeName) -> Self {
        match type_name {
            TypeName::Int => Ty::Int,
            TypeName::Bool => Ty::Bool,
            TypeName::Nothing => Ty::Nothing,
            TypeName::Class(name) => Ty::Object(name.clone()),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Bool => write!(f, "bool"),
            Ty::Nothing => write!(f, "nothing"),
            Ty::Object(name) => write!(f, "{}", name),
            Ty::Func(ret, params) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}
