mod class_table;
mod error;
mod offset_table;
mod symbol_table;
mod ty;
mod type_checker;

pub use class_table::*;
pub use error::*;
pub use offset_table::*;
pub use symbol_table::*;
pub use ty::*;
pub use type_checker::*;
