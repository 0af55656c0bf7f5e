pub mod analyzer;
pub mod codegen;
pub mod lexer;
pub mod parser;

use thiserror::Error;
use tracing::info;

use analyzer::{SemanticError, SemanticTables, TypeChecker};
use codegen::Codegen;
use lexer::{LexError, Lexer};
use parser::{ParseError, Parser, Program};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

pub fn parse(user_input: &str) -> Result<Program, CompileError> {
    let tokens = Lexer::tokenize(user_input)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse()?)
}

/// Parses and type checks `user_input`, returning the annotated tree along
/// with the tables the checker built.
pub fn analyze(user_input: &str) -> Result<(Program, SemanticTables), CompileError> {
    let mut program = parse(user_input)?;
    let tables = TypeChecker::new().visit_program(&mut program)?;
    info!(classes = program.classes.len(), "program is well typed");
    Ok((program, tables))
}

pub fn compile(user_input: &str) -> Result<String, CompileError> {
    let (program, tables) = analyze(user_input)?;
    let mut codegen = Codegen::new(&tables);
    Ok(codegen.generate(&program))
}
