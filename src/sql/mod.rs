//! SQL parsing and AST types for lightdb.
//!
//! Uses `sqlparser` crate for parsing, then converts to our internal AST
//! representation for planning.

mod ast;
mod error;
mod parser;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use parser::Parser;
