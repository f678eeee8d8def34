mod common;
mod go;

pub use common::{ParseResult, Parser};
pub use go::{is_generated, GoParser};
