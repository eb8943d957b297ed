//! Grammar collaborator boundary.
//!
//! Lexing and parsing are delegated entirely to pest: the grammar artifact
//! lives in `grammar.pest` and is compiled into `SourceParser` at build
//! time. This module only turns source text into the raw parse tree; all
//! shaping into typed nodes happens in `ast`.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::{CompileResult, ParseSnafu};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct SourceParser;

/// Parse a whole program, returning the raw `program` parse tree.
pub fn parse(source: &str) -> CompileResult<Pair<'_, Rule>> {
  let mut pairs = SourceParser::parse(Rule::program, source).map_err(|err| {
    ParseSnafu {
      message: err.to_string(),
    }
    .build()
  })?;

  pairs.next().ok_or_else(|| {
    ParseSnafu {
      message: "parse produced no program".to_string(),
    }
    .build()
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_minimal_program() {
    let pair = parse("a: int = 1;").expect("program should parse");
    assert_eq!(pair.as_rule(), Rule::program);
  }

  #[test]
  fn rejects_trailing_garbage() {
    assert!(parse("a: int = 1; @@").is_err());
  }

  #[test]
  fn keywords_are_not_identifiers() {
    assert!(parse("while: int = 1;").is_err());
  }
}
