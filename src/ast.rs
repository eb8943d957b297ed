//! AST construction: rewrite the raw parse tree, bottom-up, into typed nodes.
//!
//! This layer is purely structural. It extracts children by rule kind and
//! performs no symbol resolution or validation; a conforming grammar makes
//! malformed shapes impossible, so the extraction helpers treat them as
//! unreachable. Operators are kept as raw text and resolved against the
//! lowering table during generation.

use lazy_static::lazy_static;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::parser::Rule;

/// Type tag attached to declarations. Tags are opaque to the compiler; they
/// only gate the first assignment to each name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type(pub String);

impl Type {
  /// Return type used when a function omits its annotation.
  pub fn void() -> Self {
    Self("void".to_string())
  }
}

/// Typed syntax tree. Each node exclusively owns its children.
#[derive(Debug, Clone)]
pub enum AstNode {
  CodeBody {
    statements: Vec<AstNode>,
  },
  Function {
    name: String,
    arguments: Vec<(String, Type)>,
    return_type: Type,
    body: Box<AstNode>,
  },
  /// Call in expression position; its result stays on the stack.
  Call {
    name: String,
    arguments: Vec<AstNode>,
  },
  /// Call in statement position; its result is discarded.
  CallNoRet {
    name: String,
    arguments: Vec<AstNode>,
  },
  IfClause {
    if_branch: Box<AstNode>,
    elif_branches: Vec<AstNode>,
    else_branch: Option<Box<AstNode>>,
  },
  If {
    condition: Box<AstNode>,
    body: Box<AstNode>,
  },
  Elif {
    condition: Box<AstNode>,
    body: Box<AstNode>,
  },
  Else {
    body: Box<AstNode>,
  },
  While {
    condition: Box<AstNode>,
    body: Box<AstNode>,
  },
  For {
    start: Box<AstNode>,
    condition: Box<AstNode>,
    step: Box<AstNode>,
    body: Box<AstNode>,
  },
  Assignment {
    name: String,
    annotation: Option<Type>,
    operator: String,
    value: Box<AstNode>,
  },
  Return {
    value: Box<AstNode>,
  },
  BinaryOp {
    operator: String,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  UnaryOp {
    operator: String,
    operand: Box<AstNode>,
  },
  Identifier {
    name: String,
  },
  /// Literal text is carried through unmodified, base prefix included.
  Number {
    literal: String,
  },
}

lazy_static! {
  // Precedence is defined lowest to highest.
  static ref PRATT: PrattParser<Rule> = PrattParser::new()
    .op(Op::infix(Rule::lor, Assoc::Left))
    .op(Op::infix(Rule::land, Assoc::Left))
    .op(Op::infix(Rule::bor, Assoc::Left))
    .op(Op::infix(Rule::band, Assoc::Left))
    .op(Op::infix(Rule::eq, Assoc::Left) | Op::infix(Rule::ne, Assoc::Left))
    .op(Op::infix(Rule::lt, Assoc::Left)
      | Op::infix(Rule::le, Assoc::Left)
      | Op::infix(Rule::gt, Assoc::Left)
      | Op::infix(Rule::ge, Assoc::Left))
    .op(Op::infix(Rule::shl, Assoc::Left) | Op::infix(Rule::shr, Assoc::Left))
    .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
    .op(Op::infix(Rule::mul, Assoc::Left)
      | Op::infix(Rule::div, Assoc::Left)
      | Op::infix(Rule::rem, Assoc::Left))
    .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not));
}

/// Build the whole program into a `CodeBody`.
pub fn build(program: Pair<Rule>) -> AstNode {
  let statements = program
    .into_inner()
    .filter(|pair| pair.as_rule() != Rule::EOI)
    .map(build_statement)
    .collect();
  AstNode::CodeBody { statements }
}

fn build_statement(pair: Pair<Rule>) -> AstNode {
  match pair.as_rule() {
    Rule::function_def => build_function(pair),
    Rule::if_clause => build_if_clause(pair),
    Rule::while_loop => build_while(pair),
    Rule::for_loop => build_for(pair),
    Rule::return_stmt => {
      let value = next_pair(&mut pair.into_inner(), "a return expression");
      AstNode::Return {
        value: Box::new(build_expression(value.into_inner())),
      }
    }
    Rule::assignment => build_assignment(pair),
    Rule::call_stmt => {
      let call = next_pair(&mut pair.into_inner(), "a call");
      let (name, arguments) = build_call(call);
      AstNode::CallNoRet { name, arguments }
    }
    rule => unreachable!("rule {rule:?} is not a statement"),
  }
}

fn build_function(pair: Pair<Rule>) -> AstNode {
  let mut name = String::new();
  let mut arguments = Vec::new();
  let mut return_type = Type::void();
  let mut body = None;

  for child in pair.into_inner() {
    match child.as_rule() {
      Rule::ident => name = child.as_str().to_string(),
      Rule::param => {
        let mut parts = child.into_inner();
        let arg_name = next_pair(&mut parts, "a parameter name");
        let arg_type = next_pair(&mut parts, "a parameter type");
        arguments.push((
          arg_name.as_str().to_string(),
          Type(arg_type.as_str().to_string()),
        ));
      }
      Rule::type_name => return_type = Type(child.as_str().to_string()),
      Rule::block => body = Some(build_block(child)),
      rule => unreachable!("rule {rule:?} does not belong to a function"),
    }
  }

  AstNode::Function {
    name,
    arguments,
    return_type,
    body: Box::new(body.expect("grammar guarantees a function body")),
  }
}

fn build_if_clause(pair: Pair<Rule>) -> AstNode {
  let mut if_branch = None;
  let mut elif_branches = Vec::new();
  let mut else_branch = None;

  for child in pair.into_inner() {
    match child.as_rule() {
      Rule::if_branch => {
        let (condition, body) = build_branch(child);
        if_branch = Some(AstNode::If { condition, body });
      }
      Rule::elif_branch => {
        let (condition, body) = build_branch(child);
        elif_branches.push(AstNode::Elif { condition, body });
      }
      Rule::else_branch => {
        let block = next_pair(&mut child.into_inner(), "an else body");
        else_branch = Some(Box::new(AstNode::Else {
          body: Box::new(build_block(block)),
        }));
      }
      rule => unreachable!("rule {rule:?} does not belong to an if clause"),
    }
  }

  AstNode::IfClause {
    if_branch: Box::new(if_branch.expect("grammar guarantees a leading if branch")),
    elif_branches,
    else_branch,
  }
}

fn build_branch(pair: Pair<Rule>) -> (Box<AstNode>, Box<AstNode>) {
  let mut parts = pair.into_inner();
  let condition = next_pair(&mut parts, "a branch condition");
  let body = next_pair(&mut parts, "a branch body");
  (
    Box::new(build_expression(condition.into_inner())),
    Box::new(build_block(body)),
  )
}

fn build_while(pair: Pair<Rule>) -> AstNode {
  let mut parts = pair.into_inner();
  let condition = next_pair(&mut parts, "a loop condition");
  let body = next_pair(&mut parts, "a loop body");
  AstNode::While {
    condition: Box::new(build_expression(condition.into_inner())),
    body: Box::new(build_block(body)),
  }
}

fn build_for(pair: Pair<Rule>) -> AstNode {
  let mut parts = pair.into_inner();
  let start = next_pair(&mut parts, "a loop start statement");
  let condition = next_pair(&mut parts, "a loop condition");
  let step = next_pair(&mut parts, "a loop step statement");
  let body = next_pair(&mut parts, "a loop body");
  AstNode::For {
    start: Box::new(build_assignment(start)),
    condition: Box::new(build_expression(condition.into_inner())),
    step: Box::new(build_assignment(step)),
    body: Box::new(build_block(body)),
  }
}

fn build_assignment(pair: Pair<Rule>) -> AstNode {
  let mut name = String::new();
  let mut annotation = None;
  let mut operator = String::new();
  let mut value = None;

  for child in pair.into_inner() {
    match child.as_rule() {
      Rule::ident => name = child.as_str().to_string(),
      Rule::type_name => annotation = Some(Type(child.as_str().to_string())),
      Rule::assign_op => operator = child.as_str().to_string(),
      Rule::expression => value = Some(build_expression(child.into_inner())),
      rule => unreachable!("rule {rule:?} does not belong to an assignment"),
    }
  }

  AstNode::Assignment {
    name,
    annotation,
    operator,
    value: Box::new(value.expect("grammar guarantees an assigned expression")),
  }
}

fn build_block(pair: Pair<Rule>) -> AstNode {
  AstNode::CodeBody {
    statements: pair.into_inner().map(build_statement).collect(),
  }
}

fn build_call(pair: Pair<Rule>) -> (String, Vec<AstNode>) {
  let mut parts = pair.into_inner();
  let name = next_pair(&mut parts, "a callee name").as_str().to_string();
  let arguments = parts
    .map(|argument| build_expression(argument.into_inner()))
    .collect();
  (name, arguments)
}

fn build_expression(pairs: Pairs<Rule>) -> AstNode {
  PRATT
    .map_primary(build_primary)
    .map_prefix(|op, operand| AstNode::UnaryOp {
      operator: op.as_str().to_string(),
      operand: Box::new(operand),
    })
    .map_infix(|lhs, op, rhs| AstNode::BinaryOp {
      operator: op.as_str().to_string(),
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    })
    .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> AstNode {
  match pair.as_rule() {
    Rule::number => AstNode::Number {
      literal: pair.as_str().to_string(),
    },
    Rule::ident => AstNode::Identifier {
      name: pair.as_str().to_string(),
    },
    Rule::call_expr => {
      let (name, arguments) = build_call(pair);
      AstNode::Call { name, arguments }
    }
    // Parenthesised subexpression.
    Rule::expression => build_expression(pair.into_inner()),
    rule => unreachable!("rule {rule:?} is not a primary"),
  }
}

fn next_pair<'a>(parts: &mut Pairs<'a, Rule>, what: &str) -> Pair<'a, Rule> {
  match parts.next() {
    Some(pair) => pair,
    None => unreachable!("grammar guarantees {what}"),
  }
}
