//! Code generation: lower the typed AST into stack-machine instruction text.
//!
//! Every expression leaves exactly one value on the stack; operands are
//! emitted left before right so push order matches source order, then the
//! operator's mnemonic follows. Control flow is assembled from labels drawn
//! off the shared counters in `CompileState`. The current scope is passed
//! explicitly into every call rather than kept as mutable state.

use snafu::OptionExt;

use crate::ast::AstNode;
use crate::error::{CompileResult, UnknownOperatorSnafu};
use crate::state::{Binding, CompileState};

/// Emit newline-joined instruction text for a node under one scope.
pub fn generate(node: &AstNode, state: &mut CompileState, scope: &str) -> CompileResult<String> {
  let mut out = String::new();
  emit_node(node, state, scope, &mut out)?;
  Ok(out)
}

fn emit_node(
  node: &AstNode,
  state: &mut CompileState,
  scope: &str,
  out: &mut String,
) -> CompileResult<()> {
  match node {
    AstNode::CodeBody { statements } => {
      for statement in statements {
        emit_node(statement, state, scope, out)?;
      }
    }

    AstNode::Function {
      name,
      arguments,
      return_type,
      body,
    } => {
      state.declare_function(name, arguments.clone(), return_type.clone())?;
      // The body must be generated first: emitting it discovers the local
      // slots, and only then is the prologue count known. The prologue is
      // still placed before the body text.
      let mut body_out = String::new();
      emit_node(body, state, name, &mut body_out)?;
      let locals = state.locals_count(name);
      out.push_str(&format!("@ {name}\n"));
      out.push_str(&format!("function {locals}\n"));
      out.push_str(&body_out);
    }

    AstNode::IfClause {
      if_branch,
      elif_branches,
      else_branch,
    } => {
      let number = state.next_if_label();
      emit_branch(if_branch, state, scope, out, number, 0)?;
      for (position, branch) in elif_branches.iter().enumerate() {
        emit_branch(branch, state, scope, out, number, position + 1)?;
      }
      if let Some(else_branch) = else_branch {
        let AstNode::Else { body } = else_branch.as_ref() else {
          unreachable!("if clause holds a non-else fallback");
        };
        // Fallthrough path once every condition was false.
        emit_node(body, state, scope, out)?;
      }
      out.push_str(&format!("@ if{number}_end\n"));
    }

    AstNode::While { condition, body } => {
      let number = state.next_while_label();
      out.push_str(&format!("@ while{number}_loop\n"));
      emit_node(condition, state, scope, out)?;
      out.push_str("not\n");
      out.push_str(&format!("ifgoto while{number}_end\n"));
      emit_node(body, state, scope, out)?;
      out.push_str(&format!("goto while{number}_loop\n"));
      out.push_str(&format!("@ while{number}_end\n"));
    }

    AstNode::For {
      start,
      condition,
      step,
      body,
    } => {
      let number = state.next_for_label();
      emit_node(start, state, scope, out)?;
      out.push_str(&format!("@ for{number}_loop\n"));
      emit_node(condition, state, scope, out)?;
      out.push_str("not\n");
      out.push_str(&format!("ifgoto for{number}_end\n"));
      emit_node(body, state, scope, out)?;
      emit_node(step, state, scope, out)?;
      out.push_str(&format!("goto for{number}_loop\n"));
      out.push_str(&format!("@ for{number}_end\n"));
    }

    AstNode::Assignment {
      name,
      annotation,
      operator,
      value,
    } => {
      let index = state.declare_or_get_slot(scope, name, annotation.as_ref())?;
      if operator == "=" {
        emit_node(value, state, scope, out)?;
        out.push_str(&format!("popvar {index}\n"));
      } else {
        // Compound assignment: push the current value, apply the base
        // operator (trailing `=` stripped) to the RHS, store back.
        let base = operator.strip_suffix('=').unwrap_or(operator);
        let mnemonic = lower_binary(base).context(UnknownOperatorSnafu {
          operator: operator.as_str(),
        })?;
        out.push_str(&format!("pushvar {index}\n"));
        emit_node(value, state, scope, out)?;
        out.push_str(&format!("{mnemonic}\n"));
        out.push_str(&format!("popvar {index}\n"));
      }
    }

    AstNode::Return { value } => {
      emit_node(value, state, scope, out)?;
      out.push_str("ret\n");
    }

    AstNode::Call { name, arguments } => {
      emit_call(name, arguments, state, scope, out)?;
    }

    AstNode::CallNoRet { name, arguments } => {
      emit_call(name, arguments, state, scope, out)?;
      out.push_str("popa\n");
    }

    AstNode::BinaryOp { operator, lhs, rhs } => {
      emit_node(lhs, state, scope, out)?;
      emit_node(rhs, state, scope, out)?;
      let mnemonic = lower_binary(operator).context(UnknownOperatorSnafu {
        operator: operator.as_str(),
      })?;
      out.push_str(&format!("{mnemonic}\n"));
    }

    AstNode::UnaryOp { operator, operand } => {
      emit_node(operand, state, scope, out)?;
      let mnemonic = lower_unary(operator).context(UnknownOperatorSnafu {
        operator: operator.as_str(),
      })?;
      out.push_str(&format!("{mnemonic}\n"));
    }

    AstNode::Identifier { name } => match state.resolve(scope, name)? {
      Binding::Local(index) => out.push_str(&format!("pushvar {index}\n")),
      Binding::Argument(index) => out.push_str(&format!("pusharg {index}\n")),
    },

    AstNode::Number { literal } => {
      out.push_str(&format!("pushvalue {literal}\n"));
    }

    AstNode::If { .. } | AstNode::Elif { .. } | AstNode::Else { .. } => {
      unreachable!("branch nodes are emitted through their if clause")
    }
  }

  Ok(())
}

/// One conditional branch: the false path jumps past the body to this
/// branch's label, the true path falls through and jumps to the shared end.
fn emit_branch(
  branch: &AstNode,
  state: &mut CompileState,
  scope: &str,
  out: &mut String,
  number: usize,
  position: usize,
) -> CompileResult<()> {
  let (condition, body) = match branch {
    AstNode::If { condition, body } | AstNode::Elif { condition, body } => (condition, body),
    _ => unreachable!("if clause holds a non-branch node"),
  };
  emit_node(condition, state, scope, out)?;
  out.push_str("not\n");
  out.push_str(&format!("ifgoto if{number}_{position}\n"));
  emit_node(body, state, scope, out)?;
  out.push_str(&format!("goto if{number}_end\n"));
  out.push_str(&format!("@ if{number}_{position}\n"));
  Ok(())
}

fn emit_call(
  name: &str,
  arguments: &[AstNode],
  state: &mut CompileState,
  scope: &str,
  out: &mut String,
) -> CompileResult<()> {
  for argument in arguments {
    emit_node(argument, state, scope, out)?;
  }
  out.push_str(&format!("call {name} {}\n", arguments.len()));
  Ok(())
}

/// Lowering table from binary operator text to VM mnemonics. Operators
/// without a native instruction lower to runtime calls; the bitwise and
/// logical forms share one mnemonic, so there is no short-circuiting.
fn lower_binary(operator: &str) -> Option<&'static str> {
  match operator {
    "+" => Some("add"),
    "-" => Some("sub"),
    "*" => Some("call mul 2"),
    "/" => Some("call div 2"),
    "%" => Some("call mod 2"),
    "<<" => Some("call shl 2"),
    ">>" => Some("call shr 2"),
    "&" | "&&" => Some("and"),
    "|" | "||" => Some("or"),
    "==" => Some("eq"),
    "!=" => Some("ne"),
    ">" => Some("gt"),
    ">=" => Some("ge"),
    "<" => Some("lt"),
    "<=" => Some("le"),
    _ => None,
  }
}

fn lower_unary(operator: &str) -> Option<&'static str> {
  match operator {
    "-" => Some("neg"),
    "!" => Some("not"),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::CompileError;
  use crate::state::GLOBAL_SCOPE;
  use pretty_assertions::assert_eq;

  #[test]
  fn division_lowers_to_a_runtime_call() {
    assert_eq!(lower_binary("*"), Some("call mul 2"));
    assert_eq!(lower_binary("/"), Some("call div 2"));
  }

  #[test]
  fn bitwise_and_logical_forms_share_mnemonics() {
    assert_eq!(lower_binary("&"), lower_binary("&&"));
    assert_eq!(lower_binary("|"), lower_binary("||"));
  }

  #[test]
  fn unknown_operator_aborts_generation() {
    let node = AstNode::BinaryOp {
      operator: "^".to_string(),
      lhs: Box::new(AstNode::Number {
        literal: "1".to_string(),
      }),
      rhs: Box::new(AstNode::Number {
        literal: "2".to_string(),
      }),
    };
    let mut state = CompileState::new();
    let err = generate(&node, &mut state, GLOBAL_SCOPE).unwrap_err();
    assert!(matches!(err, CompileError::UnknownOperator { .. }));
  }

  #[test]
  fn operands_are_emitted_left_before_right() {
    let node = AstNode::BinaryOp {
      operator: "-".to_string(),
      lhs: Box::new(AstNode::Number {
        literal: "7".to_string(),
      }),
      rhs: Box::new(AstNode::Number {
        literal: "3".to_string(),
      }),
    };
    let mut state = CompileState::new();
    let out = generate(&node, &mut state, GLOBAL_SCOPE).unwrap();
    assert_eq!(out, "pushvalue 7\npushvalue 3\nsub\n");
  }
}
