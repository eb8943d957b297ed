use indoc::indoc;
use pretty_assertions::assert_eq;
use svmc::{CompileError, compile, compile_with_state};

#[test]
fn straight_line_assignments() {
  let out = compile("x: int = 1; y: int = x + 2;").unwrap();
  assert_eq!(out, "pushvalue 1\npopvar 0\npushvar 0\npushvalue 2\nadd\npopvar 1\n");
}

#[test]
fn redeclaring_a_name_reuses_its_slot() {
  // a, b, a must address slots 0, 1, 0; the second a carries no type.
  let out = compile("a: int = 1; b: int = 2; a = 3;").unwrap();
  assert_eq!(
    out,
    "pushvalue 1\npopvar 0\npushvalue 2\npopvar 1\npushvalue 3\npopvar 0\n"
  );
}

#[test]
fn if_else_emits_branch_and_end_labels() {
  let source = indoc! {"
    a: int = 0;
    b: int = 0;
    if (a > 0) { b = 1; } else { b = 2; }
  "};
  let expected = indoc! {"
    pushvalue 0
    popvar 0
    pushvalue 0
    popvar 1
    pushvar 0
    pushvalue 0
    gt
    not
    ifgoto if0_0
    pushvalue 1
    popvar 1
    goto if0_end
    @ if0_0
    pushvalue 2
    popvar 1
    @ if0_end
  "};
  assert_eq!(compile(source).unwrap(), expected);
}

#[test]
fn second_if_gets_a_fresh_label_number() {
  let source = indoc! {"
    a: int = 0;
    if (a > 0) { a = 1; }
    if (a > 1) { a = 2; }
  "};
  let expected = indoc! {"
    pushvalue 0
    popvar 0
    pushvar 0
    pushvalue 0
    gt
    not
    ifgoto if0_0
    pushvalue 1
    popvar 0
    goto if0_end
    @ if0_0
    @ if0_end
    pushvar 0
    pushvalue 1
    gt
    not
    ifgoto if1_0
    pushvalue 2
    popvar 0
    goto if1_end
    @ if1_0
    @ if1_end
  "};
  assert_eq!(compile(source).unwrap(), expected);
}

#[test]
fn elif_chain_numbers_branches_in_emission_order() {
  let source = indoc! {"
    a: int = 0;
    if (a == 0) { a = 1; } elif (a == 1) { a = 2; } elif (a == 2) { a = 3; } else { a = 4; }
  "};
  let expected = indoc! {"
    pushvalue 0
    popvar 0
    pushvar 0
    pushvalue 0
    eq
    not
    ifgoto if0_0
    pushvalue 1
    popvar 0
    goto if0_end
    @ if0_0
    pushvar 0
    pushvalue 1
    eq
    not
    ifgoto if0_1
    pushvalue 2
    popvar 0
    goto if0_end
    @ if0_1
    pushvar 0
    pushvalue 2
    eq
    not
    ifgoto if0_2
    pushvalue 3
    popvar 0
    goto if0_end
    @ if0_2
    pushvalue 4
    popvar 0
    @ if0_end
  "};
  assert_eq!(compile(source).unwrap(), expected);
}

#[test]
fn while_loop_jumps_back_to_its_single_top_label() {
  let source = indoc! {"
    i: int = 0;
    while (i < 10) { i += 1; }
  "};
  let expected = indoc! {"
    pushvalue 0
    popvar 0
    @ while0_loop
    pushvar 0
    pushvalue 10
    lt
    not
    ifgoto while0_end
    pushvar 0
    pushvalue 1
    add
    popvar 0
    goto while0_loop
    @ while0_end
  "};
  let out = compile(source).unwrap();
  assert_eq!(out, expected);
  assert_eq!(out.matches("@ while0_loop").count(), 1);
  assert_eq!(out.matches("@ while0_end").count(), 1);
}

#[test]
fn for_loop_runs_start_once_and_step_each_iteration() {
  let source = indoc! {"
    total: int = 0;
    for (i: int = 0; i < 3; i += 1) { total += i; }
  "};
  let expected = indoc! {"
    pushvalue 0
    popvar 0
    pushvalue 0
    popvar 1
    @ for0_loop
    pushvar 1
    pushvalue 3
    lt
    not
    ifgoto for0_end
    pushvar 0
    pushvar 1
    add
    popvar 0
    pushvar 1
    pushvalue 1
    add
    popvar 1
    goto for0_loop
    @ for0_end
  "};
  assert_eq!(compile(source).unwrap(), expected);
}

#[test]
fn function_arguments_compile_to_pusharg_with_zero_locals() {
  let out = compile("function add(a: int, b: int): int { return a + b; }").unwrap();
  assert_eq!(out, "@ add\nfunction 0\npusharg 0\npusharg 1\nadd\nret\n");
}

#[test]
fn function_prologue_counts_locals_discovered_in_the_body() {
  let source = indoc! {"
    function sum(n: int): int {
      total: int = 0;
      i: int = 0;
      while (i < n) { total += i; i += 1; }
      return total;
    }
  "};
  let expected = indoc! {"
    @ sum
    function 2
    pushvalue 0
    popvar 0
    pushvalue 0
    popvar 1
    @ while0_loop
    pushvar 1
    pusharg 0
    lt
    not
    ifgoto while0_end
    pushvar 0
    pushvar 1
    add
    popvar 0
    pushvar 1
    pushvalue 1
    add
    popvar 1
    goto while0_loop
    @ while0_end
    pushvar 0
    ret
  "};
  assert_eq!(compile(source).unwrap(), expected);
}

#[test]
fn assigning_to_an_argument_name_creates_a_shadowing_local() {
  let out = compile("function f(a: int): int { a: int = 1; return a; }").unwrap();
  assert_eq!(out, "@ f\nfunction 1\npushvalue 1\npopvar 0\npushvar 0\nret\n");
}

#[test]
fn statement_call_discards_its_result() {
  let source = indoc! {"
    function f(x: int): int { return x; }
    f(1 + 2);
  "};
  let expected = indoc! {"
    @ f
    function 0
    pusharg 0
    ret
    pushvalue 1
    pushvalue 2
    add
    call f 1
    popa
  "};
  assert_eq!(compile(source).unwrap(), expected);
}

#[test]
fn expression_call_keeps_its_result() {
  let out = compile("y: int = f(1, 2);").unwrap();
  assert_eq!(out, "pushvalue 1\npushvalue 2\ncall f 2\npopvar 0\n");
}

#[test]
fn mul_and_div_lower_to_runtime_calls() {
  let out = compile("x: int = 2 * 3; y: int = x / 2;").unwrap();
  assert_eq!(
    out,
    "pushvalue 2\npushvalue 3\ncall mul 2\npopvar 0\npushvar 0\npushvalue 2\ncall div 2\npopvar 1\n"
  );
}

#[test]
fn logical_and_bitwise_operators_share_mnemonics() {
  let out = compile("a: int = 1; b: int = a && 0; c: int = a & 0; d: int = a || 1; e: int = a | 1;")
    .unwrap();
  let expected = indoc! {"
    pushvalue 1
    popvar 0
    pushvar 0
    pushvalue 0
    and
    popvar 1
    pushvar 0
    pushvalue 0
    and
    popvar 2
    pushvar 0
    pushvalue 1
    or
    popvar 3
    pushvar 0
    pushvalue 1
    or
    popvar 4
  "};
  assert_eq!(out, expected);
}

#[test]
fn unary_operators_follow_their_operand() {
  let out = compile("x: int = -1; y: int = !x;").unwrap();
  assert_eq!(
    out,
    "pushvalue 1\nneg\npopvar 0\npushvar 0\nnot\npopvar 1\n"
  );
}

#[test]
fn compound_shift_strips_the_trailing_equals() {
  let out = compile("x: int = 1; x <<= 2;").unwrap();
  assert_eq!(
    out,
    "pushvalue 1\npopvar 0\npushvar 0\npushvalue 2\ncall shl 2\npopvar 0\n"
  );
}

#[test]
fn base_prefixed_literals_pass_through_unmodified() {
  let out = compile("x: int = 0x2A; y: int = 0b101; z: int = 0o17;").unwrap();
  assert_eq!(
    out,
    "pushvalue 0x2A\npopvar 0\npushvalue 0b101\npopvar 1\npushvalue 0o17\npopvar 2\n"
  );
}

#[test]
fn undefined_name_fails_with_no_output() {
  let err = compile("x: int = y;").unwrap_err();
  assert!(matches!(err, CompileError::UndefinedName { .. }));
}

#[test]
fn missing_type_on_first_assignment_fails() {
  let err = compile("x = 1;").unwrap_err();
  assert!(matches!(err, CompileError::MissingType { .. }));
}

#[test]
fn duplicate_function_names_are_refused() {
  let err = compile("function f() { return 0; } function f() { return 1; }").unwrap_err();
  assert!(matches!(err, CompileError::DuplicateFunction { .. }));
}

#[test]
fn names_are_not_visible_across_functions() {
  let source = indoc! {"
    function f(): int { x: int = 1; return x; }
    function g(): int { return x; }
  "};
  let err = compile(source).unwrap_err();
  assert!(matches!(err, CompileError::UndefinedName { .. }));
}

#[test]
fn independent_compilations_are_byte_identical() {
  let source = indoc! {"
    function f(a: int): int {
      b: int = 0;
      if (a > 0) { b = 1; } else { b = 2; }
      while (b < 10) { b += a; }
      return b;
    }
    x: int = f(3);
  "};
  assert_eq!(compile(source).unwrap(), compile(source).unwrap());
}

#[test]
fn symbol_table_dump_lists_resolved_functions() {
  let (_, state) = compile_with_state("function f(a: int): int { b: int = 1; return b; }").unwrap();
  let dump = state.to_string();
  assert!(dump.contains("function global -> void"));
  assert!(dump.contains("function f -> int"));
  assert!(dump.contains("arg 0: a: int"));
  assert!(dump.contains("local 0: b: int"));
}

#[test]
fn comments_are_ignored() {
  let source = indoc! {"
    # counter
    x: int = 1; # trailing
  "};
  assert_eq!(compile(source).unwrap(), "pushvalue 1\npopvar 0\n");
}
