//! Semantic error tests: every failure class the transformer reports.

use gala_analyzer::{analyze, SourceUnit};
use gala_common::SourceError;
use gala_syntax::ast::SourceFile;
use gala_syntax::build::*;
use gala_transform::transform;

fn lower_err(source_file: SourceFile) -> SourceError {
    lower_err_units(vec![("main.gala", source_file)])
}

fn lower_err_units(units: Vec<(&str, SourceFile)>) -> SourceError {
    let units = units
        .into_iter()
        .map(|(path, f)| SourceUnit::new(path, "", f))
        .collect();
    let rich = analyze(units).expect("analysis should succeed");
    transform(&rich[0]).expect_err("transform should fail")
}

// ── Scope ──────────────────────────────────────────────────────────────

/// `val x = 1; x = 2` is the canonical immutability violation.
#[test]
fn assign_to_val_is_an_error() {
    let err = lower_err(file(
        "main",
        vec![func(
            "main",
            vec![],
            vec![],
            vec![
                gala_syntax::ast::Stmt::Decl(val("x", int("1"))),
                assign(ident("x"), int("2")),
            ],
        )],
    ));
    assert_eq!(err.message, "cannot assign to immutable variable x");
}

/// Reading an unknown identifier fails.
#[test]
fn unknown_identifier_is_an_error() {
    let err = lower_err(file("main", vec![val("x", ident("ghost"))]));
    assert!(err.message.contains("unknown variable ghost"));
}

/// Assignment to an immutable field through member access fails.
#[test]
fn assign_to_immutable_field_is_an_error() {
    let err = lower_err(file(
        "main",
        vec![
            struct_decl("Point", vec![field("x", tname("int")), field("y", tname("int"))]),
            func(
                "main",
                vec![],
                vec![],
                vec![
                    gala_syntax::ast::Stmt::Decl(var(
                        "p",
                        call(ident("Point"), vec![int("1"), int("2")]),
                    )),
                    assign(member(ident("p"), "x"), int("3")),
                ],
            ),
        ],
    ));
    assert_eq!(err.message, "cannot assign to immutable field x");
}

// ── Declarations ───────────────────────────────────────────────────────

/// An explicitly immutable-wrapped val type would produce
/// Immutable[Immutable[...]].
#[test]
fn nested_immutable_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![val_typed(
            "x",
            tgen(tname("Immutable"), vec![tname("int")]),
            int("1"),
        )],
    ));
    assert!(err.message.contains("Immutable[Immutable[...]]"));
}

// ── Calls ──────────────────────────────────────────────────────────────

/// Positional arguments are rejected in Copy-with-overrides.
#[test]
fn positional_copy_arguments_are_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            struct_decl("Point", vec![field("x", tname("int")), field("y", tname("int"))]),
            val("p", call(ident("Point"), vec![int("1"), int("2")])),
            val(
                "q",
                call_args(
                    member(ident("p"), "Copy"),
                    vec![
                        gala_syntax::ast::Arg::named("x", int("9")),
                        gala_syntax::ast::Arg::positional(int("8")),
                    ],
                ),
            ),
        ],
    ));
    assert_eq!(err.message, "positional arguments are not allowed in Copy");
}

/// Mixing positional and named arguments in construction fails.
#[test]
fn mixed_construction_arguments_are_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            struct_decl("Point", vec![field("x", tname("int")), field("y", tname("int"))]),
            val(
                "p",
                call_args(
                    ident("Point"),
                    vec![
                        gala_syntax::ast::Arg::named("x", int("1")),
                        gala_syntax::ast::Arg::positional(int("2")),
                    ],
                ),
            ),
        ],
    ));
    assert_eq!(
        err.message,
        "cannot mix positional and named arguments in struct construction"
    );
}

/// Unknown field names in named construction fail.
#[test]
fn unknown_field_in_construction_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            struct_decl("Point", vec![field("x", tname("int")), field("y", tname("int"))]),
            val(
                "p",
                call_args(
                    ident("Point"),
                    vec![gala_syntax::ast::Arg::named("z", int("1"))],
                ),
            ),
        ],
    ));
    assert!(err.message.contains("unknown field z in construction of main.Point"));
}

/// nil cannot seed an immutable pointer field.
#[test]
fn nil_for_immutable_pointer_field_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            struct_decl("Node", vec![field("next", tptr(tname("Node")))]),
            val(
                "n",
                call_args(
                    ident("Node"),
                    vec![gala_syntax::ast::Arg::named("next", nil())],
                ),
            ),
        ],
    ));
    assert!(err
        .message
        .contains("cannot assign nil to immutable pointer field next"));
    assert!(err.message.contains("var"));
}

// ── Match ──────────────────────────────────────────────────────────────

/// The wildcard default arm is mandatory.
#[test]
fn match_without_default_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            var("n", int("1")),
            val(
                "r",
                match_expr(ident("n"), vec![arm(pat_int("1"), int("10"))]),
            ),
        ],
    ));
    assert_eq!(err.message, "match expression is missing a default case");
}

/// Two defaults are as bad as none.
#[test]
fn match_with_two_defaults_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            var("n", int("1")),
            val(
                "r",
                match_expr(
                    ident("n"),
                    vec![arm(pat_wild(), int("1")), arm(pat_wild(), int("2"))],
                ),
            ),
        ],
    ));
    assert_eq!(err.message, "match expression has multiple default cases");
}

/// Arms that disagree on their result type are rejected.
#[test]
fn match_with_divergent_arm_types_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            var("n", int("1")),
            val(
                "r",
                match_expr(
                    ident("n"),
                    vec![
                        arm(pat_int("1"), int("10")),
                        arm(pat_int("2"), str_lit("two")),
                        arm(pat_wild(), int("0")),
                    ],
                ),
            ),
        ],
    ));
    assert!(err.message.contains("match arms have mismatched types"));
}

/// Partial functions share the match contract: totality is enforced at
/// compile time, so the wildcard default is mandatory there too.
#[test]
fn partial_function_without_default_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![
            func_expr(
                "id",
                vec![param("f", tfunc(vec![tname("int")], vec![tname("int")]))],
                vec![tname("int")],
                call(ident("f"), vec![int("1")]),
            ),
            val(
                "r",
                call(ident("id"), vec![partial_fn(vec![arm(pat_int("1"), int("1"))])]),
            ),
        ],
    ));
    assert_eq!(err.message, "match expression is missing a default case");
}

/// An unresolvable scrutinee fails before any arm is compiled.
#[test]
fn match_on_unknown_scrutinee_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![val(
            "r",
            match_expr(ident("mystery"), vec![arm(pat_wild(), int("0"))]),
        )],
    ));
    assert!(err.message.contains("unknown variable mystery"));
}

// ── Literals ───────────────────────────────────────────────────────────

/// Slice and map literals are statements-only in Gala.
#[test]
fn slice_literal_in_expression_position_is_rejected() {
    let err = lower_err(file(
        "main",
        vec![val(
            "xs",
            gala_syntax::ast::Expr::Composite(gala_syntax::ast::CompositeLit {
                ty: tslice(tname("int")),
                elems: vec![],
                span: gala_common::Span::zero(),
            }),
        )],
    ));
    assert!(err.message.contains("slice literal"));
}

// ── Resolver ───────────────────────────────────────────────────────────

/// Two dot imports exporting the same symbol produce a deterministic,
/// sorted clash report.
#[test]
fn dot_import_clash_is_detected() {
    let alpha = file(
        "alpha",
        vec![func_expr("Sleep", vec![], vec![tname("int")], int("1"))],
    );
    let beta = file(
        "beta",
        vec![func_expr("Sleep", vec![], vec![tname("int")], int("2"))],
    );
    let main = file(
        "main",
        vec![
            import_dot("galalang.org/x/alpha"),
            import_dot("galalang.org/x/beta"),
        ],
    );
    let err = lower_err_units(vec![
        ("main.gala", main),
        ("alpha.gala", alpha),
        ("beta.gala", beta),
    ]);
    assert_eq!(
        err.message,
        "symbol \"Sleep\" is exported by multiple dot-imported packages: alpha, beta"
    );
}

/// Positioned errors carry file, line, and column.
#[test]
fn errors_carry_positions_when_available() {
    use gala_common::Span;
    use gala_syntax::ast::{Ident, Expr, ValDecl, Decl};
    // Hand-build a file with real spans: "val x = ghost" at line 1.
    let source = "val x = ghost\n";
    let decl = Decl::Val(ValDecl {
        name: "x".into(),
        ty: None,
        init: Expr::Ident(Ident {
            name: "ghost".into(),
            span: Span::new(8, 13),
        }),
        span: Span::new(0, 13),
    });
    let source_file = SourceFile {
        package: "main".into(),
        decls: vec![decl],
        span: Span::new(0, 14),
    };
    let rich = analyze(vec![SourceUnit::new("main.gala", source, source_file)]).unwrap();
    let err = transform(&rich[0]).unwrap_err();
    assert_eq!(err.file, "main.gala");
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 9);
    assert_eq!(err.to_string(), "main.gala:1:9: unknown variable ghost");
}
