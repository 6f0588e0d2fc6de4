use super::ast::*;
use super::*; // 导入父模块（parser）的所有公共项，主要是 `parse` 函数
use crate::diagnostic::{Diagnostic, DiagnosticBag};
use crate::lexer;

/// 辅助函数：完整跑一遍“词法 + 语法”，返回 AST 和拆分后的诊断。
fn parse_source(source: &str) -> (Option<Program>, Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut diagnostics = DiagnosticBag::new();
    let tokens = lexer::lex(source, &mut diagnostics);
    let ast = parse(&tokens, &mut diagnostics);
    let (errors, warnings) = diagnostics.into_parts();
    (ast, errors, warnings)
}

/// 辅助函数，用于测试成功解析的场景。
/// 如果出现任何错误就会 panic，否则返回 AST。警告是允许的。
fn parse_source_ok(source: &str) -> Program {
    let (ast, errors, _warnings) = parse_source(source);
    assert!(
        errors.is_empty(),
        "Parser failed unexpectedly for source {:?}: {:?}",
        source,
        errors.iter().map(|e| e.message().to_string()).collect::<Vec<_>>()
    );
    ast.expect("Parser returned no AST despite reporting no errors.")
}

/// 辅助函数，用于测试解析失败的场景，返回所有错误。
fn parse_source_fail(source: &str) -> (Option<Program>, Vec<Diagnostic>) {
    let (ast, errors, _warnings) = parse_source(source);
    assert!(
        !errors.is_empty(),
        "Expected parse errors for source: {}",
        source
    );
    (ast, errors)
}

// --- 成功路径测试 (Happy Path) ---

#[test]
fn test_variable_declarations() {
    let ast = parse_source_ok("var a = 1; const b = 2; let c;");
    assert_eq!(ast.body.len(), 3);

    match &ast.body[0].kind {
        Statement::VarDecl(decl) => {
            assert_eq!(decl.binding, BindingKind::Mutable);
            assert_eq!(decl.name.name, "a");
            assert!(decl.initializer.is_some());
        }
        other => panic!("Expected a VarDecl, got {:?}", other),
    }
    match &ast.body[1].kind {
        Statement::VarDecl(decl) => assert_eq!(decl.binding, BindingKind::Immutable),
        other => panic!("Expected a VarDecl, got {:?}", other),
    }
    match &ast.body[2].kind {
        Statement::VarDecl(decl) => {
            assert_eq!(decl.binding, BindingKind::Lexical);
            assert!(decl.initializer.is_none());
        }
        other => panic!("Expected a VarDecl, got {:?}", other),
    }
}

#[test]
fn test_function_declaration_with_lifecycle_name() {
    // `step` 是领域关键字，但必须能作为函数名使用
    let ast = parse_source_ok("function step(dt) { return dt; }");
    assert_eq!(ast.body.len(), 1);

    match &ast.body[0].kind {
        Statement::FuncDecl(func) => {
            assert_eq!(func.name.name, "step");
            assert!(func.name.is_intrinsic, "`step` is in the intrinsic function catalogue");
            assert_eq!(func.params.len(), 1);
            assert_eq!(func.params[0].name, "dt");
            assert_eq!(func.body.kind.statements.len(), 1);
        }
        other => panic!("Expected a FuncDecl, got {:?}", other),
    }
}

#[test]
fn test_operator_precedence() {
    let ast = parse_source_ok("var x = 2 + 3 * 4;");
    let Statement::VarDecl(decl) = &ast.body[0].kind else {
        panic!("Expected a VarDecl");
    };
    let init = decl.initializer.as_ref().unwrap();

    // 2 + (3 * 4)：乘法结合得更紧
    let Expression::Binary(add) = &init.kind else {
        panic!("Expected a Binary expression, got {:?}", init.kind);
    };
    assert_eq!(add.operator.kind, lexer::Operator::Plus);
    assert!(matches!(add.left.kind, Expression::Literal(Literal::Number(n)) if n == 2.0));
    let Expression::Binary(mul) = &add.right.kind else {
        panic!("Expected the right operand to be a multiplication");
    };
    assert_eq!(mul.operator.kind, lexer::Operator::Star);
}

#[test]
fn test_assignment_is_right_associative() {
    let ast = parse_source_ok("a = b = 1;");
    let Statement::Expression(expr) = &ast.body[0].kind else {
        panic!("Expected an expression statement");
    };
    let Expression::Assignment(outer) = &expr.kind else {
        panic!("Expected an assignment");
    };
    // a = (b = 1)
    assert!(matches!(&outer.target.kind, Expression::Identifier(id) if id.name == "a"));
    assert!(matches!(&outer.value.kind, Expression::Assignment(_)));
}

#[test]
fn test_compound_assignment() {
    let ast = parse_source_ok("hp -= dmg;");
    let Statement::Expression(expr) = &ast.body[0].kind else {
        panic!("Expected an expression statement");
    };
    let Expression::Assignment(assign) = &expr.kind else {
        panic!("Expected an assignment, got {:?}", expr.kind);
    };
    assert_eq!(assign.operator.kind, lexer::Operator::MinusAssign);
}

#[test]
fn test_member_call_and_index_chain() {
    let ast = parse_source_ok("player.items[0].use();");
    let Statement::Expression(expr) = &ast.body[0].kind else {
        panic!("Expected an expression statement");
    };
    // 最外层是调用
    let Expression::Call(call) = &expr.kind else {
        panic!("Expected a call, got {:?}", expr.kind);
    };
    assert!(call.arguments.is_empty());
    // 被调用者是 `.use` 成员访问
    let Expression::Member(member) = &call.callee.kind else {
        panic!("Expected a member access callee");
    };
    assert!(matches!(&member.property, MemberProperty::Named(id) if id.name == "use"));
}

#[test]
fn test_vec2_literal() {
    let ast = parse_source_ok("var p = vec2(1, 2 + 3);");
    let Statement::VarDecl(decl) = &ast.body[0].kind else {
        panic!("Expected a VarDecl");
    };
    let Expression::Vec2(v) = &decl.initializer.as_ref().unwrap().kind else {
        panic!("Expected a vec2 literal");
    };
    assert!(matches!(v.x.kind, Expression::Literal(Literal::Number(n)) if n == 1.0));
    assert!(matches!(v.y.kind, Expression::Binary(_)));
}

#[test]
fn test_vec3_literal() {
    let ast = parse_source_ok("var c = vec3(255, 128, 0);");
    let Statement::VarDecl(decl) = &ast.body[0].kind else {
        panic!("Expected a VarDecl");
    };
    assert!(matches!(
        decl.initializer.as_ref().unwrap().kind,
        Expression::Vec3(_)
    ));
}

#[test]
fn test_object_literal_shorthand_expands() {
    // `{x}` 和 `{x: x}` 解析后结构等价
    let shorthand = parse_source_ok("var o = {x};");
    let explicit = parse_source_ok("var o = {x: x};");

    let get_object = |program: &Program| -> ObjectLiteral {
        let Statement::VarDecl(decl) = &program.body[0].kind else {
            panic!("Expected a VarDecl");
        };
        let Expression::Object(obj) = &decl.initializer.as_ref().unwrap().kind else {
            panic!("Expected an object literal");
        };
        obj.clone()
    };

    let a = get_object(&shorthand);
    let b = get_object(&explicit);
    assert_eq!(a.properties.len(), 1);
    assert_eq!(a.properties[0].kind.key, b.properties[0].kind.key);
    // 两种写法的值都是对 `x` 的标识符引用
    for obj in [&a, &b] {
        assert!(matches!(
            &obj.properties[0].kind.value.kind,
            Expression::Identifier(id) if id.name == "x"
        ));
    }
}

#[test]
fn test_object_literal_trailing_comma_and_keys() {
    let ast = parse_source_ok(r#"var o = { a: 1, "b": 2, [k]: 3, };"#);
    let Statement::VarDecl(decl) = &ast.body[0].kind else {
        panic!("Expected a VarDecl");
    };
    let Expression::Object(obj) = &decl.initializer.as_ref().unwrap().kind else {
        panic!("Expected an object literal");
    };
    assert_eq!(obj.properties.len(), 3);
    assert!(matches!(&obj.properties[0].kind.key, PropertyKey::Identifier(n) if n == "a"));
    assert!(matches!(&obj.properties[1].kind.key, PropertyKey::Str(s) if s == "b"));
    assert!(matches!(&obj.properties[2].kind.key, PropertyKey::Computed(_)));
}

#[test]
fn test_object_literal_missing_comma_is_a_warning() {
    let (ast, errors, warnings) = parse_source("var o = { a: 1 b: 2 };");
    assert!(errors.is_empty(), "missing comma must not be an error: {:?}", errors);
    assert!(warnings.iter().any(|w| w.code() == "W0102"));
    assert!(ast.is_some());
}

#[test]
fn test_array_literal_with_holes() {
    let ast = parse_source_ok("var a = [1, , 2];");
    let Statement::VarDecl(decl) = &ast.body[0].kind else {
        panic!("Expected a VarDecl");
    };
    let Expression::Array(arr) = &decl.initializer.as_ref().unwrap().kind else {
        panic!("Expected an array literal");
    };
    assert_eq!(arr.elements.len(), 3);
    assert!(arr.elements[0].is_some());
    assert!(arr.elements[1].is_none(), "the middle element is a hole");
    assert!(arr.elements[2].is_some());
}

#[test]
fn test_for_without_condition_synthesizes_true() {
    let ast = parse_source_ok("for (;;) { break; }");
    let Statement::For(f) = &ast.body[0].kind else {
        panic!("Expected a for statement");
    };
    assert!(f.init.is_none());
    assert!(f.update.is_none());
    assert!(matches!(
        f.condition.kind,
        Expression::Literal(Literal::Boolean(true))
    ));
}

#[test]
fn test_full_for_loop() {
    let ast = parse_source_ok("for (var i = 0; i < 10; i += 1) { play_sound(\"tick\"); }");
    let Statement::For(f) = &ast.body[0].kind else {
        panic!("Expected a for statement");
    };
    assert!(matches!(f.init.as_ref().unwrap().kind, Statement::VarDecl(_)));
    assert!(matches!(f.condition.kind, Expression::Binary(_)));
    assert!(matches!(f.update.as_ref().unwrap().kind, Expression::Assignment(_)));
}

#[test]
fn test_switch_statement() {
    let source = r#"
        switch (dir) {
            case 1:
                velocity = vec2(1, 0);
                break;
            case 2:
                velocity = vec2(0, 1);
                break;
            default:
                velocity = vec2(0, 0);
        }
    "#;
    let ast = parse_source_ok(source);
    let Statement::Switch(sw) = &ast.body[0].kind else {
        panic!("Expected a switch statement");
    };
    assert_eq!(sw.cases.len(), 3);
    assert!(sw.cases[0].kind.test.is_some());
    assert!(sw.cases[1].kind.test.is_some());
    assert!(sw.cases[2].kind.test.is_none(), "`default` has a None test");
    assert_eq!(sw.cases[0].kind.body.len(), 2);
}

#[test]
fn test_do_while_statement() {
    let ast = parse_source_ok("do { x += 1; } while (x < 3);");
    assert!(matches!(ast.body[0].kind, Statement::DoWhile(_)));
}

#[test]
fn test_empty_statement() {
    let ast = parse_source_ok(";");
    assert!(matches!(ast.body[0].kind, Statement::Empty));
}

#[test]
fn test_yield_parses_as_identifier() {
    // `yield` 是领域关键字，但在表达式位置按标识符处理（没有生成器语义）
    let ast = parse_source_ok("var v = yield;");
    let Statement::VarDecl(decl) = &ast.body[0].kind else {
        panic!("Expected a VarDecl");
    };
    assert!(matches!(
        &decl.initializer.as_ref().unwrap().kind,
        Expression::Identifier(id) if id.name == "yield"
    ));
}

#[test]
fn test_intrinsic_flag_on_identifiers() {
    let ast = parse_source_ok("velocity = my_speed;");
    let Statement::Expression(expr) = &ast.body[0].kind else {
        panic!("Expected an expression statement");
    };
    let Expression::Assignment(assign) = &expr.kind else {
        panic!("Expected an assignment");
    };
    assert!(matches!(&assign.target.kind, Expression::Identifier(id) if id.is_intrinsic));
    assert!(matches!(&assign.value.kind, Expression::Identifier(id) if !id.is_intrinsic));
}

// --- 分号策略 ---

#[test]
fn test_missing_semicolon_is_tolerated() {
    let source = "var a = 1\nvar b = 2;";
    let (ast, errors, warnings) = parse_source(source);

    assert!(errors.is_empty(), "a missing semicolon is never an error: {:?}", errors);
    assert!(
        warnings.iter().any(|w| w.message().contains("Missing semicolon")),
        "expected a missing-terminator warning, got: {:?}",
        warnings.iter().map(|w| w.message().to_string()).collect::<Vec<_>>()
    );

    let ast = ast.unwrap();
    assert_eq!(ast.body.len(), 2);
    assert!(matches!(ast.body[0].kind, Statement::VarDecl(_)));
    assert!(matches!(ast.body[1].kind, Statement::VarDecl(_)));
}

#[test]
fn test_semicolon_variants_produce_same_shape() {
    // 带分号与不带分号，除了警告之外 AST 形状一致
    let with = parse_source_ok("var a = 1; a += 1; break; continue;");
    let (without_ast, errors, _warnings) = parse_source("var a = 1\na += 1\nbreak\ncontinue");
    assert!(errors.is_empty());
    let without = without_ast.unwrap();

    assert_eq!(with.body.len(), without.body.len());
    for (a, b) in with.body.iter().zip(without.body.iter()) {
        assert_eq!(
            std::mem::discriminant(&a.kind),
            std::mem::discriminant(&b.kind)
        );
    }
}

#[test]
fn test_bare_return_before_closing_brace() {
    // `return }` 的 return 没有返回值，缺失的分号只是警告
    let (ast, errors, warnings) = parse_source("function f(x) { return }");
    assert!(errors.is_empty(), "{:?}", errors);
    assert!(warnings.iter().any(|w| w.message().contains("Missing semicolon")));
    let ast = ast.unwrap();
    let Statement::FuncDecl(func) = &ast.body[0].kind else {
        panic!("Expected a FuncDecl");
    };
    let Statement::Return(ret) = &func.body.kind.statements[0].kind else {
        panic!("Expected a return statement");
    };
    assert!(ret.value.is_none());
}

#[test]
fn test_lifecycle_parameter_lint() {
    let (_ast, errors, warnings) = parse_source("function step() { }\nfunction draw() { }");
    assert!(errors.is_empty());
    let messages: Vec<&str> = warnings.iter().map(|w| w.message()).collect();
    assert!(messages.iter().any(|m| m.contains("time-delta")));
    assert!(messages.iter().any(|m| m.contains("drawing-context")));
}

// --- 失败路径测试 (Sad Path) ---

#[test]
fn test_recovery_at_statement_boundary() {
    // 中间一条语句有缺陷，前后两条语句仍然要出现在 AST 里
    let source = "var a = 1; var = 2; var b = 3;";
    let (ast, errors) = parse_source_fail(source);

    assert!(errors.iter().any(|e| e.message().contains("Expected")));

    let ast = ast.expect("recoverable errors still produce an AST");
    let names: Vec<String> = ast
        .body
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            Statement::VarDecl(decl) => Some(decl.name.name.clone()),
            _ => None,
        })
        .collect();
    assert!(names.contains(&"a".to_string()));
    assert!(names.contains(&"b".to_string()));
}

#[test]
fn test_unexpected_token_instead_of_expression() {
    let (_ast, errors) = parse_source_fail("var x = );");
    assert!(errors
        .iter()
        .any(|e| e.message().contains("Expected an expression")));
}

#[test]
fn test_unterminated_block_is_fatal() {
    let (ast, errors) = parse_source_fail("function f() { var x = 1");
    assert!(ast.is_none(), "an unterminated block aborts the parse");
    assert!(errors.iter().any(|e| e.code() == "E0102"));
    assert!(errors.iter().any(|e| e.message().contains("end of input")));
}

#[test]
fn test_vec2_with_wrong_arity_is_an_error() {
    let (_ast, errors) = parse_source_fail("var p = vec2(1);");
    assert!(errors.iter().any(|e| e.message().contains("Expected")));
}

#[test]
fn test_error_inside_nested_block_recovers_at_top_level() {
    let source = r#"
        function f(a) {
            var x = * 2;
        }
        var tail = 1;
    "#;
    let (ast, errors) = parse_source_fail(source);
    assert!(!errors.is_empty());
    let ast = ast.expect("recoverable errors still produce an AST");
    // 尾部的声明在恢复之后仍然被解析出来
    assert!(ast.body.iter().any(|stmt| matches!(
        &stmt.kind,
        Statement::VarDecl(decl) if decl.name.name == "tail"
    )));
}
