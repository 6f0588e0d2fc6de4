// In src/codegen/test.rs

use crate::compile;

// --- Test Harness ---

/// 一个完整的辅助函数，用于简化端到端测试。
///
/// 它接收源代码字符串，完成“词法 → 解析 → 静态分析 → 代码生成”的完整流程，
/// 并返回最终的目标脚本文本。
///
/// 如果编译失败，它会 panic 并显示错误，这在测试中是可接受的。
fn compile_ok(source: &str) -> String {
    let result = compile(source);
    assert!(
        result.success,
        "Compilation failed unexpectedly: {:?}",
        result.errors.iter().map(|e| e.message().to_string()).collect::<Vec<_>>()
    );
    result.output.expect("a successful compilation always has output")
}

// --- 端到端场景 ---

#[test]
fn test_hello_lifecycle() {
    // 三个生命周期函数 → 三个注册调用，按源码顺序
    let source = r#"
function create(){ }
function step(dt){ }
function draw(ctx){ }
"#;
    let result = compile(source);
    assert!(result.success);
    let output = result.output.unwrap();

    let create_pos = output.find("H.registerCreate(create)").expect("missing registerCreate");
    let step_pos = output.find("H.registerStep(step)").expect("missing registerStep");
    let draw_pos = output.find("H.registerDraw(draw)").expect("missing registerDraw");
    assert!(create_pos < step_pos && step_pos < draw_pos, "registrations follow source order");

    // 未使用的参数要有警告
    let messages: Vec<&str> = result.warnings.iter().map(|w| w.message()).collect();
    assert!(messages.iter().any(|m| m.contains("dt")), "warnings: {:?}", messages);
    assert!(messages.iter().any(|m| m.contains("ctx")), "warnings: {:?}", messages);
}

#[test]
fn test_intrinsic_rewrite() {
    let result = compile("var v = keyboard_check(vk_space);");
    assert!(result.success);
    let output = result.output.unwrap();

    assert!(
        output.contains("H.keyboardCheck(H.vk.space)"),
        "expected the rewritten call, got:\n{}",
        output
    );
    assert!(!output.contains("keyboard_check"), "the bare intrinsic name must not survive");
    assert!(!output.contains("vk_space"), "the bare key constant must not survive");
}

#[test]
fn test_vector_literal_expansion() {
    let output = compile_ok("var p = vec2(1, 2 + 3); p.x += 1;");
    assert!(
        output.contains("{ x: 1, y: 2 + 3 }"),
        "expected the expanded vector object, got:\n{}",
        output
    );
}

#[test]
fn test_vec3_literal_expansion() {
    let output = compile_ok("var c = vec3(255, 128, 0); c.x += 1;");
    assert!(output.contains("{ x: 255, y: 128, z: 0 }"), "got:\n{}", output);
}

#[test]
fn test_missing_semicolon_tolerated() {
    let source = "var a = 1\nvar b = 2;";
    let result = compile(source);

    assert!(result.success, "a missing semicolon never fails the compile");
    assert!(
        result.warnings.iter().any(|w| w.message().contains("Missing semicolon")),
        "expected a missing-terminator warning"
    );

    let ast = result.ast.unwrap();
    assert_eq!(ast.body.len(), 2, "both declarations are in the AST");
}

#[test]
fn test_unterminated_block_is_fatal() {
    let result = compile("function f(){ var x = 1");

    assert!(!result.success);
    assert!(result.errors.iter().any(|e| e.message().contains("end of input")));

    // 失败时的输出只包含注释，没有可执行代码
    let output = result.output.unwrap();
    assert!(
        output.lines().all(|line| line.is_empty() || line.starts_with("//")),
        "failure output must be comment-only:\n{}",
        output
    );
    assert!(output.contains("end of input"), "the banner lists the error messages");
}

#[test]
fn test_intrinsic_arity_warning_still_emits() {
    let result = compile(r#"draw_sprite("hero");"#);

    assert!(result.success, "an arity mismatch is only a warning");
    assert!(result.warnings.iter().any(|w| {
        w.message().contains("draw_sprite") && w.message().contains("argument")
    }));
    let output = result.output.unwrap();
    assert!(output.contains(r#"H.drawSprite("hero")"#), "got:\n{}", output);
}

// --- 包装与注册尾声 ---

#[test]
fn test_output_is_wrapped_in_host_scope() {
    let output = compile_ok("var x = 1; x += 1;");
    assert!(output.starts_with("(function (H) {"), "got:\n{}", output);
    assert!(output.trim_end().ends_with("})(H);"), "got:\n{}", output);
}

#[test]
fn test_no_lifecycle_no_registration() {
    let output = compile_ok("var x = 1; x += 1;");
    assert!(!output.contains("H.register"), "no registration without declarations");
}

#[test]
fn test_only_declared_lifecycles_are_registered() {
    let output = compile_ok("function step(dt){ position.x += dt; }");
    assert!(output.contains("H.registerStep(step)"));
    assert!(!output.contains("H.registerCreate"));
    assert!(!output.contains("H.registerDraw"));
    assert!(!output.contains("H.registerCollision"));
}

#[test]
fn test_on_collision_registration() {
    let output = compile_ok("function on_collision(other){ play_sound(other); }");
    assert!(output.contains("H.registerCollision(on_collision)"));
}

#[test]
fn test_nested_lifecycle_is_not_registered() {
    // 只有顶层声明才会被注册
    let source = r#"
        function outer() {
            function step(dt) { return dt; }
            return step;
        }
        outer();
    "#;
    let output = compile_ok(source);
    assert!(!output.contains("H.registerStep"), "nested declarations are not lifecycle hooks");
}

#[test]
fn test_duplicate_lifecycle_registers_once() {
    let source = "function step(dt){ return dt; }\nfunction step(dt){ return dt + 1; }";
    let result = compile(source);
    assert!(result.success);
    let output = result.output.unwrap();
    assert_eq!(output.matches("H.registerStep(step)").count(), 1);
    // 重复声明本身已经有警告
    assert!(result.warnings.iter().any(|w| w.message().contains("already declared")));
}

// --- 重写表的边界 ---

#[test]
fn test_unlisted_intrinsics_pass_through() {
    let output = compile_ok(r#"stop_sound("bgm"); var t = game_time; t += 1;"#);
    assert!(output.contains(r#"stop_sound("bgm")"#), "stop_sound is not in the host interface");
    assert!(output.contains("game_time"), "game_time is not rewritten");
    assert!(!output.contains("H.stopSound"));
}

#[test]
fn test_user_identifiers_pass_through() {
    let output = compile_ok("var my_speed = 3; my_speed += 1;");
    assert!(output.contains("var my_speed = 3;"));
}

#[test]
fn test_member_property_names_are_not_rewritten() {
    // 重写只作用于独立出现的标识符，属性名保持原样
    let output = compile_ok("position.delta_time = 1;");
    assert!(output.contains("position.delta_time"), "got:\n{}", output);
    assert!(!output.contains("H.deltaTime"));
}

#[test]
fn test_rewritten_intrinsic_variable() {
    let output = compile_ok("var elapsed = delta_time; elapsed += 1;");
    assert!(output.contains("var elapsed = H.deltaTime;"), "got:\n{}", output);
}

// --- 具体的发射形状 ---

#[test]
fn test_parentheses_are_regenerated_by_precedence() {
    let output = compile_ok("var x = (1 + 2) * 3;");
    assert!(output.contains("(1 + 2) * 3"), "grouping must survive re-emission:\n{}", output);

    let output = compile_ok("var x = 1 + 2 * 3;");
    assert!(output.contains("1 + 2 * 3"), "no spurious parentheses:\n{}", output);
}

#[test]
fn test_nested_unary_does_not_collapse() {
    let output = compile_ok("var x = 1; var y = -(-x); y += 1;");
    assert!(output.contains("-(-x)"), "`--x` would change meaning:\n{}", output);
}

#[test]
fn test_string_requoting() {
    let output = compile_ok(r#"play_sound('it\'s "loud"');"#);
    assert!(
        output.contains(r#"H.playSound("it's \"loud\"")"#),
        "single-quoted strings are re-emitted double-quoted:\n{}",
        output
    );
}

#[test]
fn test_compound_assignment_and_this() {
    let output = compile_ok("function on_collision(other){ this.hp -= other; }");
    assert!(output.contains("this.hp -= other;"), "got:\n{}", output);
}

#[test]
fn test_control_flow_emission() {
    let source = r#"
        var i = 0;
        for (var j = 0; j < 3; j += 1) { i += j; }
        while (i > 0) { i -= 1; }
        do { i += 1; } while (i < 2);
        switch (i) {
            case 1:
                break;
            default:
                i = 0;
        }
    "#;
    let output = compile_ok(source);
    assert!(output.contains("for (var j = 0; j < 3; j += 1) {"), "got:\n{}", output);
    assert!(output.contains("while (i > 0) {"));
    assert!(output.contains("} while (i < 2);"));
    assert!(output.contains("case 1:"));
    assert!(output.contains("default:"));
}

#[test]
fn test_array_holes_and_object_literals() {
    let output = compile_ok(r#"var a = [1, , 2]; var o = { hp: 10, "max hp": 12 }; a[0] = o.hp;"#);
    assert!(output.contains("[1, , 2]"), "got:\n{}", output);
    assert!(output.contains(r#"{ hp: 10, "max hp": 12 }"#), "got:\n{}", output);
}

#[test]
fn test_for_without_condition_emits_true() {
    let output = compile_ok("for (;;) { break; }");
    assert!(output.contains("for (; true; ) {"), "got:\n{}", output);
}

#[test]
fn test_number_formats() {
    let output = compile_ok("var a = 1e3; var b = 2.5; var c = .5; a = b + c;");
    assert!(output.contains("var a = 1000;"), "exponents print in plain decimal:\n{}", output);
    assert!(output.contains("var b = 2.5;"));
    assert!(output.contains("var c = 0.5;"));
}

// --- 失败输出与确定性 ---

#[test]
fn test_failure_banner_lists_all_errors() {
    let result = compile("var a = #; var b = @;");
    assert!(!result.success);
    assert!(result.errors.len() >= 2);

    let output = result.output.unwrap();
    assert!(output.contains("compilation failed with"));
    assert!(output.contains("1."));
    assert!(output.contains("2."));
}

#[test]
fn test_compile_is_deterministic() {
    let source = r#"
        var speed = 4;
        function create() { position.x = 0; }
        function step(dt) {
            if (keyboard_check(vk_right)) { position.x += speed * dt; }
        }
        function draw(ctx) { draw_sprite("hero", position.x, 0); }
    "#;
    let first = compile(source);
    let second = compile(source);

    assert_eq!(first.success, second.success);
    assert_eq!(first.output, second.output);
    let messages = |r: &crate::CompileResult| {
        r.warnings.iter().map(|w| w.message().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(messages(&first), messages(&second));
    assert_eq!(first.errors.len(), second.errors.len());
}
