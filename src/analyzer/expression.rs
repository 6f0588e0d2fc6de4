// src/analyzer/expression.rs
//
// 表达式的分析：标记符号使用、报告未声明的名字、
// 以及按内建名录检查引擎函数调用的参数个数。

use super::{Analyze, AnalysisContext};
use crate::diagnostic::codes::{W0201_UNDECLARED_USE, W0203_INTRINSIC_ARITY};
use crate::diagnostic::Label;
use crate::intrinsics;
use crate::parser::ast::{CallExpression, Expression, MemberProperty, Node, PropertyKey};

/// 在表达式位置按标识符解析、但不提供任何语义的领域关键字。
/// 生成器风格的写法（`yield` 等）超出了本编译器核心的范围，
/// 这里只是让它们不要被报成“未声明”。
const GENERATOR_STYLE_NAMES: [&str; 3] = ["yield", "signal", "state"];

impl Analyze for Node<Expression> {
    fn analyze(&self, ctx: &mut AnalysisContext) {
        match &self.kind {
            Expression::Identifier(id) => {
                if id.is_intrinsic || GENERATOR_STYLE_NAMES.contains(&id.name.as_str()) {
                    return;
                }
                if !ctx.symbols.mark_used(&id.name, id.span) {
                    let label = Label::new(id.span, "not declared anywhere in the script");
                    ctx.diagnostics.warning_with_message(
                        &W0201_UNDECLARED_USE,
                        format!("`{}` is used but not declared", id.name),
                        label,
                    );
                }
            }

            Expression::Literal(_) | Expression::ThisRef => {}

            Expression::Unary(unary) => unary.operand.analyze(ctx),

            Expression::Binary(binary) => {
                binary.left.analyze(ctx);
                binary.right.analyze(ctx);
            }

            Expression::Assignment(assign) => {
                assign.target.analyze(ctx);
                assign.value.analyze(ctx);
            }

            Expression::Call(call) => {
                call.callee.analyze(ctx);
                for arg in &call.arguments {
                    arg.analyze(ctx);
                }
                check_intrinsic_arity(call, ctx);
            }

            Expression::Member(member) => {
                member.object.analyze(ctx);
                // `obj.name` 里的 name 只是属性名，不是变量引用
                if let MemberProperty::Computed(index) = &member.property {
                    index.analyze(ctx);
                }
            }

            Expression::Object(object) => {
                for property in &object.properties {
                    if let PropertyKey::Computed(key) = &property.kind.key {
                        key.analyze(ctx);
                    }
                    property.kind.value.analyze(ctx);
                }
            }

            Expression::Array(array) => {
                for element in array.elements.iter().flatten() {
                    element.analyze(ctx);
                }
            }

            Expression::Vec2(v) => {
                v.x.analyze(ctx);
                v.y.analyze(ctx);
            }

            Expression::Vec3(v) => {
                v.x.analyze(ctx);
                v.y.analyze(ctx);
                v.z.analyze(ctx);
            }
        }
    }
}

/// 内建函数调用的参数个数检查。
/// 规则全部来自 `intrinsics::ARITY_RULES`；没有规则的内建函数不做检查。
fn check_intrinsic_arity(call: &CallExpression, ctx: &mut AnalysisContext) {
    let Expression::Identifier(id) = &call.callee.kind else {
        return;
    };
    if !id.is_intrinsic {
        return;
    }
    let Some(rule) = intrinsics::ARITY_RULES.get(id.name.as_str()) else {
        return;
    };

    let given = call.arguments.len();
    let too_few = given < rule.min;
    let too_many = rule.max.is_some_and(|max| given > max);
    if !too_few && !too_many {
        return;
    }

    let expected = match rule.max {
        Some(max) if max == rule.min => {
            format!("exactly {} argument{}", rule.min, if rule.min == 1 { "" } else { "s" })
        }
        _ => format!("at least {} arguments", rule.min),
    };
    let label = Label::new(id.span, format!("this call passes {} argument{}", given, if given == 1 { "" } else { "s" }));
    ctx.diagnostics.warning_with_message(
        &W0203_INTRINSIC_ARITY,
        format!(
            "`{}` expects {}, but {} {} given",
            id.name,
            expected,
            given,
            if given == 1 { "was" } else { "were" }
        ),
        label,
    );
}
