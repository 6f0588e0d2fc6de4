// src/analyzer/statement.rs
//
// 语句与声明的分析。表达式部分见 expression.rs。

use super::{report_never_used, Analyze, AnalysisContext};
use crate::diagnostic::codes::W0200_ALREADY_DECLARED;
use crate::diagnostic::Label;
use crate::intrinsics;
use crate::parser::ast::{FuncDecl, Node, Statement};

impl Analyze for Node<Statement> {
    fn analyze(&self, ctx: &mut AnalysisContext) {
        match &self.kind {
            Statement::VarDecl(decl) => {
                // 先分析初始化表达式再声明名字，
                // 这样 `var x = x;` 会如实地报告右边的 `x` 未声明。
                if let Some(init) = &decl.initializer {
                    init.analyze(ctx);
                }
                if !ctx.symbols.declare(&decl.name.name, decl.name.span) {
                    let label = Label::new(decl.name.span, "re-declared here");
                    ctx.diagnostics.warning_with_message(
                        &W0200_ALREADY_DECLARED,
                        format!("`{}` is already declared", decl.name.name),
                        label,
                    );
                }
            }

            Statement::FuncDecl(func) => analyze_func_decl(func, ctx),

            Statement::Block(block) => {
                // 程序使用扁平作用域：块不引入新的作用域层。
                let was_top_level = ctx.top_level;
                ctx.top_level = false;
                for stmt in &block.statements {
                    stmt.analyze(ctx);
                }
                ctx.top_level = was_top_level;
            }

            Statement::If(stmt) => {
                stmt.condition.analyze(ctx);
                analyze_nested(&stmt.then_branch, ctx);
                if let Some(else_branch) = &stmt.else_branch {
                    analyze_nested(else_branch, ctx);
                }
            }

            Statement::For(stmt) => {
                if let Some(init) = &stmt.init {
                    analyze_nested(init, ctx);
                }
                stmt.condition.analyze(ctx);
                if let Some(update) = &stmt.update {
                    update.analyze(ctx);
                }
                analyze_nested(&stmt.body, ctx);
            }

            Statement::While(stmt) => {
                stmt.condition.analyze(ctx);
                analyze_nested(&stmt.body, ctx);
            }

            Statement::DoWhile(stmt) => {
                analyze_nested(&stmt.body, ctx);
                stmt.condition.analyze(ctx);
            }

            Statement::Switch(stmt) => {
                stmt.discriminant.analyze(ctx);
                for case in &stmt.cases {
                    if let Some(test) = &case.kind.test {
                        test.analyze(ctx);
                    }
                    let was_top_level = ctx.top_level;
                    ctx.top_level = false;
                    for s in &case.kind.body {
                        s.analyze(ctx);
                    }
                    ctx.top_level = was_top_level;
                }
            }

            Statement::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    value.analyze(ctx);
                }
            }

            Statement::Expression(expr) => expr.analyze(ctx),

            Statement::Break | Statement::Continue | Statement::Empty => {}
        }
    }
}

/// 函数声明：名字进入外层作用域，参数进入新的函数作用域，
/// 然后在函数作用域里走完整个函数体。
fn analyze_func_decl(func: &FuncDecl, ctx: &mut AnalysisContext) {
    if !ctx.symbols.declare(&func.name.name, func.name.span) {
        let label = Label::new(func.name.span, "re-declared here");
        ctx.diagnostics.warning_with_message(
            &W0200_ALREADY_DECLARED,
            format!("`{}` is already declared", func.name.name),
            label,
        );
    }

    // 顶层的生命周期函数会被注册尾声引用，不算“从未使用”
    if ctx.top_level && intrinsics::lifecycle_registration(&func.name.name).is_some() {
        ctx.symbols.mark_declared_as_used(&func.name.name);
    }

    ctx.symbols.enter_scope();
    for param in &func.params {
        if !ctx.symbols.declare(&param.name, param.span) {
            let label = Label::new(param.span, "re-declared here");
            ctx.diagnostics.warning_with_message(
                &W0200_ALREADY_DECLARED,
                format!("`{}` is already declared", param.name),
                label,
            );
        }
    }

    let was_top_level = ctx.top_level;
    ctx.top_level = false;
    for stmt in &func.body.kind.statements {
        stmt.analyze(ctx);
    }
    ctx.top_level = was_top_level;

    let scope = ctx.symbols.exit_scope();
    report_never_used(&scope, ctx.diagnostics);
}

/// 走一个嵌套语句（循环体、分支体）。它们一定不再是程序顶层。
fn analyze_nested(stmt: &Node<Statement>, ctx: &mut AnalysisContext) {
    let was_top_level = ctx.top_level;
    ctx.top_level = false;
    stmt.analyze(ctx);
    ctx.top_level = was_top_level;
}
