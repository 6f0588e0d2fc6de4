//! 静态分析模块。
//! 对 AST 做一次自顶向下的遍历，维护 §symbols 里的符号表，
//! 产出的诊断全部是警告：重复声明、使用未声明的名字、声明后从未使用、
//! 内建函数调用的参数个数可疑。分析永远不会让编译失败。

mod expression;
mod statement;
mod symbols;


use crate::diagnostic::codes::W0202_NEVER_USED;
use crate::diagnostic::{DiagnosticBag, Label};
use crate::parser::ast::Program;
use symbols::{Scope, SymbolTable};

// --- 核心抽象：上下文与 Trait ---

/// 分析上下文：把符号表和诊断收集器打包，传给各个节点的分析实现。
struct AnalysisContext<'a> {
    pub symbols: &'a mut SymbolTable,
    pub diagnostics: &'a mut DiagnosticBag,
    /// 当前是否位于程序顶层。
    /// 只有顶层的生命周期函数会被注册尾声引用，因此也只有它们被预先记为“已使用”。
    pub top_level: bool,
}

/// 各 AST 节点的静态分析入口。
trait Analyze {
    fn analyze(&self, ctx: &mut AnalysisContext);
}

// --- Analyzer 结构体与实现 ---

pub struct Analyzer<'a> {
    symbol_table: SymbolTable,
    diagnostics: &'a mut DiagnosticBag,
}

impl<'a> Analyzer<'a> {
    pub fn new(diagnostics: &'a mut DiagnosticBag) -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            diagnostics,
        }
    }

    /// 主入口：遍历整个程序，然后对程序作用域做收尾检查。
    pub fn analyze(mut self, program: &Program) {
        // 注意这里是重借用而不是移动：收尾检查还要用 diagnostics。
        let mut ctx = AnalysisContext {
            symbols: &mut self.symbol_table,
            diagnostics: &mut *self.diagnostics,
            top_level: true,
        };
        for stmt in &program.body {
            stmt.analyze(&mut ctx);
        }

        let global_scope = self.symbol_table.finish();
        report_never_used(&global_scope, self.diagnostics);
    }
}

/// 对一个刚刚关闭的作用域做收尾：声明了却从未使用的符号逐个报警告。
/// 按声明顺序报告，保证输出确定。
fn report_never_used(scope: &Scope, diagnostics: &mut DiagnosticBag) {
    for symbol in scope.iter() {
        if symbol.declared && !symbol.used {
            let label = Label::new(symbol.first_span, "declared here");
            diagnostics.warning_with_message(
                &W0202_NEVER_USED,
                format!("`{}` is declared but never used", symbol.name),
                label,
            );
        }
    }
}

/// 便捷入口：对一个完整程序做静态分析。
pub fn analyze(program: &Program, diagnostics: &mut DiagnosticBag) {
    Analyzer::new(diagnostics).analyze(program)
}
