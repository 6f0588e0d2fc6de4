//! saaamc：SAAAM 游戏脚本编译器核心。
//! 管线是经典的四段式：词法 → 语法 → 静态分析 → 代码生成，
//! 所有阶段共享同一个 `DiagnosticBag`。`compile` 是唯一的公共入口，
//! 它是纯函数：同样的源码永远得到同样的输出、同样的诊断序列。

pub mod diagnostic;
pub mod intrinsics;
pub mod lexer;
pub mod parser;
pub mod analyzer;
pub mod codegen;

use diagnostic::{Diagnostic, DiagnosticBag};
use parser::ast::Program;

/// 一次编译的完整结果。
#[derive(Debug)]
pub struct CompileResult {
    /// 没有任何错误、并且产出了 AST 时为 `true`。警告不影响它。
    pub success: bool,
    /// 目标脚本文本。编译失败时是一个只含注释的诊断头，不含可执行代码。
    pub output: Option<String>,
    /// 所有错误，按发生顺序。
    pub errors: Vec<Diagnostic>,
    /// 所有警告，按发生顺序。
    pub warnings: Vec<Diagnostic>,
    /// 解析产出的 AST；只有致命的语法中止会让它缺席。
    pub ast: Option<Program>,
}

/// 编译一段 SAAAM 源代码。
///
/// # Arguments
/// * `source` - 要编译的源代码。
///
/// # Returns
/// `CompileResult`。调用方约定：
/// * `success == true` 时 `output` 一定是可执行的目标脚本；
/// * `success == false` 时 `output` 只包含列出全部错误的注释头。
pub fn compile(source: &str) -> CompileResult {
    let mut diagnostics = DiagnosticBag::new();

    // 1. 词法分析
    // lexer 总是返回一个以 Eof 结束的 Token 流，词法错误已经进了诊断背包。
    let tokens = lexer::lex(source, &mut diagnostics);

    // 2. 语法分析
    // 即使有词法错误也继续解析，它可能会发现更多问题。
    // 只有块内遇到文件末尾这样的致命错误才会让 parse 返回 None。
    let ast = parser::parse(&tokens, &mut diagnostics);

    // 3. 静态分析（只产生警告，永远不会让编译失败）
    if let Some(program) = &ast {
        analyzer::analyze(program, &mut diagnostics);
    }

    // 4. 代码生成：只有在完全没有错误时才发射
    let has_errors = diagnostics.has_errors();
    let emitted = match &ast {
        Some(program) if !has_errors => Some(codegen::codegen(program)),
        _ => None,
    };

    let (errors, warnings) = diagnostics.into_parts();
    let success = emitted.is_some();
    let output = match emitted {
        Some(text) => Some(text),
        None => Some(failure_banner(&errors)),
    };

    CompileResult {
        success,
        output,
        errors,
        warnings,
        ast,
    }
}

/// 编译失败时的输出：逐条列出错误消息的注释头。
fn failure_banner(errors: &[Diagnostic]) -> String {
    let mut banner = format!("// SAAAM compilation failed with {} error(s):\n", errors.len());
    for (index, error) in errors.iter().enumerate() {
        banner.push_str(&format!("//   {}. {}\n", index + 1, error.message()));
    }
    banner
}
