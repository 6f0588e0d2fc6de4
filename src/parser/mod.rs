//! src/parser/mod.rs
//!
//! 这个模块是编译器语法分析阶段的公共接口。
//! 它的职责是接收一个 Token 流，并将其转换为一个抽象语法树 (AST)。

// `pub mod ast` 使 AST 定义可以被编译器其他部分访问。
pub mod ast;
mod main;

// 测试模块
#[cfg(test)]
mod test;

pub use main::{Parse, Parser};

use crate::diagnostic::DiagnosticBag;
use crate::lexer::Token;
use ast::Program;

/// 这是 parser 模块唯一的公共入口函数。
///
/// - 输入: lexer 产出的 Token 流（以 `Eof` 结束）和诊断收集器。
/// - 输出: `Some(Program)`，除非解析因块内的文件末尾而中止。
///
/// 普通语法错误不会让它返回 `None`：解析器会在语句边界同步并继续，
/// 所以有错误的源文件通常仍然能得到一个覆盖其余语句的 AST。
pub fn parse(tokens: &[Token], diagnostics: &mut DiagnosticBag) -> Option<Program> {
    Parser::new(tokens, diagnostics).parse()
}
