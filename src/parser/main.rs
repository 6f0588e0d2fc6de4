//! SAAAM 语言的解析器：语句走递归下降，表达式用普拉特（绑定力）方法。
//! 输入是 lexer 的 Token 流，输出是 ast.rs 里定义的语法树。

use super::ast::*;
use crate::diagnostic::codes::*;
use crate::diagnostic::{DiagnosticBag, Label, Span};
use crate::intrinsics;
use crate::lexer::{Bracket, DomainKeyword, Keyword, Operator, Punct, Token, TokenKind};

// --- 1. 解析器状态 ---

/// 解析被打断的两种方式。
/// 普通语法错误只影响当前语句：在语句边界同步之后继续解析。
/// 块内遇到文件末尾则是致命的：程序的整体结构已经不可知，整个解析终止。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseInterrupt {
    Recoverable,
    FatalEof,
}

type ParseResult<T> = Result<T, ParseInterrupt>;

/// 解析器。除了 Token 流和诊断收集器，全部状态就是一个游标。
pub struct Parser<'a> {
    /// lexer 产出的完整 Token 流（以 `Eof` 收尾）。
    tokens: &'a [Token],
    /// 诊断信息收集器，用于报告所有解析错误与警告。
    diagnostics: &'a mut DiagnosticBag,
    /// 下一个待消费 Token 的下标。
    current: usize,
}

// --- 2. 解析逻辑的 Trait 分组 ---

/// `Parse` Trait：整个解析过程的发起点。
pub trait Parse {
    /// 消耗解析器并启动整个解析过程。
    /// 返回 `None` 当且仅当解析因块内的文件末尾而中止。
    fn parse(self) -> Option<Program>;
}

/// `StatementParser` Trait 负责解析各类语句与声明。
trait StatementParser {
    /// 分发并解析一条语句。
    fn parse_statement(&mut self) -> ParseResult<Node<Statement>>;
    /// 解析一个变量声明（不含结尾分号）。
    fn parse_var_declaration(&mut self) -> ParseResult<Node<VarDecl>>;
    /// 解析一个函数声明。
    fn parse_function_declaration(&mut self) -> ParseResult<Node<FuncDecl>>;
    /// 解析一个花括号代码块。
    fn parse_block_statement(&mut self) -> ParseResult<Node<BlockStatement>>;
    /// `if`，带可选的 `else` 分支。
    fn parse_if_statement(&mut self) -> ParseResult<Node<IfStatement>>;
    /// 解析 `for` 语句。
    fn parse_for_statement(&mut self) -> ParseResult<Node<ForStatement>>;
    /// `while` 循环。
    fn parse_while_statement(&mut self) -> ParseResult<Node<WhileStatement>>;
    /// 解析 `do ... while` 语句。
    fn parse_do_while_statement(&mut self) -> ParseResult<Node<DoWhileStatement>>;
    /// 解析 `switch` 语句。
    fn parse_switch_statement(&mut self) -> ParseResult<Node<SwitchStatement>>;
    /// `return`，返回值可缺省。
    fn parse_return_statement(&mut self) -> ParseResult<Node<ReturnStatement>>;
}

/// `ExpressionParser` Trait 覆盖表达式：普拉特主循环加各类原子。
trait ExpressionParser {
    /// 表达式入口；`min_bp` 是这里还愿意接受的最低绑定力。
    fn parse_expression(&mut self, min_bp: u8) -> ParseResult<Node<Expression>>;
    /// 前缀运算（`-x`、`!flag`、`+n`）。
    fn parse_prefix_expression(&mut self) -> ParseResult<Node<Expression>>;
    /// 解析中缀表达式（二元运算与赋值）。
    fn parse_infix_expression(&mut self, left: Node<Expression>) -> ParseResult<Node<Expression>>;
    /// 解析后缀表达式（函数调用 `f()`、成员访问 `a.b`、下标 `a[i]`）。
    fn parse_postfix_expression(&mut self, left: Node<Expression>) -> ParseResult<Node<Expression>>;
    /// 解析原子表达式（字面量、标识符、向量/对象/数组字面量、括号表达式）。
    fn parse_atom(&mut self) -> ParseResult<Node<Expression>>;
    /// 解析对象字面量的剩余部分（`{` 已被消费）。
    fn parse_object_literal(&mut self, start_span: Span) -> ParseResult<Node<Expression>>;
    /// 解析数组字面量的剩余部分（`[` 已被消费）。
    fn parse_array_literal(&mut self, start_span: Span) -> ParseResult<Node<Expression>>;
    /// 调用的实参列表。
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Node<Expression>>>;
}

/// `Util` Trait 汇集流操作、错误恢复和绑定力表这些公共零件。
trait Util {
    // --- 流操作 ---
    /// 当前 Token（不消费）。
    fn peek(&self) -> &Token;
    /// 最近一个被消费的 Token。
    fn previous(&self) -> &Token;
    /// 是否已经停在 `Eof` 上。
    fn is_at_end(&self) -> bool;
    /// 消费并返回当前 Token。
    fn advance(&mut self) -> &Token;
    /// 当前 Token 是否是给定种类。
    fn check(&self, kind: &TokenKind) -> bool;
    /// 种类匹配就顺手消费；返回是否消费了。
    fn match_token(&mut self, kind: &TokenKind) -> bool;
    /// 语法要求这里必须出现 `kind`：不在就报错并返回 `Err`。
    fn consume(&mut self, kind: &TokenKind, message: &str) -> ParseResult<&Token>;
    /// 消费一个标识符（领域关键字也按名字接受），失败时报告错误。
    fn expect_identifier_name(&mut self, what: &str) -> ParseResult<Ident>;
    /// 处理可省略的语句结尾分号：有就消费，没有则报告一个警告。
    fn optional_semicolon(&mut self, what: &str);

    // --- 恢复 ---
    /// 同步：丢弃 Token 直到（并包含）下一个 `;` 或 `}`，从下一条语句继续。
    fn synchronize(&mut self);

    // --- 绑定力表 ---
    /// 前缀运算符的右绑定力。
    fn prefix_binding_power(kind: &TokenKind) -> Option<((), u8)>;
    /// 中缀运算符的左右绑定力。
    fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)>;
    /// 后缀运算符的左绑定力。
    fn postfix_binding_power(kind: &TokenKind) -> Option<(u8, ())>;
    /// 判断一个运算符是否是语言承认的赋值运算符。
    fn is_assignment_op(op: Operator) -> bool;
}

// --- 3. 实现 ---

impl<'a> Parser<'a> {
    /// 在 Token 流的开头建立解析器。
    /// `tokens` 必须是 lexer 的完整输出：非空，且以 `Eof` 结束。
    pub fn new(tokens: &'a [Token], diagnostics: &'a mut DiagnosticBag) -> Self {
        Parser {
            tokens,
            diagnostics,
            current: 0,
        }
    }
}

impl<'a> Parse for Parser<'a> {
    fn parse(mut self) -> Option<Program> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(ParseInterrupt::Recoverable) => self.synchronize(),
                Err(ParseInterrupt::FatalEof) => return None,
            }
        }
        Some(Program { body })
    }
}

impl<'a> StatementParser for Parser<'a> {
    /// 语句分发：看一眼首 Token，转给对应的具体解析函数。
    /// 声明（`var`/`const`/`let`/`function`）在顶层和块内都会被识别。
    fn parse_statement(&mut self) -> ParseResult<Node<Statement>> {
        // 先把当前 Token 的种类拷出来，分发的各个分支就可以自由地推进解析器。
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::Keyword(Keyword::Var)
            | TokenKind::Keyword(Keyword::Const)
            | TokenKind::Keyword(Keyword::Let) => {
                let node = self.parse_var_declaration()?;
                self.optional_semicolon("variable declaration");
                Ok(node.map(Statement::VarDecl))
            }
            TokenKind::Keyword(Keyword::Function) => {
                Ok(self.parse_function_declaration()?.map(Statement::FuncDecl))
            }
            TokenKind::Keyword(Keyword::If) => {
                Ok(self.parse_if_statement()?.map(Statement::If))
            }
            TokenKind::Keyword(Keyword::For) => {
                Ok(self.parse_for_statement()?.map(Statement::For))
            }
            TokenKind::Keyword(Keyword::While) => {
                Ok(self.parse_while_statement()?.map(Statement::While))
            }
            TokenKind::Keyword(Keyword::Do) => {
                Ok(self.parse_do_while_statement()?.map(Statement::DoWhile))
            }
            TokenKind::Keyword(Keyword::Switch) => {
                Ok(self.parse_switch_statement()?.map(Statement::Switch))
            }
            TokenKind::Keyword(Keyword::Return) => {
                let node = self.parse_return_statement()?;
                self.optional_semicolon("`return` statement");
                Ok(node.map(Statement::Return))
            }
            TokenKind::Keyword(Keyword::Break) => {
                let span = self.advance().span;
                self.optional_semicolon("`break` statement");
                Ok(Node { kind: Statement::Break, span })
            }
            TokenKind::Keyword(Keyword::Continue) => {
                let span = self.advance().span;
                self.optional_semicolon("`continue` statement");
                Ok(Node { kind: Statement::Continue, span })
            }
            TokenKind::Bracket(Bracket::LBrace) => {
                Ok(self.parse_block_statement()?.map(Statement::Block))
            }
            TokenKind::Punct(Punct::Semicolon) => {
                let span = self.advance().span;
                Ok(Node { kind: Statement::Empty, span })
            }
            // 如果以上都不是，那么它只能是一个表达式语句
            _ => {
                let expr_node = self.parse_expression(0)?;
                let span = expr_node.span;
                self.optional_semicolon("expression statement");
                Ok(Node { kind: Statement::Expression(expr_node), span })
            }
        }
    }

    /// 解析一个变量声明。
    /// 例如: `var hp = 100` 或 `const GRAVITY_SCALE = 0.5`
    fn parse_var_declaration(&mut self) -> ParseResult<Node<VarDecl>> {
        // 1. 绑定形式由引导关键字决定
        let binding_token = self.advance().clone();
        let binding = match binding_token.kind {
            TokenKind::Keyword(Keyword::Var) => BindingKind::Mutable,
            TokenKind::Keyword(Keyword::Const) => BindingKind::Immutable,
            TokenKind::Keyword(Keyword::Let) => BindingKind::Lexical,
            _ => unreachable!("caller checked the leading keyword"),
        };

        // 2. 变量名
        let name = self.expect_identifier_name("a variable name")?;

        // 3. 可选的初始化表达式
        let initializer = if self.match_token(&TokenKind::Operator(Operator::Assign)) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let end_span = initializer.as_ref().map_or(name.span, |i| i.span);
        Ok(Node {
            kind: VarDecl {
                binding,
                name,
                initializer,
            },
            span: binding_token.span.merge(end_span),
        })
    }

    /// 解析一个完整的函数声明。
    /// 例如: `function on_collision(other) { ... }`
    fn parse_function_declaration(&mut self) -> ParseResult<Node<FuncDecl>> {
        // 1. 消费 `function` 关键字
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::Function), "Expected `function` keyword")?
            .span;

        // 2. 函数名（生命周期函数名是领域关键字，同样被接受）
        let name = self.expect_identifier_name("a function name")?;

        // 3. 参数列表
        self.consume(
            &TokenKind::Punct(Punct::LParen),
            "Expected `(` after the function name",
        )?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::Punct(Punct::RParen)) {
            loop {
                params.push(self.expect_identifier_name("a parameter name")?);
                if !self.match_token(&TokenKind::Punct(Punct::Comma)) {
                    break;
                }
            }
        }
        self.consume(
            &TokenKind::Punct(Punct::RParen),
            "Expected `)` after the parameter list",
        )?;

        // 4. 生命周期参数检查：`step`/`draw` 不带参数几乎总是疏忽
        if params.is_empty() {
            let hint = match name.name.as_str() {
                "step" => Some("`step` should accept a time-delta parameter"),
                "draw" => Some("`draw` should accept a drawing-context parameter"),
                _ => None,
            };
            if let Some(message) = hint {
                let label = Label::new(name.span, "declared here without parameters");
                self.diagnostics
                    .warning_with_message(&W0101_LIFECYCLE_PARAMETER, message, label);
            }
        }

        // 5. 函数体
        let body = self.parse_block_statement()?;
        let end_span = body.span;

        Ok(Node {
            kind: FuncDecl { name, params, body },
            span: start_span.merge(end_span),
        })
    }

    /// 花括号代码块。块还没闭合就碰到文件末尾是致命错误：整体结构已不可恢复。
    fn parse_block_statement(&mut self) -> ParseResult<Node<BlockStatement>> {
        let start_span = self
            .consume(&TokenKind::Bracket(Bracket::LBrace), "Expected `{` to begin a block")?
            .span;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::Bracket(Bracket::RBrace)) {
            if self.is_at_end() {
                let label = Label::new(start_span, "the block starting here is never closed");
                self.diagnostics.error(&E0102_UNEXPECTED_EOF, label);
                return Err(ParseInterrupt::FatalEof);
            }
            statements.push(self.parse_statement()?);
        }

        let end_span = self
            .consume(&TokenKind::Bracket(Bracket::RBrace), "Expected `}` to end a block")?
            .span;

        Ok(Node {
            kind: BlockStatement { statements },
            span: start_span.merge(end_span),
        })
    }

    /// `if` 语句，带可选的 `else` 分支。
    /// 例如: `if (hp <= 0) { destroy_object(this); } else { ... }`
    fn parse_if_statement(&mut self) -> ParseResult<Node<IfStatement>> {
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::If), "Expected `if` keyword")?
            .span;

        self.consume(&TokenKind::Punct(Punct::LParen), "Expected `(` after `if`")?;
        let condition = self.parse_expression(0)?;
        self.consume(&TokenKind::Punct(Punct::RParen), "Expected `)` after the `if` condition")?;

        let then_branch = Box::new(self.parse_statement()?);
        let mut end_span = then_branch.span;

        let else_branch = if self.match_token(&TokenKind::Keyword(Keyword::Else)) {
            let else_node = Box::new(self.parse_statement()?);
            end_span = else_node.span;
            Some(else_node)
        } else {
            None
        };

        Ok(Node {
            kind: IfStatement {
                condition,
                then_branch,
                else_branch,
            },
            span: start_span.merge(end_span),
        })
    }

    /// 解析 `for` 语句。三个子句之间的分号是必需的，不适用可省略规则。
    /// 条件缺失时合成一个 `true` 字面量，保证 AST 里的条件永远存在。
    fn parse_for_statement(&mut self) -> ParseResult<Node<ForStatement>> {
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::For), "Expected `for` keyword")?
            .span;
        self.consume(&TokenKind::Punct(Punct::LParen), "Expected `(` after `for`")?;

        // 1. 初始化子句
        let init = if self.match_token(&TokenKind::Punct(Punct::Semicolon)) {
            None
        } else {
            let stmt = match self.peek().kind.clone() {
                TokenKind::Keyword(Keyword::Var)
                | TokenKind::Keyword(Keyword::Const)
                | TokenKind::Keyword(Keyword::Let) => {
                    self.parse_var_declaration()?.map(Statement::VarDecl)
                }
                _ => {
                    let expr = self.parse_expression(0)?;
                    let span = expr.span;
                    Node {
                        kind: Statement::Expression(expr),
                        span,
                    }
                }
            };
            self.consume(
                &TokenKind::Punct(Punct::Semicolon),
                "Expected `;` after the `for` initializer",
            )?;
            Some(Box::new(stmt))
        };

        // 2. 条件子句
        let condition = if self.check(&TokenKind::Punct(Punct::Semicolon)) {
            let here = self.peek().span;
            Node {
                kind: Expression::Literal(Literal::Boolean(true)),
                span: Span::new(here.start, here.start),
            }
        } else {
            self.parse_expression(0)?
        };
        self.consume(
            &TokenKind::Punct(Punct::Semicolon),
            "Expected `;` after the `for` condition",
        )?;

        // 3. 更新子句
        let update = if self.check(&TokenKind::Punct(Punct::RParen)) {
            None
        } else {
            Some(self.parse_expression(0)?)
        };
        self.consume(&TokenKind::Punct(Punct::RParen), "Expected `)` after the `for` clauses")?;

        // 4. 循环体
        let body = Box::new(self.parse_statement()?);
        let end_span = body.span;

        Ok(Node {
            kind: ForStatement {
                init,
                condition,
                update,
                body,
            },
            span: start_span.merge(end_span),
        })
    }

    /// `while` 循环。
    fn parse_while_statement(&mut self) -> ParseResult<Node<WhileStatement>> {
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::While), "Expected `while` keyword")?
            .span;

        self.consume(&TokenKind::Punct(Punct::LParen), "Expected `(` after `while`")?;
        let condition = self.parse_expression(0)?;
        self.consume(&TokenKind::Punct(Punct::RParen), "Expected `)` after the `while` condition")?;

        let body = Box::new(self.parse_statement()?);
        let end_span = body.span;

        Ok(Node {
            kind: WhileStatement { condition, body },
            span: start_span.merge(end_span),
        })
    }

    /// 解析 `do ... while (...)` 语句。结尾的分号可省略（省略会得到警告）。
    fn parse_do_while_statement(&mut self) -> ParseResult<Node<DoWhileStatement>> {
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::Do), "Expected `do` keyword")?
            .span;

        let body = Box::new(self.parse_statement()?);

        self.consume(&TokenKind::Keyword(Keyword::While), "Expected `while` after the `do` body")?;
        self.consume(&TokenKind::Punct(Punct::LParen), "Expected `(` after `while`")?;
        let condition = self.parse_expression(0)?;
        let end_span = self
            .consume(&TokenKind::Punct(Punct::RParen), "Expected `)` after the `do ... while` condition")?
            .span;

        self.optional_semicolon("`do ... while` statement");

        Ok(Node {
            kind: DoWhileStatement { body, condition },
            span: start_span.merge(end_span),
        })
    }

    /// 解析 `switch` 语句。`default` 分支的 `test` 为 None。
    fn parse_switch_statement(&mut self) -> ParseResult<Node<SwitchStatement>> {
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::Switch), "Expected `switch` keyword")?
            .span;

        self.consume(&TokenKind::Punct(Punct::LParen), "Expected `(` after `switch`")?;
        let discriminant = self.parse_expression(0)?;
        self.consume(&TokenKind::Punct(Punct::RParen), "Expected `)` after the `switch` value")?;

        let body_start = self
            .consume(&TokenKind::Bracket(Bracket::LBrace), "Expected `{` to begin the `switch` body")?
            .span;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::Bracket(Bracket::RBrace)) {
            if self.is_at_end() {
                let label = Label::new(body_start, "the `switch` body starting here is never closed");
                self.diagnostics.error(&E0102_UNEXPECTED_EOF, label);
                return Err(ParseInterrupt::FatalEof);
            }

            // 每个分支以 `case expr:` 或 `default:` 开头
            let case_start = self.peek().span;
            let test = if self.match_token(&TokenKind::Keyword(Keyword::Case)) {
                let test = self.parse_expression(0)?;
                self.consume(&TokenKind::Operator(Operator::Colon), "Expected `:` after the `case` value")?;
                Some(test)
            } else if self.match_token(&TokenKind::Keyword(Keyword::Default)) {
                self.consume(&TokenKind::Operator(Operator::Colon), "Expected `:` after `default`")?;
                None
            } else {
                let found = self.peek();
                let label = Label::new(
                    found.span,
                    format!("expected `case` or `default`, but found {}", found.kind.to_string_for_error()),
                );
                self.diagnostics
                    .error_with_message(&E0100_UNEXPECTED_TOKEN, "Expected `case` or `default`", label);
                return Err(ParseInterrupt::Recoverable);
            };

            // 分支体一直延伸到下一个 `case`/`default` 或 `}`
            let mut body = Vec::new();
            while !self.check(&TokenKind::Keyword(Keyword::Case))
                && !self.check(&TokenKind::Keyword(Keyword::Default))
                && !self.check(&TokenKind::Bracket(Bracket::RBrace))
            {
                if self.is_at_end() {
                    let label = Label::new(body_start, "the `switch` body starting here is never closed");
                    self.diagnostics.error(&E0102_UNEXPECTED_EOF, label);
                    return Err(ParseInterrupt::FatalEof);
                }
                body.push(self.parse_statement()?);
            }

            let end_span = body.last().map_or(case_start, |s| s.span);
            cases.push(Node {
                kind: SwitchCase { test, body },
                span: case_start.merge(end_span),
            });
        }

        let end_span = self
            .consume(&TokenKind::Bracket(Bracket::RBrace), "Expected `}` to end the `switch` body")?
            .span;

        Ok(Node {
            kind: SwitchStatement {
                discriminant,
                cases,
            },
            span: start_span.merge(end_span),
        })
    }

    /// `return`。后面直接跟 `;`、`}` 或文件末尾时没有返回值。
    fn parse_return_statement(&mut self) -> ParseResult<Node<ReturnStatement>> {
        let start_span = self
            .consume(&TokenKind::Keyword(Keyword::Return), "Expected `return` keyword")?
            .span;

        let value = if self.check(&TokenKind::Punct(Punct::Semicolon))
            || self.check(&TokenKind::Bracket(Bracket::RBrace))
            || self.is_at_end()
        {
            None
        } else {
            Some(self.parse_expression(0)?)
        };

        let end_span = value.as_ref().map_or(start_span, |v| v.span);
        Ok(Node {
            kind: ReturnStatement { value },
            span: start_span.merge(end_span),
        })
    }
}

impl<'a> ExpressionParser for Parser<'a> {
    /// 普拉特方法的核心循环。
    fn parse_expression(&mut self, min_bp: u8) -> ParseResult<Node<Expression>> {
        // 表达式一定从一个前缀部分开始（前缀运算符或原子）
        let mut left = self.parse_prefix_expression()?;

        // 只要还有绑定力不低于 min_bp 的运算符，就继续向右扩张 left
        loop {
            let current_token = self.peek();

            // 检查后缀运算符（调用、成员访问、下标）
            if let Some((l_bp, ())) = Self::postfix_binding_power(&current_token.kind) {
                if l_bp < min_bp {
                    break;
                }
                left = self.parse_postfix_expression(left)?;
                continue;
            }

            // 中缀：二元运算与赋值
            if let Some((l_bp, _)) = Self::infix_binding_power(&current_token.kind) {
                if l_bp < min_bp {
                    break;
                }
                left = self.parse_infix_expression(left)?;
                continue;
            }

            break; // 再往后的内容不属于这个表达式了
        }

        Ok(left)
    }

    /// 解析前缀表达式，如 `-x`, `!flag`, `+n`。
    fn parse_prefix_expression(&mut self) -> ParseResult<Node<Expression>> {
        if let Some(((), r_bp)) = Self::prefix_binding_power(&self.peek().kind) {
            let op_token = self.advance().clone();
            let op = if let TokenKind::Operator(o) = op_token.kind {
                o
            } else {
                unreachable!()
            };

            // 操作数带着这个前缀运算符的右绑定力去递归
            let operand = self.parse_expression(r_bp)?;
            let span = op_token.span.merge(operand.span);

            let kind = Expression::Unary(UnaryExpression {
                operator: Node {
                    kind: op,
                    span: op_token.span,
                },
                operand: Box::new(operand),
            });
            Ok(Node { kind, span })
        } else {
            // 不是前缀运算符，就只能是一个原子
            self.parse_atom()
        }
    }

    /// 原子：字面量、标识符、向量/对象/数组字面量、括号分组。
    fn parse_atom(&mut self) -> ParseResult<Node<Expression>> {
        if self.is_at_end() {
            let label = Label::new(self.peek().span, "expected an expression before the end of the file");
            self.diagnostics.error(&E0101_EXPECTED_EXPRESSION, label);
            return Err(ParseInterrupt::Recoverable);
        }

        // 先窥视再消费：如果这个 Token 根本无法作为表达式开头，
        // 就把它留在原地，让 synchronize 按“消费到下一个 `;` 或 `}`”的规则处理。
        let token = self.peek().clone();
        match token.kind {
            // 字面量
            TokenKind::Number(n) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Literal(Literal::Number(n)),
                    span: token.span,
                })
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Literal(Literal::Str(s)),
                    span: token.span,
                })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Literal(Literal::Boolean(true)),
                    span: token.span,
                })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Literal(Literal::Boolean(false)),
                    span: token.span,
                })
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Literal(Literal::Null),
                    span: token.span,
                })
            }
            TokenKind::Keyword(Keyword::Undefined) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Literal(Literal::Undefined),
                    span: token.span,
                })
            }

            // `this` 引用
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(Node {
                    kind: Expression::ThisRef,
                    span: token.span,
                })
            }

            // 标识符
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Node {
                    kind: Expression::Identifier(Ident {
                        is_intrinsic: intrinsics::is_intrinsic(&name),
                        name,
                        span: token.span,
                    }),
                    span: token.span,
                })
            }

            // 向量字面量：`vec2(x, y)` / `vec3(x, y, z)`。
            // 不带参数列表的裸 `vec2` 按内建函数名处理。
            TokenKind::Domain(DomainKeyword::Vec2) => {
                self.advance();
                if self.check(&TokenKind::Punct(Punct::LParen)) {
                    self.advance(); // consume `(`
                    let x = self.parse_expression(0)?;
                    self.consume(&TokenKind::Punct(Punct::Comma), "Expected `,` between vector components")?;
                    let y = self.parse_expression(0)?;
                    let end_span = self
                        .consume(&TokenKind::Punct(Punct::RParen), "Expected `)` to close `vec2(...)`")?
                        .span;
                    Ok(Node {
                        kind: Expression::Vec2(Vec2Literal {
                            x: Box::new(x),
                            y: Box::new(y),
                        }),
                        span: token.span.merge(end_span),
                    })
                } else {
                    Ok(self.domain_name_as_identifier(DomainKeyword::Vec2, token.span))
                }
            }
            TokenKind::Domain(DomainKeyword::Vec3) => {
                self.advance();
                if self.check(&TokenKind::Punct(Punct::LParen)) {
                    self.advance(); // consume `(`
                    let x = self.parse_expression(0)?;
                    self.consume(&TokenKind::Punct(Punct::Comma), "Expected `,` between vector components")?;
                    let y = self.parse_expression(0)?;
                    self.consume(&TokenKind::Punct(Punct::Comma), "Expected `,` between vector components")?;
                    let z = self.parse_expression(0)?;
                    let end_span = self
                        .consume(&TokenKind::Punct(Punct::RParen), "Expected `)` to close `vec3(...)`")?
                        .span;
                    Ok(Node {
                        kind: Expression::Vec3(Vec3Literal {
                            x: Box::new(x),
                            y: Box::new(y),
                            z: Box::new(z),
                        }),
                        span: token.span.merge(end_span),
                    })
                } else {
                    Ok(self.domain_name_as_identifier(DomainKeyword::Vec3, token.span))
                }
            }

            // 其余领域关键字（`yield`、`state`、生命周期名等）在表达式位置都按标识符处理
            TokenKind::Domain(d) => {
                self.advance();
                Ok(self.domain_name_as_identifier(d, token.span))
            }

            // 括号表达式 `(...)`。分组信息不保留在 AST 里，
            // 发射器会按运算符优先级重新补上必要的括号。
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                let expr = self.parse_expression(0)?;
                let end_span = self
                    .consume(&TokenKind::Punct(Punct::RParen), "Expected `)` to close the grouped expression")?
                    .span;
                Ok(Node {
                    kind: expr.kind,
                    span: token.span.merge(end_span),
                })
            }

            // 对象字面量 `{ ... }`（表达式位置的 `{` 总是对象）
            TokenKind::Bracket(Bracket::LBrace) => {
                self.advance();
                self.parse_object_literal(token.span)
            }

            // 数组字面量 `[ ... ]`
            TokenKind::Bracket(Bracket::LBracket) => {
                self.advance();
                self.parse_array_literal(token.span)
            }

            // 剩下的种类都开不了一个表达式
            _ => {
                let label = Label::new(
                    token.span,
                    format!("{} cannot start an expression", token.kind.to_string_for_error()),
                );
                self.diagnostics.error(&E0101_EXPECTED_EXPRESSION, label);
                Err(ParseInterrupt::Recoverable)
            }
        }
    }

    /// 解析对象字面量的剩余部分。支持标识符/字符串/计算键、
    /// 简写属性（`{x}` 展开成 `{x: x}`）和结尾逗号；缺失的逗号产生警告。
    fn parse_object_literal(&mut self, start_span: Span) -> ParseResult<Node<Expression>> {
        let mut properties = Vec::new();

        while !self.check(&TokenKind::Bracket(Bracket::RBrace)) {
            if self.is_at_end() {
                let label = Label::new(start_span, "the object literal starting here is never closed");
                self.diagnostics.error(&E0102_UNEXPECTED_EOF, label);
                return Err(ParseInterrupt::FatalEof);
            }

            let key_token = self.peek().clone();
            let property = match key_token.kind {
                // 标识符键（含领域关键字），可以是简写属性
                TokenKind::Identifier(_) | TokenKind::Domain(_) => {
                    self.advance();
                    let name = match &key_token.kind {
                        TokenKind::Identifier(n) => n.clone(),
                        TokenKind::Domain(d) => d.as_str().to_string(),
                        _ => unreachable!(),
                    };
                    let value = if self.match_token(&TokenKind::Operator(Operator::Colon)) {
                        self.parse_expression(0)?
                    } else {
                        // 简写 `{x}` 等价于 `{x: x}`
                        Node {
                            kind: Expression::Identifier(Ident {
                                is_intrinsic: intrinsics::is_intrinsic(&name),
                                name: name.clone(),
                                span: key_token.span,
                            }),
                            span: key_token.span,
                        }
                    };
                    let span = key_token.span.merge(value.span);
                    Node {
                        kind: Property {
                            key: PropertyKey::Identifier(name),
                            value,
                        },
                        span,
                    }
                }
                // 字符串键
                TokenKind::Str(s) => {
                    self.advance();
                    self.consume(&TokenKind::Operator(Operator::Colon), "Expected `:` after the property key")?;
                    let value = self.parse_expression(0)?;
                    let span = key_token.span.merge(value.span);
                    Node {
                        kind: Property {
                            key: PropertyKey::Str(s),
                            value,
                        },
                        span,
                    }
                }
                // 计算键 `[expr]: value`
                TokenKind::Bracket(Bracket::LBracket) => {
                    self.advance();
                    let key_expr = self.parse_expression(0)?;
                    self.consume(&TokenKind::Bracket(Bracket::RBracket), "Expected `]` to close the computed key")?;
                    self.consume(&TokenKind::Operator(Operator::Colon), "Expected `:` after the property key")?;
                    let value = self.parse_expression(0)?;
                    let span = key_token.span.merge(value.span);
                    Node {
                        kind: Property {
                            key: PropertyKey::Computed(key_expr),
                            value,
                        },
                        span,
                    }
                }
                _ => {
                    let label = Label::new(
                        key_token.span,
                        format!("expected a property name, but found {}", key_token.kind.to_string_for_error()),
                    );
                    self.diagnostics
                        .error_with_message(&E0100_UNEXPECTED_TOKEN, "Expected a property name", label);
                    return Err(ParseInterrupt::Recoverable);
                }
            };
            properties.push(property);

            // 属性之间的逗号：缺失只是警告，解析继续
            if self.match_token(&TokenKind::Punct(Punct::Comma)) {
                continue;
            }
            if self.check(&TokenKind::Bracket(Bracket::RBrace)) {
                break;
            }
            let label = Label::new(self.peek().span, "expected a `,` before this property");
            self.diagnostics.warning(&W0102_MISSING_COMMA, label);
        }

        let end_span = self
            .consume(&TokenKind::Bracket(Bracket::RBrace), "Expected `}` to close the object literal")?
            .span;

        Ok(Node {
            kind: Expression::Object(ObjectLiteral { properties }),
            span: start_span.merge(end_span),
        })
    }

    /// 解析数组字面量的剩余部分。连续的逗号产生“洞”（None 元素）。
    fn parse_array_literal(&mut self, start_span: Span) -> ParseResult<Node<Expression>> {
        let mut elements = Vec::new();

        while !self.check(&TokenKind::Bracket(Bracket::RBracket)) {
            if self.is_at_end() {
                let label = Label::new(start_span, "the array literal starting here is never closed");
                self.diagnostics.error(&E0102_UNEXPECTED_EOF, label);
                return Err(ParseInterrupt::FatalEof);
            }

            // 一个前导逗号意味着这里有一个洞
            if self.match_token(&TokenKind::Punct(Punct::Comma)) {
                elements.push(None);
                continue;
            }

            elements.push(Some(self.parse_expression(0)?));

            if !self.match_token(&TokenKind::Punct(Punct::Comma)) {
                break;
            }
        }

        let end_span = self
            .consume(&TokenKind::Bracket(Bracket::RBracket), "Expected `]` to close the array literal")?
            .span;

        Ok(Node {
            kind: Expression::Array(ArrayLiteral { elements }),
            span: start_span.merge(end_span),
        })
    }

    /// 解析中缀表达式，如 `a + b`, `x = 10`, `hp -= dmg`。
    fn parse_infix_expression(&mut self, left: Node<Expression>) -> ParseResult<Node<Expression>> {
        let op_token = self.advance().clone();
        let op = if let TokenKind::Operator(o) = op_token.kind {
            o
        } else {
            unreachable!()
        };
        let (_, r_bp) = Self::infix_binding_power(&op_token.kind).unwrap();

        // 递归调用来解析右操作数（赋值是右结合的，r_bp 小于 l_bp）
        let right = self.parse_expression(r_bp)?;
        let span = left.span.merge(right.span);

        let kind = if Self::is_assignment_op(op) {
            Expression::Assignment(AssignmentExpression {
                operator: Node {
                    kind: op,
                    span: op_token.span,
                },
                target: Box::new(left),
                value: Box::new(right),
            })
        } else {
            Expression::Binary(BinaryExpression {
                left: Box::new(left),
                operator: Node {
                    kind: op,
                    span: op_token.span,
                },
                right: Box::new(right),
            })
        };

        Ok(Node { kind, span })
    }

    /// 解析后缀表达式：函数调用、成员访问、下标。
    fn parse_postfix_expression(&mut self, left: Node<Expression>) -> ParseResult<Node<Expression>> {
        match self.peek().kind.clone() {
            // 函数调用 `f(...)`
            TokenKind::Punct(Punct::LParen) => {
                let arguments = self.parse_call_arguments()?;
                let end_span = self.previous().span; // `)` 的位置
                let span = left.span.merge(end_span);
                Ok(Node {
                    kind: Expression::Call(CallExpression {
                        callee: Box::new(left),
                        arguments,
                    }),
                    span,
                })
            }
            // 成员访问 `obj.name`
            TokenKind::Punct(Punct::Dot) => {
                self.advance(); // consume `.`
                let name = self.expect_identifier_name("a property name")?;
                let span = left.span.merge(name.span);
                Ok(Node {
                    kind: Expression::Member(MemberExpression {
                        object: Box::new(left),
                        property: MemberProperty::Named(name),
                    }),
                    span,
                })
            }
            // 下标访问 `obj[expr]`
            TokenKind::Bracket(Bracket::LBracket) => {
                self.advance(); // consume `[`
                let index = self.parse_expression(0)?;
                let end_span = self
                    .consume(&TokenKind::Bracket(Bracket::RBracket), "Expected `]` to close the index expression")?
                    .span;
                let span = left.span.merge(end_span);
                Ok(Node {
                    kind: Expression::Member(MemberExpression {
                        object: Box::new(left),
                        property: MemberProperty::Computed(Box::new(index)),
                    }),
                    span,
                })
            }
            _ => unreachable!("caller checked the postfix binding power"),
        }
    }

    /// 解析函数调用的参数列表 `(arg1, arg2, ...)`。
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Node<Expression>>> {
        self.consume(&TokenKind::Punct(Punct::LParen), "Expected `(` for the call")?;

        let mut args = Vec::new();
        if self.check(&TokenKind::Punct(Punct::RParen)) {
            self.advance(); // 空参数列表 `()`
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression(0)?);
            if !self.match_token(&TokenKind::Punct(Punct::Comma)) {
                break;
            }
        }

        self.consume(&TokenKind::Punct(Punct::RParen), "Expected `)` after the arguments")?;
        Ok(args)
    }
}

impl<'a> Parser<'a> {
    /// 把一个领域关键字还原成表达式位置的标识符。
    /// `yield`/`signal`/`state` 走这里：它们被保留为领域关键字，
    /// 但本编译器核心不提供生成器语义，只按名字传递。
    fn domain_name_as_identifier(&self, d: DomainKeyword, span: Span) -> Node<Expression> {
        let name = d.as_str().to_string();
        Node {
            kind: Expression::Identifier(Ident {
                is_intrinsic: intrinsics::is_intrinsic(&name),
                name,
                span,
            }),
            span,
        }
    }
}

impl<'a> Util for Parser<'a> {
    // --- Token 流操作 ---

    /// 当前 Token。游标哪怕越过末尾，也稳定地落在结尾的 `Eof` 上。
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.current)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    /// 最近被消费掉的那个 Token。
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// 停在 `Eof` 上即视为流结束。
    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// 前移游标，交出刚刚越过的 Token。
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// 种类比较；到了 `Eof` 之后一律不匹配。
    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek().kind == kind
    }

    /// `check` 成立就顺手消费，返回是否消费了。
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 语法上必须出现 `kind` 的位置：不在就报 E0100，让调用方走恢复路径。
    fn consume(&mut self, kind: &TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            let label_msg = format!(
                "expected {}, but found {}",
                kind.to_string_for_error(),
                found.kind.to_string_for_error()
            );
            let label = Label::new(found.span, label_msg);
            self.diagnostics
                .error_with_message(&E0100_UNEXPECTED_TOKEN, message, label);
            Err(ParseInterrupt::Recoverable)
        }
    }

    /// 消费一个标识符并构造 `Ident` 节点。
    /// 领域关键字（`step`、`vec2` 等）出现在名字位置时按其字面名接受。
    fn expect_identifier_name(&mut self, what: &str) -> ParseResult<Ident> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Ident {
                    is_intrinsic: intrinsics::is_intrinsic(&name),
                    name,
                    span: token.span,
                })
            }
            TokenKind::Domain(d) => {
                self.advance();
                let name = d.as_str().to_string();
                Ok(Ident {
                    is_intrinsic: intrinsics::is_intrinsic(&name),
                    name,
                    span: token.span,
                })
            }
            _ => {
                let label = Label::new(
                    token.span,
                    format!("expected {}, but found {}", what, token.kind.to_string_for_error()),
                );
                self.diagnostics
                    .error_with_message(&E0100_UNEXPECTED_TOKEN, format!("Expected {}", what), label);
                Err(ParseInterrupt::Recoverable)
            }
        }
    }

    /// 语句结尾的分号是可省略的：有就消费，没有则只报告一个警告，绝不是错误。
    fn optional_semicolon(&mut self, what: &str) {
        if !self.match_token(&TokenKind::Punct(Punct::Semicolon)) {
            let label = Label::new(self.peek().span, "expected a `;` here");
            self.diagnostics.warning_with_message(
                &W0100_MISSING_SEMICOLON,
                format!("Missing semicolon after {}", what),
                label,
            );
        }
    }

    // --- 恢复 ---

    /// 错误之后按语句边界重新对齐：
    /// 丢弃 Token 直到（并包含）下一个 `;` 或 `}`，然后从下一条语句继续。
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            let token = self.advance();
            match token.kind {
                TokenKind::Punct(Punct::Semicolon) | TokenKind::Bracket(Bracket::RBrace) => return,
                _ => (),
            }
        }
    }

    // --- 绑定力表 ---

    /// 前缀：一元 `+`、`-`、`!`。
    fn prefix_binding_power(kind: &TokenKind) -> Option<((), u8)> {
        let bp = match kind {
            TokenKind::Operator(op) => match op {
                Operator::Plus | Operator::Minus | Operator::Not => 15,
                _ => return None,
            },
            _ => return None,
        };
        Some(((), bp))
    }

    /// 中缀。赋值 (2, 1) 右结合，其余都是左结合的普通梯度。
    fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            TokenKind::Operator(op) => match op {
                Operator::Assign
                | Operator::PlusAssign
                | Operator::MinusAssign
                | Operator::StarAssign
                | Operator::SlashAssign
                | Operator::PercentAssign => (2, 1),
                Operator::OrOr => (3, 4),
                Operator::AndAnd => (5, 6),
                Operator::Eq | Operator::NotEq => (7, 8),
                Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq => (9, 10),
                Operator::Plus | Operator::Minus => (11, 12),
                Operator::Star | Operator::Slash | Operator::Percent => (13, 14),
                _ => return None,
            },
            _ => return None,
        };
        Some(bp)
    }

    /// 后缀：调用、成员访问、下标，绑定力最高。
    fn postfix_binding_power(kind: &TokenKind) -> Option<(u8, ())> {
        let bp = match kind {
            TokenKind::Punct(Punct::LParen) => 16,        // 函数调用
            TokenKind::Punct(Punct::Dot) => 16,           // 成员访问
            TokenKind::Bracket(Bracket::LBracket) => 16,  // 下标
            _ => return None,
        };
        Some((bp, ()))
    }

    /// 语言承认的赋值运算符：`= += -= *= /= %=`。
    fn is_assignment_op(op: Operator) -> bool {
        matches!(
            op,
            Operator::Assign
                | Operator::PlusAssign
                | Operator::MinusAssign
                | Operator::StarAssign
                | Operator::SlashAssign
                | Operator::PercentAssign
        )
    }
}
