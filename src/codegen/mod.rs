//! 代码生成模块。
//! 纯语法制导的文本发射：把（已通过解析的）AST 重新打印为目标脚本，
//! 同时完成三件 SAAAM 特有的改写：
//!   1. 向量字面量展开成 `{ x: ..., y: ... }` 形式的对象；
//!   2. 重写表里的内建名换成宿主命名空间 `H` 下的目标写法；
//!   3. 整个程序包进一个接收 `H` 的作用域，并在末尾为每个
//!      顶层生命周期函数追加一次注册调用。
//! 这里不做任何进一步的分析；发射器假定传入的 AST 是良构的。

// 测试模块
#[cfg(test)]
mod test;

use crate::intrinsics;
use crate::lexer::Operator;
use crate::parser::ast::*;

// --- 发射器 ---

/// 代码生成器。持有输出缓冲和当前缩进层级。
pub struct CodeGen {
    out: String,
    indent: usize,
}

impl CodeGen {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    /// 顶层入口：发射完整的程序，包括作用域包装和注册尾声。
    pub fn run(mut self, program: &Program) -> String {
        self.line("(function (H) {");
        self.indent += 1;
        for stmt in &program.body {
            self.emit_statement(stmt);
        }
        self.emit_epilogue(program);
        self.indent -= 1;
        self.line("})(H);");
        self.out
    }

    // --- 行级输出 ---

    /// 按当前缩进输出一行。缩进是每层两个空格。
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    // --- 语句 ---

    fn emit_statement(&mut self, stmt: &Node<Statement>) {
        match &stmt.kind {
            Statement::VarDecl(decl) => {
                let text = match &decl.initializer {
                    Some(init) => format!(
                        "{} {} = {};",
                        decl.binding,
                        decl.name.name,
                        self.expr_text(init, 0)
                    ),
                    None => format!("{} {};", decl.binding, decl.name.name),
                };
                self.line(&text);
            }

            Statement::FuncDecl(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                self.line(&format!("function {}({}) {{", func.name.name, params.join(", ")));
                self.indent += 1;
                for s in &func.body.kind.statements {
                    self.emit_statement(s);
                }
                self.indent -= 1;
                self.line("}");
            }

            Statement::Block(block) => {
                self.line("{");
                self.indent += 1;
                for s in &block.statements {
                    self.emit_statement(s);
                }
                self.indent -= 1;
                self.line("}");
            }

            Statement::If(s) => {
                self.line(&format!("if ({}) {{", self.expr_text(&s.condition, 0)));
                self.emit_braced_body(&s.then_branch);
                match &s.else_branch {
                    Some(else_branch) => {
                        self.line("} else {");
                        self.emit_braced_body(else_branch);
                        self.line("}");
                    }
                    None => self.line("}"),
                }
            }

            Statement::For(s) => {
                let init = s.init.as_ref().map_or(String::new(), |i| self.for_init_text(i));
                let condition = self.expr_text(&s.condition, 0);
                let update = s.update.as_ref().map_or(String::new(), |u| self.expr_text(u, 0));
                self.line(&format!("for ({}; {}; {}) {{", init, condition, update));
                self.emit_braced_body(&s.body);
                self.line("}");
            }

            Statement::While(s) => {
                self.line(&format!("while ({}) {{", self.expr_text(&s.condition, 0)));
                self.emit_braced_body(&s.body);
                self.line("}");
            }

            Statement::DoWhile(s) => {
                self.line("do {");
                self.emit_braced_body(&s.body);
                self.line(&format!("}} while ({});", self.expr_text(&s.condition, 0)));
            }

            Statement::Switch(s) => {
                self.line(&format!("switch ({}) {{", self.expr_text(&s.discriminant, 0)));
                self.indent += 1;
                for case in &s.cases {
                    match &case.kind.test {
                        Some(test) => self.line(&format!("case {}:", self.expr_text(test, 0))),
                        None => self.line("default:"),
                    }
                    self.indent += 1;
                    for body_stmt in &case.kind.body {
                        self.emit_statement(body_stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.line("}");
            }

            Statement::Return(s) => {
                let text = match &s.value {
                    Some(value) => format!("return {};", self.expr_text(value, 0)),
                    None => "return;".to_string(),
                };
                self.line(&text);
            }

            Statement::Break => self.line("break;"),
            Statement::Continue => self.line("continue;"),
            Statement::Empty => self.line(";"),

            Statement::Expression(expr) => {
                let text = self.expr_text(expr, 0);
                self.line(&format!("{};", text));
            }
        }
    }

    /// 控制流语句的主体统一发射为花括号块：
    /// 单条语句的主体也会被放进块里，输出永远是良构的。
    fn emit_braced_body(&mut self, stmt: &Node<Statement>) {
        self.indent += 1;
        if let Statement::Block(block) = &stmt.kind {
            for s in &block.statements {
                self.emit_statement(s);
            }
        } else {
            self.emit_statement(stmt);
        }
        self.indent -= 1;
    }

    /// `for` 头部的初始化子句是不带分号、不换行的内联语句。
    fn for_init_text(&self, stmt: &Node<Statement>) -> String {
        match &stmt.kind {
            Statement::VarDecl(decl) => match &decl.initializer {
                Some(init) => format!(
                    "{} {} = {}",
                    decl.binding,
                    decl.name.name,
                    self.expr_text(init, 0)
                ),
                None => format!("{} {}", decl.binding, decl.name.name),
            },
            Statement::Expression(expr) => self.expr_text(expr, 0),
            // 解析器只会在 for 头部放变量声明或表达式语句
            _ => String::new(),
        }
    }

    /// 注册尾声：每个在顶层声明过的生命周期函数得到一次注册调用，
    /// 按源码顺序，每个名字至多一次。没有声明就没有注册。
    fn emit_epilogue(&mut self, program: &Program) {
        let mut seen: Vec<&str> = Vec::new();
        for stmt in &program.body {
            if let Statement::FuncDecl(func) = &stmt.kind {
                if let Some(register) = intrinsics::lifecycle_registration(&func.name.name) {
                    if !seen.contains(&func.name.name.as_str()) {
                        seen.push(func.name.name.as_str());
                        self.line(&format!("H.{}({});", register, func.name.name));
                    }
                }
            }
        }
    }

    // --- 表达式 ---

    /// 把表达式打印成文本。`min_bp` 是上下文要求的最低优先级：
    /// 当节点自身的优先级低于它时加括号，保证输出的求值顺序与 AST 一致
    /// （解析时括号分组不保留，在这里按需重建）。
    fn expr_text(&self, expr: &Node<Expression>, min_bp: u8) -> String {
        let text = match &expr.kind {
            Expression::Literal(lit) => literal_text(lit),

            Expression::Identifier(id) => rewrite_identifier(&id.name),

            Expression::ThisRef => "this".to_string(),

            Expression::Unary(unary) => {
                // 操作数的下限高于一元优先级：嵌套的一元运算会被括起来，
                // 避免 `- -x` 被连写成 `--x`。
                format!("{}{}", unary.operator.kind, self.expr_text(&unary.operand, UNARY_BP + 1))
            }

            Expression::Binary(binary) => {
                let bp = binary_bp(binary.operator.kind);
                format!(
                    "{} {} {}",
                    self.expr_text(&binary.left, bp),
                    binary.operator.kind,
                    self.expr_text(&binary.right, bp + 1)
                )
            }

            Expression::Assignment(assign) => {
                format!(
                    "{} {} {}",
                    self.expr_text(&assign.target, POSTFIX_BP),
                    assign.operator.kind,
                    self.expr_text(&assign.value, ASSIGN_BP)
                )
            }

            Expression::Call(call) => {
                let args: Vec<String> = call
                    .arguments
                    .iter()
                    .map(|a| self.expr_text(a, 0))
                    .collect();
                format!("{}({})", self.expr_text(&call.callee, POSTFIX_BP), args.join(", "))
            }

            Expression::Member(member) => {
                let object = self.expr_text(&member.object, POSTFIX_BP);
                match &member.property {
                    MemberProperty::Named(name) => format!("{}.{}", object, name.name),
                    MemberProperty::Computed(index) => {
                        format!("{}[{}]", object, self.expr_text(index, 0))
                    }
                }
            }

            Expression::Object(object) => {
                if object.properties.is_empty() {
                    "{}".to_string()
                } else {
                    let props: Vec<String> = object
                        .properties
                        .iter()
                        .map(|p| {
                            let key = match &p.kind.key {
                                PropertyKey::Identifier(name) => name.clone(),
                                PropertyKey::Str(s) => quote_string(s),
                                PropertyKey::Computed(e) => format!("[{}]", self.expr_text(e, 0)),
                            };
                            format!("{}: {}", key, self.expr_text(&p.kind.value, 0))
                        })
                        .collect();
                    format!("{{ {} }}", props.join(", "))
                }
            }

            Expression::Array(array) => {
                let elements: Vec<String> = array
                    .elements
                    .iter()
                    .map(|e| match e {
                        Some(expr) => self.expr_text(expr, 0),
                        None => String::new(), // 洞在目标语言里同样写作空元素
                    })
                    .collect();
                format!("[{}]", elements.join(", "))
            }

            Expression::Vec2(v) => format!(
                "{{ x: {}, y: {} }}",
                self.expr_text(&v.x, 0),
                self.expr_text(&v.y, 0)
            ),

            Expression::Vec3(v) => format!(
                "{{ x: {}, y: {}, z: {} }}",
                self.expr_text(&v.x, 0),
                self.expr_text(&v.y, 0),
                self.expr_text(&v.z, 0)
            ),
        };

        if expr_bp(&expr.kind) < min_bp {
            format!("({})", text)
        } else {
            text
        }
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

// --- 优先级表（与解析器的绑定力一致） ---

const ASSIGN_BP: u8 = 2;
const UNARY_BP: u8 = 15;
const POSTFIX_BP: u8 = 17;
const PRIMARY_BP: u8 = 18;

fn binary_bp(op: Operator) -> u8 {
    match op {
        Operator::OrOr => 3,
        Operator::AndAnd => 5,
        Operator::Eq | Operator::NotEq => 7,
        Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq => 9,
        Operator::Plus | Operator::Minus => 11,
        Operator::Star | Operator::Slash | Operator::Percent => 13,
        // 其余运算符不会出现在 Binary 节点里
        _ => PRIMARY_BP,
    }
}

/// 节点自身的结合优先级。
fn expr_bp(expr: &Expression) -> u8 {
    match expr {
        Expression::Assignment(_) => ASSIGN_BP,
        Expression::Binary(b) => binary_bp(b.operator.kind),
        Expression::Unary(_) => UNARY_BP,
        Expression::Call(_) | Expression::Member(_) => POSTFIX_BP,
        _ => PRIMARY_BP,
    }
}

// --- 叶子文本 ---

/// 标识符重写：重写表里的名字换成 `H` 下的目标写法，其余原样透传。
fn rewrite_identifier(name: &str) -> String {
    match intrinsics::REWRITE_TABLE.get(name) {
        Some(rewritten) => (*rewritten).to_string(),
        None => name.to_string(),
    }
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Number(n) => number_text(*n),
        Literal::Str(s) => quote_string(s),
        Literal::Boolean(true) => "true".to_string(),
        Literal::Boolean(false) => "false".to_string(),
        Literal::Null => "null".to_string(),
        Literal::Undefined => "undefined".to_string(),
    }
}

/// 数字按十进制打印。f64 的 Display 不用科学计数法，正好符合要求；
/// 溢出成无穷的字面量写成目标语言的 `Infinity`。
fn number_text(n: f64) -> String {
    if n.is_infinite() {
        return "Infinity".to_string();
    }
    format!("{}", n)
}

/// 字符串统一用双引号重新引起来，内部的引号和控制字符转义。
fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// 顶层代码生成函数：给定良构的 AST，返回目标脚本文本。
pub fn codegen(program: &Program) -> String {
    CodeGen::new().run(program)
}
