// 主词法分析器模块：SAAAM 源码在这里被切成 Token 流。
//
// 扫描器直接在源码切片上维护一个字节游标：`&source[pos..]` 就是还没
// 处理的部分，向前看任意多个字符都只是对这个尾部切片的只读访问。
// SAAAM 的 Token 全部由 ASCII 引导，游标只有在跳过字符串/注释里的
// 多字节字符时才会一次前进多个字节。

use super::token::*;
use crate::diagnostic::codes::{E0001_UNKNOWN_CHARACTER, E0002_UNTERMINATED_STRING, E0003_UNCLOSED_BLOCK_COMMENT};
use crate::diagnostic::{DiagnosticBag, Label, Span};

// --- 1. 扫描器本体 ---

/// SAAAM 的词法分析器。
pub struct Lexer<'a> {
    /// 完整的源代码。扫描过程中只读。
    source: &'a str,
    /// 词法错误都报告到这里，扫描本身从不中断。
    diagnostics: &'a mut DiagnosticBag,
    /// 当前正在扫描的 Token 的起始字节偏移。
    start_pos: usize,
    /// 游标：下一个还没被消费的字节的偏移。
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// 从一段源码出发建立扫描器，游标落在开头。
    pub fn new(source: &'a str, diagnostics: &'a mut DiagnosticBag) -> Self {
        Lexer {
            source,
            diagnostics,
            start_pos: 0,
            pos: 0,
        }
    }

    /// 消费 Lexer 并扫描出整个 Token 流。
    /// 返回的序列保证以一个（且仅一个）`Eof` Token 结束，
    /// 其位置恰好是 `source.len()`。
    pub fn scan_all_tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut token = self.scan_token();
        while token.kind != TokenKind::Eof {
            tokens.push(token);
            token = self.scan_token();
        }
        tokens.push(token);
        tokens
    }
}

// --- 2. 底层游标操作 ---

/// Lexer 的底层能力：围绕字节游标的字符读取与位置追踪。
trait LexerCore {
    /// 游标之后尚未扫描的源码尾部。
    fn rest(&self) -> &str;
    /// 当前字符（不前进）。到达末尾时返回 '\0'。
    fn current_char(&self) -> char;
    /// 当前字符后面的那个字符（不前进）。
    fn peek_char(&self) -> char;
    /// 消费当前字符，游标前进它的 UTF-8 宽度。
    fn advance(&mut self) -> char;
    /// 游标是否已经走到源码末尾。
    fn is_at_end(&self) -> bool;
    /// 用给定的种类和 `start_pos..pos` 这段范围构造一个 Token。
    fn make_token(&self, kind: TokenKind) -> Token;
    /// 当前字符等于 `expected` 时消费它并返回 `true`。
    fn match_char(&mut self, expected: char) -> bool;
}

impl<'a> LexerCore for Lexer<'a> {
    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn current_char(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn peek_char(&self) -> char {
        let mut tail = self.rest().chars();
        tail.next();
        tail.next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        match self.rest().chars().next() {
            Some(c) => {
                self.pos += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            span: Span::new(self.start_pos, self.pos),
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.current_char() != expected {
            return false;
        }
        self.advance();
        true
    }
}

// --- 3. Token 识别 ---

/// 高级的 Token 识别逻辑。
trait TokenScanner {
    /// 产出下一个 Token。
    fn scan_token(&mut self) -> Token;

    // --- 按 Token 种类划分的扫描辅助 ---

    /// 跳过 Token 之间的空白和注释。
    fn skip_whitespace_and_comments(&mut self);
    /// 扫描标识符、关键字或领域关键字。
    fn scan_identifier(&mut self) -> TokenKind;
    /// 扫描数字字面量（整数部分、小数部分、指数部分均可选）。
    fn scan_number(&mut self) -> TokenKind;
    /// 扫描字符串字面量，`quote` 为开始的引号（单引号或双引号皆可）。
    fn scan_string(&mut self, quote: char) -> TokenKind;
    /// 读取一个转义序列所表示的字符（反斜杠已被消费）。
    fn scan_escape_sequence(&mut self) -> char;
}

impl<'a> TokenScanner for Lexer<'a> {
    /// 识别的总入口：看一个字符，决定走哪条扫描路径。
    fn scan_token(&mut self) -> Token {
        // 外层循环只在遇到无法识别的字符时重来：报告错误、跳过一个字符、继续扫描。
        loop {
            self.skip_whitespace_and_comments();
            self.start_pos = self.pos;

            if self.is_at_end() {
                return self.make_token(TokenKind::Eof);
            }

            let c = self.advance();

            let kind = match c {
                // 标点 (Punctuation)
                '(' => TokenKind::Punct(Punct::LParen),
                ')' => TokenKind::Punct(Punct::RParen),
                ',' => TokenKind::Punct(Punct::Comma),
                ';' => TokenKind::Punct(Punct::Semicolon),

                // 括号 (Brackets)
                '[' => TokenKind::Bracket(Bracket::LBracket),
                ']' => TokenKind::Bracket(Bracket::RBracket),
                '{' => TokenKind::Bracket(Bracket::LBrace),
                '}' => TokenKind::Bracket(Bracket::RBrace),

                // `.` 有三种可能：`...`、`.5` 这样的数字、或者成员访问点号。
                '.' => {
                    if self.current_char() == '.' && self.peek_char() == '.' {
                        self.advance();
                        self.advance();
                        TokenKind::Operator(Operator::Ellipsis)
                    } else if self.current_char().is_ascii_digit() {
                        self.scan_number()
                    } else {
                        TokenKind::Punct(Punct::Dot)
                    }
                }

                // 操作符：先试 `op=` 的双字符形式，再落回单字符
                '+' => if self.match_char('=') { TokenKind::Operator(Operator::PlusAssign) } else { TokenKind::Operator(Operator::Plus) },
                '-' => if self.match_char('=') { TokenKind::Operator(Operator::MinusAssign) } else { TokenKind::Operator(Operator::Minus) },
                '*' => if self.match_char('=') { TokenKind::Operator(Operator::StarAssign) } else { TokenKind::Operator(Operator::Star) },
                '/' => if self.match_char('=') { TokenKind::Operator(Operator::SlashAssign) } else { TokenKind::Operator(Operator::Slash) },
                '%' => if self.match_char('=') { TokenKind::Operator(Operator::PercentAssign) } else { TokenKind::Operator(Operator::Percent) },
                '=' => if self.match_char('=') { TokenKind::Operator(Operator::Eq) } else { TokenKind::Operator(Operator::Assign) },
                '!' => if self.match_char('=') { TokenKind::Operator(Operator::NotEq) } else { TokenKind::Operator(Operator::Not) },
                '<' => if self.match_char('=') { TokenKind::Operator(Operator::LtEq) } else { TokenKind::Operator(Operator::Lt) },
                '>' => if self.match_char('=') { TokenKind::Operator(Operator::GtEq) } else { TokenKind::Operator(Operator::Gt) },
                '&' => {
                    if self.match_char('&') { TokenKind::Operator(Operator::AndAnd) }
                    else if self.match_char('=') { TokenKind::Operator(Operator::AmpAssign) }
                    else { TokenKind::Operator(Operator::Amp) }
                }
                '|' => {
                    if self.match_char('|') { TokenKind::Operator(Operator::OrOr) }
                    else if self.match_char('=') { TokenKind::Operator(Operator::PipeAssign) }
                    else { TokenKind::Operator(Operator::Pipe) }
                }
                '^' => if self.match_char('=') { TokenKind::Operator(Operator::CaretAssign) } else { TokenKind::Operator(Operator::Caret) },
                '?' => TokenKind::Operator(Operator::Question),
                ':' => TokenKind::Operator(Operator::Colon),

                // 字面量与标识符
                '\'' | '"' => self.scan_string(c),
                c if c.is_ascii_digit() => self.scan_number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),

                // 语言之外的字符
                _ => {
                    let span = Span::new(self.start_pos, self.pos);
                    let label = Label::new(span, format!("unexpected character '{}'", c));
                    self.diagnostics.error(&E0001_UNKNOWN_CHARACTER, label);
                    continue; // 报告错误后，继续扫描下一个有效的 Token
                }
            };

            return self.make_token(kind);
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.current_char();

            // 空白（含垂直制表符）
            if c.is_ascii_whitespace() || c == '\x0B' {
                self.advance();
                continue;
            }

            // 单行注释：吃到行尾为止，换行留给下一轮
            if self.rest().starts_with("//") {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
                continue;
            }

            // 块注释：吃到 `*/`；一直到文件末尾都没等到就报错
            if self.rest().starts_with("/*") {
                let comment_start = self.pos;
                self.advance();
                self.advance();
                loop {
                    if self.rest().starts_with("*/") {
                        self.advance();
                        self.advance();
                        break;
                    }
                    if self.is_at_end() {
                        let span = Span::new(comment_start, self.pos);
                        let label = Label::new(span, "the comment opened here is still open at the end of the file");
                        self.diagnostics.error(&E0003_UNCLOSED_BLOCK_COMMENT, label);
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        while self.current_char().is_ascii_alphanumeric() || self.current_char() == '_' {
            self.advance();
        }
        let text = &self.source[self.start_pos..self.pos];

        // 先查通用关键字，再查领域关键字，都不是才认为是普通标识符
        if let Some(keyword) = Keyword::lookup(text) {
            return TokenKind::Keyword(keyword);
        }
        if let Some(domain) = DomainKeyword::lookup(text) {
            return TokenKind::Domain(domain);
        }
        TokenKind::Identifier(text.to_string())
    }

    fn scan_number(&mut self) -> TokenKind {
        // 整数部分（首字符已经在 scan_token 里被消费了，可能是 `.5` 里的点）。
        while self.current_char().is_ascii_digit() {
            self.advance();
        }

        // 小数部分：只有 `.` 后面紧跟数字、而且还没出现过小数点时才属于这个数。
        let seen_dot = self.source[self.start_pos..self.pos].contains('.');
        if !seen_dot && self.current_char() == '.' && self.peek_char().is_ascii_digit() {
            self.advance(); // consume '.'
            while self.current_char().is_ascii_digit() {
                self.advance();
            }
        }

        // 指数部分：`e`/`E` 后面必须真的跟着（可带符号的）数字才算指数。
        if matches!(self.current_char(), 'e' | 'E') && exponent_follows(self.rest()) {
            self.advance(); // consume 'e'
            if matches!(self.current_char(), '+' | '-') {
                self.advance();
            }
            while self.current_char().is_ascii_digit() {
                self.advance();
            }
        }

        let text = &self.source[self.start_pos..self.pos];
        // 上面的扫描规则保证了 text 是 f64 可以解析的形式。
        TokenKind::Number(text.parse().unwrap_or(0.0))
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();
        loop {
            // 字符串里不允许出现未转义的换行；到行尾或文件尾还没闭合就报错，
            // 字面量在这里截断，换行本身留给后续扫描。
            if self.is_at_end() || self.current_char() == '\n' {
                let span = Span::new(self.start_pos, self.pos);
                let label = Label::new(span, "this string literal is missing its closing quote");
                self.diagnostics.error(&E0002_UNTERMINATED_STRING, label);
                break;
            }

            let c = self.advance();
            if c == quote {
                break;
            }
            if c == '\\' {
                let escaped = self.scan_escape_sequence();
                value.push(escaped);
            } else {
                value.push(c);
            }
        }
        TokenKind::Str(value)
    }

    fn scan_escape_sequence(&mut self) -> char {
        match self.advance() {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            // 其余转义（`\'`、`\"`、`\\` 以及任何未知转义）都表示字符本身
            other => other,
        }
    }
}

/// `rest` 以 `e`/`E` 开头时，判断它后面是不是一段合法的指数尾巴。
fn exponent_follows(rest: &str) -> bool {
    let mut tail = rest.chars().skip(1);
    match tail.next() {
        Some('+') | Some('-') => matches!(tail.next(), Some(d) if d.is_ascii_digit()),
        Some(d) => d.is_ascii_digit(),
        None => false,
    }
}
