//! 诊断系统：整个编译器的错误与警告都经过这里。
//!
//! 设计上分三层：
//!   * `codes.rs` 集中登记每一种诊断（编号、级别、默认消息、长解释）；
//!   * `Diagnostic` 只是对某个 `ErrorCode` 的一次具体引用，外加位置标注、
//!     可选的动态消息和补充说明；
//!   * `DiagnosticBag` 按发生顺序积累诊断。它不渲染、不持有源码，
//!     也从不让任何阶段中断——要不要继续由编译管线自己决定。
//! 终端渲染（ariadne 报告）只在 `render` 里发生，源码也只在那时才需要。

pub mod codes;

use ariadne::{Color, Label as AriadneLabel, Report, ReportKind, Source};
use codes::ErrorCode;
use std::ops::Range;

// --- 1. Span: 源代码位置 ---

/// 源代码里的一段字节范围。行列信息不在这里存，
/// 渲染报告时由 ariadne 现场扫描换行符恢复。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 取从 `self` 开头到 `other` 结尾的整段范围。
    /// 解析器靠它把“第一个 Token 到最后一个 Token”拼成节点的位置。
    pub fn merge(self, other: Span) -> Self {
        Span::new(self.start, other.end)
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

// --- 2. 级别与标注 ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// 诊断里的一条标注：一个位置加一句落在该位置上的说明。
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

// --- 3. Diagnostic ---

/// 一条具体的诊断。
/// 级别、编号、默认消息和帮助文本全部取自它引用的 `ErrorCode`，
/// 这里只补充这一次出现特有的东西：位置标注、覆盖消息（用来塞进
/// 具体的符号名之类的动态信息）和附加说明。
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: &'static ErrorCode,
    /// 为 `Some` 时代替 `code.message` 作为主消息。
    dynamic_message: Option<String>,
    labels: Vec<Label>,
    notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: &'static ErrorCode, primary_label: Label) -> Self {
        Self {
            code,
            dynamic_message: None,
            labels: vec![primary_label],
            notes: Vec::new(),
        }
    }

    pub fn error(code: &'static ErrorCode, primary_label: Label) -> Self {
        // 断言只用 Error 级别的代码来创建 Error 诊断
        assert!(
            code.level == DiagnosticLevel::Error,
            "Tried to create an error diagnostic with a non-error code."
        );
        Self::new(code, primary_label)
    }

    pub fn warning(code: &'static ErrorCode, primary_label: Label) -> Self {
        assert!(
            code.level == DiagnosticLevel::Warning,
            "Tried to create a warning diagnostic with a non-warning code."
        );
        Self::new(code, primary_label)
    }

    /// 用携带动态信息的消息（例如 "`x` is declared but never used"）
    /// 覆盖 `ErrorCode` 里的默认消息。
    #[must_use]
    pub fn with_dynamic_message(mut self, message: impl Into<String>) -> Self {
        self.dynamic_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_secondary_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.code.code
    }

    pub fn level(&self) -> DiagnosticLevel {
        self.code.level
    }

    pub fn message(&self) -> &str {
        self.dynamic_message.as_deref().unwrap_or(self.code.message)
    }

    /// 主标注的位置，即诊断对应的源码位置。
    pub fn span(&self) -> Span {
        self.labels.first().map(|l| l.span).unwrap_or_default()
    }

    /// 组装一份 ariadne 报告。
    /// 主标注按级别着色，其余标注都是蓝色的上下文；
    /// `ErrorCode` 的长解释进报告的 help 栏，附加说明进 note 栏。
    fn build_report<'a>(&self, file_name: &'a str) -> Report<'a, (&'a str, Range<usize>)> {
        let (report_kind, accent) = match self.level() {
            DiagnosticLevel::Error => (ReportKind::Error, Color::Red),
            DiagnosticLevel::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut builder = Report::build(report_kind, file_name, self.span().range().start)
            .with_code(self.code.code)
            .with_message(self.message())
            .with_help(self.code.explanation);

        for (index, label) in self.labels.iter().enumerate() {
            let paint = if index == 0 { accent } else { Color::Blue };
            builder = builder.with_label(
                AriadneLabel::new((file_name, label.span.range()))
                    .with_message(&label.message)
                    .with_color(paint),
            );
        }

        for note in &self.notes {
            builder = builder.with_note(note);
        }

        builder.finish()
    }
}

// --- 4. DiagnosticBag: 收集器 ---

/// “诊断背包”。所有阶段共享一个实例，按发生顺序收集诊断；
/// 它唯一回答的问题是“到目前为止有没有错误”。
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 报告一条使用默认消息的错误。
    pub fn error(&mut self, code: &'static ErrorCode, label: Label) {
        self.report(Diagnostic::error(code, label));
    }

    /// 报告一条覆盖了默认消息的错误。
    pub fn error_with_message(
        &mut self,
        code: &'static ErrorCode,
        message: impl Into<String>,
        label: Label,
    ) {
        self.report(Diagnostic::error(code, label).with_dynamic_message(message));
    }

    /// 报告一条使用默认消息的警告。
    pub fn warning(&mut self, code: &'static ErrorCode, label: Label) {
        self.report(Diagnostic::warning(code, label));
    }

    /// 报告一条覆盖了默认消息的警告。
    pub fn warning_with_message(
        &mut self,
        code: &'static ErrorCode,
        message: impl Into<String>,
        label: Label,
    ) {
        self.report(Diagnostic::warning(code, label).with_dynamic_message(message));
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level() == DiagnosticLevel::Error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// 按原始顺序把诊断拆成（错误，警告）两个列表，供编译结果使用。
    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.diagnostics
            .into_iter()
            .partition(|d| d.level() == DiagnosticLevel::Error)
    }
}

// --- 5. 终端渲染 ---

/// 把一组诊断渲染到 stderr。
/// 源码只在这里出现：行号、列号、代码片段都是渲染时从它算出来的。
pub fn render(file_name: &str, source: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let mut cache = (file_name, Source::from(source));
    for diagnostic in diagnostics {
        // 写 stderr 失败（例如管道被关掉）时没有可做的补救，直接忽略
        let _ = diagnostic.build_report(file_name).eprint(&mut cache);
    }
}
