// src/diagnostic/codes.rs

use crate::diagnostic::DiagnosticLevel;

/// Represents a specific diagnostic code with its associated information.
/// This struct serves as the single source of truth for all compiler diagnostics.
#[derive(Debug, Clone)]
pub struct ErrorCode {
    pub code: &'static str,
    pub level: DiagnosticLevel,
    pub message: &'static str,
    pub explanation: &'static str,
}

/*
E00xx: 词法分析 (Lexical Analysis) 错误。

E01xx: 语法分析 (Parsing / Syntax) 错误。

W01xx: 语法分析阶段的警告。

W02xx: 静态分析 (Static Analysis) 阶段的警告。
*/
// --- E00xx: Lexical Analysis Errors ---

pub const E0001_UNKNOWN_CHARACTER: ErrorCode = ErrorCode {
    code: "E0001",
    level: DiagnosticLevel::Error,
    message: "Unknown character",
    explanation: "The compiler encountered a character that is not part of the SAAAM language. \
                  The character is skipped and scanning continues with the next one, so a single \
                  stray symbol produces exactly one error.",
};

pub const E0002_UNTERMINATED_STRING: ErrorCode = ErrorCode {
    code: "E0002",
    level: DiagnosticLevel::Error,
    message: "Unterminated string literal",
    explanation: "A string literal must be closed with a matching quote on the same line. \
                  Raw newlines are not allowed inside strings; use the `\\n` escape instead.",
};

pub const E0003_UNCLOSED_BLOCK_COMMENT: ErrorCode = ErrorCode {
    code: "E0003",
    level: DiagnosticLevel::Error,
    message: "Unclosed block comment",
    explanation: "A `/*` comment was opened but the matching `*/` was never found before the \
                  end of the file.",
};

// --- E01xx: Syntax Analysis (Parsing) Errors ---

pub const E0100_UNEXPECTED_TOKEN: ErrorCode = ErrorCode {
    code: "E0100",
    level: DiagnosticLevel::Error,
    message: "Unexpected token",
    explanation: "The arrangement of tokens does not match any known grammar rule. The parser \
                  skips ahead to the next `;` or `}` and resumes with the following statement, \
                  so later parts of the file are still checked.",
};

pub const E0101_EXPECTED_EXPRESSION: ErrorCode = ErrorCode {
    code: "E0101",
    level: DiagnosticLevel::Error,
    message: "Expected an expression",
    explanation: "The parser reached a position where an expression is required (for example \
                  after `=` or inside a condition) but found a token that cannot begin one.",
};

pub const E0102_UNEXPECTED_EOF: ErrorCode = ErrorCode {
    code: "E0102",
    level: DiagnosticLevel::Error,
    message: "Unexpected end of input",
    explanation: "The file ended in the middle of a brace-delimited construct, such as a \
                  function body or a switch statement. This error is fatal: no output is \
                  generated because the overall structure of the program is unknown.",
};

// --- W01xx: Parsing Warnings ---

pub const W0100_MISSING_SEMICOLON: ErrorCode = ErrorCode {
    code: "W0100",
    level: DiagnosticLevel::Warning,
    message: "Missing semicolon",
    explanation: "Semicolons are optional after variable declarations, expression statements, \
                  `return`, `break` and `continue`, but omitting them is reported so that the \
                  style can be kept consistent.",
};

pub const W0101_LIFECYCLE_PARAMETER: ErrorCode = ErrorCode {
    code: "W0101",
    level: DiagnosticLevel::Warning,
    message: "Lifecycle function is missing its parameter",
    explanation: "`step` receives the frame's time delta and `draw` receives the drawing \
                  context. Declaring them without parameters usually means the argument the \
                  engine passes will be silently dropped.",
};

pub const W0102_MISSING_COMMA: ErrorCode = ErrorCode {
    code: "W0102",
    level: DiagnosticLevel::Warning,
    message: "Missing comma between object properties",
    explanation: "Object literal properties should be separated by commas. The parser accepts \
                  the property anyway, but the missing separator is reported.",
};

// --- W02xx: Static Analysis Warnings ---

pub const W0200_ALREADY_DECLARED: ErrorCode = ErrorCode {
    code: "W0200",
    level: DiagnosticLevel::Warning,
    message: "Symbol is already declared",
    explanation: "A variable or function with this name has already been declared in the same \
                  scope. The later declaration shadows the earlier one at run time, which is \
                  rarely intended.",
};

pub const W0201_UNDECLARED_USE: ErrorCode = ErrorCode {
    code: "W0201",
    level: DiagnosticLevel::Warning,
    message: "Symbol is used but not declared",
    explanation: "This name is read or written without a preceding declaration and is not one \
                  of the engine's intrinsic variables or functions. At run time it resolves to \
                  an implicit global, which is a common source of typo bugs.",
};

pub const W0202_NEVER_USED: ErrorCode = ErrorCode {
    code: "W0202",
    level: DiagnosticLevel::Warning,
    message: "Symbol is declared but never used",
    explanation: "The declaration has no remaining reads. Either the symbol is dead and can be \
                  removed, or a later use misspells its name.",
};

pub const W0203_INTRINSIC_ARITY: ErrorCode = ErrorCode {
    code: "W0203",
    level: DiagnosticLevel::Warning,
    message: "Engine function called with a suspicious number of arguments",
    explanation: "The engine's built-in functions have fixed signatures: the `keyboard_check` \
                  family takes exactly one key code, and `draw_sprite`/`draw_text` need at \
                  least a subject and a position. Calls that do not match are still emitted, \
                  but they will misbehave at run time.",
};
