//! Ex error taxonomy.
//!
//! Every variant renders as the message a vi-like editor shows the user,
//! including its `Exxx:` number where one exists.

use thiserror::Error;

/// An error raised while parsing, defining, or executing Ex statements.
#[derive(Debug, Error)]
pub enum ExError {
    // ── Command dispatch ────────────────────────────────────────────────────
    #[error("E492: Not an editor command: {0}")]
    NotAnEditorCommand(String),
    #[error("Recursion detected, maximum alias depth reached")]
    AliasDepthExceeded,

    // ── Alias definition ────────────────────────────────────────────────────
    #[error("E176: Invalid number of arguments")]
    InvalidArgumentCount,
    #[error("E183: User defined commands must start with an uppercase letter")]
    AliasMustStartUppercase,
    #[error("E183: User defined command name is missing")]
    MissingAliasName,
    #[error("E841: Reserved name, cannot be used for user defined command")]
    ReservedAliasName,
    #[error("E174: Command already exists: add ! to replace it")]
    AliasAlreadyExists,
    #[error("E184: No such user-defined command: {0}")]
    NoSuchAlias(String),

    // ── Argument / range policy ─────────────────────────────────────────────
    #[error("E471: Argument required")]
    ArgumentRequired,
    #[error("E488: Trailing characters: {0}")]
    TrailingCharacters(String),
    #[error("E481: No range allowed")]
    NoRangeAllowed,
    #[error("E16: Invalid range")]
    InvalidRange,

    // ── Control-flow structure ──────────────────────────────────────────────
    #[error("E587: :break without :while or :for")]
    BreakOutsideLoop,
    #[error("E586: :continue without :while or :for")]
    ContinueOutsideLoop,
    #[error("E170: Missing :{0}")]
    MissingEnd(&'static str),
    #[error("E171: Missing :endif")]
    MissingEndif,
    #[error("E588: :{0} without :{1}")]
    EndWithoutStart(&'static str, &'static str),
    #[error("E580: :endif without :if")]
    EndifWithoutIf,
    #[error("E581: :else without :if")]
    ElseWithoutIf,
    #[error("E582: :elseif without :if")]
    ElseifWithoutIf,
    #[error("E583: multiple :else")]
    MultipleElse,
    #[error("E584: :elseif after :else")]
    ElseifAfterElse,
    #[error("E690: Missing \"in\" after :for")]
    MissingIn,

    // ── Expressions and variables ───────────────────────────────────────────
    #[error("E15: Invalid expression: \"{0}\"")]
    InvalidExpression(String),
    #[error("E121: Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("E117: Unknown function: {0}")]
    UnknownFunction(String),
    #[error("E118: Too many arguments for function: {0}")]
    TooManyArguments(String),
    #[error("E119: Not enough arguments for function: {0}")]
    NotEnoughArguments(String),
    #[error("E714: List required")]
    ListRequired,
    #[error("E342: Out of memory! (range() of {0} items)")]
    RangeTooLong(i128),
    #[error("E108: No such variable: \"{0}\"")]
    NoSuchVariable(String),
    #[error("E461: Illegal variable name: {0}")]
    IllegalVariableName(String),
    #[error("E383: Invalid search string: {0}")]
    InvalidPattern(String),
    #[error("E1154: Divide by zero")]
    DivideByZero,

    // ── Buffer ──────────────────────────────────────────────────────────────
    #[error("E37: No write since last change (add ! to override)")]
    UnsavedChanges,
    #[error("E32: No file name")]
    NoFileName,
    #[error("E212: Can't open file for writing: {0}")]
    Io(#[from] std::io::Error),
}

impl ExError {
    /// `true` for errors raised by the alias-expansion depth guard.
    pub fn is_recursion_limit(&self) -> bool {
        matches!(self, ExError::AliasDepthExceeded)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
