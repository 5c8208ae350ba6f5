//! Diagnostic codes.
//!
//! Codes are numbered in bands, one band per phase, so a report line
//! identifies its phase at a glance: 1xxx lexical, 2xxx syntactic, 3xxx
//! semantic, 1xx warnings.

use std::fmt;

/// A numeric diagnostic code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticCode(pub u16);

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Lexical errors (1xxx)

/// End of file inside a `/* ... */` comment.
pub const E_EOF_IN_COMMENT: DiagnosticCode = DiagnosticCode(1001);
/// String literal with end of line inside, or missing close quote.
pub const E_UNTERM_STRING: DiagnosticCode = DiagnosticCode(1002);
/// Regular expression literal with no closing `/`.
pub const E_UNTERM_REGEX: DiagnosticCode = DiagnosticCode(1003);
/// Decimal point not followed by a digit.
pub const E_DIGIT_AFTER_DOT: DiagnosticCode = DiagnosticCode(1004);
/// Exponent marker with no digits.
pub const E_NO_DIGITS_IN_EXP: DiagnosticCode = DiagnosticCode(1005);
/// A character no token can start with.
pub const E_UNK_CHAR: DiagnosticCode = DiagnosticCode(1006);

// Syntactic errors (2xxx)

/// Expected `<construct>` at `<token>` - the universal parse error.
pub const E_EXPECTED: DiagnosticCode = DiagnosticCode(2001);

// Semantic errors (3xxx)

/// A construct the code generator rejects.
pub const E_SEMANTIC: DiagnosticCode = DiagnosticCode(3001);

// Warnings (1xx)

/// Extra semicolon.
pub const W_EXTRA_SEMI: DiagnosticCode = DiagnosticCode(101);
