//! SQL expression analysis.
//!
//! Deliberately a tokenizer plus an aggregate-function recognizer, not a SQL
//! parser. Good enough to extract referenced columns for validation warnings
//! and to detect aggregation; it makes no stronger guarantee.

use std::collections::BTreeSet;

/// Aggregate functions that mark an expression (and its model) as aggregating.
pub const AGGREGATE_FUNCTIONS: &[&str] = &[
    "SUM", "COUNT", "AVG", "MIN", "MAX", "STDDEV", "VARIANCE",
];

/// SQL keywords never counted as column references.
const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "BY", "ORDER", "HAVING", "CASE", "WHEN", "THEN", "ELSE",
    "END", "AND", "OR", "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "IS", "NULL", "DISTINCT", "AS",
    "ON", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "JOIN", "UNION", "INTERSECT", "EXCEPT",
    "WITH", "RECURSIVE", "TRUE", "FALSE", "ASC", "DESC", "LIMIT", "OFFSET", "INTERVAL",
];

/// Scalar built-ins recognized as functions even when the tokenizer cannot
/// see the call parenthesis (e.g. after alias substitution). Dialects may
/// extend this set via [`analyze_with_functions`].
const RECOGNIZED_FUNCTIONS: &[&str] = &[
    "CONCAT", "SUBSTRING", "LENGTH", "UPPER", "LOWER", "TRIM", "LTRIM", "RTRIM", "CAST",
    "CONVERT", "COALESCE", "NULLIF", "IFNULL", "ABS", "ROUND", "CEILING", "FLOOR", "YEAR",
    "MONTH", "DAY", "DATE_TRUNC", "DATEDIFF", "CURRENT_DATE", "CURRENT_TIMESTAMP", "NOW",
    "ROW_NUMBER", "RANK", "DENSE_RANK", "LEAD", "LAG", "FIRST_VALUE", "LAST_VALUE", "REPLACE",
    "SPLIT", "GREATEST", "LEAST",
];

/// What the analyzer extracted from one SQL scalar fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprInfo {
    /// Bareword identifiers that look like column references
    pub referenced_columns: BTreeSet<String>,

    /// Identifiers used in `name(...)` call position (macros keep their `@`)
    pub functions_used: BTreeSet<String>,

    /// Dot-qualifiers preceding a column reference (`T` in `T.Amount`)
    pub qualifiers: BTreeSet<String>,

    /// `true` if the fragment calls a recognized aggregate function
    pub is_aggregate: bool,
}

/// Analyze a fragment with the default built-in function set.
pub fn analyze(expression: &str) -> ExprInfo {
    analyze_with_functions(expression, &[])
}

/// Analyze a fragment, additionally treating `extra_functions` (a dialect's
/// allowlist) as function names rather than columns.
pub fn analyze_with_functions(expression: &str, extra_functions: &[&str]) -> ExprInfo {
    let mut info = ExprInfo::default();
    let tokens = tokenize(expression);

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(word) => {
                let upper = word.to_ascii_uppercase();
                let next = tokens.get(i + 1);

                if matches!(next, Some(Token::OpenParen)) {
                    // Call position: a function, never a column
                    info.functions_used.insert(word.clone());
                    if AGGREGATE_FUNCTIONS.contains(&upper.as_str()) {
                        info.is_aggregate = true;
                    }
                } else if matches!(next, Some(Token::Dot)) {
                    // Qualifier: record it and fall through to the member
                    info.qualifiers.insert(word.clone());
                } else if !SQL_KEYWORDS.contains(&upper.as_str())
                    && !RECOGNIZED_FUNCTIONS.contains(&upper.as_str())
                    && !extra_functions
                        .iter()
                        .any(|f| f.eq_ignore_ascii_case(word))
                {
                    info.referenced_columns.insert(word.clone());
                }
            }
            Token::Macro(name) => {
                info.functions_used.insert(name.clone());
            }
            _ => {}
        }
        i += 1;
    }

    info
}

/// `true` if the fragment calls an aggregate function.
pub fn is_aggregate_expression(expression: &str) -> bool {
    analyze(expression).is_aggregate
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Macro(String),
    Dot,
    OpenParen,
    Other,
}

/// Split a fragment into identifier-level tokens, skipping string literals,
/// numeric literals, and comments.
fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                i = skip_string_literal(&chars, i, c);
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            '@' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if name.len() > 1 {
                    tokens.push(Token::Macro(name));
                }
            }
            c if c.is_ascii_digit() => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen);
                i += 1;
            }
            c if c.is_whitespace() => {
                i += 1;
            }
            _ => {
                tokens.push(Token::Other);
                i += 1;
            }
        }
    }

    // Drop whitespace-separated call detection noise: `SUM (x)` should still
    // see SUM adjacent to the parenthesis, so Other tokens between a word
    // and a paren were never emitted for whitespace above.
    tokens
}

/// Skip over a quoted literal, honoring doubled-quote escapes.
fn skip_string_literal(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
