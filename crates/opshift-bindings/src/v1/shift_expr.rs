//! Shift condition expressions: `alt + !debug` requires `alt` and forbids `debug`.

const AND: char = '+';
const NOT: char = '!';

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ExprErrorKind {
    LeadingOperator,
    TrailingOperator,
    DoubleOperator,
    MissingOperatorBetweenTerms,
    EmptyNegation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ExprError<'a> {
    pub rest: &'a str,
    pub kind: ExprErrorKind,
}

/// A single shift reference inside an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ShiftTerm<'a> {
    pub name: &'a str,
    pub negated: bool,
}

/// Returns either the next term (without surrounding whitespace) or the `+`
/// operator as a one-character slice, plus the remaining input.
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    let first = input.chars().next()?;
    if first == AND {
        return Some((&input[..1], &input[1..]));
    }

    for (i, ch) in input.char_indices() {
        if ch == AND {
            return Some((&input[..i], &input[i..]));
        }
        if ch.is_whitespace() {
            return Some((&input[..i], input[i..].trim_start()));
        }
    }

    Some((input, ""))
}

/// Parses a `+`-joined list of shift terms. Rejects leading, trailing and
/// doubled operators, terms without an operator between them, and a bare `!`.
pub(crate) fn parse_shift_expr(mut input: &str) -> Result<Vec<ShiftTerm<'_>>, ExprError<'_>> {
    let mut terms = Vec::new();
    let mut after_operator = false;

    while let Some((token, rest)) = next_token(input) {
        input = rest;

        if token.len() == 1 && token.starts_with(AND) {
            let kind = if terms.is_empty() {
                ExprErrorKind::LeadingOperator
            } else if after_operator {
                ExprErrorKind::DoubleOperator
            } else {
                after_operator = true;
                continue;
            };
            return Err(ExprError { rest: input, kind });
        }

        if !terms.is_empty() && !after_operator {
            return Err(ExprError {
                rest: input,
                kind: ExprErrorKind::MissingOperatorBetweenTerms,
            });
        }

        let (name, negated) = match token.strip_prefix(NOT) {
            Some(name) => (name.trim_start(), true),
            None => (token, false),
        };
        if name.is_empty() {
            return Err(ExprError {
                rest: input,
                kind: ExprErrorKind::EmptyNegation,
            });
        }
        terms.push(ShiftTerm { name, negated });
        after_operator = false;
    }

    if after_operator {
        return Err(ExprError {
            rest: "",
            kind: ExprErrorKind::TrailingOperator,
        });
    }

    Ok(terms)
}
