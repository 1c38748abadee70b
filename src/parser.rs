// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! OQL parser.
//!
//! There is no token stream: parsing works directly on substrings of the
//! query text. A lowercased mirror of the text (with bracketed keys left
//! intact) drives keyword and operator scanning, while clause content is
//! sliced out of the original so quoted literals keep their case.
//!
//! Clause keywords:
//!
//! ```text
//! select <a,b,...> from <type> [where <criteria>] [sort-by <prop>]
//! [descending] [ascending] [limit <n>] [page <n>] [match-case] [mapreduce]
//! ```
//!
//! The WHERE grammar is boolean comparators joined by `and`/`or` with
//! explicit parenthesized grouping; there is no implicit precedence
//! between the connectives.

use crate::ast::{CompareOp, Comparator, Condition, Expression, LogicalOp, ParsedQuery};
use crate::error::{OqlError, Result};

const SELECT: &str = "select";
const FROM: &str = "from";
const WHERE: &str = "where";
const SORT_BY: &str = "sort-by";
const DESCENDING: &str = "descending";
const ASCENDING: &str = "ascending";
const LIMIT: &str = "limit";
const PAGE: &str = "page";
const MATCH_CASE: &str = "match-case";
const MAP_REDUCE: &str = "mapreduce";

const KEYWORDS: [&str; 10] = [
    SELECT, FROM, WHERE, SORT_BY, DESCENDING, ASCENDING, LIMIT, PAGE, MATCH_CASE, MAP_REDUCE,
];

/// Parse an OQL query string into a [`ParsedQuery`].
pub fn parse(text: &str) -> Result<ParsedQuery> {
    let orig = text.trim();
    let lowered = trim_and_lower_no_keys(text);

    let mut query = ParsedQuery {
        text: text.to_string(),
        properties: Vec::new(),
        root_type: clause(&lowered, orig, FROM).unwrap_or_default().to_string(),
        criteria: None,
        sort_by: clause(&lowered, orig, SORT_BY).unwrap_or_default().to_string(),
        descending: false,
        limit: 0,
        page: 0,
        match_case: lowered.contains(MATCH_CASE),
        map_reduce: lowered.contains(MAP_REDUCE),
    };

    if let Some(cols) = clause(&lowered, orig, SELECT) {
        if !cols.is_empty() {
            query.properties = cols.split(',').map(str::to_string).collect();
        }
    }

    if let Some(criteria) = clause(&lowered, orig, WHERE) {
        if !criteria.is_empty() {
            query.criteria = Some(parse_expression(criteria)?);
        }
    }

    if let Some(limit) = clause(&lowered, orig, LIMIT) {
        if !limit.is_empty() {
            let limit = match limit.parse::<i32>() {
                Ok(n) => n,
                Err(_) => {
                    tracing::warn!(limit = %limit, "invalid limit, defaulting to 10");
                    10
                }
            };
            if limit >= 1000 {
                return Err(OqlError::Parse(format!(
                    "limit {limit} exceeds the 1000 element cap"
                )));
            }
            query.limit = limit;
        }
    }

    if let Some(page) = clause(&lowered, orig, PAGE) {
        if !page.is_empty() {
            query.page = page
                .parse::<i32>()
                .map_err(|_| OqlError::Parse(format!("invalid page: {page}")))?;
        }
    }

    if lowered.contains(DESCENDING) {
        query.descending = true;
    }
    // Last one wins when both orderings appear in the same text.
    if lowered.contains(ASCENDING) {
        query.descending = false;
    }

    Ok(query)
}

/// Trim and lowercase the query text, leaving characters between `[` and
/// `]` intact so bracketed keys keep their case. Lowercasing is ASCII-only,
/// which keeps byte offsets aligned with the original string.
pub(crate) fn trim_and_lower_no_keys(text: &str) -> String {
    let trimmed = text.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut key_open = false;
    for c in trimmed.chars() {
        if c == '[' {
            key_open = true;
        } else if c == ']' {
            key_open = false;
        }
        if key_open {
            out.push(c);
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

/// Extract the content of one clause: the original-case slice between the
/// end of `keyword` and the earliest following keyword (or end of string).
/// Returns `None` when the keyword is absent.
fn clause<'a>(lowered: &str, orig: &'a str, keyword: &str) -> Option<&'a str> {
    let start = lowered.find(keyword)? + keyword.len();
    let mut end = lowered.len();
    for other in KEYWORDS {
        if other == keyword {
            continue;
        }
        if let Some(pos) = lowered.find(other) {
            if pos > start && pos < end {
                end = pos;
            }
        }
    }
    Some(orig[start..end].trim())
}

/// Parse a standalone WHERE clause into an expression tree.
///
/// The recursion is driven by the first `(` in the input: absent, the
/// clause is a flat condition chain; preceded by content, the last
/// connective in the prefix splits chain from group; at position zero, the
/// bracket-counted matching `)` delimits a child sub-tree.
pub fn parse_expression(ws: &str) -> Result<Expression> {
    let ws = ws.trim();
    match ws.find('(') {
        None => parse_no_brackets(ws),
        Some(0) => parse_with_brackets(ws),
        Some(bo) => parse_before_brackets(ws, bo),
    }
}

fn parse_no_brackets(ws: &str) -> Result<Expression> {
    Ok(Expression {
        condition: Some(parse_condition(ws)?),
        child: None,
        op: None,
        next: None,
    })
}

fn parse_with_brackets(ws: &str) -> Result<Expression> {
    let be = matching_bracket(ws)?;
    let child = parse_expression(&ws[1..be])?;
    let mut expr = Expression {
        condition: None,
        child: Some(Box::new(child)),
        op: None,
        next: None,
    };
    if be < ws.len() - 1 {
        let rest = &ws[be + 1..];
        let (op, loc) = first_logical_op(rest)
            .ok_or_else(|| OqlError::Parse(format!("missing and/or after ')' in: {rest}")))?;
        expr.op = Some(op);
        let next = parse_expression(&rest[loc + op.token().len()..])?;
        expr.next = Some(Box::new(next));
    }
    Ok(expr)
}

fn parse_before_brackets(ws: &str, bo: usize) -> Result<Expression> {
    let prefix = &ws[..bo];
    let (op, loc) = last_logical_op(prefix)
        .ok_or_else(|| OqlError::Parse(format!("missing and/or before '(' in: {ws}")))?;
    let mut expr = parse_no_brackets(&prefix[..loc])?;
    expr.op = Some(op);
    let next = parse_expression(&ws[bo..])?;
    expr.next = Some(Box::new(next));
    Ok(expr)
}

/// Index of the `)` matching the `(` at the start of `ws`.
fn matching_bracket(ws: &str) -> Result<usize> {
    let mut depth = 0i32;
    for (i, c) in ws.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(OqlError::Parse(format!("missing close bracket in: {ws}")))
}

/// Parse a flat condition chain: comparators joined by `and`/`or`.
fn parse_condition(ws: &str) -> Result<Condition> {
    match first_logical_op(ws) {
        None => Ok(Condition {
            comparator: parse_comparator(ws)?,
            op: None,
            next: None,
        }),
        Some((op, loc)) => {
            let comparator = parse_comparator(&ws[..loc])?;
            let next = parse_condition(&ws[loc + op.token().len()..])?;
            Ok(Condition {
                comparator,
                op: Some(op),
                next: Some(Box::new(next)),
            })
        }
    }
}

/// Parse a comparator leaf by trying the operator tokens in scan order
/// against the lowercased text and splitting the original at the match.
fn parse_comparator(ws: &str) -> Result<Comparator> {
    let lowered = ws.to_ascii_lowercase();
    for op in CompareOp::SCAN_ORDER {
        if let Some(loc) = lowered.find(op.token()) {
            let left = ws[..loc].trim().to_lowercase();
            let right = normalize_literal(ws[loc + op.token().len()..].trim());
            check_operand(&left)?;
            check_operand(&right)?;
            return Ok(Comparator { left, op, right });
        }
    }
    Err(OqlError::Parse(format!("no comparator operator in: {ws}")))
}

/// Position and kind of the first space-delimited connective in `ws`.
fn first_logical_op(ws: &str) -> Option<(LogicalOp, usize)> {
    let lowered = ws.to_ascii_lowercase();
    let and = lowered.find(LogicalOp::And.token());
    let or = lowered.find(LogicalOp::Or.token());
    match (and, or) {
        (Some(a), Some(o)) if o < a => Some((LogicalOp::Or, o)),
        (Some(a), _) => Some((LogicalOp::And, a)),
        (None, Some(o)) => Some((LogicalOp::Or, o)),
        (None, None) => None,
    }
}

/// Position and kind of the last space-delimited connective in `ws`.
fn last_logical_op(ws: &str) -> Option<(LogicalOp, usize)> {
    let lowered = ws.to_ascii_lowercase();
    let and = lowered.rfind(LogicalOp::And.token());
    let or = lowered.rfind(LogicalOp::Or.token());
    match (and, or) {
        (Some(a), Some(o)) if o > a => Some((LogicalOp::Or, o)),
        (Some(a), _) => Some((LogicalOp::And, a)),
        (None, Some(o)) => Some((LogicalOp::Or, o)),
        (None, None) => None,
    }
}

/// Normalize a right-hand operand: double quotes strip and preserve case,
/// single quotes strip and lowercase, bare words lowercase.
fn normalize_literal(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        s[1..s.len() - 1].to_lowercase()
    } else {
        s.to_lowercase()
    }
}

/// Operands may not contain raw parentheses; list literals use `[...]` and
/// strings use quotes.
fn check_operand(s: &str) -> Result<()> {
    if s.contains('(') || s.contains(')') {
        return Err(OqlError::Parse(format!(
            "operand {s} contains illegal brackets"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowering_preserves_bracketed_keys() {
        assert_eq!(
            trim_and_lower_no_keys("  Select [MyKey] From T  "),
            "select [MyKey] from t"
        );
    }

    #[test]
    fn clause_bounded_by_next_keyword() {
        let orig = "select a,b from T1 where x=1 limit 5";
        let lowered = trim_and_lower_no_keys(orig);
        assert_eq!(clause(&lowered, orig, SELECT), Some("a,b"));
        assert_eq!(clause(&lowered, orig, FROM), Some("T1"));
        assert_eq!(clause(&lowered, orig, WHERE), Some("x=1"));
        assert_eq!(clause(&lowered, orig, LIMIT), Some("5"));
        assert_eq!(clause(&lowered, orig, PAGE), None);
    }

    #[test]
    fn header_fields() {
        let q = parse(
            "Select c1,c2 fRom t1 wHere 1=2 sort-by col1 page 7 limit 50 match-case descending",
        )
        .expect("should parse");
        assert_eq!(q.root_type, "t1");
        assert_eq!(q.properties, vec!["c1", "c2"]);
        assert_eq!(q.sort_by, "col1");
        assert_eq!(q.page, 7);
        assert_eq!(q.limit, 50);
        assert!(q.match_case);
        assert!(q.descending);
        assert!(!q.map_reduce);
    }

    #[test]
    fn ascending_cancels_descending() {
        let q = parse("select * from t where a=1 descending ascending").expect("should parse");
        assert!(!q.descending);
    }

    #[test]
    fn limit_cap() {
        assert_eq!(parse("select * from t limit 999").unwrap().limit, 999);
        assert!(parse("select * from t limit 1000").is_err());
    }

    #[test]
    fn unparseable_limit_defaults() {
        assert_eq!(parse("select * from t limit ten").unwrap().limit, 10);
    }

    #[test]
    fn unparseable_page_fails() {
        assert!(parse("select * from t page seven").is_err());
    }

    #[test]
    fn flat_chain() {
        let q = parse("Select c1,c2 fRom t1 wHere 1=2 AND 3  =  4 Or 5!=6").expect("should parse");
        assert_eq!(q.criteria.unwrap().to_string(), "(1=2 and 3=4 or 5!=6)");
    }

    #[test]
    fn prefix_before_group() {
        let q = parse("Select c1 fRom t1 wHere 1=2 AND (3  =  4 Or 5!=6)").expect("should parse");
        assert_eq!(q.criteria.unwrap().to_string(), "(1=2) and ((3=4 or 5!=6))");
    }

    #[test]
    fn groups_and_trailing_chain() {
        let q = parse("Select c1 fRom t1 wHere (1=2 or 3  =  4) And (5!=6 or 8<9) or 10<=12")
            .expect("should parse");
        assert_eq!(
            q.criteria.unwrap().to_string(),
            "((1=2 or 3=4)) and ((5!=6 or 8<9)) or (10<=12)"
        );
    }

    #[test]
    fn deeply_nested_groups() {
        let q = parse(
            "Select c1,c2 fRom t1 wHere 1=2 or ((3!=4 and 5<6) and 7>8) or ((9=10) and 11=12) ",
        )
        .expect("should parse");
        assert_eq!(
            q.criteria.unwrap().to_string(),
            "(1=2) or (((3!=4 and 5<6)) and (7>8)) or (((9=10)) and (11=12))"
        );
    }

    #[test]
    fn missing_close_bracket() {
        let e = parse("Select c1 fRom t1 wHere (1=2 or 3=4) And (5!=6 or 8<9 or 10<=12");
        assert!(matches!(e, Err(OqlError::Parse(_))));
    }

    #[test]
    fn stray_close_bracket() {
        let e = parse("Select c1 fRom t1 wHere (1=2 or 3=4) And 5!=6 or 8<9) or 10<=12");
        assert!(matches!(e, Err(OqlError::Parse(_))));
    }

    #[test]
    fn misspelled_connective() {
        let e = parse("Select c1 fRom t1 wHere (1=2 or 3=4) Anf (5!=6 or 8<9) or 10<=12");
        assert!(e.is_err());
    }

    #[test]
    fn unknown_comparator() {
        let e = parse("Select c1 fRom t1 wHere (1=2 or 3=4) And (5^6 or 8<9) or 10<=12");
        assert!(e.is_err());
    }

    #[test]
    fn scan_order_multi_char_first() {
        let q = parse("select * from t where a>=5").unwrap();
        let cond = q.criteria.unwrap().condition.unwrap();
        assert_eq!(cond.comparator.op, CompareOp::Gte);
        assert_eq!(cond.comparator.left, "a");
        assert_eq!(cond.comparator.right, "5");
    }

    #[test]
    fn word_operators_case_insensitive() {
        let q = parse("select * from t where tag NOT IN ['a','b']").unwrap();
        let cond = q.criteria.unwrap().condition.unwrap();
        assert_eq!(cond.comparator.op, CompareOp::NotIn);
        assert_eq!(cond.comparator.right, "['a','b']");
    }

    #[test]
    fn double_quotes_preserve_case() {
        let q = parse("select * from t where name=\"Hello\"").unwrap();
        let cond = q.criteria.unwrap().condition.unwrap();
        assert_eq!(cond.comparator.right, "Hello");
    }

    #[test]
    fn single_quotes_lowercase() {
        let q = parse("select * from t where name='Hello'").unwrap();
        let cond = q.criteria.unwrap().condition.unwrap();
        assert_eq!(cond.comparator.right, "hello");
    }

    #[test]
    fn bare_operands_lowercase() {
        let q = parse("select * from t where Name=World").unwrap();
        let cond = q.criteria.unwrap().condition.unwrap();
        assert_eq!(cond.comparator.left, "name");
        assert_eq!(cond.comparator.right, "world");
    }

    #[test]
    fn quoted_star_survives() {
        let q = parse("select * from l8file where path=\"*\" mapreduce").unwrap();
        assert!(q.map_reduce);
        let cond = q.criteria.unwrap().condition.unwrap();
        assert_eq!(cond.comparator.right, "*");
    }

    #[test]
    fn no_where_clause() {
        let q = parse("select * from t").unwrap();
        assert!(q.criteria.is_none());
        assert_eq!(q.properties, vec!["*"]);
    }
}
