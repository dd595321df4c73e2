// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Parser for guards and assignment right-hand sides.
//!
//! Both the symbolic (`&`, `|`, `~`, `$true`) and the keyword (`and`, `or`,
//! `not`, `true`) spellings are accepted and produce the same [`Expr`].
//! Predicates are referenced by id, by a bare identifier, or by their full
//! parenthesized name as it appears in the model's predicate map, e.g.
//! `(a = -1)`.

use crate::model::PredicateMap;
use crate::syntax::*;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use peg::{error::ParseError, str::LineCol};

peg::parser! {

grammar parser(predicates: &PredicateMap) for str {
    rule ident_start() = ['a'..='z' | 'A'..='Z' | '_']
    rule ident_char() = ident_start() / ['0'..='9']
    rule word_boundary() = !ident_char()
    rule _ = quiet!{ [' ' | '\t' | '\n' | '\r']* }

    rule keyword()
    = ("and" / "or" / "not" / "true" / "false" / "choice") word_boundary()

    pub(super) rule ident() -> &'input str
    = s:$(quiet!{ !keyword() ident_start() ident_char()* } / expected!("identifier"))
    { s }

    rule balanced() = (quiet!{ [^ '(' | ')'] } / "(" balanced() ")")*

    rule named_predicate() -> PredicateId
    = n:$("(" balanced() ")") {? predicates.get(n).copied().ok_or("predicate name") } /
      n:ident() {? predicates.get(n).copied().ok_or("known predicate") }

    rule predicate_id() -> PredicateId
    = n:$(['0'..='9']+) word_boundary() {? n.parse().or(Err("predicate id")) }

    rule literal() -> bool
    = ("$true" / "true" word_boundary()) { true } /
      ("$false" / "false" word_boundary()) { false }

    rule or_op() = "|" / "or" word_boundary()
    rule and_op() = "&" / "and" word_boundary()
    rule not_op() = "~" / "!" / "not" word_boundary()

    pub(super) rule expr() -> Expr = precedence!{
        x:(@) _ or_op() _ y:@ { Expr::or([x, y]) }
        --
        x:(@) _ and_op() _ y:@ { Expr::and([x, y]) }
        --
        not_op() _ x:@ { Expr::not(x) }
        --
        b:literal() { Expr::Literal(b) }
        p:predicate_id() { Expr::Predicate(p) }
        p:named_predicate() { Expr::Predicate(p) }
        "(" _ e:expr() _ ")" { e }
    }

    rule choice() -> Expression
    = "choice" _ "(" _ left:expr() _ "," _ right:expr() _ ")"
    { Expression::Choice(left, right) }

    pub rule expression() -> Expression
    = _ e:(choice() / e:expr() { Expression::Deterministic(e) }) _ { e }
}
}

/// Parse a guard or assignment right-hand side.
pub fn parse_expression(
    s: &str,
    predicates: &PredicateMap,
) -> Result<Expression, ParseError<LineCol>> {
    parser::expression(s, predicates)
}

/// Parse a deterministic expression (no top-level `choice`).
pub fn parse_expr(s: &str, predicates: &PredicateMap) -> Result<Expr, ParseError<LineCol>> {
    parser::expr(s.trim(), predicates)
}

/// Convert an opaque FileId and error to a readable `Diagnostic`
pub fn parse_error_diagnostic<FileId>(
    file_id: FileId,
    e: &ParseError<LineCol>,
) -> Diagnostic<FileId> {
    Diagnostic::error()
        .with_message("could not parse expression")
        .with_labels(vec![Label::primary(
            file_id,
            e.location.offset..e.location.offset + 1,
        )
        .with_message(format!("expected {}", e.expected))])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicates() -> PredicateMap {
        PredicateMap::from([
            ("(a = -1)".to_string(), 0),
            ("ready".to_string(), 1),
            ("nothing".to_string(), 2),
            ("order".to_string(), 3),
            ("(f(x, y) > 0)".to_string(), 4),
            ("truest".to_string(), 5),
        ])
    }

    fn expression(s: &str) -> Expression {
        parse_expression(s, &predicates()).expect("test expression should parse")
    }

    fn expr(s: &str) -> Expr {
        parse_expr(s, &predicates()).expect("test expr should parse")
    }

    #[test]
    fn test_ident() {
        let preds = predicates();
        assert_eq!(parser::ident("ready", &preds).ok(), Some("ready"));
        assert_eq!(parser::ident("nothing", &preds).ok(), Some("nothing"));
        assert!(parser::ident("not", &preds).is_err());
        assert!(parser::ident("1up", &preds).is_err());
    }

    #[test]
    fn test_keyword_and_symbol_forms_agree() {
        assert_eq!(expr("0 & 1"), expr("0 and 1"));
        assert_eq!(expr("0 | 1"), expr("0 or 1"));
        assert_eq!(expr("~0"), expr("not 0"));
        assert_eq!(expr("!0"), expr("not(0)"));
        assert_eq!(expr("$true"), expr("true"));
        assert_eq!(expr("$false"), expr("false"));
        assert_eq!(expr("not (a = -1)"), Expr::not(Expr::predicate(0)));
    }

    #[test]
    fn test_word_boundaries() {
        // keywords embedded in predicate names are not operators
        assert_eq!(expr("nothing"), Expr::predicate(2));
        assert_eq!(expr("order"), Expr::predicate(3));
        assert_eq!(expr("truest"), Expr::predicate(5));
        assert_eq!(
            expr("nothing and order"),
            Expr::and([Expr::predicate(2), Expr::predicate(3)])
        );
        assert_eq!(expr("not nothing"), Expr::not(Expr::predicate(2)));
        assert!(parse_expr("notready", &predicates()).is_err());
        assert!(parse_expr("ready andorder", &predicates()).is_err());
    }

    #[test]
    fn test_parenthesized_names() {
        assert_eq!(expr("(a = -1)"), Expr::predicate(0));
        assert_eq!(expr("(f(x, y) > 0)"), Expr::predicate(4));
        assert_eq!(
            expr("((a = -1) | ready)"),
            Expr::or([Expr::predicate(0), Expr::predicate(1)])
        );
        assert_eq!(expr("(1)"), Expr::predicate(1));
        assert!(parse_expr("(b = 2)", &predicates()).is_err());
    }

    #[test]
    fn test_precedence() {
        assert_eq!(expr("0 | 1 & 2"), expr("0 | (1 & 2)"));
        assert_eq!(expr("~0 & 1"), expr("(~0) & 1"));
        assert_eq!(expr("0 & 1 & 2"), expr("(0 & 1) & 2"));
        insta::assert_snapshot!(expr("not (0 or 1) and 2").to_string(), @"~(0 | 1) & 2");
    }

    #[test]
    fn test_choice() {
        assert_eq!(
            expression("choice((a = -1), (not (a = -1)))"),
            Expression::Choice(Expr::predicate(0), Expr::not(Expr::predicate(0)))
        );
        assert_eq!(
            expression("choice(false, true)"),
            Expression::Choice(Expr::false_(), Expr::true_())
        );
        assert_eq!(
            expression(" choice( (f(x, y) > 0) , ready ) "),
            Expression::Choice(Expr::predicate(4), Expr::predicate(1))
        );
        assert_eq!(
            expression("ready & order"),
            Expression::Deterministic(Expr::and([Expr::predicate(1), Expr::predicate(3)]))
        );
        assert!(parse_expression("choice(0)", &predicates()).is_err());
        assert!(parse_expression("0 & choice(0, 1)", &predicates()).is_err());
    }

    #[test]
    fn test_errors_report_location() {
        let err = parse_expression("0 & & 1", &predicates()).unwrap_err();
        assert_eq!(err.location.offset, 4);
    }
}
