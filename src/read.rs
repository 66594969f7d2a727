//! Text reader for statements, facts and rules.
//!
//! ```text
//! # comments and blank lines are skipped
//! fact: (isa cube block)
//! rule: ((isa ?x block) (on ?x table)) -> (grounded ?x)
//! rule: (grounded ?x) -> (stable ?x)
//! ```
//!
//! A rule's left-hand side is either a parenthesized list of statements or a
//! single statement.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::fact::{Fact, Item, Rule};
use crate::term::{Statement, Term};

static ITEM_LINE: OnceLock<Option<Regex>> = OnceLock::new();

fn item_line() -> Option<&'static Regex> {
    ITEM_LINE
        .get_or_init(|| Regex::new(r"^\s*(fact|rule)\s*:\s*(.*?)\s*$").ok())
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Symbol(&'a str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token::Symbol(&text[s..i]));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token::Symbol(&text[s..]));
    }
    tokens
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: tokenize(text),
            pos: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek(0)?;
        self.pos += 1;
        Some(token)
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<(), String> {
        match self.bump() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {expected:?}, found {token:?}")),
            None => Err(format!("expected {expected:?}, found end of input")),
        }
    }

    fn finish(&self) -> Result<(), String> {
        match self.peek(0) {
            None => Ok(()),
            Some(token) => Err(format!("unexpected trailing {token:?}")),
        }
    }

    fn statement(&mut self) -> Result<Statement, String> {
        self.expect(Token::Open)?;
        let predicate = match self.bump() {
            Some(Token::Symbol(symbol)) => symbol,
            Some(Token::Close) => return Err("statement has no predicate".to_string()),
            Some(Token::Open) => return Err("nested statements are not supported".to_string()),
            None => return Err("unbalanced parentheses".to_string()),
        };
        let mut terms = Vec::new();
        loop {
            match self.bump() {
                Some(Token::Symbol(symbol)) => {
                    terms.push(Term::parse(symbol).map_err(|e| e.to_string())?);
                }
                Some(Token::Close) => break,
                Some(Token::Open) => return Err("nested statements are not supported".to_string()),
                None => return Err("unbalanced parentheses".to_string()),
            }
        }
        Statement::new(predicate, terms).map_err(|e| e.to_string())
    }

    /// `((s1) (s2) ...)` or a single `(s)`.
    fn premises(&mut self) -> Result<Vec<Statement>, String> {
        if self.peek(0) == Some(Token::Open) && self.peek(1) == Some(Token::Open) {
            self.expect(Token::Open)?;
            let mut lhs = Vec::new();
            while self.peek(0) == Some(Token::Open) {
                lhs.push(self.statement()?);
            }
            self.expect(Token::Close)?;
            Ok(lhs)
        } else {
            Ok(vec![self.statement()?])
        }
    }
}

/// Parses a single statement such as `(on ?x table)`.
pub fn parse_statement(text: &str) -> Result<Statement, ParseError> {
    parse_statement_at(text, 1)
}

fn parse_statement_at(text: &str, line: usize) -> Result<Statement, ParseError> {
    let mut parser = Parser::new(text);
    let statement = parser.statement().map_err(|reason| ParseError::new(line, reason))?;
    parser.finish().map_err(|reason| ParseError::new(line, reason))?;
    Ok(statement)
}

fn parse_rule_at(text: &str, line: usize) -> Result<Rule, ParseError> {
    let Some((lhs_text, rhs_text)) = text.split_once("->") else {
        return Err(ParseError::new(line, "rule is missing '->'"));
    };
    let mut parser = Parser::new(lhs_text);
    let lhs = parser.premises().map_err(|reason| ParseError::new(line, reason))?;
    parser.finish().map_err(|reason| ParseError::new(line, reason))?;
    let rhs = parse_statement_at(rhs_text, line)?;
    let rule = Rule::new(lhs, rhs).map_err(|e| ParseError::new(line, e.to_string()))?;
    let unbound = rule.unbound_variables();
    if !unbound.is_empty() {
        tracing::warn!(line, rule = %rule.signature(), ?unbound, "conclusion uses variables no premise binds");
    }
    Ok(rule)
}

/// Parses one `fact: ...` or `rule: ... -> ...` line into an asserted item.
pub fn parse_item(text: &str) -> Result<Item, ParseError> {
    parse_item_at(text, 1)
}

fn parse_item_at(text: &str, line: usize) -> Result<Item, ParseError> {
    let pattern = item_line().ok_or_else(|| ParseError::new(line, "item pattern failed to compile"))?;
    let Some(caps) = pattern.captures(text) else {
        return Err(ParseError::new(line, "expected 'fact:' or 'rule:'"));
    };
    let body = caps.get(2).map_or("", |m| m.as_str());
    match caps.get(1).map(|m| m.as_str()) {
        Some("fact") => Ok(Fact::new(parse_statement_at(body, line)?).into()),
        Some("rule") => Ok(parse_rule_at(body, line)?.into()),
        _ => Err(ParseError::new(line, "expected 'fact:' or 'rule:'")),
    }
}

/// Parses a program: one item per line, skipping blank lines and `#` comments.
///
/// Stops at the first malformed line; the error carries its 1-based number.
pub fn parse_program(text: &str) -> Result<Vec<Item>, ParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| parse_item_at(line, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_statements_with_variables() {
        let s = parse_statement("(on ?x table)").unwrap();
        assert_eq!(s, Statement::of("on", &["?x", "table"]).unwrap());
        assert_eq!(parse_statement("  (sleepy)  ").unwrap().arity(), 0);
    }

    #[test]
    fn rejects_malformed_statements() {
        assert!(parse_statement("(on ?x table").is_err());
        assert!(parse_statement("()").is_err());
        assert!(parse_statement("(a (b c))").is_err());
        assert!(parse_statement("(a b) extra").is_err());
        assert!(parse_statement("(?p a)").is_err());
    }

    #[test]
    fn parses_fact_lines() {
        let Item::Fact(fact) = parse_item("fact: (isa cube block)").unwrap() else {
            panic!("expected fact");
        };
        assert!(fact.asserted);
        assert_eq!(fact.statement.to_string(), "(isa cube block)");
    }

    #[test]
    fn parses_rule_lines_in_both_premise_forms() {
        let Item::Rule(rule) = parse_item("rule: ((a ?x) (b ?x)) -> (c ?x)").unwrap() else {
            panic!("expected rule");
        };
        assert_eq!(rule.lhs.len(), 2);
        assert_eq!(rule.signature(), "((a ?x) (b ?x)) -> (c ?x)");

        let Item::Rule(single) = parse_item("rule: (a ?x) -> (c ?x)").unwrap() else {
            panic!("expected rule");
        };
        assert_eq!(single.lhs, vec![Statement::of("a", &["?x"]).unwrap()]);
    }

    #[test]
    fn rule_with_unbound_conclusion_variable_still_parses() {
        let Item::Rule(rule) = parse_item("rule: (a ?x) -> (c ?x ?y)").unwrap() else {
            panic!("expected rule");
        };
        assert_eq!(rule.unbound_variables(), vec!["y"]);
    }

    #[test]
    fn rejects_unknown_headers_and_missing_arrow() {
        assert!(parse_item("query: (a 1)").is_err());
        assert!(parse_item("rule: ((a ?x))").is_err());
        assert!(parse_item("rule: () -> (c ?x)").is_err());
    }

    #[test]
    fn program_skips_comments_and_reports_line_numbers() {
        let text = "# blocks\n\nfact: (a 1)\nrule: (a ?x) -> (b ?x)\n";
        let items = parse_program(text).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_fact());
        assert!(items[1].is_rule());

        let err = parse_program("fact: (a 1)\n# ok\nfact: (a 1\n").unwrap_err();
        assert_eq!(err.line, 3);
    }
}
