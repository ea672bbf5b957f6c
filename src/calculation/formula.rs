//! Restricted formula expressions for company-authored templates.
//!
//! Templates may compute amounts from a small expression language:
//! numeric literals, whitelisted `{variable}` references, the four
//! arithmetic operators, and parentheses. Expressions are compiled once
//! into an explicit syntax tree and evaluated by walking it — there is no
//! general-purpose eval anywhere, so a hostile expression has nothing to
//! escape into. Any token outside the grammar, and any variable outside
//! the whitelist, is rejected at compile time and the owning item resolves
//! to amount 0.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// The variables a formula may reference.
pub const ALLOWED_VARIABLES: &[&str] = &["basic_salary", "gross_salary", "years_of_service"];

/// Errors raised while compiling or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The expression contains a token outside the whitelisted grammar.
    #[error("disallowed token '{token}' at position {position}")]
    DisallowedToken {
        /// The offending token text.
        token: String,
        /// Byte offset of the token in the expression.
        position: usize,
    },

    /// The expression references a variable outside the whitelist.
    #[error("unknown variable '{name}'")]
    UnknownVariable {
        /// The variable name as written.
        name: String,
    },

    /// The expression is not well-formed.
    #[error("malformed expression: {message}")]
    Malformed {
        /// A description of the syntax problem.
        message: String,
    },

    /// The expression divided by zero during evaluation.
    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Variable(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Variable(String),
    Negate(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

/// A formula compiled into an explicit syntax tree.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::CompiledFormula;
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
/// use std::str::FromStr;
///
/// let formula = CompiledFormula::compile("{basic_salary} * 0.1 + 500").unwrap();
/// let vars = HashMap::from([("basic_salary".to_string(), Decimal::from(50_000))]);
/// assert_eq!(formula.evaluate(&vars).unwrap(), Decimal::from_str("5500.0").unwrap());
///
/// // Anything outside the grammar never executes.
/// assert!(CompiledFormula::compile("exec('rm -rf /')").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    expr: Expr,
}

impl CompiledFormula {
    /// Compiles an expression, rejecting any token outside the grammar and
    /// any variable outside [`ALLOWED_VARIABLES`].
    pub fn compile(expression: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            tokens: &tokens,
            position: 0,
        };
        let expr = parser.parse_expression()?;
        if parser.position != tokens.len() {
            return Err(FormulaError::Malformed {
                message: "trailing tokens after expression".to_string(),
            });
        }
        Ok(Self { expr })
    }

    /// Evaluates the formula against a variable map.
    ///
    /// A whitelisted variable missing from the map evaluates to 0.
    pub fn evaluate(&self, variables: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
        eval(&self.expr, variables)
    }
}

fn eval(expr: &Expr, variables: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable(name) => Ok(variables.get(name).copied().unwrap_or(Decimal::ZERO)),
        Expr::Negate(inner) => Ok(-eval(inner, variables)?),
        Expr::Add(left, right) => Ok(eval(left, variables)? + eval(right, variables)?),
        Expr::Sub(left, right) => Ok(eval(left, variables)? - eval(right, variables)?),
        Expr::Mul(left, right) => Ok(eval(left, variables)? * eval(right, variables)?),
        Expr::Div(left, right) => {
            let divisor = eval(right, variables)?;
            eval(left, variables)?
                .checked_div(divisor)
                .ok_or(FormulaError::DivisionByZero)
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = expression.as_bytes();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let ch = bytes[index] as char;
        match ch {
            ' ' | '\t' | '\n' | '\r' => index += 1,
            '+' => {
                tokens.push(Token::Plus);
                index += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                index += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                index += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                index += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                index += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                index += 1;
            }
            '{' => {
                let start = index + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end] as char != '}' {
                    end += 1;
                }
                if end == bytes.len() {
                    return Err(FormulaError::Malformed {
                        message: "unterminated variable reference".to_string(),
                    });
                }
                let name = expression[start..end].trim().to_string();
                if !ALLOWED_VARIABLES.contains(&name.as_str()) {
                    return Err(FormulaError::UnknownVariable { name });
                }
                tokens.push(Token::Variable(name));
                index = end + 1;
            }
            '0'..='9' | '.' => {
                let start = index;
                while index < bytes.len()
                    && matches!(bytes[index] as char, '0'..='9' | '.')
                {
                    index += 1;
                }
                let literal = &expression[start..index];
                let value =
                    Decimal::from_str(literal).map_err(|_| FormulaError::DisallowedToken {
                        token: literal.to_string(),
                        position: start,
                    })?;
                tokens.push(Token::Number(value));
            }
            _ => {
                // Capture the whole run of unexpected characters for the error.
                let start = index;
                while index < bytes.len()
                    && !matches!(
                        bytes[index] as char,
                        ' ' | '\t' | '\n' | '\r' | '+' | '-' | '*' | '/' | '(' | ')' | '{'
                    )
                {
                    index += 1;
                }
                return Err(FormulaError::DisallowedToken {
                    token: expression[start..index].to_string(),
                    position: start,
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn parse_expression(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_term()?;
        while let Some(operator) = self.peek() {
            match operator {
                Token::Plus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = Expr::Add(Box::new(left), Box::new(right));
                }
                Token::Minus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = Expr::Sub(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_factor()?;
        while let Some(operator) = self.peek() {
            match operator {
                Token::Star => {
                    self.advance();
                    let right = self.parse_factor()?;
                    left = Expr::Mul(Box::new(left), Box::new(right));
                }
                Token::Slash => {
                    self.advance();
                    let right = self.parse_factor()?;
                    left = Expr::Div(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, FormulaError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(*value)),
            Some(Token::Variable(name)) => Ok(Expr::Variable(name.clone())),
            Some(Token::Minus) => {
                let inner = self.parse_factor()?;
                Ok(Expr::Negate(Box::new(inner)))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FormulaError::Malformed {
                        message: "missing closing parenthesis".to_string(),
                    }),
                }
            }
            Some(token) => Err(FormulaError::Malformed {
                message: format!("unexpected token {token:?}"),
            }),
            None => Err(FormulaError::Malformed {
                message: "unexpected end of expression".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, Decimal> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), dec(value)))
            .collect()
    }

    #[test]
    fn test_literal_expression() {
        let formula = CompiledFormula::compile("1500.50").unwrap();
        assert_eq!(formula.evaluate(&HashMap::new()).unwrap(), dec("1500.50"));
    }

    #[test]
    fn test_variable_substitution() {
        let formula = CompiledFormula::compile("{basic_salary} * 0.15").unwrap();
        let result = formula
            .evaluate(&vars(&[("basic_salary", "50000")]))
            .unwrap();
        assert_eq!(result, dec("7500.00"));
    }

    #[test]
    fn test_operator_precedence() {
        let formula = CompiledFormula::compile("2 + 3 * 4").unwrap();
        assert_eq!(formula.evaluate(&HashMap::new()).unwrap(), dec("14"));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let formula = CompiledFormula::compile("(2 + 3) * 4").unwrap();
        assert_eq!(formula.evaluate(&HashMap::new()).unwrap(), dec("20"));
    }

    #[test]
    fn test_unary_minus() {
        let formula = CompiledFormula::compile("-5 + 10").unwrap();
        assert_eq!(formula.evaluate(&HashMap::new()).unwrap(), dec("5"));
    }

    #[test]
    fn test_years_of_service_step_formula() {
        let formula =
            CompiledFormula::compile("{years_of_service} * 100 + {basic_salary} / 100").unwrap();
        let result = formula
            .evaluate(&vars(&[("years_of_service", "3"), ("basic_salary", "50000")]))
            .unwrap();
        assert_eq!(result, dec("800"));
    }

    #[test]
    fn test_missing_whitelisted_variable_evaluates_to_zero() {
        let formula = CompiledFormula::compile("{gross_salary} * 0.01").unwrap();
        assert_eq!(
            formula.evaluate(&HashMap::new()).unwrap(),
            dec("0.00")
        );
    }

    #[test]
    fn test_exec_call_is_rejected_not_executed() {
        let error = CompiledFormula::compile("exec('rm -rf /')").unwrap_err();
        match error {
            FormulaError::DisallowedToken { token, .. } => {
                assert!(token.starts_with("exec"));
            }
            other => panic!("Expected DisallowedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_variable_is_rejected() {
        let error = CompiledFormula::compile("{net_worth} * 2").unwrap_err();
        assert_eq!(
            error,
            FormulaError::UnknownVariable {
                name: "net_worth".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_variable_is_rejected() {
        assert!(matches!(
            CompiledFormula::compile("{basic_salary * 2").unwrap_err(),
            FormulaError::Malformed { .. }
        ));
    }

    #[test]
    fn test_trailing_tokens_are_rejected() {
        assert!(matches!(
            CompiledFormula::compile("1 + 2 3").unwrap_err(),
            FormulaError::Malformed { .. }
        ));
    }

    #[test]
    fn test_empty_expression_is_rejected() {
        assert!(matches!(
            CompiledFormula::compile("").unwrap_err(),
            FormulaError::Malformed { .. }
        ));
    }

    #[test]
    fn test_division_by_zero_reported_at_evaluation() {
        let formula = CompiledFormula::compile("100 / {years_of_service}").unwrap();
        let error = formula
            .evaluate(&vars(&[("years_of_service", "0")]))
            .unwrap_err();
        assert_eq!(error, FormulaError::DivisionByZero);
    }

    #[test]
    fn test_comparison_operators_are_rejected() {
        assert!(CompiledFormula::compile("1 < 2").is_err());
        assert!(CompiledFormula::compile("1 == 1").is_err());
    }

    #[test]
    fn test_compile_once_evaluate_many() {
        let formula = CompiledFormula::compile("{basic_salary} * 0.05").unwrap();
        for salary in ["10000", "20000", "30000"] {
            let result = formula.evaluate(&vars(&[("basic_salary", salary)])).unwrap();
            assert_eq!(result, dec(salary) * dec("0.05"));
        }
    }
}
