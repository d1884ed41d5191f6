//! Symbolic gate parameters.
//!
//! A [`ParameterExpression`] is a small arithmetic tree over constants,
//! named symbols and the literal `pi`. Rotation gates store one of these
//! instead of a bare `f64`, so a circuit can be built with free angles and
//! bound later — the usual variational workflow. Passes that need a
//! concrete number go through [`as_f64`](ParameterExpression::as_f64)
//! (lenient, returns `None`) or
//! [`evaluate`](ParameterExpression::evaluate) (strict, reports *which*
//! symbol blocked evaluation as an [`IrError::UnboundParameter`]).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// Arithmetic connective of a [`ParameterExpression::Binary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            BinaryOp::Add => Some(lhs + rhs),
            BinaryOp::Sub => Some(lhs - rhs),
            BinaryOp::Mul => Some(lhs * rhs),
            BinaryOp::Div => {
                if rhs == 0.0 {
                    None
                } else {
                    Some(lhs / rhs)
                }
            }
        }
    }

    fn glyph(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A concrete numeric value.
    Constant(f64),
    /// A free symbol, bound later by name.
    Symbol(String),
    /// The constant pi.
    Pi,
    /// Negation of a sub-expression.
    Neg(Box<ParameterExpression>),
    /// Two sub-expressions joined by an arithmetic operator.
    Binary(
        BinaryOp,
        Box<ParameterExpression>,
        Box<ParameterExpression>,
    ),
}

impl ParameterExpression {
    /// A concrete numeric parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// A free symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// The constant pi.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// True if any free symbol remains anywhere in the tree.
    pub fn is_symbolic(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ParameterExpression::Symbol(_) => return true,
                ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
                ParameterExpression::Neg(inner) => stack.push(inner),
                ParameterExpression::Binary(_, lhs, rhs) => {
                    stack.push(lhs);
                    stack.push(rhs);
                }
            }
        }
        false
    }

    /// Evaluate to a concrete value, if the tree has no free symbols and
    /// no division by zero. The lenient counterpart of [`evaluate`].
    ///
    /// [`evaluate`]: ParameterExpression::evaluate
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(value) => Some(*value),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(inner) => inner.as_f64().map(|v| -v),
            ParameterExpression::Binary(op, lhs, rhs) => {
                op.apply(lhs.as_f64()?, rhs.as_f64()?)
            }
        }
    }

    /// Evaluate to a concrete value, reporting the offending symbol (or
    /// the unevaluable sub-expression) when that is not possible.
    pub fn evaluate(&self) -> IrResult<f64> {
        self.as_f64().ok_or_else(|| {
            let blocker = self
                .symbols()
                .into_iter()
                .next()
                .unwrap_or_else(|| self.to_string());
            IrError::UnboundParameter(blocker)
        })
    }

    /// Names of every free symbol in the tree.
    pub fn symbols(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ParameterExpression::Symbol(name) => {
                    names.insert(name.clone());
                }
                ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
                ParameterExpression::Neg(inner) => stack.push(inner),
                ParameterExpression::Binary(_, lhs, rhs) => {
                    stack.push(lhs);
                    stack.push(rhs);
                }
            }
        }
        names
    }

    /// Substitute `value` for every occurrence of the symbol `name`,
    /// returning the rewritten tree. Other symbols are untouched.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        match self {
            ParameterExpression::Symbol(n) if n == name => {
                ParameterExpression::Constant(value)
            }
            ParameterExpression::Constant(_)
            | ParameterExpression::Pi
            | ParameterExpression::Symbol(_) => self.clone(),
            ParameterExpression::Neg(inner) => {
                ParameterExpression::Neg(Box::new(inner.bind(name, value)))
            }
            ParameterExpression::Binary(op, lhs, rhs) => ParameterExpression::Binary(
                *op,
                Box::new(lhs.bind(name, value)),
                Box::new(rhs.bind(name, value)),
            ),
        }
    }

    /// Fold every fully-constant subtree down to a single
    /// [`Constant`](ParameterExpression::Constant) node.
    pub fn simplify(&self) -> Self {
        if let Some(value) = self.as_f64() {
            return ParameterExpression::Constant(value);
        }
        match self {
            ParameterExpression::Neg(inner) => {
                ParameterExpression::Neg(Box::new(inner.simplify()))
            }
            ParameterExpression::Binary(op, lhs, rhs) => ParameterExpression::Binary(
                *op,
                Box::new(lhs.simplify()),
                Box::new(rhs.simplify()),
            ),
            leaf => leaf.clone(),
        }
    }

    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        ParameterExpression::Binary(op, Box::new(lhs), Box::new(rhs))
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(value) => write!(f, "{value}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "pi"),
            ParameterExpression::Neg(inner) => write!(f, "-({inner})"),
            ParameterExpression::Binary(op, lhs, rhs) => {
                write!(f, "({lhs} {} {rhs})", op.glyph())
            }
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Add, self, rhs)
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Sub, self, rhs)
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Mul, self, rhs)
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Div, self, rhs)
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_and_pi_are_concrete() {
        let c = ParameterExpression::constant(1.5);
        assert!(!c.is_symbolic());
        assert_eq!(c.as_f64(), Some(1.5));

        let pi = ParameterExpression::pi();
        assert!(!pi.is_symbolic());
        assert_eq!(pi.as_f64(), Some(PI));
    }

    #[test]
    fn test_symbol_blocks_concrete_evaluation() {
        let theta = ParameterExpression::symbol("theta");
        assert!(theta.is_symbolic());
        assert_eq!(theta.as_f64(), None);
        assert!(theta.symbols().contains("theta"));
    }

    #[test]
    fn test_evaluate_names_the_unbound_symbol() {
        let expr = ParameterExpression::symbol("theta") + ParameterExpression::pi();
        match expr.evaluate() {
            Err(IrError::UnboundParameter(name)) => assert_eq!(name, "theta"),
            other => panic!("expected UnboundParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_succeeds_once_bound() {
        let expr = ParameterExpression::symbol("theta") * ParameterExpression::constant(2.0);
        let bound = expr.bind("theta", PI / 4.0);
        assert!((bound.evaluate().unwrap() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_is_not_concrete() {
        let expr = ParameterExpression::constant(1.0) / ParameterExpression::constant(0.0);
        assert_eq!(expr.as_f64(), None);
        assert!(expr.evaluate().is_err());
    }

    #[test]
    fn test_bind_leaves_other_symbols_alone() {
        let expr = ParameterExpression::symbol("a") + ParameterExpression::symbol("b");
        let bound = expr.bind("a", 1.0);
        assert!(bound.is_symbolic());
        assert_eq!(bound.symbols().len(), 1);
        assert!(bound.symbols().contains("b"));
    }

    #[test]
    fn test_simplify_folds_constant_subtrees() {
        let expr = (ParameterExpression::constant(2.0) * ParameterExpression::constant(3.0))
            + ParameterExpression::symbol("x");
        let simplified = expr.simplify();
        match &simplified {
            ParameterExpression::Binary(BinaryOp::Add, lhs, _) => {
                assert_eq!(lhs.as_f64(), Some(6.0));
            }
            other => panic!("expected an Add node, got {other:?}"),
        }
    }

    #[test]
    fn test_display_renders_the_tree() {
        let expr = -(ParameterExpression::symbol("phi") / ParameterExpression::constant(2.0));
        assert_eq!(expr.to_string(), "-((phi / 2))");
    }
}
