//! Parameter expressions for gate angles and durations.
//!
//! Both gate parameters and instruction durations may be symbolic until an
//! upstream binding step substitutes concrete values. The scheduler only
//! accepts expressions that evaluate to a number.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A named, not yet bound parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Check if this expression still references an unbound symbol.
    pub fn is_symbolic(&self) -> bool {
        !self.symbols().is_empty()
    }

    /// Evaluate to a concrete value.
    ///
    /// Returns `None` for symbolic expressions and for division by zero.
    pub fn as_f64(&self) -> Option<f64> {
        self.eval(&|_: &str| None)
    }

    /// Names of all unbound symbols, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk(&mut |expr: &ParameterExpression| {
            if let ParameterExpression::Symbol(name) = expr {
                out.insert(name.clone());
            }
        });
        out
    }

    /// Bind a single symbol to a value.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        self.substitute(&|symbol: &str| (symbol == name).then_some(value))
    }

    fn eval(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
        use ParameterExpression as E;
        match self {
            E::Constant(v) => Some(*v),
            E::Pi => Some(PI),
            E::Symbol(name) => lookup(name),
            E::Neg(e) => e.eval(lookup).map(|v| -v),
            E::Add(a, b) => Some(a.eval(lookup)? + b.eval(lookup)?),
            E::Sub(a, b) => Some(a.eval(lookup)? - b.eval(lookup)?),
            E::Mul(a, b) => Some(a.eval(lookup)? * b.eval(lookup)?),
            E::Div(a, b) => {
                let divisor = b.eval(lookup)?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.eval(lookup)? / divisor)
            }
        }
    }

    fn walk(&self, visit: &mut dyn FnMut(&ParameterExpression)) {
        use ParameterExpression as E;
        visit(self);
        match self {
            E::Constant(_) | E::Pi | E::Symbol(_) => {}
            E::Neg(e) => e.walk(visit),
            E::Add(a, b) | E::Sub(a, b) | E::Mul(a, b) | E::Div(a, b) => {
                a.walk(visit);
                b.walk(visit);
            }
        }
    }

    fn substitute(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        use ParameterExpression as E;
        let pair = |a: &E, b: &E| (Box::new(a.substitute(lookup)), Box::new(b.substitute(lookup)));
        match self {
            E::Symbol(name) => lookup(name).map_or_else(|| self.clone(), E::Constant),
            E::Constant(_) | E::Pi => self.clone(),
            E::Neg(e) => E::Neg(Box::new(e.substitute(lookup))),
            E::Add(a, b) => {
                let (a, b) = pair(a, b);
                E::Add(a, b)
            }
            E::Sub(a, b) => {
                let (a, b) = pair(a, b);
                E::Sub(a, b)
            }
            E::Mul(a, b) => {
                let (a, b) = pair(a, b);
                E::Mul(a, b)
            }
            E::Div(a, b) => {
                let (a, b) = pair(a, b);
                E::Div(a, b)
            }
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<u64> for ParameterExpression {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        ParameterExpression::Constant(value as f64)
    }
}

impl From<&str> for ParameterExpression {
    fn from(name: &str) -> Self {
        ParameterExpression::Symbol(name.to_string())
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
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
    fn test_constant() {
        let p = ParameterExpression::constant(160.0);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(160.0));
    }

    #[test]
    fn test_symbol_is_unbound() {
        let p = ParameterExpression::symbol("t_meas") * ParameterExpression::constant(2.0);
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert_eq!(p.symbols().into_iter().collect::<Vec<_>>(), vec!["t_meas"]);
    }

    #[test]
    fn test_bind() {
        let p = ParameterExpression::symbol("theta") + ParameterExpression::pi();
        let bound = p.bind("theta", 1.0);
        assert!(!bound.is_symbolic());
        assert!((bound.as_f64().unwrap() - (1.0 + PI)).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_is_not_a_value() {
        let p = ParameterExpression::constant(1.0) / ParameterExpression::constant(0.0);
        assert_eq!(p.as_f64(), None);
        assert!(!p.is_symbolic());
    }
}
