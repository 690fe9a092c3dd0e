use crate::Real;
use std::{
    fmt::{self, Display},
    ops::{Add, Div, Mul, Sub},
};

/// A rate expression.
///
/// Expressions are plain data: a tree of constants, variables and a handful
/// of arithmetic operators. The variable type V is a symbolic reference while
/// a model is being declared (see [`super::Symbol`]) and becomes a slot index
/// once the model is built, so evaluation is just a walk over the tree with a
/// lookup function.
///
/// Expressions are usually created with the arithmetic operators:
///
/// ```
/// use atv::model::Expr;
///
/// let s: Expr<&str> = Expr::var("S");
/// let i: Expr<&str> = Expr::var("I");
/// let rate = 0.3 * s.clone() * i.clone() / Expr::constant(1.0).max(s + i);
/// let value = rate.eval(&|v: &&str| if *v == "S" { 10.0 } else { 5.0 });
/// assert!((value - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr<V> {
    Const(Real),
    Var(V),
    Add(Box<Expr<V>>, Box<Expr<V>>),
    Sub(Box<Expr<V>>, Box<Expr<V>>),
    Mul(Box<Expr<V>>, Box<Expr<V>>),
    Div(Box<Expr<V>>, Box<Expr<V>>),
    Max(Box<Expr<V>>, Box<Expr<V>>),
}

impl<V> Expr<V> {
    pub fn constant(value: Real) -> Self {
        Expr::Const(value)
    }

    pub fn var(v: V) -> Self {
        Expr::Var(v)
    }

    /// Larger of self and other.
    pub fn max(self, other: impl Into<Expr<V>>) -> Self {
        Expr::Max(Box::new(self), Box::new(other.into()))
    }

    /// Evaluate expression, reading variables from lookup.
    pub fn eval<F>(&self, lookup: &F) -> Real
    where
        F: Fn(&V) -> Real,
    {
        match self {
            Expr::Const(x) => *x,
            Expr::Var(v) => lookup(v),
            Expr::Add(a, b) => a.eval(lookup) + b.eval(lookup),
            Expr::Sub(a, b) => a.eval(lookup) - b.eval(lookup),
            Expr::Mul(a, b) => a.eval(lookup) * b.eval(lookup),
            Expr::Div(a, b) => a.eval(lookup) / b.eval(lookup),
            Expr::Max(a, b) => a.eval(lookup).max(b.eval(lookup)),
        }
    }

    /// Rebuild the expression replacing each variable by f(var). Stops at the
    /// first error.
    pub fn try_map<W, E, F>(&self, f: &mut F) -> Result<Expr<W>, E>
    where
        F: FnMut(&V) -> Result<W, E>,
    {
        let bin = |a: &Self, b: &Self, f: &mut F| -> Result<(Box<Expr<W>>, Box<Expr<W>>), E> {
            Ok((Box::new(a.try_map(f)?), Box::new(b.try_map(f)?)))
        };
        Ok(match self {
            Expr::Const(x) => Expr::Const(*x),
            Expr::Var(v) => Expr::Var(f(v)?),
            Expr::Add(a, b) => {
                let (a, b) = bin(a, b, f)?;
                Expr::Add(a, b)
            }
            Expr::Sub(a, b) => {
                let (a, b) = bin(a, b, f)?;
                Expr::Sub(a, b)
            }
            Expr::Mul(a, b) => {
                let (a, b) = bin(a, b, f)?;
                Expr::Mul(a, b)
            }
            Expr::Div(a, b) => {
                let (a, b) = bin(a, b, f)?;
                Expr::Div(a, b)
            }
            Expr::Max(a, b) => {
                let (a, b) = bin(a, b, f)?;
                Expr::Max(a, b)
            }
        })
    }

    /// All variables in the expression, left to right, with repetitions.
    pub fn vars(&self) -> Vec<&V> {
        let mut out = vec![];
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars<'a>(&'a self, out: &mut Vec<&'a V>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(v) => out.push(v),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Max(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
        }
    }
}

impl<V> From<Real> for Expr<V> {
    fn from(x: Real) -> Self {
        Expr::Const(x)
    }
}

impl<V: Display> Expr<V> {
    /// Products and quotients read left to right, so a nested one on the
    /// right needs parentheses.
    fn fmt_right_factor(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Mul(..) | Expr::Div(..) => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

impl<V: Display> Display for Expr<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(x) => write!(f, "{}", x),
            Expr::Var(v) => write!(f, "{}", v),
            Expr::Add(a, b) => write!(f, "({} + {})", a, b),
            Expr::Sub(a, b) => write!(f, "({} - {})", a, b),
            Expr::Mul(a, b) => {
                write!(f, "{} * ", a)?;
                b.fmt_right_factor(f)
            }
            Expr::Div(a, b) => {
                write!(f, "{} / ", a)?;
                b.fmt_right_factor(f)
            }
            Expr::Max(a, b) => write!(f, "max({}, {})", a, b),
        }
    }
}

/// Implements an arithmetic operator between expressions and between
/// expressions and reals, on both sides.
macro_rules! expr_op {
    ($tr:ident, $method:ident, $variant:ident) => {
        impl<V> $tr for Expr<V> {
            type Output = Expr<V>;

            fn $method(self, rhs: Expr<V>) -> Expr<V> {
                Expr::$variant(Box::new(self), Box::new(rhs))
            }
        }

        impl<V> $tr<Real> for Expr<V> {
            type Output = Expr<V>;

            fn $method(self, rhs: Real) -> Expr<V> {
                Expr::$variant(Box::new(self), Box::new(Expr::Const(rhs)))
            }
        }

        impl<V> $tr<Expr<V>> for Real {
            type Output = Expr<V>;

            fn $method(self, rhs: Expr<V>) -> Expr<V> {
                Expr::$variant(Box::new(Expr::Const(self)), Box::new(rhs))
            }
        }
    };
}

expr_op!(Add, add, Add);
expr_op!(Sub, sub, Sub);
expr_op!(Mul, mul, Mul);
expr_op!(Div, div, Div);
