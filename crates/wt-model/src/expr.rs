//! Algebraic expressions over model variables.
//!
//! Constraint bodies, cost curves and objectives are all `Expr` trees. They are
//! evaluated against a dense value vector indexed by `VarId`.

use std::collections::BTreeSet;
use std::ops::{Add, Div, Mul, Neg, Sub};
use wt_core::VarId;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(VarId),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    Neg(Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, f64),
}

impl Expr {
    pub fn var(id: VarId) -> Self {
        Expr::Var(id)
    }

    pub fn constant(v: f64) -> Self {
        Expr::Const(v)
    }

    pub fn zero() -> Self {
        Expr::Const(0.0)
    }

    /// Sum of an arbitrary number of terms. An empty iterator yields zero.
    pub fn sum<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        let terms: Vec<Expr> = terms.into_iter().map(Into::into).collect();
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.into_iter().next().unwrap_or_else(Expr::zero),
            _ => Expr::Sum(terms),
        }
    }

    /// Product of an arbitrary number of factors. An empty iterator yields one.
    pub fn product<I, T>(factors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        let factors: Vec<Expr> = factors.into_iter().map(Into::into).collect();
        match factors.len() {
            0 => Expr::Const(1.0),
            1 => factors.into_iter().next().unwrap_or(Expr::Const(1.0)),
            _ => Expr::Product(factors),
        }
    }

    pub fn powf(self, exponent: f64) -> Self {
        Expr::Pow(Box::new(self), exponent)
    }

    /// Evaluate against a dense value vector.
    pub fn eval(&self, values: &[f64]) -> f64 {
        match self {
            Expr::Const(c) => *c,
            Expr::Var(id) => values.get(id.idx()).copied().unwrap_or(f64::NAN),
            Expr::Sum(terms) => terms.iter().map(|t| t.eval(values)).sum(),
            Expr::Product(factors) => factors.iter().map(|f| f.eval(values)).product(),
            Expr::Neg(inner) => -inner.eval(values),
            Expr::Div(num, den) => num.eval(values) / den.eval(values),
            Expr::Pow(base, e) => base.eval(values).powf(*e),
        }
    }

    /// Collect every variable referenced by the expression.
    pub fn collect_vars(&self, out: &mut BTreeSet<VarId>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(id) => {
                out.insert(*id);
            }
            Expr::Sum(items) | Expr::Product(items) => {
                for item in items {
                    item.collect_vars(out);
                }
            }
            Expr::Neg(inner) | Expr::Pow(inner, _) => inner.collect_vars(out),
            Expr::Div(num, den) => {
                num.collect_vars(out);
                den.collect_vars(out);
            }
        }
    }

    pub fn vars(&self) -> BTreeSet<VarId> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    /// True when the expression references no variables.
    pub fn is_constant(&self) -> bool {
        self.vars().is_empty()
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Const(v)
    }
}

impl From<VarId> for Expr {
    fn from(id: VarId) -> Self {
        Expr::Var(id)
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

impl<T: Into<Expr>> Add<T> for Expr {
    type Output = Expr;

    fn add(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        match self {
            Expr::Sum(mut terms) => {
                terms.push(rhs);
                Expr::Sum(terms)
            }
            lhs => Expr::Sum(vec![lhs, rhs]),
        }
    }
}

impl<T: Into<Expr>> Sub<T> for Expr {
    type Output = Expr;

    fn sub(self, rhs: T) -> Expr {
        self + Expr::Neg(Box::new(rhs.into()))
    }
}

impl<T: Into<Expr>> Mul<T> for Expr {
    type Output = Expr;

    fn mul(self, rhs: T) -> Expr {
        let rhs = rhs.into();
        match self {
            Expr::Product(mut factors) => {
                factors.push(rhs);
                Expr::Product(factors)
            }
            lhs => Expr::Product(vec![lhs, rhs]),
        }
    }
}

impl<T: Into<Expr>> Div<T> for Expr {
    type Output = Expr;

    fn div(self, rhs: T) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs.into()))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}
