//! Arithmetic between time-varying values and numbers.

use super::TimeVar;
use crate::types::time::Time;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Operator joining a value to its dependency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    /// Division by zero yields zero
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div if b == 0.0 => 0.0,
            BinOp::Div => a / b,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(BinOp::Add),
            '-' => Some(BinOp::Sub),
            '*' => Some(BinOp::Mul),
            '/' => Some(BinOp::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }
}

/// One side of a composition
#[derive(Clone, Debug)]
pub enum Operand {
    Var(TimeVar),
    Const(f64),
}

impl Operand {
    pub fn value_at(&self, beat: Time) -> f64 {
        match self {
            Operand::Var(var) => var.value_at(beat),
            Operand::Const(c) => *c,
        }
    }

    pub(crate) fn as_var(&self) -> Option<&TimeVar> {
        match self {
            Operand::Var(var) => Some(var),
            Operand::Const(_) => None,
        }
    }
}

impl From<f64> for Operand {
    fn from(c: f64) -> Self {
        Operand::Const(c)
    }
}

impl From<TimeVar> for Operand {
    fn from(var: TimeVar) -> Self {
        Operand::Var(var)
    }
}

impl From<&TimeVar> for Operand {
    fn from(var: &TimeVar) -> Self {
        Operand::Var(var.clone())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(var) => write!(f, "{}", var),
            Operand::Const(c) => write!(f, "{}", c),
        }
    }
}

macro_rules! impl_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<&TimeVar> for &TimeVar {
            type Output = TimeVar;
            fn $method(self, rhs: &TimeVar) -> TimeVar {
                TimeVar::compose(self, $op, rhs)
            }
        }

        impl $trait<TimeVar> for TimeVar {
            type Output = TimeVar;
            fn $method(self, rhs: TimeVar) -> TimeVar {
                TimeVar::compose(self, $op, rhs)
            }
        }

        impl $trait<f64> for &TimeVar {
            type Output = TimeVar;
            fn $method(self, rhs: f64) -> TimeVar {
                TimeVar::compose(self, $op, rhs)
            }
        }

        impl $trait<f64> for TimeVar {
            type Output = TimeVar;
            fn $method(self, rhs: f64) -> TimeVar {
                TimeVar::compose(self, $op, rhs)
            }
        }

        impl $trait<&TimeVar> for f64 {
            type Output = TimeVar;
            fn $method(self, rhs: &TimeVar) -> TimeVar {
                TimeVar::compose(self, $op, rhs)
            }
        }

        impl $trait<TimeVar> for f64 {
            type Output = TimeVar;
            fn $method(self, rhs: TimeVar) -> TimeVar {
                TimeVar::compose(self, $op, rhs)
            }
        }
    };
}

impl_op!(Add, add, BinOp::Add);
impl_op!(Sub, sub, BinOp::Sub);
impl_op!(Mul, mul, BinOp::Mul);
impl_op!(Div, div, BinOp::Div);
