//! Time-varying values
//!
//! A [`TimeVar`] is a list of values, each held for a number of beats, that
//! repeats forever: `var([0, 3], 4)` is 0 for four beats, then 3 for four
//! beats, then 0 again. Reading is a pure function of the beat (plus the
//! one-way infinite-hold state), so a value can be shared by any number of
//! players and redefined live; every holder sees the new definition on its
//! next read.
//!
//! Compositions (`&a + &b`, `&a * 2.0`) keep references to their operands
//! and are recomputed on every read.

mod ops;
mod segments;

pub use ops::{BinOp, Operand};
pub use segments::{Curve, Span, FOREVER_CLAMP};

use crate::error::TimeVarError;
use crate::types::time::Time;
use parking_lot::RwLock;
use segments::Segments;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Anything that knows the current (absolute) beat
pub trait BeatSource {
    fn beat(&self) -> Time;
}

impl BeatSource for Time {
    fn beat(&self) -> Time {
        *self
    }
}

/// Progress of the infinite hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HoldStage {
    /// No infinite segment
    None = 0,
    /// Infinite segment present, no finite segment read yet
    Armed = 1,
    /// A finite segment has been read; the next read of the infinite
    /// segment freezes it
    Waiting = 2,
    /// Frozen until redefined
    Held = 3,
}

impl HoldStage {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => HoldStage::Armed,
            2 => HoldStage::Waiting,
            3 => HoldStage::Held,
            _ => HoldStage::None,
        }
    }
}

struct Hold {
    stage: AtomicU8,
    frozen: AtomicU64,
}

impl Hold {
    fn new(stage: HoldStage) -> Self {
        Self {
            stage: AtomicU8::new(stage as u8),
            frozen: AtomicU64::new(0),
        }
    }

    fn stage(&self) -> HoldStage {
        HoldStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    fn reset(&self, stage: HoldStage) {
        self.stage.store(stage as u8, Ordering::Release);
    }

    fn advance(&self, from: HoldStage, to: HoldStage) {
        let _ = self
            .stage
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire);
    }

    fn frozen(&self) -> f64 {
        f64::from_bits(self.frozen.load(Ordering::Acquire))
    }
}

enum Body {
    Segments {
        segments: Segments,
        dependency: Option<(BinOp, Operand)>,
    },
    Compose {
        left: Operand,
        op: BinOp,
        right: Operand,
    },
}

impl Body {
    fn hold_stage(&self) -> HoldStage {
        match self {
            Body::Segments { segments, .. } if segments.has_hold() => HoldStage::Armed,
            _ => HoldStage::None,
        }
    }

    fn operands(&self) -> Vec<&Operand> {
        match self {
            Body::Segments { dependency, .. } => dependency.iter().map(|(_, d)| d).collect(),
            Body::Compose { left, right, .. } => vec![left, right],
        }
    }
}

struct Cell {
    body: RwLock<Arc<Body>>,
    hold: Hold,
}

/// A shared, redefinable value that changes with the beat
#[derive(Clone)]
pub struct TimeVar {
    cell: Arc<Cell>,
}

impl TimeVar {
    fn from_body(body: Body) -> Self {
        let hold = Hold::new(body.hold_stage());
        Self {
            cell: Arc::new(Cell {
                body: RwLock::new(Arc::new(body)),
                hold,
            }),
        }
    }

    fn with_curve(values: Vec<f64>, durations: Vec<Span>, curve: Curve) -> Result<Self, TimeVarError> {
        let segments = Segments::new(values, durations, curve)?;
        Ok(Self::from_body(Body::Segments {
            segments,
            dependency: None,
        }))
    }

    /// Step-wise value: each value holds for its duration.
    /// Durations are cycled over the values.
    pub fn new(values: Vec<f64>, durations: Vec<Span>) -> Result<Self, TimeVarError> {
        Self::with_curve(values, durations, Curve::Step)
    }

    /// A value that never changes
    pub fn constant(value: f64) -> Self {
        Self::from_body(Body::Compose {
            left: Operand::Const(value),
            op: BinOp::Add,
            right: Operand::Const(0.0),
        })
    }

    /// Linear ramp from each value to the next
    pub fn linear(values: Vec<f64>, durations: Vec<Span>) -> Result<Self, TimeVarError> {
        Self::with_curve(values, durations, Curve::Linear)
    }

    /// Quarter-sine ramp from each value to the next
    pub fn sine(values: Vec<f64>, durations: Vec<Span>) -> Result<Self, TimeVarError> {
        Self::with_curve(values, durations, Curve::Sine)
    }

    /// Exponential ramp from each value to the next
    pub fn exponential(values: Vec<f64>, durations: Vec<Span>) -> Result<Self, TimeVarError> {
        Self::with_curve(values, durations, Curve::Exponential)
    }

    /// `left op right`, recomputed from both operands on every read
    pub fn compose(left: impl Into<Operand>, op: BinOp, right: impl Into<Operand>) -> Self {
        let (left, right) = (left.into(), right.into());
        Self::from_body(Body::Compose { left, op, right })
    }

    fn body(&self) -> Arc<Body> {
        self.cell.body.read().clone()
    }

    /// Value at an absolute beat, with every dependency applied.
    ///
    /// Advances the infinite-hold state machine; nothing else is mutated.
    pub fn value_at(&self, beat: Time) -> f64 {
        match &*self.body() {
            Body::Segments {
                segments,
                dependency,
            } => {
                let raw = self.segment_value(segments, beat);
                match dependency {
                    Some((op, operand)) => op.apply(raw, operand.value_at(beat)),
                    None => raw,
                }
            }
            Body::Compose { left, op, right } => op.apply(left.value_at(beat), right.value_at(beat)),
        }
    }

    fn segment_value(&self, segments: &Segments, beat: Time) -> f64 {
        let hold = &self.cell.hold;
        if hold.stage() == HoldStage::Held {
            return hold.frozen();
        }

        let (index, progress) = segments.locate(beat);
        let value = segments.shaped(index, progress);

        if segments.is_tail(index) {
            if hold.stage() == HoldStage::Waiting {
                hold.frozen.store(value.to_bits(), Ordering::Release);
                hold.advance(HoldStage::Waiting, HoldStage::Held);
            }
        } else {
            hold.advance(HoldStage::Armed, HoldStage::Waiting);
        }
        value
    }

    /// Value at the source's current beat
    pub fn now<S: BeatSource + ?Sized>(&self, source: &S) -> f64 {
        self.value_at(source.beat())
    }

    pub fn hold_stage(&self) -> HoldStage {
        self.cell.hold.stage()
    }

    pub fn is_held(&self) -> bool {
        self.hold_stage() == HoldStage::Held
    }

    /// Replace the values and durations in place, keeping the curve and
    /// any dependency. A composite becomes a plain step value.
    pub fn update(&self, values: Vec<f64>, durations: Vec<Span>) -> Result<(), TimeVarError> {
        let current = self.body();
        let body = match &*current {
            Body::Segments {
                segments,
                dependency,
            } => Body::Segments {
                segments: Segments::new(values, durations, segments.curve)?,
                dependency: dependency.clone(),
            },
            Body::Compose { .. } => Body::Segments {
                segments: Segments::new(values, durations, Curve::Step)?,
                dependency: None,
            },
        };
        self.install(body);
        Ok(())
    }

    /// Take over `other`'s definition; every holder of `self` sees it.
    pub fn redefine(&self, other: &TimeVar) -> Result<(), TimeVarError> {
        if self.same_as(other) {
            return Ok(());
        }
        if other.depends_on(self) {
            return Err(TimeVarError::DependencyCycle);
        }
        let body = other.body();
        let stage = body.hold_stage();
        *self.cell.body.write() = body;
        self.cell.hold.reset(stage);
        Ok(())
    }

    /// Apply `op` with `operand` on top of this value from now on
    pub fn depend_on(&self, op: BinOp, operand: impl Into<Operand>) -> Result<(), TimeVarError> {
        let operand = operand.into();
        if let Some(var) = operand.as_var() {
            if var.same_as(self) || var.depends_on(self) {
                return Err(TimeVarError::DependencyCycle);
            }
        }

        let current = self.body();
        let body = match &*current {
            Body::Segments { segments, .. } => Body::Segments {
                segments: segments.clone(),
                dependency: Some((op, operand)),
            },
            Body::Compose { .. } => Body::Compose {
                left: Operand::Var(TimeVar {
                    cell: Arc::new(Cell {
                        body: RwLock::new(current.clone()),
                        hold: Hold::new(HoldStage::None),
                    }),
                }),
                op,
                right: operand,
            },
        };
        *self.cell.body.write() = Arc::new(body);
        Ok(())
    }

    fn install(&self, body: Body) {
        let stage = body.hold_stage();
        *self.cell.body.write() = Arc::new(body);
        self.cell.hold.reset(stage);
    }

    /// Whether reading `self` reads `other` somewhere down the line
    pub fn depends_on(&self, other: &TimeVar) -> bool {
        self.body().operands().into_iter().any(|operand| match operand.as_var() {
            Some(var) => var.same_as(other) || var.depends_on(other),
            None => false,
        })
    }

    /// Same underlying value (not just equal contents)
    pub fn same_as(&self, other: &TimeVar) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// The values of the segment list (of the left-most operand for a
    /// composite)
    pub fn values(&self) -> Vec<f64> {
        match &*self.body() {
            Body::Segments { segments, .. } => segments.values.clone(),
            Body::Compose { left, .. } => match left {
                Operand::Var(var) => var.values(),
                Operand::Const(c) => vec![*c],
            },
        }
    }

    /// The durations as given
    pub fn durations(&self) -> Vec<Span> {
        match &*self.body() {
            Body::Segments { segments, .. } => segments.durations.clone(),
            Body::Compose { left, right, .. } => match (left, right) {
                (Operand::Var(var), _) | (_, Operand::Var(var)) => var.durations(),
                _ => vec![Span::Forever],
            },
        }
    }

    /// Beats until the value repeats; `None` for values that end in a hold
    /// or never change
    pub fn cycle_length(&self) -> Option<Time> {
        match &*self.body() {
            Body::Segments { segments, .. } => segments.cycle_length(),
            Body::Compose { left, right, .. } => match (left, right) {
                (Operand::Var(var), _) | (_, Operand::Var(var)) => var.cycle_length(),
                _ => None,
            },
        }
    }

    pub fn curve(&self) -> Curve {
        match &*self.body() {
            Body::Segments { segments, .. } => segments.curve,
            Body::Compose { .. } => Curve::Step,
        }
    }

    /// New value mirrored about its largest value (`max - v`)
    pub fn invert(&self) -> Result<TimeVar, TimeVarError> {
        let values = self.values();
        let largest = values.iter().cloned().fold(f64::MIN, f64::max);
        let inverted = values.iter().map(|v| largest - v).collect();
        Self::with_curve(inverted, self.durations(), self.curve())
    }

    /// New value with more segments appended; without new durations the
    /// existing ones keep cycling
    pub fn extend(&self, values: Vec<f64>, durations: Option<Vec<Span>>) -> Result<TimeVar, TimeVarError> {
        let mut all_values = self.values();
        all_values.extend(values);
        let mut all_durations = self.durations();
        if let Some(more) = durations {
            all_durations.extend(more);
        }
        Self::with_curve(all_values, all_durations, self.curve())
    }
}

impl fmt::Display for TimeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.body() {
            Body::Segments {
                segments,
                dependency,
            } => match dependency {
                Some((op, operand)) => write!(f, "({} {} {})", segments, op.symbol(), operand),
                None => write!(f, "{}", segments),
            },
            Body::Compose {
                left: Operand::Const(c),
                op: BinOp::Add,
                right: Operand::Const(z),
            } if *z == 0.0 => write!(f, "{}", c),
            Body::Compose { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}

impl fmt::Debug for TimeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeVar({})", self)
    }
}
