//! The contract between the clock and the things it plays.

use super::Clock;
use crate::types::time::Time;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Identifies a player registered with a [`Clock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub(crate) u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A schedulable entity.
///
/// Once started, the clock calls [`update_state`](Player::update_state) and
/// [`send`](Player::send) every time the player is due, then files it again
/// [`next_delay`](Player::next_delay) beats later. Errors are logged and the
/// player is retried on its next turn.
pub trait Player: Send {
    fn name(&self) -> &str;

    fn is_playing(&self) -> bool;

    /// Called by the clock when the player starts (on a bar boundary)
    fn play(&mut self);

    fn stop(&mut self);

    /// Recompute the current event for the clock's beat
    fn update_state(&mut self, clock: &Clock) -> anyhow::Result<()>;

    /// Hand the current event to the output
    fn send(&mut self) -> anyhow::Result<()>;

    /// Beats until the player is due again. A delay shorter than a step
    /// still waits for the next step, and the player's timeline resumes from
    /// that step's beat.
    fn next_delay(&self) -> Time;
}

pub type SharedPlayer = Arc<Mutex<dyn Player>>;

/// Wrap a player for registration with a clock
pub fn shared<P: Player + 'static>(player: P) -> Arc<Mutex<P>> {
    Arc::new(Mutex::new(player))
}
