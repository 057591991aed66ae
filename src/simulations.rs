//! Contextual-bandit simulations.
//!
//! A simulation is a fixed, re-iterable sequence of [`Interaction`]s plus a
//! reward oracle. Learners read the interactions, choose one action per key
//! and ask [`Simulation::rewards`] what each choice earned.
//!
//! ```
//! use tabsim::simulations::{ClassificationSimulation, Simulation};
//!
//! let sim = ClassificationSimulation::new(vec![1, 2, 3], vec!["a", "b", "a"])?;
//! assert_eq!(sim.interactions().len(), 3);
//! assert_eq!(sim.interactions()[0].actions(), &["a", "b"]);
//! assert_eq!(sim.rewards(&[(0, "a"), (1, "a")])?, vec![1.0, 0.0]);
//! # Ok::<(), tabsim::error::SimError>(())
//! ```
//!
//! ## Variants
//!
//! - [`ClassificationSimulation`]: one interaction per labelled row
//! - [`MemorySimulation`]: precomputed contexts, actions and rewards
//! - [`LambdaSimulation`]: generated from pure functions
//! - [`SimulationConfig`]: declarative JSON that builds a classification simulation

pub mod classification;
pub mod json;
pub mod lambda;
pub mod memory;

pub use classification::{ClassificationSimulation, TableSimulation};
pub use json::{ColumnConfig, CsvSource, OpenMlSource, SimulationConfig, SourceConfig, TableSource};
pub use lambda::{FnSource, InteractionSource, LambdaSimulation};
pub use memory::MemorySimulation;

use crate::error::{Result, SimError};
use std::sync::Arc;

/// Identifies an interaction within its simulation.
pub type Key = usize;

pub type Reward = f64;

/// One decision point: an optional context and the actions available in it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interaction<C, A> {
    key: Key,
    context: Option<C>,
    actions: Arc<[A]>,
}

impl<C, A> Interaction<C, A> {
    pub fn new(key: Key, context: Option<C>, actions: Arc<[A]>) -> Self {
        Self {
            key,
            context,
            actions,
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// The action set as shared with other interactions.
    pub fn shared_actions(&self) -> &Arc<[A]> {
        &self.actions
    }
}

pub trait Simulation {
    type Context;
    type Action;

    /// Built once; every call returns the same sequence.
    fn interactions(&self) -> &[Interaction<Self::Context, Self::Action>];

    /// Rewards for `(key, action)` choices, in the order given.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidChoice`] for keys outside the simulation or actions
    /// not offered at that key.
    fn rewards(&self, choices: &[(Key, Self::Action)]) -> Result<Vec<Reward>>;
}

/// The interaction at `key`, or an [`SimError::InvalidChoice`].
pub(crate) fn lookup<C, A>(interactions: &[Interaction<C, A>], key: Key) -> Result<&Interaction<C, A>> {
    interactions.get(key).ok_or_else(|| {
        SimError::InvalidChoice(format!(
            "key {key} is out of range for {} interactions",
            interactions.len()
        ))
    })
}

/// Position of `action` in `interaction`'s action set.
pub(crate) fn action_position<C, A: PartialEq + std::fmt::Debug>(
    interaction: &Interaction<C, A>,
    action: &A,
) -> Result<usize> {
    interaction
        .actions()
        .iter()
        .position(|a| a == action)
        .ok_or_else(|| {
            SimError::InvalidChoice(format!(
                "action {action:?} is not offered at key {}",
                interaction.key()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_accessors() {
        let actions: Arc<[&str]> = Arc::from(vec!["a", "b"]);
        let interaction = Interaction::new(3, Some((1, 2)), Arc::clone(&actions));

        assert_eq!(interaction.key(), 3);
        assert_eq!(interaction.context(), Some(&(1, 2)));
        assert_eq!(interaction.actions(), &["a", "b"]);
        assert!(Arc::ptr_eq(interaction.shared_actions(), &actions));
    }

    #[test]
    fn test_lookup_errors() {
        let interactions = vec![Interaction::<(), i32>::new(0, None, Arc::from(vec![1, 2]))];
        assert!(matches!(lookup(&interactions, 1), Err(SimError::InvalidChoice(_))));

        let first = lookup(&interactions, 0).unwrap();
        assert_eq!(action_position(first, &2).unwrap(), 1);
        assert!(matches!(
            action_position(first, &7),
            Err(SimError::InvalidChoice(_))
        ));
    }
}
