//! Precomputed simulations: every interaction and reward given up front.

use super::{Interaction, Key, Reward, Simulation, action_position, lookup};
use crate::error::{Result, SimError};
use std::fmt::Debug;
use std::sync::Arc;

/// A simulation whose contexts, action sets and rewards are all known up front.
///
/// `reward_sets[i][j]` is the reward for the `j`-th action of interaction `i`.
#[derive(Clone, Debug)]
pub struct MemorySimulation<C, A> {
    interactions: Vec<Interaction<C, A>>,
    reward_sets: Vec<Vec<Reward>>,
}

impl<C, A> MemorySimulation<C, A> {
    /// # Errors
    ///
    /// [`SimError::Configuration`] when the three inputs differ in length or
    /// a reward set does not match its action set.
    pub fn new(
        contexts: Vec<Option<C>>,
        action_sets: Vec<Vec<A>>,
        reward_sets: Vec<Vec<Reward>>,
    ) -> Result<Self> {
        if contexts.len() != action_sets.len() || contexts.len() != reward_sets.len() {
            return Err(SimError::config(format!(
                "{} contexts, {} action sets and {} reward sets must have equal length",
                contexts.len(),
                action_sets.len(),
                reward_sets.len()
            )));
        }

        if let Some((key, (actions, rewards))) = action_sets
            .iter()
            .zip(&reward_sets)
            .enumerate()
            .find(|(_, (actions, rewards))| actions.len() != rewards.len())
        {
            return Err(SimError::config(format!(
                "interaction {key} has {} actions but {} rewards",
                actions.len(),
                rewards.len()
            )));
        }

        let interactions = contexts
            .into_iter()
            .zip(action_sets)
            .enumerate()
            .map(|(key, (context, actions))| Interaction::new(key, context, Arc::from(actions)))
            .collect();

        Ok(Self {
            interactions,
            reward_sets,
        })
    }
}

impl<C, A: PartialEq + Debug> Simulation for MemorySimulation<C, A> {
    type Context = C;
    type Action = A;

    fn interactions(&self) -> &[Interaction<C, A>] {
        &self.interactions
    }

    fn rewards(&self, choices: &[(Key, A)]) -> Result<Vec<Reward>> {
        choices
            .iter()
            .map(|(key, action)| {
                let interaction = lookup(&self.interactions, *key)?;
                let position = action_position(interaction, action)?;
                self.reward_sets
                    .get(*key)
                    .and_then(|rewards| rewards.get(position))
                    .copied()
                    .ok_or_else(|| SimError::InvalidChoice(format!("no reward for key {key}")))
            })
            .collect()
    }
}
