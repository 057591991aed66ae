//! Simulations generated by functions.

use super::{Interaction, Key, Reward, Simulation, action_position, lookup};
use crate::error::Result;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// The three pure functions that define a generated simulation.
pub trait InteractionSource {
    type Context;
    type Action;

    fn context(&self, index: usize) -> Option<Self::Context>;

    fn actions(&self, context: Option<&Self::Context>) -> Vec<Self::Action>;

    fn reward(&self, context: Option<&Self::Context>, action: &Self::Action) -> Reward;
}

/// An [`InteractionSource`] made of closures.
pub struct FnSource<C, A, FC, FA, FR> {
    context: FC,
    actions: FA,
    reward: FR,
    _marker: PhantomData<fn() -> (C, A)>,
}

impl<C, A, FC, FA, FR> InteractionSource for FnSource<C, A, FC, FA, FR>
where
    FC: Fn(usize) -> Option<C>,
    FA: Fn(Option<&C>) -> Vec<A>,
    FR: Fn(Option<&C>, &A) -> Reward,
{
    type Context = C;
    type Action = A;

    fn context(&self, index: usize) -> Option<C> {
        (self.context)(index)
    }

    fn actions(&self, context: Option<&C>) -> Vec<A> {
        (self.actions)(context)
    }

    fn reward(&self, context: Option<&C>, action: &A) -> Reward {
        (self.reward)(context, action)
    }
}

/// Interactions are generated once at construction; rewards are computed per query.
pub struct LambdaSimulation<S: InteractionSource> {
    source: S,
    interactions: Vec<Interaction<S::Context, S::Action>>,
}

impl<S: InteractionSource> LambdaSimulation<S> {
    pub fn new(n_interactions: usize, source: S) -> Self {
        let interactions = (0..n_interactions)
            .map(|key| {
                let context = source.context(key);
                let actions = source.actions(context.as_ref());
                Interaction::new(key, context, Arc::from(actions))
            })
            .collect();

        Self {
            source,
            interactions,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<C, A, FC, FA, FR> LambdaSimulation<FnSource<C, A, FC, FA, FR>>
where
    FC: Fn(usize) -> Option<C>,
    FA: Fn(Option<&C>) -> Vec<A>,
    FR: Fn(Option<&C>, &A) -> Reward,
{
    pub fn from_fns(n_interactions: usize, context: FC, actions: FA, reward: FR) -> Self {
        Self::new(
            n_interactions,
            FnSource {
                context,
                actions,
                reward,
                _marker: PhantomData,
            },
        )
    }
}

impl<S> Simulation for LambdaSimulation<S>
where
    S: InteractionSource,
    S::Action: PartialEq + Debug,
{
    type Context = S::Context;
    type Action = S::Action;

    fn interactions(&self) -> &[Interaction<S::Context, S::Action>] {
        &self.interactions
    }

    fn rewards(&self, choices: &[(Key, S::Action)]) -> Result<Vec<Reward>> {
        choices
            .iter()
            .map(|(key, action)| {
                let interaction = lookup(&self.interactions, *key)?;
                action_position(interaction, action)?;
                Ok(self.source.reward(interaction.context(), action))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn test_from_fns() {
        let sim = LambdaSimulation::from_fns(
            4,
            |i| Some(i as i64),
            |_| vec![0_i64, 1, 2],
            |c, a| (c.copied().unwrap_or(0) - a).abs() as f64,
        );

        assert_eq!(sim.interactions().len(), 4);
        assert_eq!(sim.interactions()[3].context(), Some(&3));
        assert_eq!(sim.interactions()[3].actions(), &[0, 1, 2]);
        assert_eq!(sim.rewards(&[(3, 1), (0, 2)]).unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_context_less_interactions() {
        let sim = LambdaSimulation::from_fns(2, |_| None::<()>, |_| vec!["x"], |_, _| 1.0);
        assert!(sim.interactions().iter().all(|i| i.context().is_none()));
        assert!(matches!(sim.rewards(&[(5, "x")]), Err(SimError::InvalidChoice(_))));
    }

    struct Parity;

    impl InteractionSource for Parity {
        type Context = u32;
        type Action = bool;

        fn context(&self, index: usize) -> Option<u32> {
            Some(index as u32)
        }

        fn actions(&self, _: Option<&u32>) -> Vec<bool> {
            vec![true, false]
        }

        fn reward(&self, context: Option<&u32>, action: &bool) -> Reward {
            f64::from(u8::from(context.is_some_and(|c| c % 2 == 0) == *action))
        }
    }

    #[test]
    fn test_custom_source() {
        let sim = LambdaSimulation::new(3, Parity);
        assert_eq!(
            sim.rewards(&[(0, true), (1, true), (2, false)]).unwrap(),
            vec![1.0, 0.0, 0.0]
        );
    }
}
