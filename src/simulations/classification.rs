//! Classification datasets as bandit problems.
//!
//! Each labelled row becomes an interaction. The actions are the distinct
//! labels of the whole dataset and choosing the row's own label earns 1.

use super::json::SourceConfig;
use super::{Interaction, Key, Reward, Simulation, lookup};
use crate::context::ExecutionContext;
use crate::error::{Result, SimError};
use crate::integrity::Checksum;
use crate::loader::{OpenMlDataset, TableLoader};
use crate::preprocessing::{EncodedTable, Encoded, Encoder, RawTable, Scalar, TableOptions, transform};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// A classification simulation built from an encoded table.
pub type TableSimulation = ClassificationSimulation<Vec<Scalar>, Encoded>;

#[derive(Clone, Debug)]
pub struct ClassificationSimulation<C, A> {
    interactions: Vec<Interaction<C, A>>,
    labels: Vec<A>,
    action_set: Arc<[A]>,
    label_encoder: Option<Encoder>,
    feature_names: Vec<String>,
}

impl<C, A: Clone + Eq + Hash> ClassificationSimulation<C, A> {
    /// # Errors
    ///
    /// [`SimError::Configuration`] unless `features` and `labels` have the
    /// same length of at least 2.
    pub fn new(features: Vec<C>, labels: Vec<A>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(SimError::config(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.len() < 2 {
            return Err(SimError::config(
                "A classification simulation needs at least 2 labelled rows",
            ));
        }

        let mut seen = HashSet::with_capacity(16);
        let distinct: Vec<A> = labels
            .iter()
            .filter(|label| seen.insert(*label))
            .cloned()
            .collect();
        let action_set: Arc<[A]> = Arc::from(distinct);

        let interactions = features
            .into_iter()
            .enumerate()
            .map(|(key, context)| Interaction::new(key, Some(context), Arc::clone(&action_set)))
            .collect();

        Ok(Self {
            interactions,
            labels,
            action_set,
            label_encoder: None,
            feature_names: Vec::new(),
        })
    }

    /// Distinct labels in first-seen order, shared by every interaction.
    pub fn action_set(&self) -> &Arc<[A]> {
        &self.action_set
    }

    pub fn labels(&self) -> &[A] {
        &self.labels
    }

    /// How often each action is the correct label, aligned with [`Self::action_set`].
    pub fn label_counts(&self) -> Vec<(&A, usize)> {
        self.action_set
            .iter()
            .map(|action| (action, self.labels.iter().filter(|l| *l == action).count()))
            .collect()
    }

    /// The fitted label encoder, for mapping actions back to label values.
    pub fn label_encoder(&self) -> Option<&Encoder> {
        self.label_encoder.as_ref()
    }

    /// Names of the columns that make up each context, when built from a table.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl TableSimulation {
    pub fn from_encoded(table: EncodedTable) -> Result<Self> {
        let EncodedTable {
            feature_names,
            contexts,
            labels,
            label_encoder,
        } = table;

        let mut simulation = Self::new(contexts, labels)?;
        simulation.label_encoder = Some(label_encoder);
        simulation.feature_names = feature_names;
        tracing::info!(
            interactions = simulation.interactions.len(),
            actions = simulation.action_set.len(),
            "Built classification simulation"
        );
        Ok(simulation)
    }

    pub fn from_raw(table: &RawTable, options: &TableOptions) -> Result<Self> {
        Self::from_encoded(transform(table, options)?)
    }

    /// Build from rows of text cells; the first row is the header when
    /// `options.has_header` is set.
    pub fn from_table(rows: Vec<Vec<String>>, options: &TableOptions) -> Result<Self> {
        let table = RawTable::from_rows(rows, options.has_header)?;
        Self::from_raw(&table, options)
    }

    pub fn from_csv(
        ctx: &ExecutionContext,
        location: &str,
        checksum: Option<&Checksum>,
        options: &TableOptions,
    ) -> Result<Self> {
        let rows = TableLoader::new(ctx).load_csv(location, checksum)?;
        ctx.in_scope(|| Self::from_table(rows, options))
    }

    pub fn from_openml(ctx: &ExecutionContext, id: u64) -> Result<Self> {
        let dataset = OpenMlDataset::load(ctx, id)?;
        ctx.in_scope(|| Self::from_table(dataset.rows, &dataset.options))
    }

    /// Build from the JSON description of a source, e.g.
    /// `{"format": "openml", "id": 1116}`.
    pub fn from_json(ctx: &ExecutionContext, json: &str) -> Result<Self> {
        SourceConfig::from_json(json)?.build(ctx)
    }
}

impl<C, A: Clone + Eq + Hash + Debug> Simulation for ClassificationSimulation<C, A> {
    type Context = C;
    type Action = A;

    fn interactions(&self) -> &[Interaction<C, A>] {
        &self.interactions
    }

    fn rewards(&self, choices: &[(Key, A)]) -> Result<Vec<Reward>> {
        choices
            .iter()
            .map(|(key, action)| {
                lookup(&self.interactions, *key)?;
                if !self.action_set.contains(action) {
                    return Err(SimError::InvalidChoice(format!(
                        "action {action:?} is not a label of this dataset"
                    )));
                }
                let correct = self.labels.get(*key).is_some_and(|label| label == action);
                Ok(if correct { 1.0 } else { 0.0 })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{ColumnMeta, FactorEncoder};

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells
            .iter()
            .map(|row| row.iter().map(|c| (*c).to_owned()).collect())
            .collect()
    }

    #[test]
    fn test_new_builds_shared_action_set() {
        let sim = ClassificationSimulation::new(vec!["x", "y", "z"], vec![2, 1, 2]).unwrap();

        assert_eq!(sim.action_set().as_ref(), &[2, 1]);
        for interaction in sim.interactions() {
            assert!(Arc::ptr_eq(interaction.shared_actions(), sim.action_set()));
        }
        assert_eq!(sim.label_counts(), vec![(&2, 2), (&1, 1)]);
    }

    #[test]
    fn test_indicator_rewards() {
        let sim = ClassificationSimulation::new(vec![(1, 2), (3, 4)], vec!["a", "b"]).unwrap();
        assert_eq!(
            sim.rewards(&[(0, "a"), (0, "b"), (1, "a"), (1, "b")]).unwrap(),
            vec![1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_new_rejects_bad_shapes() {
        assert!(matches!(
            ClassificationSimulation::new(vec![1], vec!["a", "b"]),
            Err(SimError::Configuration(_))
        ));
        assert!(matches!(
            ClassificationSimulation::new(vec![1], vec!["a"]),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_rewards_reject_unknown_choices() {
        let sim = ClassificationSimulation::new(vec![1, 2], vec!["a", "b"]).unwrap();
        assert!(matches!(sim.rewards(&[(2, "a")]), Err(SimError::InvalidChoice(_))));
        assert!(matches!(sim.rewards(&[(0, "c")]), Err(SimError::InvalidChoice(_))));
    }

    #[test]
    fn test_from_table_one_hot_labels() {
        let options = TableOptions::new()
            .with_default(ColumnMeta::full(false, false, Encoder::factor()))
            .with_override("b", ColumnMeta::label(Some(Encoder::one_hot())));
        let sim = TableSimulation::from_table(
            rows(&[&["a", "b", "c"], &["s1", "2", "3"], &["s2", "5", "6"]]),
            &options,
        )
        .unwrap();

        let one = Scalar::Int(1);
        let zero = Scalar::Int(0);
        assert_eq!(sim.interactions().len(), 2);
        assert_eq!(sim.interactions()[0].context(), Some(&vec![Scalar::Int(1), Scalar::Int(1)]));
        assert_eq!(
            sim.action_set().as_ref(),
            &[
                Encoded::Tuple(vec![one.clone(), zero.clone()]),
                Encoded::Tuple(vec![zero, one]),
            ]
        );
        assert_eq!(sim.feature_names(), &["a", "c"]);

        let encoder = sim.label_encoder().unwrap();
        assert_eq!(encoder.name(), "onehot");
    }

    #[test]
    fn test_from_table_seeded_factor_without_header() {
        let options = TableOptions::new()
            .without_header()
            .with_default(ColumnMeta::full(
                false,
                false,
                Encoder::Factor(FactorEncoder::with_levels(["1", "0"])),
            ))
            .with_label(0_usize);
        let sim = TableSimulation::from_table(
            rows(&[&["1", "0", "1"], &["0", "1", "1"], &["1", "1", "0"]]),
            &options,
        )
        .unwrap();

        assert_eq!(sim.interactions().len(), 3);
        assert_eq!(
            sim.action_set().as_ref(),
            &[Encoded::Scalar(Scalar::Int(1)), Encoded::Scalar(Scalar::Int(2))]
        );
        assert_eq!(
            sim.interactions()[1].context(),
            Some(&vec![Scalar::Int(1), Scalar::Int(1)])
        );
    }
}
