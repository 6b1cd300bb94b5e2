//! Random forest classifier.
//!
//! - [`RandomForest`] = `RandomForestClassifier<Unfitted>`: hyperparameters only.
//! - `RandomForestClassifier<Fitted>`: the trained trees, inference and serialization.
//!
//! Each tree is grown on a bootstrap sample with its own RNG, seeded from a
//! per-tree seed drawn up front from the master seed. Trees are fitted in
//! parallel, and the result does not depend on thread scheduling.
//! Prediction averages the leaf class distributions of all trees and takes
//! the most probable class (ties go to the lower class index).

use crate::model::tree::{DecisionTree, TreeConfig};
use crate::model::{Fitted, InferenceModel, ModelError, Unfitted};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// How many features each split examines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// `max(1, floor(sqrt(n_features)))`.
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k.min(n_features),
        };
        k.max(1)
    }
}

/// Forest hyperparameters.
///
/// Defaults:
/// - `n_estimators`: 300
/// - `max_depth`: 15
/// - `min_samples_split`: 5
/// - `min_samples_leaf`: 1
/// - `max_features`: `Sqrt`
/// - `bootstrap`: true
/// - `seed`: 42
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidConfig("n_estimators must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(ModelError::InvalidConfig("max_features must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Serializable parameters of a fitted forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub config: ForestConfig,
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

/// Random forest of CART trees.
///
/// - When `S = Unfitted`: holds a [`ForestConfig`] and can be fitted.
/// - When `S = Fitted`: holds the trees; implements [`InferenceModel`].
#[derive(Clone, Debug)]
pub struct RandomForestClassifier<S> {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    _state: PhantomData<S>,
}

/// Alias for an **unfitted** random forest.
pub type RandomForest = RandomForestClassifier<Unfitted>;

impl<S> RandomForestClassifier<S> {
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl RandomForestClassifier<Unfitted> {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
            _state: PhantomData,
        }
    }

    /// Fit the forest on `x` (one row per sample) and class indices `y`.
    pub fn fit(
        self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<RandomForestClassifier<Fitted>, ModelError> {
        self.config.validate()?;
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if n_samples != y.len() {
            return Err(ModelError::LabelMismatch {
                n_rows: n_samples,
                n_labels: y.len(),
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(ModelError::InvalidLabel { label, n_classes });
        }

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(n_features),
        };

        let mut master = StdRng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..self.config.n_estimators).map(|_| master.gen()).collect();
        let bootstrap = self.config.bootstrap;

        tracing::debug!(
            n_estimators = self.config.n_estimators,
            n_samples,
            n_features,
            max_features = tree_config.max_features,
            "fitting random forest"
        );

        let trees: Vec<DecisionTree> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(x, y, samples, n_classes, &tree_config, &mut rng)
            })
            .collect();

        Ok(RandomForestClassifier {
            config: self.config,
            trees,
            n_features,
            n_classes,
            _state: PhantomData,
        })
    }
}

impl RandomForestClassifier<Fitted> {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean class distribution over all trees.
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, ModelError> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)?) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<usize, ModelError> {
        Ok(argmax(&self.predict_proba_row(row)?))
    }

    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        let mut out = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let proba = self.predict_proba_row(row)?;
            out.row_mut(i).assign(&ArrayView1::from(&proba[..]));
        }
        Ok(out)
    }

    /// Predicted class index for each row of `x`.
    pub fn predict_view(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, ModelError> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl InferenceModel for RandomForestClassifier<Fitted> {
    type InputSingle = [f64];
    type InputBatch = Array2<f64>;
    type OutputSingle = usize;
    type OutputBatch = Vec<usize>;
    type ParamsRepr = ForestParams;

    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle, ModelError> {
        self.predict_row(ArrayView1::from(input))
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch, ModelError> {
        self.predict_view(input.view())
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        ForestParams {
            config: self.config.clone(),
            n_features: self.n_features,
            n_classes: self.n_classes,
            trees: self.trees.clone(),
        }
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self, ModelError> {
        if params.trees.is_empty() {
            return Err(ModelError::CorruptParams("forest has no trees".to_string()));
        }
        if params.n_classes == 0 {
            return Err(ModelError::CorruptParams("forest has no classes".to_string()));
        }
        for tree in &params.trees {
            tree.validate(params.n_features, params.n_classes)?;
        }
        Ok(Self {
            config: params.config,
            trees: params.trees,
            n_features: params.n_features,
            n_classes: params.n_classes,
            _state: PhantomData,
        })
    }
}
