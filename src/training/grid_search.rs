//! Exhaustive grid search with cross-validation

use super::cross_validation::{CVResults, CVSplit, CrossValidator};
use super::models::{r2_score, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// One hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParameterValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            ParameterValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Null)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Null => f.write_str("null"),
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::Int(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Str(v) => write!(f, "{}", v),
        }
    }
}

/// A single hyperparameter assignment
pub type Params = BTreeMap<String, ParameterValue>;

/// Candidate values per hyperparameter name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterGrid {
    params: BTreeMap<String, Vec<ParameterValue>>,
}

impl ParameterGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with its candidate values
    pub fn add(mut self, name: impl Into<String>, values: Vec<ParameterValue>) -> Self {
        self.params.insert(name.into(), values);
        self
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.values().map(Vec::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination, names in sorted order with the last name varying fastest
    pub fn candidates(&self) -> Vec<Params> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut combos: Vec<Params> = vec![Params::new()];
        for (name, values) in &self.params {
            combos = combos
                .into_iter()
                .flat_map(|partial| {
                    values.iter().map(move |v| {
                        let mut next = partial.clone();
                        next.insert(name.clone(), v.clone());
                        next
                    })
                })
                .collect();
        }
        combos
    }
}

/// Render an assignment as `name=value, ...`
pub fn format_params(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cross-validated score of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: Params,
    pub cv: CVResults,
}

/// Outcome of a grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_params: Params,
    /// Mean R^2 of the best candidate across folds
    pub best_score: f64,
    pub best_index: usize,
    pub candidates: Vec<CandidateResult>,
}

/// Grid search scored by mean R^2 across cross-validation folds
pub struct GridSearchCv {
    cv: CrossValidator,
}

impl GridSearchCv {
    pub fn new(cv: CrossValidator) -> Self {
        Self { cv }
    }

    /// Score every candidate of `grid` and return the best.
    ///
    /// `factory` builds an unfitted model for a parameter assignment. All
    /// candidates share the same folds; on equal scores the earlier candidate wins.
    pub fn fit<F>(
        &self,
        factory: F,
        grid: &ParameterGrid,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<GridSearchResult>
    where
        F: Fn(&Params) -> Result<Box<dyn Regressor>> + Sync,
    {
        let candidates = grid.candidates();
        if candidates.is_empty() {
            return Err(ForecastError::ConfigError(
                "hyperparameter grid has no candidates".to_string(),
            ));
        }

        let splits = self.cv.split(x.nrows())?;
        debug!(
            candidates = candidates.len(),
            folds = splits.len(),
            "starting grid search"
        );

        let results = candidates
            .into_par_iter()
            .map(|params| {
                let scores = splits
                    .iter()
                    .map(|split| score_fold(&factory, &params, split, x, y))
                    .collect::<Result<Vec<f64>>>()?;
                let cv = CVResults::from_scores(scores);
                debug!(
                    params = %format_params(&params),
                    mean_r2 = cv.mean_score,
                    std_r2 = cv.std_score,
                    "scored candidate"
                );
                Ok(CandidateResult { params, cv })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut best_index = 0;
        for (i, candidate) in results.iter().enumerate() {
            let best = results[best_index].cv.mean_score;
            let score = candidate.cv.mean_score;
            if score > best || (best.is_nan() && !score.is_nan()) {
                best_index = i;
            }
        }

        let best = &results[best_index];
        Ok(GridSearchResult {
            best_params: best.params.clone(),
            best_score: best.cv.mean_score,
            best_index,
            candidates: results,
        })
    }
}

fn score_fold<F>(
    factory: &F,
    params: &Params,
    split: &CVSplit,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<f64>
where
    F: Fn(&Params) -> Result<Box<dyn Regressor>>,
{
    let x_train = x.select(Axis(0), &split.train_indices);
    let y_train = y.select(Axis(0), &split.train_indices);
    let x_test = x.select(Axis(0), &split.test_indices);
    let y_test = y.select(Axis(0), &split.test_indices);

    let mut model = factory(params)?;
    model.fit(&x_train, &y_train)?;
    let predictions = model.predict(&x_test)?;
    r2_score(&y_test, &predictions)
}
