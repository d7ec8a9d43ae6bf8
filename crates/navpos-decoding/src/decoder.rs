// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Classifiers over spike-count features.
//!
//! Both decoders z-score features with statistics of the training set, so
//! neurons with high firing rates do not dominate the distance.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{DecodingError, DecodingResult};

/// A trainable classifier
///
/// `fit` replaces any previous state, so one instance can be refitted per fold.
pub trait Decoder: Send {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[i64]) -> DecodingResult<()>;
    fn predict(&self, x: ArrayView2<'_, f64>) -> DecodingResult<Vec<i64>>;
}

/// Which decoder to build for each fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    NearestCentroid,
    KNearestNeighbors { k: usize },
}

impl DecoderKind {
    /// Look up a decoder by its command-line name
    ///
    /// `"linear"` is accepted as an alias of `"centroid"`.
    pub fn from_name(name: &str, neighbors: usize) -> Option<Self> {
        match name {
            "linear" | "centroid" => Some(Self::NearestCentroid),
            "neighbors" => Some(Self::KNearestNeighbors { k: neighbors }),
            _ => None,
        }
    }

    pub fn build(&self) -> Box<dyn Decoder> {
        match *self {
            Self::NearestCentroid => Box::new(NearestCentroid::default()),
            Self::KNearestNeighbors { k } => Box::new(KNearestNeighbors::new(k)),
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearestCentroid => write!(f, "centroid"),
            Self::KNearestNeighbors { k } => write!(f, "neighbors(k={})", k),
        }
    }
}

fn check_training_set(x: &ArrayView2<'_, f64>, y: &[i64]) -> DecodingResult<()> {
    if x.nrows() != y.len() {
        return Err(DecodingError::LabelLength {
            expected: y.len(),
            actual: x.nrows(),
        });
    }
    if y.is_empty() {
        return Err(DecodingError::EmptyTrainingSet);
    }
    Ok(())
}

/// Per-feature z-scoring; constant features are only centered
#[derive(Debug, Clone, PartialEq)]
struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    fn fit(x: &ArrayView2<'_, f64>) -> DecodingResult<Self> {
        let mean = x.mean_axis(Axis(0)).ok_or(DecodingError::EmptyTrainingSet)?;
        let scale = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    fn transform(&self, x: &ArrayView2<'_, f64>) -> DecodingResult<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(DecodingError::FeatureCount {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum()
}

/// Assigns each trial to the class with the closest mean feature vector
///
/// Distance ties go to the smaller class label.
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    standardizer: Option<Standardizer>,
    classes: Vec<i64>,
    centroids: Array2<f64>,
}

impl NearestCentroid {
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}

impl Decoder for NearestCentroid {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[i64]) -> DecodingResult<()> {
        check_training_set(&x, y)?;
        let standardizer = Standardizer::fit(&x)?;
        let z = standardizer.transform(&x)?;

        let classes: Vec<i64> = y.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let mut centroids = Array2::zeros((classes.len(), z.ncols()));
        for (row, class) in classes.iter().enumerate() {
            let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == *class).collect();
            let centroid = z
                .select(Axis(0), &members)
                .mean_axis(Axis(0))
                .ok_or(DecodingError::EmptyTrainingSet)?;
            centroids.row_mut(row).assign(&centroid);
        }

        self.standardizer = Some(standardizer);
        self.classes = classes;
        self.centroids = centroids;
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> DecodingResult<Vec<i64>> {
        let standardizer = self.standardizer.as_ref().ok_or(DecodingError::NotFitted)?;
        let z = standardizer.transform(&x)?;

        let predictions = z
            .rows()
            .into_iter()
            .map(|sample| {
                let mut best = (f64::INFINITY, self.classes[0]);
                for (centroid, &class) in self.centroids.rows().into_iter().zip(&self.classes) {
                    let d = squared_distance(sample, centroid);
                    if d < best.0 {
                        best = (d, class);
                    }
                }
                best.1
            })
            .collect();
        Ok(predictions)
    }
}

/// Majority vote of the `k` closest training trials
///
/// Vote ties go to the class whose member ranks closest.
#[derive(Debug, Clone)]
pub struct KNearestNeighbors {
    k: usize,
    standardizer: Option<Standardizer>,
    train_x: Array2<f64>,
    train_y: Vec<i64>,
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            standardizer: None,
            train_x: Array2::zeros((0, 0)),
            train_y: Vec::new(),
        }
    }

    fn vote(&self, sample: ArrayView1<'_, f64>) -> i64 {
        let mut order: Vec<(f64, usize)> = self
            .train_x
            .rows()
            .into_iter()
            .map(|row| squared_distance(sample, row))
            .zip(0..)
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        // class -> (votes, rank of its closest member)
        let mut votes: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
        for (rank, &(_, i)) in order.iter().take(self.k).enumerate() {
            let entry = votes.entry(self.train_y[i]).or_insert((0, rank));
            entry.0 += 1;
        }

        votes
            .into_iter()
            .max_by(|(_, (va, ra)), (_, (vb, rb))| va.cmp(vb).then(rb.cmp(ra)))
            .map_or(self.train_y[0], |(class, _)| class)
    }
}

impl Decoder for KNearestNeighbors {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[i64]) -> DecodingResult<()> {
        check_training_set(&x, y)?;
        let standardizer = Standardizer::fit(&x)?;
        self.train_x = standardizer.transform(&x)?;
        self.train_y = y.to_vec();
        self.standardizer = Some(standardizer);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> DecodingResult<Vec<i64>> {
        let standardizer = self.standardizer.as_ref().ok_or(DecodingError::NotFitted)?;
        let z = standardizer.transform(&x)?;
        Ok(z.rows().into_iter().map(|sample| self.vote(sample)).collect())
    }
}

/// Interleaved k-fold accuracy: trial `i` is tested in fold `i % folds`
///
/// # Errors
///
/// `InvalidFolds` for fewer than two folds or fewer trials than folds;
/// otherwise whatever the decoder reports.
pub fn cross_validate(
    decoder: &mut dyn Decoder,
    x: ArrayView2<'_, f64>,
    y: &[i64],
    folds: usize,
) -> DecodingResult<f64> {
    check_training_set(&x, y)?;
    let n = y.len();
    if folds < 2 || n < folds {
        return Err(DecodingError::InvalidFolds { folds, trials: n });
    }

    let mut correct = 0;
    for fold in 0..folds {
        let (test, train): (Vec<usize>, Vec<usize>) = (0..n).partition(|i| i % folds == fold);
        let train_y: Vec<i64> = train.iter().map(|&i| y[i]).collect();

        decoder.fit(x.select(Axis(0), &train).view(), &train_y)?;
        let predicted = decoder.predict(x.select(Axis(0), &test).view())?;
        correct += predicted
            .iter()
            .zip(&test)
            .filter(|(p, &i)| **p == y[i])
            .count();
    }

    Ok(correct as f64 / n as f64)
}
