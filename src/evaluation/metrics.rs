//! Binary confusion counts and F1.

use std::ops::AddAssign;

use serde::Serialize;

/// Confusion counts of one binary column, or of several pooled together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
}

impl ConfusionCounts {
    /// Count paired (prediction, ground truth) cells.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let mut counts = Self::default();
        for (predicted, actual) in pairs {
            counts.record(predicted == 1, actual == 1);
        }
        counts
    }

    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_ += 1,
            (false, false) => self.tn += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.fn_ + self.tn
    }

    /// 2·tp / (2·tp + fp + fn); zero division scores 0.
    pub fn f1(&self) -> f64 {
        let denominator = 2 * self.tp + self.fp + self.fn_;
        if denominator == 0 {
            return 0.0;
        }
        (2 * self.tp) as f64 / denominator as f64
    }

    /// Counts with prediction and ground truth swapped.
    pub fn transpose(&self) -> Self {
        Self {
            tp: self.tp,
            fp: self.fn_,
            fn_: self.fp,
            tn: self.tn,
        }
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
        self.tn += other.tn;
    }
}
