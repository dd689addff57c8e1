use serde::{Deserialize, Serialize};

use crate::util::mean;

/// Restore steps recorded per row, in csv column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    StartJvm,
    StartCommunication,
    PrepareCkpts,
    ApplyCkpts,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::StartJvm,
        Stage::StartCommunication,
        Stage::PrepareCkpts,
        Stage::ApplyCkpts,
    ];

    pub fn column(&self) -> usize {
        match self {
            Stage::StartJvm => 0,
            Stage::StartCommunication => 1,
            Stage::PrepareCkpts => 2,
            Stage::ApplyCkpts => 3,
        }
    }

    /// Legend label
    pub fn label(&self) -> &'static str {
        match self {
            Stage::StartJvm => "JVM Initialization",
            Stage::StartCommunication => "Gather Checkpoints",
            Stage::PrepareCkpts => "Serialize Checkpoints",
            Stage::ApplyCkpts => "Apply Checkpoints",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::StartJvm => "StartJvm",
            Stage::StartCommunication => "StartCommunication",
            Stage::PrepareCkpts => "PrepareCkpts",
            Stage::ApplyCkpts => "ApplyCkpts",
        }
    }
}

/// Durations in seconds observed for one stage, with their running mean
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSeries {
    values: Vec<f64>,
    mean: f64,
}

impl StageSeries {
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
        self.mean = mean(&self.values);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `0.0` while empty
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreBreakdown {
    pub condition: String,
    series: [StageSeries; 4],
}

impl RestoreBreakdown {
    pub fn new(condition: &str) -> Self {
        Self {
            condition: condition.to_owned(),
            series: Default::default(),
        }
    }

    /// Appends one row's worth of values, keeping all four series the same length
    pub fn push_row(&mut self, values: [f64; 4]) {
        for (series, value) in self.series.iter_mut().zip(values) {
            series.push(value);
        }
    }

    pub fn series(&self, stage: Stage) -> &StageSeries {
        &self.series[stage.column()]
    }

    pub fn mean(&self, stage: Stage) -> f64 {
        self.series(stage).mean()
    }

    pub fn means(&self) -> [f64; 4] {
        Stage::ALL.map(|stage| self.mean(stage))
    }

    /// Number of rows consumed for this condition
    pub fn samples(&self) -> usize {
        self.series[0].len()
    }
}
