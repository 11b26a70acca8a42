use std::fmt;

/// The shape of the per-lane spawn probability vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDistributionKind {
    /// Probability proportional to `L - i`: lane 0 most likely.
    Triangle,
    /// Weights `(L - i) / Σ k²`, normalized.
    SumSquared,
    /// Every lane equally likely.
    Equal,
    /// Everything spawns in lane 0.
    AllInFirstLane,
    /// Everything spawns in the last lane.
    AllInLastLane,
}

impl LaneDistributionKind {
    /// Parses a configuration-document distribution name.
    ///
    /// Accepts the canonical names (`triangle`, `sum_squared`, `equal`,
    /// `all_in_first_lane`, `all_in_last_lane`), the `linear` alias and the
    /// GUI label `Triangle / Linear`, case-insensitively.
    ///
    /// # Example
    /// ```rust
    /// use multilane_traffic_sim_core::spawning::LaneDistributionKind;
    ///
    /// assert_eq!(
    ///     LaneDistributionKind::parse("Triangle / Linear"),
    ///     Some(LaneDistributionKind::Triangle)
    /// );
    /// assert_eq!(LaneDistributionKind::parse("zipf"), None);
    /// ```
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "triangle" | "linear" | "triangle / linear" => Some(LaneDistributionKind::Triangle),
            "sum_squared" => Some(LaneDistributionKind::SumSquared),
            "equal" => Some(LaneDistributionKind::Equal),
            "all_in_first_lane" => Some(LaneDistributionKind::AllInFirstLane),
            "all_in_last_lane" => Some(LaneDistributionKind::AllInLastLane),
            _ => None,
        }
    }

    /// The canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            LaneDistributionKind::Triangle => "triangle",
            LaneDistributionKind::SumSquared => "sum_squared",
            LaneDistributionKind::Equal => "equal",
            LaneDistributionKind::AllInFirstLane => "all_in_first_lane",
            LaneDistributionKind::AllInLastLane => "all_in_last_lane",
        }
    }
}

impl fmt::Display for LaneDistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Splits a batch of new vehicles over the lanes of the road.
///
/// The probability vector is fixed at construction; each call partitions a
/// batch size `N` into per-lane counts that sum to exactly `N` using a
/// deterministic largest-remainder rounding rule.
#[derive(Debug, Clone)]
pub struct LaneDistribution {
    kind: LaneDistributionKind,
    probabilities: Vec<f64>,
}

impl LaneDistribution {
    /// Builds the distribution for a road with `total_lanes` lanes.
    pub fn new(kind: LaneDistributionKind, total_lanes: usize) -> Self {
        let l = total_lanes as f64;
        let weights: Vec<f64> = match kind {
            LaneDistributionKind::Triangle => (0..total_lanes)
                .map(|i| (l - i as f64) / (0.5 * l * (l + 1.0)))
                .collect(),
            LaneDistributionKind::SumSquared => {
                let squared_sum: f64 = (1..=total_lanes).map(|k| (k * k) as f64).sum();
                (0..total_lanes)
                    .map(|i| (l - i as f64) / squared_sum)
                    .collect()
            }
            LaneDistributionKind::Equal => vec![1.0 / l; total_lanes],
            LaneDistributionKind::AllInFirstLane => {
                let mut p = vec![0.0; total_lanes];
                if let Some(first) = p.first_mut() {
                    *first = 1.0;
                }
                p
            }
            LaneDistributionKind::AllInLastLane => {
                let mut p = vec![0.0; total_lanes];
                if let Some(last) = p.last_mut() {
                    *last = 1.0;
                }
                p
            }
        };
        // Normalize: the sum-squared weights do not add up to 1 on their own
        let total: f64 = weights.iter().sum();
        let probabilities = if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            weights
        };
        Self {
            kind,
            probabilities,
        }
    }

    pub fn kind(&self) -> LaneDistributionKind {
        self.kind
    }

    /// Per-lane spawn probabilities; they sum to 1.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Partitions `total_new_cars` into per-lane counts.
    ///
    /// Counts start as the rounded expectations `round(p[i] · N)` and are
    /// then adjusted one vehicle at a time until they sum to `N`: an excess
    /// is taken from the lane with the smallest rounding error (ties go to
    /// the highest lane index), a deficit is given to the lane with the
    /// largest rounding error (ties go to the lowest lane index).
    ///
    /// # Example
    /// ```rust
    /// use multilane_traffic_sim_core::spawning::{LaneDistribution, LaneDistributionKind};
    ///
    /// let distribution = LaneDistribution::new(LaneDistributionKind::Triangle, 4);
    /// assert_eq!(distribution.cars_per_lane(10), vec![4, 3, 2, 1]);
    /// ```
    pub fn cars_per_lane(&self, total_new_cars: usize) -> Vec<usize> {
        let n = total_new_cars as i64;
        let unrounded: Vec<f64> = self
            .probabilities
            .iter()
            .map(|p| p * total_new_cars as f64)
            .collect();
        let mut counts: Vec<i64> = unrounded.iter().map(|u| u.round() as i64).collect();

        while counts.iter().sum::<i64>() != n {
            let differences: Vec<f64> = unrounded
                .iter()
                .zip(&counts)
                .map(|(u, c)| u - *c as f64)
                .collect();
            if counts.iter().sum::<i64>() > n {
                // Over budget: decrement the lane with the smallest rounding
                // error, ties broken by the highest lane index
                let mut index = 0;
                let mut smallest = f64::INFINITY;
                for (i, d) in differences.iter().enumerate() {
                    if *d <= smallest {
                        smallest = *d;
                        index = i;
                    }
                }
                counts[index] -= 1;
            } else {
                // Under budget: increment the lane with the largest rounding
                // error, ties broken by the lowest lane index
                let mut index = 0;
                let mut largest = f64::NEG_INFINITY;
                for (i, d) in differences.iter().enumerate() {
                    if *d > largest {
                        largest = *d;
                        index = i;
                    }
                }
                counts[index] += 1;
            }
        }

        counts.into_iter().map(|c| c.max(0) as usize).collect()
    }
}
