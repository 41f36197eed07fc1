//! Clock period prediction for tempo-synced oscillators.

/*
Pattern Predictor
=================

A synced LFO wants the period of an external clock. Clocks played by hand or
sent from a sequencer are never perfectly regular: the raw interval between
two edges jitters, an edge goes missing, a ghost edge sneaks in. Using the
latest interval directly makes the LFO wobble.

Vocabulary
----------

  observation   One measured interval between two rising edges, in ticks.

  stable period The predictor's current belief about the clock period.

  ratio         A simple integer relation p:q between an observation and the
                stable period. 2:1 is a missed edge, 1:2 is an extra one.

  tolerance     How close (1/16 of the candidate) an observation must be to
                `period * p / q` to count as that ratio.


Algorithm
---------

    warm-up (first 3 edges)    period = (period + 3 * observation) / 4
    observation ~ period       period = (7 * period + observation) / 8
    observation ~ period * p/q period unchanged (missed or extra edges)
        ... same p:q 3 times   re-lock on the mean of those observations
    no ratio fits              period = (3 * period + observation) / 4

The last line is the bounded smoothing step: a single outlier can move the
prediction by at most a quarter of its distance from the stable period.
*/

use crate::SYNC_COUNTER_MAX_TIME;

const RATIOS: [(u32, u32); 9] = [
    (1, 1),
    (1, 2),
    (2, 1),
    (1, 3),
    (3, 1),
    (2, 3),
    (3, 2),
    (1, 4),
    (4, 1),
];

const TOLERANCE_SHIFT: u32 = 4;
const WARMUP_EDGES: u32 = 3;
const RELOCK_EDGES: usize = 3;

/// Fixed-capacity history of recent intervals plus the current stable period.
#[derive(Debug, Clone)]
pub struct PatternPredictor<const HISTORY: usize = 32> {
    history: [u32; HISTORY],
    head: usize,
    edges: u32,
    period: u32,
    last_ratio: (u32, u32),
    ratio_streak: usize,
}

impl<const HISTORY: usize> PatternPredictor<HISTORY> {
    pub fn new() -> Self {
        Self {
            history: [0; HISTORY],
            head: 0,
            edges: 0,
            period: 0,
            last_ratio: (1, 1),
            ratio_streak: 0,
        }
    }

    /// Forget everything; the next edges go through warm-up again.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed one observed interval, get the predicted next period.
    pub fn predict(&mut self, observed: u32) -> u32 {
        let observed = observed.clamp(1, SYNC_COUNTER_MAX_TIME);
        self.push(observed);
        self.edges = self.edges.saturating_add(1);

        if self.period == 0 {
            self.period = observed;
            return self.period;
        }

        if self.edges <= WARMUP_EDGES {
            self.period = (self.period + 3 * observed) >> 2;
            return self.period;
        }

        match self.match_ratio(observed) {
            Some((1, 1)) => {
                self.ratio_streak = 0;
                self.period = (7 * self.period + observed) >> 3;
            }
            Some(ratio) => {
                if ratio == self.last_ratio {
                    self.ratio_streak += 1;
                } else {
                    self.last_ratio = ratio;
                    self.ratio_streak = 1;
                }
                if self.ratio_streak >= RELOCK_EDGES {
                    self.period = self.recent_mean(RELOCK_EDGES);
                    self.ratio_streak = 0;
                }
            }
            None => {
                self.ratio_streak = 0;
                self.period = (3 * self.period + observed) >> 2;
            }
        }

        self.period = self.period.clamp(1, SYNC_COUNTER_MAX_TIME);
        self.period
    }

    /// Current stable period in ticks (0 before the first edge).
    pub fn period(&self) -> u32 {
        self.period
    }

    fn push(&mut self, observed: u32) {
        self.history[self.head] = observed;
        self.head = (self.head + 1) % HISTORY;
    }

    fn match_ratio(&self, observed: u32) -> Option<(u32, u32)> {
        let period = self.period as u64;
        RATIOS
            .iter()
            .filter_map(|&(p, q)| {
                let candidate = period * p as u64 / q as u64;
                let error = candidate.abs_diff(observed as u64);
                (error <= candidate >> TOLERANCE_SHIFT).then_some(((p, q), error))
            })
            .min_by_key(|&(_, error)| error)
            .map(|(ratio, _)| ratio)
    }

    fn recent_mean(&self, count: usize) -> u32 {
        let count = count.min(HISTORY).max(1);
        let sum: u64 = (1..=count)
            .map(|back| self.history[(self.head + HISTORY - back) % HISTORY] as u64)
            .sum();
        (sum / count as u64) as u32
    }
}

impl<const HISTORY: usize> Default for PatternPredictor<HISTORY> {
    fn default() -> Self {
        Self::new()
    }
}
