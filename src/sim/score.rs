//! Scoring: tiered run points and the cascade multiplier

use serde::{Deserialize, Serialize};

/// Base points for a removed run of `size` markers, before the multiplier
pub fn run_points(size: usize) -> u64 {
    match size {
        0..=2 => 0,
        3 => 100,
        4 => 150,
        n => 200 + 50 * (n as u64 - 5),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    /// Points earned in the current level
    level: u64,
    /// Points banked from completed levels
    total: u64,
    /// Cascade multiplier (>= 1)
    multiplier: u32,
    /// Best total ever reached
    best: u64,
}

impl Default for Score {
    fn default() -> Self {
        Self::with_best(0)
    }
}

impl Score {
    /// Fresh score carrying a previously persisted best
    pub fn with_best(best: u64) -> Self {
        Self {
            level: 0,
            total: 0,
            multiplier: 1,
            best,
        }
    }

    pub fn level(&self) -> u64 {
        self.level
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Award a removed run; returns the points added
    pub fn award_run(&mut self, size: usize) -> u64 {
        let points = run_points(size) * self.multiplier as u64;
        self.level += points;
        points
    }

    /// One more successful cascade step
    pub fn on_cascade(&mut self) {
        self.multiplier += 1;
    }

    /// A closure or insertion produced nothing
    pub fn on_no_match(&mut self) {
        self.multiplier = 1;
    }

    pub fn reset_level(&mut self) {
        self.level = 0;
        self.multiplier = 1;
    }

    /// Bank the level's points; returns the new best if it was beaten
    pub fn complete_level(&mut self) -> Option<u64> {
        self.total += self.level;
        self.level = 0;
        self.multiplier = 1;
        if self.total > self.best {
            self.best = self.total;
            Some(self.best)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_table() {
        let mut score = Score::default();
        assert_eq!(score.award_run(3), 100);
        assert_eq!(score.award_run(4), 150);
        assert_eq!(score.award_run(5), 200);
        assert_eq!(score.award_run(7), 300);
        assert_eq!(score.level(), 750);
    }

    #[test]
    fn test_multiplier_scales_exactly() {
        let mut score = Score::default();
        score.on_cascade();
        assert_eq!(score.multiplier(), 2);
        assert_eq!(score.award_run(3), 200);
        score.on_cascade();
        assert_eq!(score.award_run(6), 750);
        score.on_no_match();
        assert_eq!(score.multiplier(), 1);
        assert_eq!(score.award_run(3), 100);
    }

    #[test]
    fn test_short_runs_score_nothing() {
        assert_eq!(run_points(2), 0);
        assert_eq!(run_points(0), 0);
    }

    #[test]
    fn test_level_lifecycle() {
        let mut score = Score::with_best(250);
        score.award_run(3);
        score.on_cascade();
        score.reset_level();
        assert_eq!(score.level(), 0);
        assert_eq!(score.multiplier(), 1);

        score.award_run(4);
        assert_eq!(score.complete_level(), None);
        assert_eq!(score.total(), 150);

        // Tying the best is not a new best
        score.award_run(3);
        assert_eq!(score.complete_level(), None);
        assert_eq!(score.total(), 250);

        score.award_run(3);
        assert_eq!(score.complete_level(), Some(350));
        assert_eq!(score.best(), 350);
    }

    #[test]
    fn test_new_best() {
        let mut score = Score::with_best(100);
        score.award_run(4);
        assert_eq!(score.complete_level(), Some(150));
        assert_eq!(score.best(), 150);
        assert_eq!(score.level(), 0);
    }
}
