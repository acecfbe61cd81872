//! 進捗の集計（10%刻みでのみ通知）

use indicatif::HumanDuration;
use std::fmt;
use std::time::{Duration, Instant};

const MILESTONE_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub percent: usize,
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub remaining: Duration,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "進捗 {}% ({}/{}) 経過 {} / 残り約 {}",
            self.percent,
            self.processed,
            self.total,
            HumanDuration(self.elapsed),
            HumanDuration(self.remaining)
        )
    }
}

#[derive(Debug)]
pub struct Progress {
    total: usize,
    processed: usize,
    next_percent: usize,
    started: Instant,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            next_percent: MILESTONE_STEP,
            started: Instant::now(),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// 1件完了。区切りを越えたときだけ `Milestone` を返す
    pub fn advance(&mut self) -> Option<Milestone> {
        if self.total == 0 || self.processed >= self.total {
            return None;
        }
        self.processed += 1;

        let percent = self.processed * 100 / self.total;
        if percent < self.next_percent {
            return None;
        }
        self.next_percent = (percent / MILESTONE_STEP + 1) * MILESTONE_STEP;

        let elapsed = self.started.elapsed();
        let per_item = elapsed / self.processed as u32;
        let remaining = per_item * (self.total - self.processed) as u32;

        Some(Milestone {
            percent,
            processed: self.processed,
            total: self.total,
            elapsed,
            remaining,
        })
    }
}
