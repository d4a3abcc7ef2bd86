use std::time::Duration;

use crate::shared::STEPS_PER_BEAT;

/// Most ticks a single `advance` may fire. If the host stalls for longer than
/// this many steps, the backlog is dropped instead of replayed in one burst.
pub const MAX_CATCH_UP_TICKS: u32 = 4;

/// Beats per minute, finite and strictly positive.
///
/// Range limits (40..=300 by default) are a config concern, see
/// `config::TempoRange`; this type only guarantees the period is defined.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Tempo(f64);

impl Tempo {
    pub fn new(bpm: f64) -> anyhow::Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            anyhow::bail!("tempo must be a positive number of bpm, got {bpm}");
        }
        Ok(Self(bpm))
    }

    pub fn bpm(self) -> f64 {
        self.0
    }
}

// milliseconds per sixteenth-note step
pub fn step_period_ms(tempo: Tempo) -> f64 {
    (60000.0 / tempo.bpm()) / STEPS_PER_BEAT as f64
}

// saturates for tempos so slow the period doesn't fit in a Duration
pub fn step_period(tempo: Tempo) -> Duration {
    Duration::try_from_secs_f64(step_period_ms(tempo) / 1000.0).unwrap_or(Duration::MAX)
}

/// Repeating timer driven by elapsed wall time. Fires once per period, the
/// first time one full period after it was created.
#[derive(Clone, Debug)]
pub struct StepTimer {
    period: Duration,
    elapsed: Duration, // time since the last firing
}

impl StepTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_nanos(1)),
            elapsed: Duration::ZERO,
        }
    }

    // how many times the timer fired during `dt`
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut fired = 0;
        while self.elapsed >= self.period {
            if fired == MAX_CATCH_UP_TICKS {
                let phase = self.elapsed.as_nanos() % self.period.as_nanos();
                let late = self.elapsed.as_nanos() / self.period.as_nanos();
                log::debug!("dropping {late} late steps");
                self.elapsed = Duration::from_nanos(phase as u64);
                break;
            }
            self.elapsed -= self.period;
            fired += 1;
        }
        fired
    }

    pub fn remaining(&self) -> Duration {
        self.period.saturating_sub(self.elapsed)
    }
}
