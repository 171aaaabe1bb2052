/// Result of advancing the day clock by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    /// New hour of day in `[0, 24)`.
    pub hour: f32,
    /// `true` when this tick wrapped past midnight.
    pub rolled_over: bool,
}

/// Advances `hour` by `dt_hours`, wrapping to `0.0` once it reaches 24.
///
/// Any overshoot past midnight is discarded rather than carried, so a
/// simulated day always restarts exactly at `00:00`.
///
/// # Examples
///
/// ```
/// use energy_twin::sim::clock::advance;
///
/// let a = advance(23.75, 0.25);
/// assert_eq!(a.hour, 0.0);
/// assert!(a.rolled_over);
/// ```
pub fn advance(hour: f32, dt_hours: f32) -> Advance {
    let next = hour + dt_hours;
    if next >= 24.0 {
        Advance {
            hour: 0.0,
            rolled_over: true,
        }
    } else {
        Advance {
            hour: next,
            rolled_over: false,
        }
    }
}

/// A tick counter for headless runs.
///
/// The `Clock` provides methods to advance tick-by-tick or run a function at
/// each tick until a fixed budget is spent.
///
/// # Examples
///
/// ```
/// use energy_twin::sim::clock::Clock;
///
/// let mut clock = Clock::new(3);
/// let mut ticks = Vec::new();
///
/// clock.run(|tick| ticks.push(tick));
/// assert_eq!(ticks, vec![0, 1, 2]);
/// ```
pub struct Clock {
    /// Next tick to hand out
    current: u64,
    /// Total ticks in the run
    total: u64,
}

impl Clock {
    /// Creates a new clock with a specified total number of ticks.
    pub fn new(total: u64) -> Self {
        Self { current: 0, total }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The tick number (starting from 0) before advancing
    /// * `None` - If the clock has spent its budget
    pub fn tick(&mut self) -> Option<u64> {
        if self.current < self.total {
            let tick = self.current;
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(u64)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}
