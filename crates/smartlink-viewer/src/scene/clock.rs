use chrono::{DateTime, Duration, Utc};

/// `t` moved by `us` microseconds, saturating at the ends of the calendar.
fn shifted(t: DateTime<Utc>, us: i64) -> DateTime<Utc> {
    t.checked_add_signed(Duration::microseconds(us))
        .unwrap_or(if us >= 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockRange {
    #[default]
    Unbounded,
    Clamped,
    /// Wrap to start once stop is passed going forward; clamp at start going back.
    LoopStop,
}

/// Simulation clock shared by every layer.
#[derive(Debug, Clone)]
pub struct SceneClock {
    pub start_time: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub range: ClockRange,
    pub multiplier: f64,
    pub should_animate: bool,
}

impl Default for SceneClock {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            current_time: now,
            stop_time: now + Duration::days(1),
            range: ClockRange::Unbounded,
            multiplier: 1.0,
            should_animate: true,
        }
    }
}

impl SceneClock {
    pub fn set_bounds(&mut self, start: DateTime<Utc>, stop: DateTime<Utc>, range: ClockRange) {
        self.start_time = start;
        self.current_time = start;
        self.stop_time = stop;
        self.range = range;
    }

    pub fn reset(&mut self) {
        self.current_time = self.start_time;
    }

    /// Advances by `real_dt_s` wall-clock seconds scaled by the multiplier.
    pub fn tick(&mut self, real_dt_s: f64) -> DateTime<Utc> {
        if !self.should_animate {
            return self.current_time;
        }
        let step_us = (real_dt_s * self.multiplier * 1e6).round() as i64;
        let next = shifted(self.current_time, step_us);
        self.current_time = self.constrain(next, self.multiplier >= 0.0);
        self.current_time
    }

    /// Scrubbing never wraps; it only clamps when the range is bounded.
    pub fn set_current(&mut self, t: DateTime<Utc>) {
        self.current_time = match self.range {
            ClockRange::Unbounded => t,
            ClockRange::Clamped | ClockRange::LoopStop => t.clamp(self.start_time, self.stop_time),
        };
    }

    fn constrain(&self, t: DateTime<Utc>, forward: bool) -> DateTime<Utc> {
        match self.range {
            ClockRange::Unbounded => t,
            ClockRange::Clamped => t.clamp(self.start_time, self.stop_time),
            ClockRange::LoopStop => {
                if forward && t > self.stop_time {
                    self.start_time
                } else if t < self.start_time {
                    self.start_time
                } else {
                    t
                }
            }
        }
    }
}

/// Visible span of the timeline widget.
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Default for Timeline {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            start: now,
            end: now + Duration::days(1),
        }
    }
}

impl Timeline {
    pub fn zoom_to(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.start = start;
        self.end = end;
    }

    pub fn span_s(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    pub fn offset_s(&self, t: DateTime<Utc>) -> f64 {
        (t - self.start).num_milliseconds() as f64 / 1000.0
    }

    pub fn at_offset(&self, offset_s: f64) -> DateTime<Utc> {
        shifted(self.start, (offset_s * 1e6).round() as i64)
    }
}
