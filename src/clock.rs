use std::time::Duration;

use crate::rules::TimeControl;
use crate::utc_time::UtcDateTime;


const MILLIS_PER_SEC: u64 = 1000;
const MILLIS_PER_DECI: u64 = MILLIS_PER_SEC / 10;


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LowTimeLevel {
    Normal,
    Warning,
    Critical,
}

#[derive(Clone, Debug)]
pub struct ClockShowing {
    pub is_active: bool,
    pub show_separator: bool,
    pub out_of_time: bool,
    pub low_time_level: LowTimeLevel,
    pub time_breakdown: TimeBreakdown,
}

// Improvement potential: Support longer time controls (with hours).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeBreakdown {
    NormalTime { minutes: u32, seconds: u32 },
    LowTime { seconds: u32, deciseconds: u32 },
}

impl ClockShowing {
    // Includes padding for TUI.
    pub fn ui_string(&self) -> String {
        let separator = |s| if self.show_separator { s } else { " " };
        match self.time_breakdown {
            TimeBreakdown::NormalTime { minutes, seconds } => {
                format!("{}{}{:02}", minutes, separator(":"), seconds)
            }
            TimeBreakdown::LowTime { seconds, deciseconds } => {
                format!("{:02}{}{} ", seconds, separator("."), deciseconds)
            }
        }
    }
}

impl From<Duration> for TimeBreakdown {
    fn from(time: Duration) -> Self {
        // Always round the time up, so that we never show "00.0" for a player who still has
        // time. Also in the beginning of the game rounding up ensures that the first tick
        // happens one second after the game starts rather than immediately.
        let millis = u64::try_from(time.as_millis()).unwrap_or(u64::MAX);
        let ds_ceil = millis.div_ceil(MILLIS_PER_DECI);
        if ds_ceil < 200 {
            let seconds = (ds_ceil / 10) as u32;
            let deciseconds = (ds_ceil % 10) as u32;
            TimeBreakdown::LowTime { seconds, deciseconds }
        } else {
            let s_ceil = millis.div_ceil(MILLIS_PER_SEC);
            let minutes = u32::try_from(s_ceil / 60).unwrap_or(u32::MAX);
            let seconds = (s_ceil % 60) as u32;
            TimeBreakdown::NormalTime { minutes, seconds }
        }
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ClockState {
    // Remaining time is `deadline - now`.
    Running { deadline: UtcDateTime },
    Stopped { remaining: Duration },
}

// One player's countdown. While running, the clock is defined by an absolute deadline rather
// than by accumulated elapsed time, so it never drifts from the server no matter how often
// (or how rarely) it is polled.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Clock {
    control: TimeControl,
    state: ClockState,
}

impl Clock {
    pub fn new(control: TimeControl) -> Self {
        let remaining = control.starting_time;
        Clock { control, state: ClockState::Stopped { remaining } }
    }

    pub fn with_remaining(control: TimeControl, remaining: Duration) -> Self {
        Clock { control, state: ClockState::Stopped { remaining } }
    }

    pub fn is_running(&self) -> bool { matches!(self.state, ClockState::Running { .. }) }
    pub fn deadline(&self) -> Option<UtcDateTime> {
        match self.state {
            ClockState::Running { deadline } => Some(deadline),
            ClockState::Stopped { .. } => None,
        }
    }

    // Starts counting down towards `deadline`. Without a deadline the clock resumes from the
    // time it had when stopped.
    pub fn start(&mut self, deadline: Option<UtcDateTime>, now: UtcDateTime) {
        let deadline = match (deadline, self.state) {
            (Some(deadline), _) => deadline,
            (None, ClockState::Running { deadline }) => deadline,
            (None, ClockState::Stopped { remaining }) => now + remaining,
        };
        self.state = ClockState::Running { deadline };
    }

    pub fn stop(&mut self, now: UtcDateTime) {
        if let ClockState::Running { deadline } = self.state {
            self.state = ClockState::Stopped {
                remaining: deadline.saturating_duration_since(now),
            };
        }
    }

    pub fn remaining(&self, now: UtcDateTime) -> Duration {
        match self.state {
            ClockState::Running { deadline } => deadline.saturating_duration_since(now),
            ClockState::Stopped { remaining } => remaining,
        }
    }

    pub fn is_out_of_time(&self, now: UtcDateTime) -> bool { self.remaining(now).is_zero() }

    pub fn low_time_level(&self, now: UtcDateTime) -> LowTimeLevel {
        let remaining = self.remaining(now).as_millis();
        let total = self.control.starting_time.as_millis();
        if remaining * 100 <= total * u128::from(self.control.critical_percent) {
            LowTimeLevel::Critical
        } else if remaining * 100 <= total * u128::from(self.control.warning_percent) {
            LowTimeLevel::Warning
        } else {
            LowTimeLevel::Normal
        }
    }

    pub fn showing(&self, now: UtcDateTime) -> ClockShowing {
        let is_active = self.is_running();
        let mut time = self.remaining(now);

        // Note. Never consider an active player to be out of time. Running out of time is only
        // a claim: the server decides whether the game is over.
        let out_of_time = !is_active && time.is_zero();
        if !out_of_time && time.is_zero() {
            time = Duration::from_millis(1);
        }

        let time_breakdown = time.into();
        let show_separator = match (is_active, time_breakdown) {
            (false, _) => true,
            (true, TimeBreakdown::NormalTime { .. }) => time.subsec_millis() >= 500,
            (true, TimeBreakdown::LowTime { .. }) => true,
        };

        ClockShowing {
            is_active,
            show_separator,
            out_of_time,
            low_time_level: self.low_time_level(now),
            time_breakdown,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> UtcDateTime { UtcDateTime::UNIX_EPOCH + Duration::from_secs(1_000_000) }

    #[test]
    fn time_breakdown() {
        use TimeBreakdown::*;
        let cases = [
            (0, LowTime { seconds: 0, deciseconds: 0 }),
            (1, LowTime { seconds: 0, deciseconds: 1 }),
            (100, LowTime { seconds: 0, deciseconds: 1 }),
            (101, LowTime { seconds: 0, deciseconds: 2 }),
            (900, LowTime { seconds: 0, deciseconds: 9 }),
            (901, LowTime { seconds: 1, deciseconds: 0 }),
            (1_000, LowTime { seconds: 1, deciseconds: 0 }),
            (1_001, LowTime { seconds: 1, deciseconds: 1 }),
            (19_900, LowTime { seconds: 19, deciseconds: 9 }),
            (19_901, NormalTime { minutes: 0, seconds: 20 }),
            (20_000, NormalTime { minutes: 0, seconds: 20 }),
            (20_001, NormalTime { minutes: 0, seconds: 21 }),
            (59_000, NormalTime { minutes: 0, seconds: 59 }),
            (59_001, NormalTime { minutes: 1, seconds: 0 }),
            (60_000, NormalTime { minutes: 1, seconds: 0 }),
            (119_001, NormalTime { minutes: 2, seconds: 0 }),
            (600_000, NormalTime { minutes: 10, seconds: 0 }),
        ];
        for (millis, breakdown) in cases {
            assert_eq!(TimeBreakdown::from(Duration::from_millis(millis)), breakdown, "{millis}");
        }
    }

    #[test]
    fn counts_down_to_deadline() {
        let mut clock = Clock::new(TimeControl::default());
        assert_eq!(clock.remaining(t0()), Duration::from_secs(600));
        clock.start(Some(t0() + Duration::from_secs(300)), t0());
        assert!(clock.is_running());
        assert_eq!(clock.remaining(t0() + Duration::from_secs(100)), Duration::from_secs(200));
        assert_eq!(clock.remaining(t0() + Duration::from_secs(400)), Duration::ZERO);
        assert!(clock.is_out_of_time(t0() + Duration::from_secs(300)));
    }

    #[test]
    fn stop_freezes_remaining() {
        let mut clock = Clock::new(TimeControl::default());
        clock.start(None, t0());
        clock.stop(t0() + Duration::from_secs(15));
        assert!(!clock.is_running());
        assert_eq!(clock.remaining(t0() + Duration::from_secs(500)), Duration::from_secs(585));
        // Resuming without a deadline continues from the frozen value.
        clock.start(None, t0() + Duration::from_secs(1000));
        assert_eq!(clock.deadline(), Some(t0() + Duration::from_secs(1585)));
        // Stopping twice is harmless.
        clock.stop(t0() + Duration::from_secs(1085));
        clock.stop(t0() + Duration::from_secs(1200));
        assert_eq!(clock.remaining(t0()), Duration::from_secs(500));
    }

    #[test]
    fn low_time_levels() {
        let control = TimeControl::default();
        let level = |secs| Clock::with_remaining(control.clone(), Duration::from_secs(secs)).low_time_level(t0());
        assert_eq!(level(600), LowTimeLevel::Normal);
        assert_eq!(level(181), LowTimeLevel::Normal);
        assert_eq!(level(180), LowTimeLevel::Warning);
        assert_eq!(level(61), LowTimeLevel::Warning);
        assert_eq!(level(60), LowTimeLevel::Critical);
        assert_eq!(level(0), LowTimeLevel::Critical);
    }

    #[test]
    fn showing() {
        let mut clock = Clock::new(TimeControl::default());
        assert_eq!(clock.showing(t0()).ui_string(), "10:00");
        clock.start(Some(t0()), t0());
        let showing = clock.showing(t0() + Duration::from_secs(1));
        assert!(showing.is_active);
        assert!(!showing.out_of_time);
        assert_eq!(showing.ui_string(), "00.1 ");
        clock.stop(t0() + Duration::from_secs(1));
        let showing = clock.showing(t0() + Duration::from_secs(1));
        assert!(showing.out_of_time);
        assert_eq!(showing.ui_string(), "00.0 ");
    }
}
