use std::time::Duration;

use enum_map::{EnumMap, enum_map};
use strum::IntoEnumIterator;

use crate::clock::Clock;
use crate::force::Force;
use crate::rules::TimeControl;
use crate::utc_time::UtcDateTime;


// Owns both players' clocks. At most one clock runs at any moment.
#[derive(Clone, Debug)]
pub struct DualClock {
    clocks: EnumMap<Force, Clock>,
    // Set when a running clock reaches zero and the timeout claim has been raised. Reset when
    // the clock is started again, so that each crossing yields exactly one claim.
    timeout_claimed: EnumMap<Force, bool>,
}

impl DualClock {
    pub fn new(control: TimeControl) -> Self {
        DualClock {
            clocks: enum_map! { _ => Clock::new(control.clone()) },
            timeout_claimed: enum_map! { _ => false },
        }
    }

    // Initializes stopped clocks from server-provided deadlines. A missing deadline means
    // the full starting time.
    pub fn with_deadlines(
        control: TimeControl, deadlines: EnumMap<Force, Option<UtcDateTime>>, now: UtcDateTime,
    ) -> Self {
        let clocks = EnumMap::from_fn(|force| {
            let remaining: Duration = match deadlines[force] {
                Some(deadline) => deadline.saturating_duration_since(now),
                None => control.starting_time,
            };
            Clock::with_remaining(control.clone(), remaining)
        });
        DualClock { clocks, timeout_claimed: enum_map! { _ => false } }
    }

    pub fn clock(&self, force: Force) -> &Clock { &self.clocks[force] }
    pub fn remaining(&self, force: Force, now: UtcDateTime) -> Duration {
        self.clocks[force].remaining(now)
    }
    pub fn running_force(&self) -> Option<Force> {
        Force::iter().find(|&force| self.clocks[force].is_running())
    }

    pub fn start(&mut self, force: Force, deadline: Option<UtcDateTime>, now: UtcDateTime) {
        self.clocks[force.opponent()].stop(now);
        self.clocks[force].start(deadline, now);
        self.timeout_claimed[force] = false;
    }

    pub fn stop(&mut self, force: Force, now: UtcDateTime) { self.clocks[force].stop(now); }

    pub fn stop_all(&mut self, now: UtcDateTime) {
        for force in Force::iter() {
            self.clocks[force].stop(now);
        }
    }

    // Returns the force whose running clock has just reached zero. Each crossing is reported
    // once; the caller forwards it to the server as a claim.
    pub fn tick(&mut self, now: UtcDateTime) -> Option<Force> {
        let force = self.running_force()?;
        if self.clocks[force].is_out_of_time(now) && !self.timeout_claimed[force] {
            self.timeout_claimed[force] = true;
            log::debug!("{force} clock reached zero");
            Some(force)
        } else {
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: u64) -> UtcDateTime { UtcDateTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + secs) }

    #[test]
    fn one_clock_at_a_time() {
        let mut clocks = DualClock::new(TimeControl::default());
        assert_eq!(clocks.running_force(), None);
        clocks.start(Force::White, None, t(0));
        assert_eq!(clocks.running_force(), Some(Force::White));
        clocks.start(Force::Black, Some(t(700)), t(10));
        assert_eq!(clocks.running_force(), Some(Force::Black));
        assert!(!clocks.clock(Force::White).is_running());
        assert_eq!(clocks.remaining(Force::White, t(500)), Duration::from_secs(590));
        assert_eq!(clocks.remaining(Force::Black, t(500)), Duration::from_secs(200));
        clocks.stop_all(t(600));
        assert_eq!(clocks.running_force(), None);
        assert_eq!(clocks.remaining(Force::Black, t(900)), Duration::from_secs(100));
    }

    #[test]
    fn initial_deadlines() {
        let deadlines = enum_map! { Force::White => Some(t(300)), Force::Black => None };
        let clocks = DualClock::with_deadlines(TimeControl::default(), deadlines, t(0));
        assert_eq!(clocks.remaining(Force::White, t(0)), Duration::from_secs(300));
        assert_eq!(clocks.remaining(Force::Black, t(0)), Duration::from_secs(600));
        assert_eq!(clocks.running_force(), None);
    }

    #[test]
    fn timeout_claimed_once_per_crossing() {
        let mut clocks = DualClock::new(TimeControl::default());
        clocks.start(Force::White, Some(t(5)), t(0));
        assert_eq!(clocks.tick(t(4)), None);
        assert_eq!(clocks.tick(t(5)), Some(Force::White));
        assert_eq!(clocks.tick(t(6)), None);
        assert_eq!(clocks.tick(t(60)), None);
        // A new deadline arms the claim again.
        clocks.start(Force::White, Some(t(70)), t(61));
        assert_eq!(clocks.tick(t(71)), Some(Force::White));
    }

    #[test]
    fn stopped_clock_never_claims() {
        let mut clocks = DualClock::new(TimeControl::default());
        clocks.start(Force::Black, Some(t(5)), t(0));
        clocks.stop(Force::Black, t(5));
        assert_eq!(clocks.tick(t(10)), None);
    }
}
