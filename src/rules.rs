use std::fmt;
use std::time::Duration;


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TimeControl {
    // Improvement potential. Support increment, delay, etc.
    pub starting_time: Duration,
    // Clock is highlighted when remaining time falls to this share of `starting_time`.
    pub warning_percent: u32,
    pub critical_percent: u32,
}

impl TimeControl {
    pub fn new(starting_time: Duration) -> Self {
        TimeControl {
            starting_time,
            warning_percent: 30,
            critical_percent: 10,
        }
    }

    // Used when the server does not send initial deadlines.
    pub fn classic_ten_minutes() -> Self { TimeControl::new(Duration::from_secs(10 * 60)) }
}

impl Default for TimeControl {
    fn default() -> Self { TimeControl::classic_ten_minutes() }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", duration_to_mss(self.starting_time))
    }
}

pub fn duration_to_mss(d: Duration) -> String {
    let s = d.as_secs();
    let minutes = s / 60;
    let seconds = s % 60;
    format!("{minutes}:{seconds:02}")
}
