use chrono::{Local, NaiveDateTime};

/// Port giving the reference instant for past/upcoming classification.
///
/// Show start times are stored as naive local wall-clock times, so "now" is
/// the local wall-clock time as well.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
