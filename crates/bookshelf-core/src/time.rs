use time::{Date, OffsetDateTime};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Current calendar date in UTC. Publication dates are compared against this.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}
