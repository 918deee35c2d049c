use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Office timezone offset: UTC+5:30. Every calendar date and business
/// window in the system is interpreted in this zone.
pub const OFFICE_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Latest office-local time at which a check-in is accepted.
pub fn check_in_deadline() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 5, 0).expect("valid time")
}

/// Check-out is blocked in the closed interval [16:00, 17:25] so nobody
/// leaves right around shift end.
pub fn checkout_block() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(16, 0, 0).expect("valid time"),
        NaiveTime::from_hms_opt(17, 25, 0).expect("valid time"),
    )
}

pub fn office_offset() -> FixedOffset {
    FixedOffset::east_opt(OFFICE_UTC_OFFSET_SECS).expect("office offset is in range")
}

/// The only source of "now" for the engines. Injectable so tests can pin
/// the wall clock.
pub trait Clock: Send + Sync {
    /// Current wall time in the office timezone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Calendar date in the office timezone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn check_in_allowed(&self) -> bool {
        self.now().time() <= check_in_deadline()
    }

    fn check_out_allowed(&self) -> bool {
        let t = self.now().time();
        let (block_start, block_end) = checkout_block();
        t < block_start || t > block_end
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&office_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct At(DateTime<FixedOffset>);

    impl Clock for At {
        fn now(&self) -> DateTime<FixedOffset> {
            self.0
        }
    }

    fn at(h: u32, m: u32, s: u32) -> At {
        At(office_offset()
            .with_ymd_and_hms(2024, 1, 15, h, m, s)
            .unwrap())
    }

    #[test]
    fn check_in_window_closes_after_0905() {
        assert!(at(8, 0, 0).check_in_allowed());
        assert!(at(9, 5, 0).check_in_allowed());
        assert!(!at(9, 5, 1).check_in_allowed());
        assert!(!at(9, 6, 0).check_in_allowed());
    }

    #[test]
    fn check_out_blocked_between_1600_and_1725_inclusive() {
        assert!(at(15, 59, 59).check_out_allowed());
        assert!(!at(16, 0, 0).check_out_allowed());
        assert!(!at(16, 30, 0).check_out_allowed());
        assert!(!at(17, 25, 0).check_out_allowed());
        assert!(at(17, 25, 1).check_out_allowed());
        assert!(at(18, 0, 0).check_out_allowed());
    }

    #[test]
    fn today_follows_the_office_zone_not_utc() {
        // 20:00 UTC is already 01:30 the next day in the office.
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let clock = At(utc.with_timezone(&office_offset()));
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }
}
