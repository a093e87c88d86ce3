use cardwall::date_status::{classify, due_status, end_status, start_status, CardDates, DateStatus};
use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;

/// Any instant between roughly 1653 and 2286.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (-10_000_000_000_i64..10_000_000_000_i64, 0_u32..1_000_000_000_u32)
        .prop_filter_map("representable", |(secs, nanos)| {
            DateTime::from_timestamp(secs, nanos)
        })
}

/// A positive span of up to about three years, in seconds.
fn span() -> impl Strategy<Value = Duration> {
    (1_i64..100_000_000_i64).prop_map(Duration::seconds)
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn due_at_exactly_now_is_due(now in instant()) {
        prop_assert_eq!(due_status(now, now, None), DateStatus::Due);
    }

    #[test]
    fn due_two_or_more_days_ago_is_long_overdue(now in instant(), extra in 0_i64..10_000_000) {
        let due = now - Duration::days(2) - Duration::seconds(extra);
        prop_assert_eq!(due_status(now, due, None), DateStatus::LongOverdue);
    }

    #[test]
    fn due_under_two_days_ago_is_due(now in instant(), late in 0_i64..(2 * 86_400)) {
        let due = now - Duration::seconds(late);
        prop_assert_eq!(due_status(now, due, None), DateStatus::Due);
    }

    #[test]
    fn due_within_a_day_is_almost_due(now in instant(), ahead in 1_i64..=86_400) {
        let due = now + Duration::seconds(ahead);
        prop_assert_eq!(due_status(now, due, None), DateStatus::AlmostDue);
    }

    #[test]
    fn early_end_keeps_due_current_however_late(
        due in instant(),
        early in span(),
        late in span(),
    ) {
        let end = due - early;
        let now = due + late;
        prop_assert_eq!(due_status(now, due, Some(end)), DateStatus::Current);
    }

    #[test]
    fn start_after_due_and_end_beats_future(
        now in instant(),
        start_ahead in span(),
        due_before in span(),
        end_before in span(),
    ) {
        let start = now + start_ahead;
        let status = start_status(now, start, Some(start - due_before), Some(start - end_before));
        prop_assert_eq!(status, DateStatus::LongOverdue);
    }

    #[test]
    fn end_before_start_is_early_whatever_the_due(
        end in instant(),
        start_after in span(),
        due_offset in -100_000_000_i64..100_000_000,
    ) {
        let due = end + Duration::seconds(due_offset);
        prop_assert_eq!(end_status(end, Some(end + start_after), Some(due)), DateStatus::Early);
    }

    #[test]
    fn absent_dates_never_get_a_status(now in instant(), due in instant()) {
        let dates = CardDates { due_at: Some(due), ..CardDates::default() };
        let statuses = classify(now, &dates);
        prop_assert!(statuses.due.is_some());
        prop_assert_eq!(statuses.received, None);
        prop_assert_eq!(statuses.start, None);
        prop_assert_eq!(statuses.end, None);
    }
}
