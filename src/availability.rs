use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::models::{
    appointments::AppointmentData,
    blocked_slots::{
        BlockedSlotData, NewBlockedSlot, RecurringPattern, BLOCK_TYPE_RANGE, BLOCK_TYPE_SINGLE,
        BLOCK_TYPE_WEEKLY,
    },
};
use crate::utils::format_slot_str;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    SlotUnavailable(String),
    #[error("{0}")]
    ConflictRequiresConfirmation(String),
    #[error("{0}")]
    StorageConflict(String),
}

pub const FIRST_SLOT_HOUR: u32 = 9;
pub const LAST_SLOT_HOUR: u32 = 17;

/// The fixed hourly catalog of bookable times, 09:00 through 17:00.
pub fn slot_catalog() -> Vec<NaiveTime> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .map(|hour| NaiveTime::from_hms(hour, 0, 0))
        .collect()
}

/// A proposed block before any row exists, as submitted by the admin.
#[derive(Clone)]
pub struct BlockSpec {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
    pub reason: String,
    pub block_type: String,
    pub recurring: Option<RecurringPattern>,
}

pub struct BlockedInfo {
    pub reason: String,
    pub time_range: String,
}

pub struct DayAvailability {
    pub available: Vec<NaiveTime>,
    pub booked: Vec<NaiveTime>,
    pub blocked: Vec<NaiveTime>,
    pub blocked_info: Vec<BlockedInfo>,
}

pub struct BlockConflict {
    pub date: NaiveDate,
    pub appointments: Vec<AppointmentData>,
}

pub fn block_covers_date(block: &BlockedSlotData, date: NaiveDate) -> bool {
    let end_date = block.end_date.unwrap_or(block.start_date);
    block.start_date <= date && date <= end_date
}

pub fn block_covers_range(block: &BlockedSlotData, start: NaiveDate, end: NaiveDate) -> bool {
    let end_date = block.end_date.unwrap_or(block.start_date);
    block.start_date <= end && end_date >= start
}

pub fn block_covers_slot(block: &BlockedSlotData, slot: NaiveTime) -> bool {
    if block.all_day {
        return true;
    }
    time_range_covers(block.start_time, block.end_time, slot)
}

// A row with neither bound and all_day unset covers nothing.
fn time_range_covers(start: Option<NaiveTime>, end: Option<NaiveTime>, slot: NaiveTime) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start <= slot && slot <= end,
        (Some(start), None) => slot >= start,
        (None, Some(end)) => slot <= end,
        (None, None) => false,
    }
}

fn spec_covers_slot(spec: &BlockSpec, slot: NaiveTime) -> bool {
    if spec.all_day {
        return true;
    }
    time_range_covers(spec.start_time, spec.end_time, slot)
}

fn block_time_range_str(block: &BlockedSlotData) -> String {
    if block.all_day {
        return "All day".to_string();
    }
    format!(
        "{} - {}",
        block.start_time.map(|t| format_slot_str(&t)).unwrap_or_default(),
        block.end_time.map(|t| format_slot_str(&t)).unwrap_or_default(),
    )
}

/// Partition the catalog for one date into booked, blocked, and available
/// slots. A slot that is both booked and covered by a block counts as
/// booked, keeping the three sets disjoint.
pub fn compute_availability(
    catalog: &[NaiveTime],
    date: NaiveDate,
    appointments: &[AppointmentData],
    blocks: &[BlockedSlotData],
) -> Result<DayAvailability, EngineError> {
    if catalog.is_empty() {
        return Err(EngineError::InvalidInput("Slot catalog is empty".to_string()));
    }

    let covering: Vec<&BlockedSlotData> = blocks
        .iter()
        .filter(|block| block_covers_date(block, date))
        .collect();
    let booked_times: Vec<NaiveTime> = appointments
        .iter()
        .filter(|appo| appo.date == date)
        .map(|appo| appo.time)
        .collect();

    let mut available = Vec::new();
    let mut booked = Vec::new();
    let mut blocked = Vec::new();
    for &slot in catalog {
        if booked_times.contains(&slot) {
            booked.push(slot);
        } else if covering.iter().any(|block| block_covers_slot(block, slot)) {
            blocked.push(slot);
        } else {
            available.push(slot);
        }
    }

    let blocked_info = covering
        .iter()
        .map(|block| BlockedInfo {
            reason: block.reason.clone(),
            time_range: block_time_range_str(block),
        })
        .collect();

    Ok(DayAvailability {
        available,
        booked,
        blocked,
        blocked_info,
    })
}

/// Advisory booking check run before the insert. The UNIQUE (date, time)
/// constraint remains the final word against races.
pub fn is_bookable(
    catalog: &[NaiveTime],
    date: NaiveDate,
    time: NaiveTime,
    now: NaiveDateTime,
    appointments: &[AppointmentData],
    blocks: &[BlockedSlotData],
) -> Result<(), EngineError> {
    if catalog.is_empty() {
        return Err(EngineError::InvalidInput("Slot catalog is empty".to_string()));
    }
    if !catalog.contains(&time) {
        return Err(EngineError::InvalidInput(
            "Please select a valid time slot".to_string(),
        ));
    }
    if date < now.date() {
        return Err(EngineError::InvalidInput(
            "Please select a valid future date".to_string(),
        ));
    }
    if date == now.date() && time <= now.time() {
        return Err(EngineError::InvalidInput(
            "Cannot book appointments in the past. Please select a future time".to_string(),
        ));
    }
    if appointments
        .iter()
        .any(|appo| appo.date == date && appo.time == time)
    {
        return Err(EngineError::SlotUnavailable(
            "This time slot is already booked. Please choose a different time.".to_string(),
        ));
    }
    if let Some(block) = blocks
        .iter()
        .find(|block| block_covers_date(block, date) && block_covers_slot(block, time))
    {
        let msg = if block.reason.is_empty() {
            "This time slot is not available. Please choose a different time.".to_string()
        } else {
            format!("This time slot is not available: {}", block.reason)
        };
        return Err(EngineError::SlotUnavailable(msg));
    }
    Ok(())
}

fn validate_pattern(pattern: &RecurringPattern) -> Result<(), EngineError> {
    if pattern.days.is_empty() {
        return Err(EngineError::InvalidInput(
            "Please select at least one day for a weekly recurring block".to_string(),
        ));
    }
    if pattern.days.iter().any(|&day| day > 6) {
        return Err(EngineError::InvalidInput("Unknown weekday index".to_string()));
    }
    if pattern.weeks == 0 {
        return Err(EngineError::InvalidInput(
            "Recurring weeks count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_block_spec(spec: &BlockSpec) -> Result<(), EngineError> {
    if let (Some(start), Some(end)) = (spec.start_time, spec.end_time) {
        if start > end {
            return Err(EngineError::InvalidInput(
                "End time must be after start time".to_string(),
            ));
        }
    }
    match spec.block_type.as_str() {
        BLOCK_TYPE_SINGLE => Ok(()),
        BLOCK_TYPE_RANGE => {
            let end = spec.end_date.ok_or_else(|| {
                EngineError::InvalidInput("End date is required for a range block".to_string())
            })?;
            if end < spec.start_date {
                return Err(EngineError::InvalidInput(
                    "End date must be after start date".to_string(),
                ));
            }
            Ok(())
        }
        BLOCK_TYPE_WEEKLY => {
            let pattern = spec.recurring.as_ref().ok_or_else(|| {
                EngineError::InvalidInput(
                    "Recurring pattern is required for weekly blocks".to_string(),
                )
            })?;
            validate_pattern(pattern)
        }
        _ => Err(EngineError::InvalidInput("Unknown block type".to_string())),
    }
}

// Concrete dates of every weekly occurrence. The base date's own occurrence
// in week 0 is kept, so the date the admin picked is itself blocked.
fn recurring_dates(
    base_date: NaiveDate,
    pattern: &RecurringPattern,
) -> Result<Vec<NaiveDate>, EngineError> {
    validate_pattern(pattern)?;

    let base_weekday = base_date.weekday().num_days_from_sunday();
    let mut dates = Vec::new();
    for week in 0..pattern.weeks {
        for &day in &pattern.days {
            let days_to_add = (day + 7 - base_weekday) % 7 + 7 * week;
            dates.push(base_date + Duration::days(i64::from(days_to_add)));
        }
    }
    dates.sort();
    dates.dedup();
    Ok(dates)
}

/// Every concrete date a proposed block would cover, in ascending order.
pub fn covered_dates(spec: &BlockSpec) -> Result<Vec<NaiveDate>, EngineError> {
    validate_block_spec(spec)?;
    match spec.block_type.as_str() {
        BLOCK_TYPE_RANGE => {
            let end = spec.end_date.unwrap_or(spec.start_date);
            let mut dates = Vec::new();
            let mut date = spec.start_date;
            while date <= end {
                dates.push(date);
                date += Duration::days(1);
            }
            Ok(dates)
        }
        BLOCK_TYPE_WEEKLY => recurring_dates(spec.start_date, spec.recurring.as_ref().unwrap()),
        _ => Ok(vec![spec.start_date]),
    }
}

/// Expand a weekly rule into one single-day row per occurrence, each
/// carrying the serialized pattern and a week-numbered reason.
pub fn expand_recurring_block(
    base_date: NaiveDate,
    pattern: &RecurringPattern,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    all_day: bool,
    reason: &str,
) -> Result<Vec<NewBlockedSlot>, EngineError> {
    let dates = recurring_dates(base_date, pattern)?;
    let pattern_json = serde_json::to_string(pattern)
        .map_err(|err| EngineError::InvalidInput(format!("Invalid recurring pattern: {}", err)))?;

    let rows = dates
        .into_iter()
        .map(|date| {
            let week = (date - base_date).num_days() / 7 + 1;
            let reason = if reason.is_empty() {
                format!("Recurring week {}", week)
            } else {
                format!("{} (recurring week {})", reason, week)
            };
            NewBlockedSlot {
                start_date: date,
                end_date: None,
                start_time,
                end_time,
                all_day,
                reason,
                block_type: BLOCK_TYPE_WEEKLY.to_string(),
                recurring_pattern: Some(pattern_json.clone()),
            }
        })
        .collect();
    Ok(rows)
}

/// Turn a validated proposal into the rows to insert: one row for single
/// and range blocks, one row per occurrence for weekly blocks.
pub fn expand_block_rows(spec: &BlockSpec) -> Result<Vec<NewBlockedSlot>, EngineError> {
    validate_block_spec(spec)?;
    match spec.block_type.as_str() {
        BLOCK_TYPE_WEEKLY => expand_recurring_block(
            spec.start_date,
            spec.recurring.as_ref().unwrap(),
            spec.start_time,
            spec.end_time,
            spec.all_day,
            &spec.reason,
        ),
        block_type => Ok(vec![NewBlockedSlot {
            start_date: spec.start_date,
            end_date: if block_type == BLOCK_TYPE_RANGE {
                spec.end_date
            } else {
                None
            },
            start_time: spec.start_time,
            end_time: spec.end_time,
            all_day: spec.all_day,
            reason: spec.reason.clone(),
            block_type: block_type.to_string(),
            recurring_pattern: None,
        }]),
    }
}

/// Existing appointments a proposed block would cover, grouped by date.
/// Callers must show these and require explicit confirmation before any
/// block row is inserted.
pub fn find_appointment_conflicts(
    spec: &BlockSpec,
    appointments: &[AppointmentData],
) -> Result<Vec<BlockConflict>, EngineError> {
    let dates = covered_dates(spec)?;
    let mut conflicts = Vec::new();
    for date in dates {
        let hits: Vec<AppointmentData> = appointments
            .iter()
            .filter(|appo| appo.date == date && spec_covers_slot(spec, appo.time))
            .cloned()
            .collect();
        if !hits.is_empty() {
            conflicts.push(BlockConflict {
                date,
                appointments: hits,
            });
        }
    }
    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn appo(date: NaiveDate, hour: u32) -> AppointmentData {
        AppointmentData {
            id: 1,
            first_name: "Jane".to_string(),
            family_name: "Doe".to_string(),
            phone: "555-123-4567".to_string(),
            date,
            time: NaiveTime::from_hms(hour, 0, 0),
            created_at: NaiveDateTime::new(date, NaiveTime::from_hms(8, 0, 0)),
        }
    }

    fn block(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
        all_day: bool,
    ) -> BlockedSlotData {
        BlockedSlotData {
            id: 1,
            start_date,
            end_date,
            start_time,
            end_time,
            all_day,
            reason: "Holiday".to_string(),
            block_type: BLOCK_TYPE_SINGLE.to_string(),
            recurring_pattern: None,
            created_at: NaiveDateTime::new(start_date, NaiveTime::from_hms(0, 0, 0)),
        }
    }

    fn spec(block_type: &str) -> BlockSpec {
        BlockSpec {
            start_date: NaiveDate::from_ymd(2024, 6, 10),
            end_date: None,
            start_time: None,
            end_time: None,
            all_day: true,
            reason: "Holiday".to_string(),
            block_type: block_type.to_string(),
            recurring: None,
        }
    }

    #[test]
    fn catalog_is_nine_hourly_slots() {
        let catalog = slot_catalog();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog[0], NaiveTime::from_hms(9, 0, 0));
        assert_eq!(catalog[8], NaiveTime::from_hms(17, 0, 0));
    }

    #[test]
    fn date_coverage_is_inclusive_and_defaults_to_single_day() {
        let d = |day| NaiveDate::from_ymd(2024, 6, day);
        let single = block(d(10), None, None, None, true);
        assert!(block_covers_date(&single, d(10)));
        assert!(!block_covers_date(&single, d(11)));

        let range = block(d(10), Some(d(12)), None, None, true);
        assert!(block_covers_date(&range, d(10)));
        assert!(block_covers_date(&range, d(11)));
        assert!(block_covers_date(&range, d(12)));
        assert!(!block_covers_date(&range, d(13)));
    }

    #[test]
    fn slot_coverage_handles_open_ended_bounds() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let t = |h| NaiveTime::from_hms(h, 0, 0);

        let bounded = block(d, None, Some(t(10)), Some(t(12)), false);
        assert!(!block_covers_slot(&bounded, t(9)));
        assert!(block_covers_slot(&bounded, t(10)));
        assert!(block_covers_slot(&bounded, t(12)));
        assert!(!block_covers_slot(&bounded, t(13)));

        let from = block(d, None, Some(t(14)), None, false);
        assert!(!block_covers_slot(&from, t(13)));
        assert!(block_covers_slot(&from, t(14)));
        assert!(block_covers_slot(&from, t(17)));

        let until = block(d, None, None, Some(t(11)), false);
        assert!(block_covers_slot(&until, t(9)));
        assert!(block_covers_slot(&until, t(11)));
        assert!(!block_covers_slot(&until, t(12)));

        let unbounded = block(d, None, None, None, false);
        assert!(!block_covers_slot(&unbounded, t(9)));

        let all_day = block(d, None, Some(t(23)), Some(t(23)), true);
        assert!(block_covers_slot(&all_day, t(9)));
    }

    #[test]
    fn partition_is_disjoint_and_covering() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let t = |h| NaiveTime::from_hms(h, 0, 0);
        let catalog = slot_catalog();

        let appointments = vec![appo(d, 10), appo(d, 15)];
        let blocks = vec![block(d, None, Some(t(14)), Some(t(16)), false)];

        let day = compute_availability(&catalog, d, &appointments, &blocks).unwrap();
        assert_eq!(day.booked, vec![t(10), t(15)]);
        assert_eq!(day.blocked, vec![t(14), t(16)]);
        assert_eq!(
            day.available,
            vec![t(9), t(11), t(12), t(13), t(17)]
        );

        let total = day.available.len() + day.booked.len() + day.blocked.len();
        assert_eq!(total, catalog.len());
    }

    #[test]
    fn booked_wins_over_blocked() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let t = |h| NaiveTime::from_hms(h, 0, 0);

        let appointments = vec![appo(d, 10)];
        let blocks = vec![block(d, None, None, None, true)];
        let day = compute_availability(&slot_catalog(), d, &appointments, &blocks).unwrap();
        assert_eq!(day.booked, vec![t(10)]);
        assert!(!day.blocked.contains(&t(10)));
        assert!(day.available.is_empty());
    }

    #[test]
    fn empty_catalog_is_invalid_input() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let res = compute_availability(&[], d, &[], &[]);
        assert!(matches!(res, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn blocked_info_reports_reason_and_range() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let t = |h| NaiveTime::from_hms(h, 0, 0);

        let blocks = vec![
            block(d, None, None, None, true),
            block(d, None, Some(t(9)), Some(t(12)), false),
        ];
        let day = compute_availability(&slot_catalog(), d, &[], &blocks).unwrap();
        assert_eq!(day.blocked_info.len(), 2);
        assert_eq!(day.blocked_info[0].time_range, "All day");
        assert_eq!(day.blocked_info[1].time_range, "09:00 - 12:00");
        assert_eq!(day.blocked_info[0].reason, "Holiday");
    }

    #[test]
    fn bookable_rejects_past_and_off_catalog() {
        let catalog = slot_catalog();
        let now = NaiveDateTime::new(
            NaiveDate::from_ymd(2024, 6, 10),
            NaiveTime::from_hms(12, 30, 0),
        );
        let t = |h| NaiveTime::from_hms(h, 0, 0);

        // yesterday
        let res = is_bookable(
            &catalog,
            NaiveDate::from_ymd(2024, 6, 9),
            t(10),
            now,
            &[],
            &[],
        );
        assert!(matches!(res, Err(EngineError::InvalidInput(_))));

        // today, but the slot has passed
        let res = is_bookable(
            &catalog,
            NaiveDate::from_ymd(2024, 6, 10),
            t(12),
            now,
            &[],
            &[],
        );
        assert!(matches!(res, Err(EngineError::InvalidInput(_))));

        // today, later slot is fine
        is_bookable(
            &catalog,
            NaiveDate::from_ymd(2024, 6, 10),
            t(13),
            now,
            &[],
            &[],
        )
        .unwrap();

        // not an hourly slot
        let res = is_bookable(
            &catalog,
            NaiveDate::from_ymd(2024, 6, 11),
            NaiveTime::from_hms(10, 30, 0),
            now,
            &[],
            &[],
        );
        assert!(matches!(res, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn bookable_rejects_booked_and_blocked_slots() {
        let catalog = slot_catalog();
        let d = NaiveDate::from_ymd(2024, 6, 11);
        let now = NaiveDateTime::new(
            NaiveDate::from_ymd(2024, 6, 10),
            NaiveTime::from_hms(8, 0, 0),
        );
        let t = |h| NaiveTime::from_hms(h, 0, 0);

        let appointments = vec![appo(d, 10)];
        let res = is_bookable(&catalog, d, t(10), now, &appointments, &[]);
        assert!(matches!(res, Err(EngineError::SlotUnavailable(_))));

        let blocks = vec![block(d, None, Some(t(14)), Some(t(16)), false)];
        let res = is_bookable(&catalog, d, t(15), now, &[], &blocks);
        match res {
            Err(EngineError::SlotUnavailable(msg)) => assert!(msg.contains("Holiday")),
            other => panic!("expected SlotUnavailable, got {:?}", other),
        }

        is_bookable(&catalog, d, t(11), now, &appointments, &blocks).unwrap();
    }

    #[test]
    fn recurring_keeps_the_base_date_occurrence() {
        // 2024-01-01 is a Monday; asking for Mondays keeps it.
        let base = NaiveDate::from_ymd(2024, 1, 1);
        let pattern = RecurringPattern {
            days: vec![1],
            weeks: 2,
        };
        let dates = recurring_dates(base, &pattern).unwrap();
        assert_eq!(
            dates,
            vec![NaiveDate::from_ymd(2024, 1, 1), NaiveDate::from_ymd(2024, 1, 8)]
        );
    }

    #[test]
    fn recurring_rolls_forward_to_requested_weekdays() {
        // Base Monday, asking for Wednesday and Friday.
        let base = NaiveDate::from_ymd(2024, 1, 1);
        let pattern = RecurringPattern {
            days: vec![3, 5],
            weeks: 1,
        };
        let dates = recurring_dates(base, &pattern).unwrap();
        assert_eq!(
            dates,
            vec![NaiveDate::from_ymd(2024, 1, 3), NaiveDate::from_ymd(2024, 1, 5)]
        );
    }

    #[test]
    fn recurring_validation_failures() {
        let base = NaiveDate::from_ymd(2024, 1, 1);
        let bad_day = RecurringPattern {
            days: vec![7],
            weeks: 1,
        };
        assert_eq!(
            recurring_dates(base, &bad_day),
            Err(EngineError::InvalidInput("Unknown weekday index".to_string()))
        );

        let no_days = RecurringPattern {
            days: vec![],
            weeks: 1,
        };
        assert!(recurring_dates(base, &no_days).is_err());

        let no_weeks = RecurringPattern {
            days: vec![1],
            weeks: 0,
        };
        assert!(recurring_dates(base, &no_weeks).is_err());
    }

    #[test]
    fn expansion_produces_week_numbered_single_day_rows() {
        let base = NaiveDate::from_ymd(2024, 1, 1);
        let pattern = RecurringPattern {
            days: vec![1],
            weeks: 2,
        };
        let rows = expand_recurring_block(
            base,
            &pattern,
            Some(NaiveTime::from_hms(9, 0, 0)),
            Some(NaiveTime::from_hms(12, 0, 0)),
            false,
            "Training",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start_date, base);
        assert_eq!(rows[0].end_date, None);
        assert_eq!(rows[0].reason, "Training (recurring week 1)");
        assert_eq!(rows[1].start_date, NaiveDate::from_ymd(2024, 1, 8));
        assert_eq!(rows[1].reason, "Training (recurring week 2)");
        for row in &rows {
            assert_eq!(row.block_type, BLOCK_TYPE_WEEKLY);
            let stored: RecurringPattern =
                serde_json::from_str(row.recurring_pattern.as_ref().unwrap()).unwrap();
            assert_eq!(stored, pattern);
        }
    }

    #[test]
    fn spec_validation_catches_inverted_ranges() {
        let mut range = spec(BLOCK_TYPE_RANGE);
        range.end_date = Some(NaiveDate::from_ymd(2024, 6, 9));
        assert!(validate_block_spec(&range).is_err());

        let mut single = spec(BLOCK_TYPE_SINGLE);
        single.all_day = false;
        single.start_time = Some(NaiveTime::from_hms(15, 0, 0));
        single.end_time = Some(NaiveTime::from_hms(10, 0, 0));
        assert!(validate_block_spec(&single).is_err());

        let unknown = spec("monthly");
        assert_eq!(
            validate_block_spec(&unknown),
            Err(EngineError::InvalidInput("Unknown block type".to_string()))
        );
    }

    #[test]
    fn covered_dates_enumerates_ranges() {
        let mut range = spec(BLOCK_TYPE_RANGE);
        range.end_date = Some(NaiveDate::from_ymd(2024, 6, 12));
        let dates = covered_dates(&range).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd(2024, 6, 10),
                NaiveDate::from_ymd(2024, 6, 11),
                NaiveDate::from_ymd(2024, 6, 12),
            ]
        );

        assert_eq!(
            covered_dates(&spec(BLOCK_TYPE_SINGLE)).unwrap(),
            vec![NaiveDate::from_ymd(2024, 6, 10)]
        );
    }

    #[test]
    fn single_and_range_expand_to_one_row() {
        let rows = expand_block_rows(&spec(BLOCK_TYPE_SINGLE)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].end_date, None);

        let mut range = spec(BLOCK_TYPE_RANGE);
        range.end_date = Some(NaiveDate::from_ymd(2024, 6, 12));
        let rows = expand_block_rows(&range).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].end_date, Some(NaiveDate::from_ymd(2024, 6, 12)));
    }

    #[test]
    fn conflicts_are_grouped_by_date() {
        let mut range = spec(BLOCK_TYPE_RANGE);
        range.end_date = Some(NaiveDate::from_ymd(2024, 6, 12));

        let appointments = vec![
            appo(NaiveDate::from_ymd(2024, 6, 11), 10),
            appo(NaiveDate::from_ymd(2024, 6, 11), 14),
            appo(NaiveDate::from_ymd(2024, 6, 20), 10),
        ];
        let conflicts = find_appointment_conflicts(&range, &appointments).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].date, NaiveDate::from_ymd(2024, 6, 11));
        assert_eq!(conflicts[0].appointments.len(), 2);
    }

    #[test]
    fn one_booking_leaves_the_other_eight_slots() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let t = |h| NaiveTime::from_hms(h, 0, 0);

        let appointments = vec![appo(d, 10)];
        let day = compute_availability(&slot_catalog(), d, &appointments, &[]).unwrap();
        assert_eq!(day.booked, vec![t(10)]);
        assert!(day.blocked.is_empty());
        assert_eq!(
            day.available,
            vec![t(9), t(11), t(12), t(13), t(14), t(15), t(16), t(17)]
        );
    }

    #[test]
    fn all_day_range_empties_every_covered_date() {
        let d = |day| NaiveDate::from_ymd(2024, 6, day);
        let blocks = vec![block(d(10), Some(d(12)), None, None, true)];
        let appointments = vec![appo(d(11), 10)];

        for day in 10..=12 {
            let result =
                compute_availability(&slot_catalog(), d(day), &appointments, &blocks).unwrap();
            assert!(result.available.is_empty());
        }

        let after = compute_availability(&slot_catalog(), d(13), &[], &blocks).unwrap();
        assert_eq!(after.available.len(), 9);
    }

    #[test]
    fn availability_is_deterministic() {
        let d = NaiveDate::from_ymd(2024, 6, 10);
        let t = |h| NaiveTime::from_hms(h, 0, 0);
        let appointments = vec![appo(d, 11)];
        let blocks = vec![block(d, None, Some(t(14)), Some(t(16)), false)];

        let first = compute_availability(&slot_catalog(), d, &appointments, &blocks).unwrap();
        let second = compute_availability(&slot_catalog(), d, &appointments, &blocks).unwrap();
        assert_eq!(first.available, second.available);
        assert_eq!(first.booked, second.booked);
        assert_eq!(first.blocked, second.blocked);
    }

    #[test]
    fn time_bounded_spec_only_conflicts_inside_its_range() {
        let mut single = spec(BLOCK_TYPE_SINGLE);
        single.all_day = false;
        single.start_time = Some(NaiveTime::from_hms(9, 0, 0));
        single.end_time = Some(NaiveTime::from_hms(11, 0, 0));

        let appointments = vec![
            appo(NaiveDate::from_ymd(2024, 6, 10), 10),
            appo(NaiveDate::from_ymd(2024, 6, 10), 15),
        ];
        let conflicts = find_appointment_conflicts(&single, &appointments).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].appointments.len(), 1);
        assert_eq!(
            conflicts[0].appointments[0].time,
            NaiveTime::from_hms(10, 0, 0)
        );
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::NaiveDateTime;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn target_date() -> NaiveDate {
        NaiveDate::from_ymd(2024, 6, 10)
    }

    fn appo_at(hour: u32) -> AppointmentData {
        AppointmentData {
            id: 1,
            first_name: "Jane".to_string(),
            family_name: "Doe".to_string(),
            phone: "555-123-4567".to_string(),
            date: target_date(),
            time: NaiveTime::from_hms(hour, 0, 0),
            created_at: NaiveDateTime::new(target_date(), NaiveTime::from_hms(8, 0, 0)),
        }
    }

    fn booked_hours() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(FIRST_SLOT_HOUR..=LAST_SLOT_HOUR, 0..6)
    }

    fn arb_block() -> impl Strategy<Value = BlockedSlotData> {
        (
            -3i64..=3,
            0i64..=4,
            any::<bool>(),
            any::<bool>(),
            prop::option::of(8u32..=18),
            prop::option::of(8u32..=18),
        )
            .prop_map(|(offset, len, has_end, all_day, start_hour, end_hour)| {
                let start_date = target_date() + Duration::days(offset);
                BlockedSlotData {
                    id: 1,
                    start_date,
                    end_date: if has_end {
                        Some(start_date + Duration::days(len))
                    } else {
                        None
                    },
                    start_time: start_hour.map(|h| NaiveTime::from_hms(h, 0, 0)),
                    end_time: end_hour.map(|h| NaiveTime::from_hms(h, 0, 0)),
                    all_day,
                    reason: "Blocked".to_string(),
                    block_type: BLOCK_TYPE_SINGLE.to_string(),
                    recurring_pattern: None,
                    created_at: NaiveDateTime::new(start_date, NaiveTime::from_hms(0, 0, 0)),
                }
            })
    }

    proptest! {
        // Every catalog slot lands in exactly one of the three sets.
        #[test]
        fn partition_is_disjoint_and_covering(
            booked in booked_hours(),
            blocks in prop::collection::vec(arb_block(), 0..4),
        ) {
            let catalog = slot_catalog();
            let appointments: Vec<AppointmentData> =
                booked.iter().map(|&h| appo_at(h)).collect();

            let day =
                compute_availability(&catalog, target_date(), &appointments, &blocks).unwrap();

            let mut seen = HashSet::new();
            for slot in day.available.iter().chain(&day.booked).chain(&day.blocked) {
                prop_assert!(seen.insert(*slot), "slot {} classified twice", slot);
                prop_assert!(catalog.contains(slot));
            }
            prop_assert_eq!(seen.len(), catalog.len());

            for &hour in &booked {
                prop_assert!(day.booked.contains(&NaiveTime::from_hms(hour, 0, 0)));
            }
        }

        #[test]
        fn identical_inputs_yield_identical_output(
            booked in booked_hours(),
            blocks in prop::collection::vec(arb_block(), 0..4),
        ) {
            let catalog = slot_catalog();
            let appointments: Vec<AppointmentData> =
                booked.iter().map(|&h| appo_at(h)).collect();

            let first =
                compute_availability(&catalog, target_date(), &appointments, &blocks).unwrap();
            let second =
                compute_availability(&catalog, target_date(), &appointments, &blocks).unwrap();
            prop_assert_eq!(&first.available, &second.available);
            prop_assert_eq!(&first.booked, &second.booked);
            prop_assert_eq!(&first.blocked, &second.blocked);
        }

        // A booked slot is refused no matter what the blocked rows say.
        #[test]
        fn booked_slot_is_never_bookable(
            hour in FIRST_SLOT_HOUR..=LAST_SLOT_HOUR,
            blocks in prop::collection::vec(arb_block(), 0..4),
        ) {
            let catalog = slot_catalog();
            let appointments = vec![appo_at(hour)];
            let now = NaiveDateTime::new(
                NaiveDate::from_ymd(2024, 6, 1),
                NaiveTime::from_hms(8, 0, 0),
            );

            let res = is_bookable(
                &catalog,
                target_date(),
                NaiveTime::from_hms(hour, 0, 0),
                now,
                &appointments,
                &blocks,
            );
            prop_assert!(matches!(res, Err(EngineError::SlotUnavailable(_))));
        }
    }
}
