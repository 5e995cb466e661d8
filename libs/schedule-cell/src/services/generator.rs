use chrono::{Datelike, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{
    ConflictReason, CreateScheduleRequest, Schedule, ScheduleConflict, ScheduleError, ScheduleSlot,
    ScheduleStatus,
};

pub const MAX_RANGE_DAYS: i64 = 366;

/// Expands a request into concrete rows.
///
/// A request without an end date, or whose end date equals the start date, yields
/// exactly one row on the start date and ignores `weekdays`. Otherwise every date
/// from start to end inclusive whose weekday (0 = Sunday) is listed yields a row.
pub fn expand(request: &CreateScheduleRequest) -> Result<Vec<ScheduleSlot>, ScheduleError> {
    if let Some(day) = request.weekdays.iter().find(|d| **d > 6) {
        return Err(ScheduleError::Validation(format!(
            "Weekday {} is out of range; use 0 (Sunday) through 6 (Saturday)",
            day
        )));
    }

    let start = request.start_date;
    let end = request.end_date.unwrap_or(start);
    if end < start {
        return Err(ScheduleError::Validation("End date is before start date".to_string()));
    }

    let slot = |work_date: NaiveDate| ScheduleSlot {
        staff_id: request.staff_id,
        staff_type: request.staff_type,
        room_id: request.room_id,
        work_date,
        start_time: request.shift.start_time(),
        end_time: request.shift.end_time(),
    };

    if end == start {
        return Ok(vec![slot(start)]);
    }

    if (end - start).num_days() + 1 > MAX_RANGE_DAYS {
        return Err(ScheduleError::Validation(format!(
            "Date range may not exceed {} days",
            MAX_RANGE_DAYS
        )));
    }
    if request.weekdays.is_empty() {
        return Err(ScheduleError::Validation(
            "Select at least one weekday for a date range".to_string(),
        ));
    }

    let slots: Vec<ScheduleSlot> = start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| request.weekdays.contains(&weekday_number(*date)))
        .map(slot)
        .collect();

    if slots.is_empty() {
        return Err(ScheduleError::Validation(
            "No dates in the range fall on the selected weekdays".to_string(),
        ));
    }
    Ok(slots)
}

/// 0 = Sunday through 6 = Saturday.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && b_start < a_end
}

/// Existing, non-cancelled rows that clash with any candidate on the same date
/// with overlapping times, for the same staff member or the same room.
pub fn find_conflicts(
    candidates: &[ScheduleSlot],
    existing: &[Schedule],
    exclude_id: Option<Uuid>,
) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    for slot in candidates {
        for row in existing {
            if Some(row.id) == exclude_id
                || row.status == ScheduleStatus::Cancelled
                || row.work_date != slot.work_date
                || !overlaps(slot.start_time, slot.end_time, row.start_time, row.end_time)
            {
                continue;
            }

            let reason = if row.staff_id == slot.staff_id && row.staff_type == slot.staff_type {
                ConflictReason::Staff
            } else if row.room_id == slot.room_id {
                ConflictReason::Room
            } else {
                continue;
            };

            conflicts.push(ScheduleConflict {
                existing_id: row.id,
                work_date: row.work_date,
                start_time: row.start_time,
                end_time: row.end_time,
                reason,
            });
        }
    }

    conflicts
}

/// First and last dates the slots touch, for bounding the conflict lookup.
pub fn date_bounds(slots: &[ScheduleSlot]) -> Option<(NaiveDate, NaiveDate)> {
    let first = slots.iter().map(|s| s.work_date).min()?;
    let last = slots.iter().map(|s| s.work_date).max()?;
    Some((first, last))
}
