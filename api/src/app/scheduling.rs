//! Scheduling rules
//!
//! Pure planning functions behind the agenda: lote (batch) row generation
//! and conflict detection, weekly workload, and laudo work-block
//! suggestions. Services load the data and persist the results; nothing
//! here performs I/O.
//!
//! All "local" dates and times are interpreted in the experts' configured
//! UTC offset.

use std::collections::{HashMap, HashSet};

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use serde::Serialize;

use crate::domain::entities::{AgendaEvent, AgendaEventId, PericiaId, DEFAULT_EVENT_MINUTES};
use crate::error::DomainError;

/// Daily capacity on weekdays, in minutes
pub const WEEKDAY_WINDOW_MINUTES: i64 = 480;
/// Daily capacity on Saturdays and Sundays, in minutes
pub const WEEKEND_WINDOW_MINUTES: i64 = 240;
/// Block start used when no preferred window is given or it does not parse
pub const DEFAULT_BLOCK_TIME: &str = "14:00";
/// Upper bound for any single duration, interval or buffer, in minutes
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;
/// Upper bound for the laudo backlog a block plan may cover
pub const MAX_BACKLOG: i64 = 10_000;
/// Upper bound for the number of blocks suggested in one week
pub const MAX_SUGGESTED_BLOCKS: i64 = 1_000;
/// Calendar years accepted for planning
pub const PLANNING_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

// ============================================================================
// Time helpers
// ============================================================================

/// UTC instant of local midnight starting `date`
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    local_instant(date, NaiveTime::MIN, offset)
}

pub fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time);
    Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
}

pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Parse `HH:MM`
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), DomainError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "{} deve estar entre {} e {}",
            field, min, max
        )))
    }
}

/// Reject dates far enough out that day arithmetic could leave chrono's range
pub fn check_planning_date(date: NaiveDate) -> Result<(), DomainError> {
    if PLANNING_YEARS.contains(&date.year()) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "Data {} fora do intervalo {}-{}",
            date,
            PLANNING_YEARS.start(),
            PLANNING_YEARS.end()
        )))
    }
}

fn minutes(value: i64) -> Result<Duration, DomainError> {
    Duration::try_minutes(value).ok_or_else(out_of_calendar)
}

fn out_of_calendar() -> DomainError {
    DomainError::Validation("Horário calculado fora do intervalo suportado".to_string())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn utilization(allocated: i64, window: i64) -> f64 {
    if window > 0 {
        round1(allocated as f64 / window as f64 * 100.0)
    } else {
        0.0
    }
}

// ============================================================================
// Lote planning
// ============================================================================

/// Parameters of a lote as chosen in the scheduling wizard
#[derive(Debug, Clone)]
pub struct LotParams {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub interval_minutes: i64,
}

/// A perícia picked for the lote
#[derive(Debug, Clone)]
pub struct LotCandidate {
    pub pericia_id: PericiaId,
    pub processo_cnj: String,
    pub city: Option<String>,
}

/// A slot of a draft or submitted lote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSlot {
    pub row: usize,
    pub pericia_id: Option<PericiaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processo_cnj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl PlannedSlot {
    pub fn new(
        row: usize,
        pericia_id: Option<PericiaId>,
        start_at: DateTime<Utc>,
        end_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            row,
            pericia_id,
            processo_cnj: None,
            city: None,
            start_at,
            end_at: end_at.unwrap_or(start_at + Duration::minutes(DEFAULT_EVENT_MINUTES)),
        }
    }

    fn overlaps(&self, other: &PlannedSlot) -> bool {
        self.start_at < other.end_at && other.start_at < self.end_at
    }
}

/// Lay candidates out back to back: each row starts `duration + interval`
/// minutes after the previous one. Fails when a parameter is out of range
/// or a row would land outside the representable calendar.
pub fn plan_lot(
    params: &LotParams,
    candidates: &[LotCandidate],
    offset: FixedOffset,
) -> Result<Vec<PlannedSlot>, DomainError> {
    check_range("durationMinutes", params.duration_minutes, 1, MAX_SLOT_MINUTES)?;
    check_range("intervalMinutes", params.interval_minutes, 0, MAX_SLOT_MINUTES)?;
    check_planning_date(params.date)?;

    let first = local_instant(params.date, params.start_time, offset);
    let step = minutes(params.duration_minutes + params.interval_minutes)?;
    let duration = minutes(params.duration_minutes)?;

    candidates
        .iter()
        .enumerate()
        .map(|(row, c)| {
            let shift = i32::try_from(row)
                .ok()
                .and_then(|r| step.checked_mul(r))
                .ok_or_else(out_of_calendar)?;
            let start_at = first.checked_add_signed(shift).ok_or_else(out_of_calendar)?;
            let end_at = start_at
                .checked_add_signed(duration)
                .ok_or_else(out_of_calendar)?;
            Ok(PlannedSlot {
                row,
                pericia_id: Some(c.pericia_id),
                processo_cnj: Some(c.processo_cnj.clone()),
                city: c.city.clone(),
                start_at,
                end_at,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// The perícia already belongs to a confirmed lote
    AlreadyScheduled,
    /// The perícia appears more than once in this lote
    DuplicateInBatch { first_row: usize },
    /// Two rows of this lote overlap in time
    OverlapsBatchRow { other_row: usize },
    /// The row overlaps an event already on the agenda
    OverlapsEvent {
        event_id: AgendaEventId,
        title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingConflict {
    pub row: usize,
    pub pericia_id: Option<PericiaId>,
    #[serde(flatten)]
    pub kind: ConflictKind,
    pub message: String,
}

/// Find every conflict of a lote. Cancelled agenda events are ignored.
pub fn detect_conflicts(
    slots: &[PlannedSlot],
    confirmed: &HashSet<PericiaId>,
    existing: &[AgendaEvent],
) -> Vec<SchedulingConflict> {
    let mut conflicts = Vec::new();
    let mut first_seen: HashMap<PericiaId, usize> = HashMap::new();

    for (i, slot) in slots.iter().enumerate() {
        if let Some(pid) = slot.pericia_id {
            if confirmed.contains(&pid) {
                conflicts.push(SchedulingConflict {
                    row: slot.row,
                    pericia_id: Some(pid),
                    kind: ConflictKind::AlreadyScheduled,
                    message: "Perícia já está em um lote confirmado".to_string(),
                });
            }
            if let Some(&first_row) = first_seen.get(&pid) {
                conflicts.push(SchedulingConflict {
                    row: slot.row,
                    pericia_id: Some(pid),
                    kind: ConflictKind::DuplicateInBatch { first_row },
                    message: format!("Perícia repetida (linha {})", first_row + 1),
                });
            } else {
                first_seen.insert(pid, slot.row);
            }
        }

        for other in &slots[..i] {
            if slot.overlaps(other) {
                conflicts.push(SchedulingConflict {
                    row: slot.row,
                    pericia_id: slot.pericia_id,
                    kind: ConflictKind::OverlapsBatchRow {
                        other_row: other.row,
                    },
                    message: format!("Horário sobreposto à linha {}", other.row + 1),
                });
            }
        }

        for event in existing.iter().filter(|e| e.is_active()) {
            if event.overlaps(slot.start_at, slot.end_at) {
                conflicts.push(SchedulingConflict {
                    row: slot.row,
                    pericia_id: slot.pericia_id,
                    kind: ConflictKind::OverlapsEvent {
                        event_id: event.id,
                        title: event.title.clone(),
                    },
                    message: format!("Conflito com \"{}\"", event.title),
                });
            }
        }
    }

    conflicts
}

// ============================================================================
// Weekly workload
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DayWorkload {
    pub date: NaiveDate,
    pub allocated_minutes: i64,
    pub work_window_minutes: i64,
    pub utilization: f64,
    pub conflicts: usize,
    #[serde(skip)]
    pub events: Vec<AgendaEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyWorkload {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<DayWorkload>,
    pub allocated_minutes: i64,
    pub work_window_minutes: i64,
    pub utilization: f64,
    pub conflicts: usize,
}

fn window_for(date: NaiveDate) -> i64 {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => WEEKEND_WINDOW_MINUTES,
        _ => WEEKDAY_WINDOW_MINUTES,
    }
}

/// Count overlapping pairs among events sorted by start
fn count_overlaps(events: &[AgendaEvent]) -> usize {
    let mut overlaps = 0;
    for (i, a) in events.iter().enumerate() {
        let a_end = a.effective_end();
        for b in &events[i + 1..] {
            if a_end <= b.start_at {
                break;
            }
            overlaps += 1;
        }
    }
    overlaps
}

/// Aggregate the week starting on `monday`. Events are assigned to the
/// local day they start on and count whatever their status; events outside
/// the week are ignored.
pub fn weekly_workload(
    monday: NaiveDate,
    events: &[AgendaEvent],
    offset: FixedOffset,
) -> WeeklyWorkload {
    let mut days: Vec<DayWorkload> = (0..7)
        .map(|i| {
            let date = monday + Duration::days(i);
            DayWorkload {
                date,
                allocated_minutes: 0,
                work_window_minutes: window_for(date),
                utilization: 0.0,
                conflicts: 0,
                events: Vec::new(),
            }
        })
        .collect();

    for event in events {
        let idx = (local_date(event.start_at, offset) - monday).num_days();
        if let Some(day) = usize::try_from(idx).ok().and_then(|i| days.get_mut(i)) {
            day.allocated_minutes += event.allocated_minutes();
            day.events.push(event.clone());
        }
    }

    for day in &mut days {
        day.events.sort_by_key(|e| e.start_at);
        day.conflicts = count_overlaps(&day.events);
        day.utilization = utilization(day.allocated_minutes, day.work_window_minutes);
    }

    let allocated_minutes = days.iter().map(|d| d.allocated_minutes).sum();
    let work_window_minutes = days.iter().map(|d| d.work_window_minutes).sum();
    let conflicts = days.iter().map(|d| d.conflicts).sum();

    WeeklyWorkload {
        week_start: monday,
        week_end: monday + Duration::days(6),
        days,
        allocated_minutes,
        work_window_minutes,
        utilization: utilization(allocated_minutes, work_window_minutes),
        conflicts,
    }
}

// ============================================================================
// Laudo block suggestions
// ============================================================================

#[derive(Debug, Clone)]
pub struct BlockRequest {
    pub avg_minutes_per_laudo: i64,
    pub backlog: i64,
    pub min_buffer_minutes: i64,
    pub preferred_windows: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockAssumptions {
    pub avg_minutes_per_laudo: i64,
    pub backlog: i64,
    pub required_minutes: i64,
    pub min_buffer_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSuggestion {
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: crate::domain::entities::EventType,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub ai_suggested: bool,
    pub conflict: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockPlan {
    pub assumptions: BlockAssumptions,
    pub suggestions: Vec<BlockSuggestion>,
}

/// Spread enough report-writing blocks over the weekdays of the week to
/// cover the backlog, flagging those that collide with any existing event.
pub fn suggest_laudo_blocks(
    monday: NaiveDate,
    request: &BlockRequest,
    existing: &[AgendaEvent],
    offset: FixedOffset,
) -> Result<BlockPlan, DomainError> {
    check_range("avgMinutesPerLaudo", request.avg_minutes_per_laudo, 0, MAX_SLOT_MINUTES)?;
    check_range("backlog", request.backlog, 0, MAX_BACKLOG)?;
    check_range("minBufferMinutes", request.min_buffer_minutes, 0, MAX_SLOT_MINUTES)?;
    check_planning_date(monday)?;

    let required_minutes = request
        .avg_minutes_per_laudo
        .checked_mul(request.backlog)
        .ok_or_else(out_of_calendar)?;
    let per_block = request.min_buffer_minutes.max(30);
    let count = ((required_minutes + per_block - 1) / per_block).max(1);
    if count > MAX_SUGGESTED_BLOCKS {
        return Err(DomainError::Validation(format!(
            "Backlog exige {} blocos; o máximo por semana é {}",
            count, MAX_SUGGESTED_BLOCKS
        )));
    }
    let duration = minutes(
        request
            .min_buffer_minutes
            .max((request.avg_minutes_per_laudo as f64 * 0.8).round() as i64),
    )?;
    let default_time = parse_hhmm(DEFAULT_BLOCK_TIME).unwrap_or(NaiveTime::MIN);

    let suggestions = (0..count)
        .map(|i| {
            let date = monday
                .checked_add_signed(Duration::days(i % 5))
                .ok_or_else(out_of_calendar)?;
            let time = if request.preferred_windows.is_empty() {
                default_time
            } else {
                let window = &request.preferred_windows[i as usize % request.preferred_windows.len()];
                parse_hhmm(window).unwrap_or(default_time)
            };
            let start_at = local_instant(date, time, offset);
            let end_at = start_at
                .checked_add_signed(duration)
                .ok_or_else(out_of_calendar)?;
            let conflict = existing.iter().any(|e| e.overlaps(start_at, end_at));

            Ok(BlockSuggestion {
                title: format!("Bloco de Laudo #{}", i + 1),
                event_type: crate::domain::entities::EventType::BlocoTrabalho,
                start_at,
                end_at,
                ai_suggested: true,
                conflict,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(BlockPlan {
        assumptions: BlockAssumptions {
            avg_minutes_per_laudo: request.avg_minutes_per_laudo,
            backlog: request.backlog,
            required_minutes,
            min_buffer_minutes: request.min_buffer_minutes,
        },
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EventStatus, TenantId};
    use crate::test_utils::test_event;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn event_at(date: NaiveDate, h: u32, m: u32, minutes: Option<i64>) -> AgendaEvent {
        let mut e = test_event(TenantId::new());
        e.start_at = local_instant(date, NaiveTime::from_hms_opt(h, m, 0).unwrap(), brt());
        e.end_at = minutes.map(|min| e.start_at + Duration::minutes(min));
        e
    }

    fn candidates(n: usize) -> Vec<LotCandidate> {
        (0..n)
            .map(|i| LotCandidate {
                pericia_id: PericiaId::new(),
                processo_cnj: format!("000000{}-00.2025.8.26.0100", i),
                city: Some("Campinas".to_string()),
            })
            .collect()
    }

    #[test]
    fn week_start_is_monday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert_eq!(week_start(sunday), monday());
        assert_eq!(week_start(wednesday), monday());
        assert_eq!(week_start(monday()), monday());
    }

    #[test]
    fn local_midnight_applies_offset() {
        let utc = local_midnight(monday(), brt());
        assert_eq!(utc, Utc.with_ymd_and_hms(2025, 3, 10, 3, 0, 0).unwrap());
    }

    #[test]
    fn plan_lot_steps_by_duration_plus_interval() {
        let params = LotParams {
            date: monday(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            duration_minutes: 30,
            interval_minutes: 10,
        };
        let rows = plan_lot(&params, &candidates(3), brt()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].start_at, Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap());
        assert_eq!(rows[1].start_at, rows[0].start_at + Duration::minutes(40));
        assert_eq!(rows[2].end_at, rows[2].start_at + Duration::minutes(30));
        assert_eq!(rows[2].row, 2);
    }

    #[test]
    fn generated_lot_has_no_internal_conflicts() {
        let params = LotParams {
            date: monday(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            duration_minutes: 30,
            interval_minutes: 0,
        };
        let rows = plan_lot(&params, &candidates(5), brt()).unwrap();
        assert!(detect_conflicts(&rows, &HashSet::new(), &[]).is_empty());
    }

    #[test]
    fn conflict_when_pericia_in_confirmed_batch() {
        let rows = plan_lot(
            &LotParams {
                date: monday(),
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                duration_minutes: 30,
                interval_minutes: 0,
            },
            &candidates(2),
            brt(),
        )
        .unwrap();
        let confirmed: HashSet<_> = [rows[1].pericia_id.unwrap()].into();

        let conflicts = detect_conflicts(&rows, &confirmed, &[]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].row, 1);
        assert_eq!(conflicts[0].kind, ConflictKind::AlreadyScheduled);
    }

    #[test]
    fn conflict_when_pericia_repeated() {
        let pid = PericiaId::new();
        let start = local_instant(monday(), NaiveTime::from_hms_opt(8, 0, 0).unwrap(), brt());
        let slots = vec![
            PlannedSlot::new(0, Some(pid), start, Some(start + Duration::minutes(30))),
            PlannedSlot::new(
                1,
                Some(pid),
                start + Duration::hours(1),
                Some(start + Duration::minutes(90)),
            ),
        ];

        let conflicts = detect_conflicts(&slots, &HashSet::new(), &[]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::DuplicateInBatch { first_row: 0 });
    }

    #[test]
    fn conflict_when_rows_overlap() {
        let start = local_instant(monday(), NaiveTime::from_hms_opt(8, 0, 0).unwrap(), brt());
        let slots = vec![
            PlannedSlot::new(0, None, start, None),
            PlannedSlot::new(1, None, start + Duration::minutes(30), None),
        ];

        let conflicts = detect_conflicts(&slots, &HashSet::new(), &[]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::OverlapsBatchRow { other_row: 0 });
    }

    #[test]
    fn conflict_with_existing_event_ignores_cancelled() {
        let busy = event_at(monday(), 8, 15, Some(30));
        let mut cancelled = event_at(monday(), 8, 0, Some(60));
        cancelled.status = EventStatus::Cancelada;

        let start = local_instant(monday(), NaiveTime::from_hms_opt(8, 0, 0).unwrap(), brt());
        let slots = vec![PlannedSlot::new(0, None, start, Some(start + Duration::minutes(30)))];

        let conflicts = detect_conflicts(&slots, &HashSet::new(), &[busy.clone(), cancelled]);
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(
            &conflicts[0].kind,
            ConflictKind::OverlapsEvent { event_id, .. } if *event_id == busy.id
        ));
    }

    #[test]
    fn back_to_back_event_is_not_a_conflict() {
        let before = event_at(monday(), 7, 0, Some(60));
        let start = local_instant(monday(), NaiveTime::from_hms_opt(8, 0, 0).unwrap(), brt());
        let slots = vec![PlannedSlot::new(0, None, start, None)];
        assert!(detect_conflicts(&slots, &HashSet::new(), &[before]).is_empty());
    }

    #[test]
    fn workload_windows_and_minutes() {
        let saturday = monday() + Duration::days(5);
        let events = vec![
            event_at(monday(), 9, 0, Some(90)),
            event_at(monday(), 14, 0, None),
            event_at(saturday, 9, 0, Some(5)),
        ];

        let week = weekly_workload(monday(), &events, brt());

        assert_eq!(week.week_end, monday() + Duration::days(6));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].allocated_minutes, 150);
        assert_eq!(week.days[0].work_window_minutes, 480);
        assert_eq!(week.days[0].utilization, 31.3);
        assert_eq!(week.days[5].allocated_minutes, 15);
        assert_eq!(week.days[5].work_window_minutes, 240);
        assert_eq!(week.work_window_minutes, 5 * 480 + 2 * 240);
        assert_eq!(week.allocated_minutes, 165);
        assert_eq!(week.utilization, 5.7);
    }

    #[test]
    fn workload_counts_overlapping_pairs() {
        let events = vec![
            event_at(monday(), 9, 0, Some(120)),
            event_at(monday(), 9, 30, Some(30)),
            event_at(monday(), 10, 0, Some(30)),
            event_at(monday(), 12, 0, Some(30)),
        ];

        let week = weekly_workload(monday(), &events, brt());
        assert_eq!(week.days[0].conflicts, 2);
        assert_eq!(week.conflicts, 2);
    }

    #[test]
    fn workload_uses_local_day() {
        // 23:30 local on Monday is already Tuesday in UTC
        let late = event_at(monday(), 23, 30, Some(30));
        let week = weekly_workload(monday(), &[late], brt());
        assert_eq!(week.days[0].allocated_minutes, 30);
        assert_eq!(week.days[1].allocated_minutes, 0);
    }

    #[test]
    fn workload_skips_events_outside_week() {
        let next_week = event_at(monday() + Duration::days(7), 9, 0, Some(60));
        let week = weekly_workload(monday(), &[next_week], brt());
        assert_eq!(week.allocated_minutes, 0);
    }

    #[test]
    fn block_count_and_placement() {
        let request = BlockRequest {
            avg_minutes_per_laudo: 60,
            backlog: 4,
            min_buffer_minutes: 45,
            preferred_windows: vec!["09:00".into(), "15:30".into()],
        };

        let plan = suggest_laudo_blocks(monday(), &request, &[], brt()).unwrap();

        // 240 required / 45 per block -> 6 blocks
        assert_eq!(plan.assumptions.required_minutes, 240);
        assert_eq!(plan.suggestions.len(), 6);
        // duration = max(45, round(60 * 0.8)) = 48
        let first = &plan.suggestions[0];
        assert_eq!(first.end_at - first.start_at, Duration::minutes(48));
        assert_eq!(first.start_at, local_instant(monday(), parse_hhmm("09:00").unwrap(), brt()));
        // sixth block wraps back to Monday, second window
        let sixth = &plan.suggestions[5];
        assert_eq!(local_date(sixth.start_at, brt()), monday());
        assert_eq!(
            sixth.start_at,
            local_instant(monday(), parse_hhmm("15:30").unwrap(), brt())
        );
        assert_eq!(sixth.title, "Bloco de Laudo #6");
    }

    #[test]
    fn block_buffer_floor_is_thirty_minutes() {
        let request = BlockRequest {
            avg_minutes_per_laudo: 15,
            backlog: 1,
            min_buffer_minutes: 15,
            preferred_windows: vec![],
        };

        let plan = suggest_laudo_blocks(monday(), &request, &[], brt()).unwrap();
        assert_eq!(plan.suggestions.len(), 1);
        assert_eq!(
            plan.suggestions[0].start_at,
            local_instant(monday(), parse_hhmm(DEFAULT_BLOCK_TIME).unwrap(), brt())
        );
    }

    #[test]
    fn block_flags_conflicts() {
        let busy = event_at(monday(), 14, 30, Some(60));
        let request = BlockRequest {
            avg_minutes_per_laudo: 60,
            backlog: 1,
            min_buffer_minutes: 30,
            preferred_windows: vec![],
        };

        let plan = suggest_laudo_blocks(monday(), &request, &[busy], brt()).unwrap();
        assert_eq!(plan.suggestions.len(), 2);
        assert!(plan.suggestions[0].conflict);
        assert!(!plan.suggestions[1].conflict);
    }

    #[test]
    fn plan_lot_rejects_out_of_range_minutes() {
        let base = LotParams {
            date: monday(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            duration_minutes: 30,
            interval_minutes: 0,
        };
        for params in [
            LotParams { duration_minutes: 0, ..base.clone() },
            LotParams { duration_minutes: i64::MAX, ..base.clone() },
            LotParams { interval_minutes: -5, ..base.clone() },
            LotParams { interval_minutes: i64::MAX / 2, ..base.clone() },
        ] {
            let err = plan_lot(&params, &candidates(2), brt()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{:?}", params);
        }
    }

    #[test]
    fn plan_lot_accepts_day_long_slots() {
        let params = LotParams {
            date: monday(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            duration_minutes: MAX_SLOT_MINUTES,
            interval_minutes: MAX_SLOT_MINUTES,
        };
        let rows = plan_lot(&params, &candidates(3), brt()).unwrap();
        assert_eq!(rows[2].start_at - rows[0].start_at, Duration::days(4));
        assert_eq!(rows[2].end_at - rows[2].start_at, Duration::days(1));
    }

    #[test]
    fn plan_lot_rejects_dates_at_calendar_edges() {
        for date in [NaiveDate::MAX, NaiveDate::MIN] {
            let params = LotParams {
                date,
                start_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
                duration_minutes: 30,
                interval_minutes: 0,
            };
            let err = plan_lot(&params, &candidates(1), brt()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn blocks_reject_out_of_range_inputs() {
        let base = BlockRequest {
            avg_minutes_per_laudo: 60,
            backlog: 4,
            min_buffer_minutes: 45,
            preferred_windows: vec![],
        };
        for request in [
            BlockRequest { avg_minutes_per_laudo: i64::MAX, ..base.clone() },
            BlockRequest { backlog: i64::MAX, ..base.clone() },
            BlockRequest { backlog: -1, ..base.clone() },
            BlockRequest { min_buffer_minutes: i64::MAX, ..base.clone() },
            BlockRequest { min_buffer_minutes: -30, ..base.clone() },
        ] {
            let err = suggest_laudo_blocks(monday(), &request, &[], brt()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{:?}", request);
        }
        let err = suggest_laudo_blocks(NaiveDate::MAX, &base, &[], brt()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blocks_cap_the_number_of_suggestions() {
        // 1440 * 10000 / 30 would be 480000 blocks
        let request = BlockRequest {
            avg_minutes_per_laudo: MAX_SLOT_MINUTES,
            backlog: MAX_BACKLOG,
            min_buffer_minutes: 0,
            preferred_windows: vec![],
        };
        let err = suggest_laudo_blocks(monday(), &request, &[], brt()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let within = BlockRequest {
            avg_minutes_per_laudo: 30,
            backlog: MAX_SUGGESTED_BLOCKS,
            ..request
        };
        let plan = suggest_laudo_blocks(monday(), &within, &[], brt()).unwrap();
        assert_eq!(plan.suggestions.len() as i64, MAX_SUGGESTED_BLOCKS);
    }

    #[test]
    fn cancelled_events_still_count_toward_workload_and_blocks() {
        let mut cancelled = event_at(monday(), 14, 0, Some(60));
        cancelled.status = EventStatus::Cancelada;

        let week = weekly_workload(monday(), std::slice::from_ref(&cancelled), brt());
        assert_eq!(week.days[0].allocated_minutes, 60);

        let request = BlockRequest {
            avg_minutes_per_laudo: 30,
            backlog: 1,
            min_buffer_minutes: 30,
            preferred_windows: vec![],
        };
        let plan = suggest_laudo_blocks(monday(), &request, &[cancelled], brt()).unwrap();
        assert!(plan.suggestions[0].conflict);
    }

    #[test]
    fn long_running_event_conflicts_with_later_slot() {
        // starts two days before the lote and is still running
        let long = event_at(monday() - Duration::days(2), 8, 0, Some(3 * 24 * 60));
        let start = local_instant(monday(), NaiveTime::from_hms_opt(8, 0, 0).unwrap(), brt());
        let slots = vec![PlannedSlot::new(0, None, start, None)];

        let conflicts = detect_conflicts(&slots, &HashSet::new(), &[long.clone()]);
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(
            &conflicts[0].kind,
            ConflictKind::OverlapsEvent { event_id, .. } if *event_id == long.id
        ));
    }
}
