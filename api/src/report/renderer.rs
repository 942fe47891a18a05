//! Weekly agenda report renderer
//!
//! Renders a [`WeeklyWorkload`] as a plain-text report, one line per day,
//! optionally followed by the day's events.

use std::fmt::Write;

use chrono::SecondsFormat;
use serde::Deserialize;

use crate::app::scheduling::WeeklyWorkload;

/// How much detail the weekly report carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    #[default]
    Compacto,
    Detalhado,
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportMode::Compacto => write!(f, "compacto"),
            ReportMode::Detalhado => write!(f, "detalhado"),
        }
    }
}

/// Render the weekly report
pub fn render_weekly_report(week: &WeeklyWorkload, mode: ReportMode) -> String {
    let mut buf = String::new();

    // writeln! into a String cannot fail
    let _ = writeln!(buf, "Agenda semanal ({} a {})", week.week_start, week.week_end);
    let _ = writeln!(buf, "Modo: {}", mode);
    let _ = writeln!(
        buf,
        "Total semana: {} min de {} min ({}%)",
        week.allocated_minutes, week.work_window_minutes, week.utilization
    );
    let _ = writeln!(buf, "Conflitos: {}", week.conflicts);
    buf.push('\n');

    for day in &week.days {
        let _ = writeln!(
            buf,
            "{} | {}/{} min | uso {}% | conflitos {}",
            day.date, day.allocated_minutes, day.work_window_minutes, day.utilization, day.conflicts
        );
        if mode == ReportMode::Detalhado {
            for event in &day.events {
                let _ = writeln!(
                    buf,
                    "  - {} [{}] {} -> {}",
                    event.title,
                    event.event_type,
                    event.start_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                    event
                        .effective_end()
                        .to_rfc3339_opts(SecondsFormat::Millis, true)
                );
            }
        }
    }

    buf
}
