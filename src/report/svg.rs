//! Gantt-style SVG chart of release lines.
//!
//! Each version gets one row, newest on top, with up to three segments:
//! release testing (branch cut to first release, or to the last commit while
//! unreleased), released (first to last release) and unreleased maintenance
//! (last release to last commit).

use chrono::{DateTime, Datelike, Duration as TimeDelta, NaiveDate, Utc};
use std::fmt::{self, Write};

use crate::timeline::BranchRecord;

const PATCH_COLOR: &str = "#ff4444";
const GRID_COLOR: &str = "#d0d0d0";
const TEXT_COLOR: &str = "#444";
const DATE_COLOR: &str = "#666";

/// Bars longer than this carry their day count inside
const LABEL_INSIDE_MIN_DAYS: i64 = 25;
/// Bars shorter than this get their start date to the left
const DATE_OUTSIDE_MAX_DAYS: i64 = 20;
const PADDING_DAYS: i64 = 15;
const TICK_MONTHS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgLayout {
    pub width: f64,
    pub label_width: f64,
    pub right_margin: f64,
    pub top_margin: f64,
    pub row_height: f64,
    pub bar_height: f64,
    pub axis_height: f64,
    pub legend_height: f64,
}

impl Default for SvgLayout {
    fn default() -> Self {
        Self {
            width: 1500.0,
            label_width: 90.0,
            right_margin: 60.0,
            top_margin: 40.0,
            row_height: 44.0,
            bar_height: 24.0,
            axis_height: 70.0,
            legend_height: 40.0,
        }
    }
}

impl SvgLayout {
    fn plot_width(&self) -> f64 {
        (self.width - self.label_width - self.right_margin).max(1.0)
    }

    fn height(&self, rows: usize) -> f64 {
        self.top_margin + self.row_height * rows as f64 + self.axis_height + self.legend_height
    }

    fn row_center(&self, row: usize) -> f64 {
        self.top_margin + self.row_height * (row as f64 + 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    ReleaseTesting,
    Released,
    Unreleased,
}

impl Segment {
    const ALL: [Segment; 3] = [Segment::ReleaseTesting, Segment::Released, Segment::Unreleased];

    fn color(self) -> &'static str {
        match self {
            Segment::ReleaseTesting => "#b3b3b3",
            Segment::Released => "#26c06f",
            Segment::Unreleased => "#e67e22",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Segment::ReleaseTesting => "Release Testing",
            Segment::Released => "Released",
            Segment::Unreleased => "Unreleased",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bar {
    segment: Segment,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    estimated: bool,
}

impl Bar {
    fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Bars for one record; none at all without a creation date
fn bars(record: &BranchRecord) -> Vec<Bar> {
    let Some(creation) = record.branch_creation else {
        return Vec::new();
    };

    let testing_end = record.first_release.or(record.last_commit);
    let spans = [
        (Segment::ReleaseTesting, Some(creation.at()), testing_end),
        (Segment::Released, record.first_release, record.last_release),
        (Segment::Unreleased, record.last_release, record.last_commit),
    ];

    spans
        .into_iter()
        .filter_map(|(segment, start, end)| {
            let (start, end) = (start?, end?);
            (end >= start).then_some(Bar {
                segment,
                start,
                end,
                estimated: segment == Segment::ReleaseTesting && creation.is_estimated(),
            })
        })
        .collect()
}

/// Formal releases after `.0`, with their `.N` label when numeric
fn patch_markers(record: &BranchRecord) -> Vec<(DateTime<Utc>, Option<&str>)> {
    if record.branch_creation.is_none() {
        return Vec::new();
    }
    record
        .formal_releases
        .iter()
        .filter(|r| !r.tag_name.ends_with(".0"))
        .map(|r| (r.created_at, r.patch_label()))
        .collect()
}

/// Maps instants onto the horizontal plot area
struct TimeScale {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    x0: f64,
    width: f64,
}

impl TimeScale {
    fn fit(records: &[BranchRecord], layout: &SvgLayout) -> Option<Self> {
        let dates: Vec<DateTime<Utc>> = records
            .iter()
            .flat_map(|record| {
                let bar_dates = bars(record).into_iter().flat_map(|b| [b.start, b.end]);
                let patch_dates = patch_markers(record).into_iter().map(|(at, _)| at);
                bar_dates.chain(patch_dates).collect::<Vec<_>>()
            })
            .collect();

        let min = dates.iter().min()?;
        let max = dates.iter().max()?;
        let padding = TimeDelta::days(PADDING_DAYS);
        Some(Self {
            start: *min - padding,
            end: *max + padding,
            x0: layout.label_width,
            width: layout.plot_width(),
        })
    }

    fn x(&self, at: DateTime<Utc>) -> f64 {
        let total = (self.end - self.start).num_seconds().max(1) as f64;
        let offset = (at - self.start).num_seconds() as f64;
        self.x0 + offset / total * self.width
    }

    /// First day of every other month (Jan, Mar, ...) inside the range
    fn ticks(&self) -> Vec<NaiveDate> {
        let mut ticks = Vec::new();
        let (mut year, mut month) = (self.start.year(), self.start.month());
        if month % TICK_MONTHS == 0 {
            month += 1;
        }
        loop {
            if month > 12 {
                year += 1;
                month -= 12;
            }
            let Some(tick) = NaiveDate::from_ymd_opt(year, month, 1) else {
                break;
            };
            let Some(at) = tick.and_hms_opt(0, 0, 0).map(|t| t.and_utc()) else {
                break;
            };
            if at > self.end {
                break;
            }
            if at >= self.start {
                ticks.push(tick);
            }
            month += TICK_MONTHS;
        }
        ticks
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `records` (ascending by version) as a standalone SVG document
pub fn render_svg(records: &[BranchRecord], layout: &SvgLayout) -> Result<String, fmt::Error> {
    let mut svg = String::new();
    let height = layout.height(records.len());
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Helvetica, Arial, sans-serif">"#,
        w = layout.width,
        h = height,
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

    match TimeScale::fit(records, layout) {
        Some(scale) => {
            draw_axis(&mut svg, &scale, layout, records.len())?;
            for (row, record) in records.iter().rev().enumerate() {
                draw_row(&mut svg, &scale, layout, row, record)?;
            }
        }
        None => {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="12" fill="{TEXT_COLOR}">No release data</text>"#,
                layout.label_width,
                layout.top_margin,
            )?;
            for (row, record) in records.iter().rev().enumerate() {
                draw_row_label(&mut svg, layout, row, record)?;
            }
        }
    }

    draw_legend(&mut svg, layout, records.len())?;
    writeln!(svg, "</svg>")?;
    Ok(svg)
}

fn draw_axis(svg: &mut String, scale: &TimeScale, layout: &SvgLayout, rows: usize) -> fmt::Result {
    let top = layout.top_margin;
    let bottom = top + layout.row_height * rows as f64;
    for tick in scale.ticks() {
        let Some(at) = tick.and_hms_opt(0, 0, 0).map(|t| t.and_utc()) else {
            continue;
        };
        let x = scale.x(at);
        writeln!(
            svg,
            r#"<line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="{GRID_COLOR}" stroke-width="0.5" stroke-dasharray="4 3"/>"#
        )?;
        let label_y = bottom + 14.0;
        writeln!(
            svg,
            r#"<text x="{x:.1}" y="{label_y:.1}" font-size="10" fill="{TEXT_COLOR}" text-anchor="end" transform="rotate(-45 {x:.1} {label_y:.1})">{}</text>"#,
            tick.format("%Y-%m"),
        )?;
    }
    Ok(())
}

fn draw_row_label(svg: &mut String, layout: &SvgLayout, row: usize, record: &BranchRecord) -> fmt::Result {
    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="12" fill="{TEXT_COLOR}" text-anchor="end" dominant-baseline="middle">v{}</text>"#,
        layout.label_width - 10.0,
        layout.row_center(row),
        escape(&record.version().to_string()),
    )
}

fn draw_row(
    svg: &mut String,
    scale: &TimeScale,
    layout: &SvgLayout,
    row: usize,
    record: &BranchRecord,
) -> fmt::Result {
    draw_row_label(svg, layout, row, record)?;

    let center = layout.row_center(row);
    let bar_top = center - layout.bar_height / 2.0;
    let bar_bottom = center + layout.bar_height / 2.0;

    for bar in bars(record) {
        let x1 = scale.x(bar.start);
        let x2 = scale.x(bar.end);
        let width = (x2 - x1).max(1.0);
        let days = bar.days();

        let outline = if bar.estimated {
            format!(r#" fill-opacity="0.5" stroke="{}" stroke-dasharray="4 2""#, DATE_COLOR)
        } else {
            String::new()
        };
        writeln!(
            svg,
            r#"<rect x="{x1:.1}" y="{bar_top:.1}" width="{width:.1}" height="{:.1}" fill="{}"{outline}/>"#,
            layout.bar_height,
            bar.segment.color(),
        )?;

        if days > LABEL_INSIDE_MIN_DAYS {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{center:.1}" font-size="10" fill="{TEXT_COLOR}" text-anchor="middle" dominant-baseline="middle">{days}d</text>"#,
                x1 + width / 2.0,
            )?;
        } else {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{center:.1}" font-size="10" fill="{TEXT_COLOR}" text-anchor="start" dominant-baseline="middle">{days}d</text>"#,
                x1 + width + 3.0,
            )?;
        }

        let (date_x, anchor) = if days < DATE_OUTSIDE_MAX_DAYS {
            (x1 - 2.0, "end")
        } else {
            (x1 + 2.0, "start")
        };
        writeln!(
            svg,
            r#"<text x="{date_x:.1}" y="{:.1}" font-size="8" fill="{DATE_COLOR}" text-anchor="{anchor}">{}</text>"#,
            bar_top - 3.0,
            bar.start.format("%Y-%m-%d"),
        )?;
    }

    for (at, label) in patch_markers(record) {
        let x = scale.x(at);
        writeln!(
            svg,
            r#"<circle cx="{x:.1}" cy="{center:.1}" r="3" fill="{PATCH_COLOR}"/>"#
        )?;
        if let Some(patch) = label {
            writeln!(
                svg,
                r#"<text x="{x:.1}" y="{:.1}" font-size="8" font-weight="bold" fill="{PATCH_COLOR}" text-anchor="middle">.{}</text>"#,
                bar_bottom + 10.0,
                escape(patch),
            )?;
        }
    }
    Ok(())
}

fn draw_legend(svg: &mut String, layout: &SvgLayout, rows: usize) -> fmt::Result {
    let y = layout.top_margin + layout.row_height * rows as f64 + layout.axis_height + 10.0;
    let mut x = layout.label_width + layout.plot_width() / 2.0 - 260.0;

    for segment in Segment::ALL {
        writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{y:.1}" width="14" height="14" fill="{}"/>"#,
            segment.color()
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" fill="{TEXT_COLOR}">{}</text>"#,
            x + 20.0,
            y + 11.0,
            segment.label()
        )?;
        x += 130.0;
    }

    writeln!(
        svg,
        r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{PATCH_COLOR}"/>"#,
        x + 7.0,
        y + 7.0
    )?;
    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="11" fill="{TEXT_COLOR}">Patch Versions</text>"#,
        x + 20.0,
        y + 11.0
    )
}
