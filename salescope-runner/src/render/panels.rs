//! Reusable chart panels drawn onto a sub-area of an SVG figure.

use plotters::coord::combinators::IntoLogRange;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use salescope_core::stats::Histogram;

use crate::aggregator::CategoryBar;
use crate::report::truncate_chars;

pub(super) type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
pub(super) type DrawResult = Result<(), Box<dyn std::error::Error>>;

pub(super) const FONT: &str = "sans-serif";
pub(super) const TITLE_SIZE: i32 = 22;

pub(super) const PRICE_COLOR: RGBColor = RGBColor(52, 101, 164);
pub(super) const RATING_COLOR: RGBColor = RGBColor(230, 126, 34);

const BAR_LABEL_CHARS: usize = 40;

/// Panel title and axis descriptions.
pub(super) struct Labels<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

/// Maps a value onto [0, 1] for colouring scatter points.
pub(super) struct ColorScale {
    lo: f64,
    hi: f64,
    log: bool,
}

impl ColorScale {
    pub fn linear(lo: f64, hi: f64) -> Self {
        Self { lo, hi, log: false }
    }

    /// Log scale over the positive values seen; prices are heavily skewed.
    pub fn log_of(values: impl Iterator<Item = f64>) -> Self {
        let (lo, hi) = values
            .filter(|v| *v > 0.0)
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if lo.is_finite() {
            Self {
                lo: lo.ln(),
                hi: hi.ln(),
                log: true,
            }
        } else {
            Self::linear(0.0, 1.0)
        }
    }

    pub fn position(&self, value: f64) -> f64 {
        let v = if self.log { value.max(f64::MIN_POSITIVE).ln() } else { value };
        if self.hi <= self.lo {
            return 0.5;
        }
        ((v - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0)
    }
}

/// Blue (low) to red (high).
pub(super) fn heat(position: f64) -> HSLColor {
    HSLColor(0.66 * (1.0 - position.clamp(0.0, 1.0)), 0.8, 0.5)
}

/// Title plus a "no data" note, for panels whose series is empty.
pub(super) fn empty_panel(area: &Area<'_>, title: &str) -> DrawResult {
    let inner = area.titled(title, (FONT, TITLE_SIZE))?;
    let (w, h) = inner.dim_in_pixel();
    inner.draw(&Text::new(
        "no data",
        (w as i32 / 2, h as i32 / 2),
        (FONT, 16).into_font(),
    ))?;
    Ok(())
}

/// Vertical-bar histogram.
pub(super) fn histogram(
    area: &Area<'_>,
    hist: &Histogram,
    labels: &Labels<'_>,
    color: RGBColor,
) -> DrawResult {
    let (Some(first), Some(last)) = (hist.bins.first(), hist.bins.last()) else {
        return empty_panel(area, labels.title);
    };
    let y_max = hist.max_count().max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(labels.title, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(first.lower..last.upper, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(labels.x_desc)
        .y_desc(labels.y_desc)
        .y_label_formatter(&|v: &f64| format!("{v:.0}"))
        .draw()?;

    let filled = hist.bins.iter().filter(|b| b.count > 0);
    chart.draw_series(filled.clone().map(|b| {
        Rectangle::new(
            [(b.lower, 0.0), (b.upper, b.count as f64)],
            color.mix(0.75).filled(),
        )
    }))?;
    chart.draw_series(filled.map(|b| {
        Rectangle::new(
            [(b.lower, 0.0), (b.upper, b.count as f64)],
            BLACK.stroke_width(1),
        )
    }))?;
    Ok(())
}

/// Vertical-bar histogram on a log x-axis; bucket edges must be positive.
pub(super) fn log_histogram(
    area: &Area<'_>,
    hist: &Histogram,
    labels: &Labels<'_>,
    color: RGBColor,
) -> DrawResult {
    let (Some(first), Some(last)) = (hist.bins.first(), hist.bins.last()) else {
        return empty_panel(area, labels.title);
    };
    if first.lower <= 0.0 {
        return Err(format!("log axis needs positive edges, got {}", first.lower).into());
    }
    let y_max = hist.max_count().max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(labels.title, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d((first.lower..last.upper).log_scale(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(labels.x_desc)
        .y_desc(labels.y_desc)
        .x_label_formatter(&|v: &f64| format!("{v:.0}"))
        .y_label_formatter(&|v: &f64| format!("{v:.0}"))
        .draw()?;

    let filled = hist.bins.iter().filter(|b| b.count > 0);
    chart.draw_series(filled.clone().map(|b| {
        Rectangle::new(
            [(b.lower, 0.0), (b.upper, b.count as f64)],
            color.mix(0.75).filled(),
        )
    }))?;
    chart.draw_series(filled.map(|b| {
        Rectangle::new(
            [(b.lower, 0.0), (b.upper, b.count as f64)],
            BLACK.stroke_width(1),
        )
    }))?;
    Ok(())
}

/// Horizontal bars, first entry on top, each labelled with its name and
/// formatted value.
pub(super) fn horizontal_bars(
    area: &Area<'_>,
    bars: &[CategoryBar],
    labels: &Labels<'_>,
    value_label: &dyn Fn(f64) -> String,
) -> DrawResult {
    if bars.is_empty() {
        return empty_panel(area, labels.title);
    }
    let n = bars.len();
    let lo = bars.iter().map(|b| b.value).fold(0.0_f64, f64::min);
    let hi = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    // Right-hand room for the text labels.
    let x_range = (lo - span * 0.02)..(hi + span * 0.75);

    let mut chart = ChartBuilder::on(area)
        .caption(labels.title, (FONT, TITLE_SIZE))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(x_range, -0.6f64..(n as f64 - 0.4))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .x_desc(labels.x_desc)
        .draw()?;

    let row = |i: usize| (n - 1 - i) as f64;

    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let y = row(i);
        Rectangle::new(
            [(0.0, y - 0.35), (bar.value, y + 0.35)],
            Palette99::pick(i).mix(0.8).filled(),
        )
    }))?;

    let text_style = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        Text::new(
            format!(
                "{}  {}",
                truncate_chars(&bar.label, BAR_LABEL_CHARS),
                value_label(bar.value)
            ),
            (bar.value.max(0.0) + span * 0.01, row(i)),
            text_style.clone(),
        )
    }))?;
    Ok(())
}
