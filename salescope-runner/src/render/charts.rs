//! Layouts of the three figures.

use std::path::Path;

use plotters::coord::combinators::IntoLogRange;
use plotters::prelude::*;

use super::panels::{
    self, heat, Area, ColorScale, DrawResult, Labels, FONT, PRICE_COLOR, RATING_COLOR,
};
use super::ChartStyle;
use crate::aggregator::{CategoryBar, ChartSeries};
use crate::report::{thousands, truncate_chars};

const SCATTER_TITLE_SIZE: i32 = 20;

/// Price histogram above the most expensive categories.
pub(super) fn price_analysis(path: &Path, series: &ChartSeries, style: &ChartStyle) -> DrawResult {
    let root = SVGBackend::new(path, (1400, 1100)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(480);
    let symbol = style.currency_symbol.as_str();

    let price_desc = format!("Price ({symbol}, log scale)");
    let hist_labels = Labels {
        title: "Price Distribution",
        x_desc: &price_desc,
        y_desc: "Number of Products",
    };
    match &series.price_histogram {
        Some(hist) => panels::log_histogram(&upper, hist, &hist_labels, PRICE_COLOR)?,
        None => panels::empty_panel(&upper, hist_labels.title)?,
    }

    let bars = &series.top_categories_by_price;
    let title = format!("Top {} Most Expensive Categories", bars.len());
    let avg_desc = format!("Average Price ({symbol})");
    panels::horizontal_bars(
        &lower,
        bars,
        &Labels {
            title: &title,
            x_desc: &avg_desc,
            y_desc: "",
        },
        &|v: f64| format!("{symbol}{v:.2}"),
    )?;

    root.present()?;
    Ok(())
}

/// Rating/review scatter and rating histogram above the most reviewed
/// products.
pub(super) fn rating_analysis(path: &Path, series: &ChartSeries, style: &ChartStyle) -> DrawResult {
    let root = SVGBackend::new(path, (1400, 1200)).into_drawing_area();
    root.fill(&WHITE)?;
    let (top, bottom) = root.split_vertically(560);
    let (left, right) = top.split_horizontally(700);

    rating_scatter(&left, series, style)?;
    panels::histogram(
        &right,
        &series.rating_histogram,
        &Labels {
            title: "Rating Distribution (rated products)",
            x_desc: "Rating",
            y_desc: "Number of Products",
        },
        RATING_COLOR,
    )?;

    let bars: Vec<CategoryBar> = series
        .top_reviewed
        .iter()
        .map(|p| CategoryBar {
            label: format!("{} ({:.1}★)", truncate_chars(&p.name, 30), p.rating),
            value: p.rating_count as f64,
        })
        .collect();
    let title = format!("Top {} Most Reviewed Products", bars.len());
    panels::horizontal_bars(
        &bottom,
        &bars,
        &Labels {
            title: &title,
            x_desc: "Number of Reviews",
            y_desc: "",
        },
        &|v: f64| thousands(v.max(0.0).round() as u64),
    )?;

    root.present()?;
    Ok(())
}

fn rating_scatter(area: &Area<'_>, series: &ChartSeries, style: &ChartStyle) -> DrawResult {
    let max_reviews = series
        .points
        .iter()
        .map(|p| p.rating_count)
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let price_scale = ColorScale::log_of(series.points.iter().map(|p| p.price));

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("Rating vs Reviews (colour: price in {})", style.currency_symbol),
            (FONT, SCATTER_TITLE_SIZE),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(75)
        .build_cartesian_2d(0f64..5.2, 0f64..max_reviews * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Rating")
        .y_desc("Number of Reviews")
        .y_label_formatter(&|v: &f64| thousands(v.max(0.0).round() as u64))
        .draw()?;

    chart.draw_series(series.points.iter().map(|p| {
        let size = 2 + (10.0 * p.rating_count as f64 / max_reviews).round() as i32;
        Circle::new(
            (p.rating, p.rating_count as f64),
            size,
            heat(price_scale.position(p.price)).mix(0.6).filled(),
        )
    }))?;
    Ok(())
}

/// Discount/price scatter above the most discounted categories.
pub(super) fn discount_analysis(path: &Path, series: &ChartSeries, style: &ChartStyle) -> DrawResult {
    let root = SVGBackend::new(path, (1400, 1100)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(520);

    discount_scatter(&upper, series, style)?;

    let bars = &series.top_categories_by_discount;
    let title = format!("Top {} Categories by Average Discount", bars.len());
    panels::horizontal_bars(
        &lower,
        bars,
        &Labels {
            title: &title,
            x_desc: "Average Discount (%)",
            y_desc: "",
        },
        &|v: f64| format!("{v:.1}%"),
    )?;

    root.present()?;
    Ok(())
}

fn discount_scatter(area: &Area<'_>, series: &ChartSeries, style: &ChartStyle) -> DrawResult {
    let (price_lo, price_hi) = series
        .points
        .iter()
        .map(|p| p.price)
        .filter(|p| *p > 0.0)
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), p| (lo.min(p), hi.max(p)));
    if !price_lo.is_finite() {
        return panels::empty_panel(area, "Discount vs Price");
    }
    let (disc_lo, disc_hi) = series
        .points
        .iter()
        .map(|p| p.discount_pct)
        .fold((0.0_f64, 0.0_f64), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let rating_scale = ColorScale::linear(0.0, 5.0);

    let mut chart = ChartBuilder::on(area)
        .caption("Discount vs Price (colour: rating)", (FONT, SCATTER_TITLE_SIZE))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(
            (price_lo * 0.8..price_hi * 1.25).log_scale(),
            (disc_lo - 5.0)..(disc_hi + 5.0),
        )?;

    chart
        .configure_mesh()
        .x_desc(format!("Price ({}, log scale)", style.currency_symbol))
        .y_desc("Discount (%)")
        .x_label_formatter(&|v: &f64| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(
        series
            .points
            .iter()
            .filter(|p| p.price > 0.0)
            .map(|p| {
                Circle::new(
                    (p.price, p.discount_pct),
                    4,
                    heat(rating_scale.position(p.rating)).mix(0.55).filled(),
                )
            }),
    )?;
    Ok(())
}
