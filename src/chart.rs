use std::{io, path::Path};

use plotters::prelude::*;

use crate::stats::{MentionCount, PeriodRow};

const BAR_WIDTH: u32 = 40;
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

/// Per-date listing, one line per date.
pub fn render_counts(counts: &[MentionCount], out: &mut impl io::Write) -> io::Result<()> {
    if counts.is_empty() {
        return writeln!(out, "No post with a usable date was collected.");
    }

    writeln!(out, "{:<10}  {:>8}", "date", "mentions")?;
    for count in counts {
        writeln!(out, "{}  {:>8}", count.date.format("%Y-%m-%d"), count.mentions)?;
    }
    Ok(())
}

/// Horizontal bar chart on the terminal, one bar per period.
pub fn render_text(rows: &[PeriodRow], title: &str, out: &mut impl io::Write) -> io::Result<()> {
    let Some(max) = rows.iter().map(|r| r.mentions).max() else {
        return writeln!(out, "Nothing to plot.");
    };

    writeln!(out, "{title}")?;
    writeln!(out, "Period")?;
    for row in rows {
        let width = bar_width(row.mentions, max);
        writeln!(
            out,
            "{:>7} │{} {}",
            row.label(),
            "█".repeat(width as usize),
            row.mentions
        )?;
    }
    writeln!(out, "{:>7} └{}", "", "─".repeat(BAR_WIDTH as usize + 1))?;
    writeln!(out, "{:>9}Mentions (max {max})", "")
}

fn bar_width(mentions: u32, max: u32) -> u32 {
    if mentions == 0 || max == 0 {
        0
    } else {
        (mentions * BAR_WIDTH).div_ceil(max)
    }
}

/// Vertical bar chart written to an SVG file.
pub fn render_svg(rows: &[PeriodRow], title: &str, path: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(!rows.is_empty(), "nothing to plot");

    let labels = rows.iter().map(PeriodRow::label).collect::<Vec<_>>();
    let top = rows.iter().map(|r| r.mentions).max().unwrap_or(0);

    let root = SVGBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..rows.len() as u32).into_segmented(), 0u32..top + top / 10 + 1)?;

    let period = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rows.len())
        .x_label_formatter(&period)
        .x_desc("Period")
        .y_desc("Mentions")
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(SKY_BLUE.filled())
            .margin(12)
            .data(rows.iter().enumerate().map(|(i, r)| (i as u32, r.mentions))),
    )?;

    root.present()?;
    tracing::info!(target: "chart", "chart written to {}", path.display());
    Ok(())
}
