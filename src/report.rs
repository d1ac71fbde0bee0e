//! Human-readable rendering of an [`Analysis`].

use crate::analyzer::{Analysis, ApplyTo};
use crate::stats::Triple;
use std::fmt::Write as _;

/// Format every section of the analysis as plain text.
pub fn render(analysis: &Analysis) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, analysis);
    out
}

fn write_report(out: &mut String, ana: &Analysis) -> std::fmt::Result {
    let sizes = ana.sample_sizes;
    writeln!(
        out,
        "intervention at position {} ({} observations: {} before, {} after)",
        ana.cut, sizes.overall, sizes.before, sizes.after
    )?;
    writeln!(out)?;

    writeln!(out, "#means:")?;
    writeln!(out, "#{:<15} {:>14} {:>14} {:>14}", "", "overall", "before", "after")?;
    write_triple(out, "series", &ana.means.series)?;
    write_triple(out, "control_series", &ana.means.control_series)?;
    write_triple(out, "difference", &ana.difference_means)?;
    writeln!(out)?;

    writeln!(out, "#stds:")?;
    writeln!(out, "#{:<15} {:>14} {:>14} {:>14}", "", "overall", "before", "after")?;
    write_triple(out, "series", &ana.stds.series)?;
    write_triple(out, "control_series", &ana.stds.control_series)?;
    write_triple(out, "difference", &ana.difference_stds)?;
    writeln!(out)?;

    let variance = if ana.equal_var { "pooled" } else { "welch" };
    writeln!(
        out,
        "#t-tests (after vs. before, {variance} variance, {}):",
        ana.alternative
    )?;
    let level = ana.ttest_series.confidence_level * 100.0;
    writeln!(
        out,
        "#{:<15} {:>14} {:>14} {:>14} {:>14}",
        "",
        "statistic",
        "p-value",
        format!("{level:.0}% ci low"),
        format!("{level:.0}% ci high")
    )?;
    for apply_to in ApplyTo::ALL {
        let res = ana.ttest(apply_to);
        writeln!(
            out,
            " {:<15} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
            apply_to.to_string(),
            res.statistic,
            res.p_value,
            res.confidence_interval.0,
            res.confidence_interval.1
        )?;
    }

    if let Some(table) = &ana.ancova {
        writeln!(out)?;
        writeln!(out, "#ancova:")?;
        writeln!(
            out,
            "#{:<15} {:>14} {:>6} {:>14} {:>14} {:>14}",
            "source",
            "ss",
            "df",
            "f",
            "p-unc",
            table.effect_size.to_string()
        )?;
        for row in &table.rows {
            writeln!(
                out,
                " {:<15} {:>14.6} {:>6} {:>14.6} {:>14.6e} {:>14.6}",
                row.source, row.ss, row.df, row.f, row.p_unc, row.effect_size
            )?;
        }
    }

    Ok(())
}

fn write_triple(out: &mut String, name: &str, triple: &Triple) -> std::fmt::Result {
    writeln!(
        out,
        " {:<15} {:>14.6} {:>14.6} {:>14.6}",
        name, triple.overall, triple.before, triple.after
    )
}
