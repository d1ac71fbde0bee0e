//! Line charts rendered as standalone SVG documents.

use std::{
    fmt::{self, Write as _},
    fs, io,
    path::Path,
};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 48.0;
const COLORS: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];
const SVG_NS: &str = "http://www.w3.org/2000/svg";
const FONT: &str = r#"font-family="sans-serif""#;
const MARKER_STROKE: &str = r#"stroke="gray" stroke-dasharray="4 4""#;

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub name: String,
    pub values: Vec<f64>,
}

/// Lines over a shared x axis with a vertical marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    title: String,
    x: Vec<f64>,
    marker: f64,
    lines: Vec<Line>,
}

impl Figure {
    pub fn new(title: &str, x: Vec<f64>, marker: f64) -> Self {
        Self {
            title: title.to_string(),
            x,
            marker,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, name: &str, values: Vec<f64>) -> Self {
        self.lines.push(Line {
            name: name.to_string(),
            values,
        });
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn marker(&self) -> f64 {
        self.marker
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_svg(&mut svg);
        svg
    }

    fn write_svg(&self, out: &mut String) -> fmt::Result {
        let (x_min, x_max) = bounds(self.x.iter().copied().chain([self.marker]));
        let (y_min, y_max) =
            bounds(self.lines.iter().flat_map(|line| line.values.iter().copied()));

        let plot_width = WIDTH - 2.0 * MARGIN;
        let plot_height = HEIGHT - 2.0 * MARGIN;
        let scale_x = |x: f64| MARGIN + (x - x_min) / (x_max - x_min) * plot_width;
        let scale_y = |y: f64| HEIGHT - MARGIN - (y - y_min) / (y_max - y_min) * plot_height;

        writeln!(
            out,
            r#"<svg xmlns="{SVG_NS}" width="{WIDTH}" height="{HEIGHT}" {view_box}>"#,
            view_box = format_args!(r#"viewBox="0 0 {WIDTH} {HEIGHT}""#)
        )?;
        writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" {FONT} font-size="16">{}</text>"#,
            WIDTH / 2.0,
            MARGIN / 2.0,
            escape(&self.title)
        )?;
        writeln!(
            out,
            r#"<path d="M{m} {m} L{m} {b} L{r} {b}" fill="none" stroke="black"/>"#,
            m = MARGIN,
            b = HEIGHT - MARGIN,
            r = WIDTH - MARGIN
        )?;
        for (label, y) in [(y_min, HEIGHT - MARGIN), (y_max, MARGIN)] {
            writeln!(
                out,
                r#"<text x="{}" y="{y}" text-anchor="end" {FONT} font-size="10">{label:.3}</text>"#,
                MARGIN - 4.0
            )?;
        }

        for (i_line, line) in self.lines.iter().enumerate() {
            let color = COLORS[i_line % COLORS.len()];
            let points: Vec<String> = self
                .x
                .iter()
                .zip(&line.values)
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|(&x, &y)| format!("{:.2},{:.2}", scale_x(x), scale_y(y)))
                .collect();
            writeln!(
                out,
                r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="1.5"/>"#,
                points.join(" ")
            )?;
            let legend_y = MARGIN + 14.0 * i_line as f64;
            writeln!(
                out,
                r#"<text x="{}" y="{legend_y}" fill="{color}" {FONT} font-size="12">{}</text>"#,
                WIDTH - MARGIN - 120.0,
                escape(&line.name)
            )?;
        }

        let marker_x = scale_x(self.marker);
        writeln!(
            out,
            r#"<line x1="{marker_x:.2}" y1="{}" x2="{marker_x:.2}" y2="{}" {MARKER_STROKE}/>"#,
            MARGIN,
            HEIGHT - MARGIN
        )?;
        writeln!(out, "</svg>")
    }

    pub fn save<P: AsRef<Path>>(&self, file: P) -> io::Result<()> {
        fs::write(file, self.to_svg())
    }
}

/// Finite range of the values, widened when empty or flat.
fn bounds(vals: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = vals
        .filter(|val| val.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), val| {
            (min.min(val), max.max(val))
        });
    if min > max {
        (0.0, 1.0)
    } else if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
