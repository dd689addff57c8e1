use std::{fs, path::Path};

use common::{
    BreakdownError,
    config::Config,
    plot::Plot,
    stage::{RestoreBreakdown, Stage},
    util::max_finite,
};
use eyre::{Result, bail};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_backend::DrawingBackend;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_Y_LABEL: &str = "Breakdown for restore duration (sec)";

/// Fill color per stage, indexed like [`Stage::ALL`]
pub const STAGE_COLORS: [RGBColor; 4] = [
    RGBColor(32, 32, 32),
    RGBColor(192, 192, 192),
    RGBColor(64, 64, 64),
    RGBColor(128, 128, 128),
];

/// Bar offsets from the category centre, in bar widths
const STAGE_OFFSETS: [f64; 4] = [-1.5, -0.5, 0.5, 1.5];

/// Grouped bar chart, one category per condition and one bar per stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownBars {
    pub x_label: String,
    #[serde(default = "default_y_label")]
    pub y_label: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Defaults to `<name>_breakdown.png`
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default = "default_inches")]
    pub width_in: f64,
    #[serde(default = "default_inches")]
    pub height_in: f64,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Width of a single bar, in category units
    #[serde(default = "default_bar_width")]
    pub bar_width: f64,
}

fn default_y_label() -> String {
    DEFAULT_Y_LABEL.to_owned()
}

fn default_inches() -> f64 {
    7.0
}

fn default_dpi() -> u32 {
    96
}

fn default_bar_width() -> f64 {
    0.2
}

impl Default for BreakdownBars {
    fn default() -> Self {
        Self {
            x_label: String::new(),
            y_label: default_y_label(),
            title: None,
            filename: None,
            width_in: default_inches(),
            height_in: default_inches(),
            dpi: default_dpi(),
            bar_width: default_bar_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub stage: Stage,
    pub condition: usize,
    pub x0: f64,
    pub x1: f64,
    pub height: f64,
}

/// Places every stage mean of every condition on the categorical x axis.
///
/// Condition `i` occupies the slot `i - 0.5 .. i + 0.5`.
pub fn bar_layout(
    breakdowns: &[RestoreBreakdown],
    bar_width: f64,
) -> Result<Vec<Bar>, BreakdownError> {
    if !bar_width.is_finite() || bar_width <= 0.0 {
        return Err(BreakdownError::Render(format!(
            "bar width must be positive, got {bar_width}"
        )));
    }
    if bar_width * STAGE_OFFSETS.len() as f64 > 1.0 {
        return Err(BreakdownError::Render(format!(
            "{} bars of width {bar_width} do not fit in one category",
            STAGE_OFFSETS.len()
        )));
    }

    let mut bars = Vec::with_capacity(breakdowns.len() * Stage::ALL.len());
    for (stage, offset) in Stage::ALL.into_iter().zip(STAGE_OFFSETS) {
        for (condition, breakdown) in breakdowns.iter().enumerate() {
            let centre = condition as f64 + offset * bar_width;
            bars.push(Bar {
                stage,
                condition,
                x0: centre - bar_width / 2.0,
                x1: centre + bar_width / 2.0,
                height: breakdown.mean(stage),
            });
        }
    }
    Ok(bars)
}

#[typetag::serde]
impl Plot for BreakdownBars {
    fn name(&self) -> &'static str {
        "BreakdownBars"
    }

    fn plot(
        &self,
        config: &Config,
        breakdowns: &[RestoreBreakdown],
        plot_path: &Path,
    ) -> Result<()> {
        if breakdowns.is_empty() {
            bail!("Nothing to plot for {}", config.name);
        }
        let filename = self
            .filename
            .clone()
            .unwrap_or_else(|| format!("{}_breakdown.png", config.name));
        let filepath = plot_path.join(filename);
        self.render(&filepath, breakdowns)?;
        info!("Wrote {filepath:?}");
        Ok(())
    }
}

impl BreakdownBars {
    pub fn pixel_size(&self) -> Result<(u32, u32), BreakdownError> {
        let to_px = |inches: f64| -> Result<u32, BreakdownError> {
            let px = (inches * self.dpi as f64).round();
            if !px.is_finite() || px < 1.0 || px > u32::MAX as f64 {
                return Err(BreakdownError::Render(format!(
                    "invalid image size {inches}in at {} dpi",
                    self.dpi
                )));
            }
            Ok(px as u32)
        };
        Ok((to_px(self.width_in)?, to_px(self.height_in)?))
    }

    /// Draws the chart in memory and writes `filepath` only once every draw call succeeded
    pub fn render(
        &self,
        filepath: &Path,
        breakdowns: &[RestoreBreakdown],
    ) -> Result<(), BreakdownError> {
        self.render_with(filepath, |plot, pixels, size| {
            plot.draw(BitMapBackend::with_buffer(pixels, size), breakdowns)
        })
    }

    fn render_with<F>(&self, filepath: &Path, draw: F) -> Result<(), BreakdownError>
    where
        F: FnOnce(&Self, &mut [u8], (u32, u32)) -> Result<(), BreakdownError>,
    {
        let size = self.pixel_size()?;
        let mut pixels = vec![0u8; size.0 as usize * size.1 as usize * 3];
        draw(self, &mut pixels, size)?;
        write_png(filepath, &pixels, size)
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        backend: DB,
        breakdowns: &[RestoreBreakdown],
    ) -> Result<(), BreakdownError> {
        let bars = bar_layout(breakdowns, self.bar_width)?;
        let names = breakdowns
            .iter()
            .map(|b| b.condition.as_str())
            .collect::<Vec<_>>();
        let y_max = (max_finite(bars.iter().map(|b| b.height)).unwrap_or(0.0) * 1.1).max(1.0);
        debug!(
            "Rendering {} bars at {:?}, y up to {y_max:.2}",
            bars.len(),
            backend.get_size()
        );

        let root = backend.into_drawing_area();
        root.fill(&WHITE).map_err(BreakdownError::render)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(10).x_label_area_size(50).y_label_area_size(60);
        if let Some(title) = &self.title {
            builder.caption(title, ("sans-serif", 20));
        }

        let mut chart = builder
            .build_cartesian_2d(-0.5..names.len() as f64 - 0.5, 0f64..y_max)
            .map_err(BreakdownError::render)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_label_formatter(&|_| String::new())
            .y_label_formatter(&|y| format!("{y:.1}"))
            .draw()
            .map_err(BreakdownError::render)?;

        // category names under the centre of each bar group
        let label_style = ("sans-serif", 15)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (idx, name) in names.iter().enumerate() {
            let (x, y) = chart.plotting_area().map_coordinate(&(idx as f64, 0.0));
            root.draw(&Text::new(*name, (x, y + 6), label_style.clone()))
                .map_err(BreakdownError::render)?;
        }

        for (stage, color) in Stage::ALL.into_iter().zip(STAGE_COLORS) {
            chart
                .draw_series(bars.iter().filter(|b| b.stage == stage).map(|b| {
                    Rectangle::new([(b.x0, 0.0), (b.x1, b.height)], color.filled())
                }))
                .map_err(BreakdownError::render)?
                .label(stage.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(BreakdownError::render)?;

        root.present().map_err(BreakdownError::render)?;
        Ok(())
    }
}

/// Encodes an RGB buffer as PNG and writes it in one go
pub fn write_png(filepath: &Path, pixels: &[u8], (width, height): (u32, u32)) -> Result<(), BreakdownError> {
    let mut encoded = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut encoded, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(BreakdownError::render)?;
        writer
            .write_image_data(pixels)
            .map_err(BreakdownError::render)?;
        writer.finish().map_err(BreakdownError::render)?;
    }
    fs::write(filepath, encoded).map_err(|source| BreakdownError::Io {
        path: filepath.to_path_buf(),
        source,
    })
}
