use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use crate::display::window::SeriesView;
use crate::error::PlotError;
use crate::types::Channel;

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    /// Z, X, Y in that order.
    pub palette: [RGBColor; 3],
    /// Caption, axis labels and legend. Needs a system font.
    pub labels: bool,
    pub caption: String,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 450,
            background: RGBColor(10, 10, 10),
            palette: [BLUE, RED, GREEN],
            labels: true,
            caption: "Acceleration".to_string(),
        }
    }
}

fn value_bounds(view: &SeriesView) -> (f64, f64) {
    let (lo, hi) = Channel::ALL
        .iter()
        .flat_map(|c| view.channel(*c).iter().map(|p| p.1))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Draw the three channels of `view` and return a PNG.
pub fn render_view_png(view: &SeriesView, style: &PlotStyle) -> Result<Vec<u8>, PlotError> {
    if view.is_empty() {
        return Err(PlotError::EmptyView);
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (y_min, y_max) = value_bounds(view);
        let x_min = view.start as f64;
        let x_max = (view.end as f64).max(x_min + 1.0);

        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.labels {
            builder
                .caption(&style.caption, ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 55)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        if style.labels {
            chart
                .configure_mesh()
                .light_line_style(WHITE.mix(0.1))
                .label_style(("sans-serif", 12).into_font().color(&WHITE))
                .x_desc("sample")
                .draw()?;
        }
        for (channel, color) in Channel::ALL.into_iter().zip(style.palette) {
            let points = view.channel(channel).iter().copied();
            let drawn = chart.draw_series(LineSeries::new(points, &color))?;
            if style.labels {
                drawn
                    .label(channel.label())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }
        if style.labels {
            chart
                .configure_series_labels()
                .border_style(WHITE.mix(0.2))
                .background_style(style.background)
                .label_font(("sans-serif", 12).into_font().color(&WHITE))
                .draw()?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PlotError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| PlotError::Render("image buffer size mismatch".into()))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
