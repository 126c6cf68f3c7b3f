//! Bar charts of 256 bin histograms.

use image::{Rgba, RgbaImage};

use crate::session::Histogram;

/// Chart width in pixels.
pub const CHART_WIDTH: u32 = 512;
/// Chart height in pixels.
pub const CHART_HEIGHT: u32 = 200;
/// Width of one bar.
pub const BAR_WIDTH: u32 = 2;
/// Bar colour, `#3498db`.
pub const BAR_COLOUR: Rgba<u8> = Rgba([0x34, 0x98, 0xdb, 0xff]);

/// One bar, anchored to the bottom of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Left edge
    pub x: u32,
    /// Height in pixels, between 0 and the chart height
    pub height: f64,
}

/// A histogram laid out on a 512x200 chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistogramChart {
    bars: Vec<Bar>,
}

impl HistogramChart {
    /// Lay out the bars. Bin `i` is drawn at `x = 2i` with a height
    /// proportional to its share of the largest bin. An empty or all-zero
    /// histogram has no bars.
    pub fn new(histogram: &Histogram) -> Self {
        let bins = histogram.bins();
        let max = bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return Self::default();
        }

        let bars = bins
            .iter()
            .zip((0..).step_by(BAR_WIDTH as usize))
            .map(|(&count, x)| Bar {
                x,
                height: count as f64 / max as f64 * f64::from(CHART_HEIGHT),
            })
            .collect();
        Self { bars }
    }

    /// The bars, left to right.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Whether nothing would be drawn.
    pub fn is_blank(&self) -> bool {
        self.bars.is_empty()
    }

    /// Paint the chart on a transparent canvas.
    pub fn to_image(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(CHART_WIDTH, CHART_HEIGHT);
        for bar in &self.bars {
            let top = (f64::from(CHART_HEIGHT) - bar.height).round() as u32;
            for x in bar.x..(bar.x + BAR_WIDTH).min(CHART_WIDTH) {
                for y in top..CHART_HEIGHT {
                    canvas.put_pixel(x, y, BAR_COLOUR);
                }
            }
        }
        canvas
    }
}
