use std::collections::VecDeque;
/// Retention horizon and visible x span of the chart, in seconds.
pub const WINDOW_SECONDS: f64 = 10.0;
/// The y axis never shows less than +/- this value.
pub const Y_FLOOR: f64 = 250.0;
/// Space kept between the observed extremes and the y axis limits.
pub const Y_MARGIN: f64 = 10.0;
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Arrival wall-clock time, seconds since the UNIX epoch.
    pub timestamp: f64,
    pub value: f64,
}
impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}
impl DisplayBounds {
    /// Bounds the chart starts with before the first sample arrives.
    pub const INITIAL_Y_MIN: f64 = -100.0;
    pub const INITIAL_Y_MAX: f64 = 100.0;
}
/// Ready-to-draw snapshot of the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartFrame {
    pub points: Vec<[f64; 2]>,
    pub bounds: DisplayBounds,
}
/// Time-bounded scrolling store of samples.
///
/// Every retained sample is at most `WINDOW_SECONDS` older than the newest one;
/// how many that is depends only on the arrival rate.
#[derive(Debug, Default)]
pub struct SeriesStore {
    data: VecDeque<Sample>,
    bounds: Option<DisplayBounds>,
}
impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn append(&mut self, sample: Sample) {
        self.data.push_back(sample);
        self.prune(sample.timestamp);
        self.bounds = Some(self.compute_bounds(sample.timestamp));
    }
    #[cfg(test)]
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.data.iter()
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn latest(&self) -> Option<Sample> {
        self.data.back().copied()
    }
    #[cfg(test)]
    /// `None` until the first sample has been appended.
    pub fn bounds(&self) -> Option<DisplayBounds> {
        self.bounds
    }
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.data.iter().map(|s| [s.timestamp, s.value]).collect()
    }
    pub fn frame(&self) -> Option<ChartFrame> {
        if self.is_empty() {
            return None;
        }
        Some(ChartFrame {
            points: self.points(),
            bounds: self.bounds?,
        })
    }
    fn prune(&mut self, newest_time: f64) {
        let threshold = newest_time - WINDOW_SECONDS;
        while let Some(front) = self.data.front() {
            if front.timestamp < threshold {
                self.data.pop_front();
            } else {
                break;
            }
        }
    }
    // Full scan; fine for a few seconds of low-rate samples.
    fn compute_bounds(&self, newest_time: f64) -> DisplayBounds {
        let (min, max) = self
            .data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.value), hi.max(s.value))
            });
        DisplayBounds {
            x_min: newest_time - WINDOW_SECONDS,
            x_max: newest_time,
            y_min: (-Y_FLOOR).min(min - Y_MARGIN),
            y_max: Y_FLOOR.max(max + Y_MARGIN),
        }
    }
}
