/// WPM sampled at `t` seconds into a reading run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Extend a step series to `end_t` so charts show the final rate holding
pub fn close_series(points: &[TimeSeriesPoint], end_t: f64) -> Vec<TimeSeriesPoint> {
    let mut closed = points.to_vec();
    if let Some(last) = points.last() {
        if end_t > last.t {
            closed.push(TimeSeriesPoint::new(end_t, last.wpm));
        }
    }
    closed
}
