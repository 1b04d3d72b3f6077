use crate::time_series::TimeSeriesPoint;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(wpm_coords: &[TimeSeriesPoint], duration_secs: u64) -> (f64, f64) {
    let highest_wpm = wpm_coords
        .iter()
        .map(|p| p.wpm)
        .fold(0.0_f64, f64::max);

    let last_t = wpm_coords.last().map(|p| p.t).unwrap_or(0.0);
    let overall_duration = last_t.max(duration_secs as f64).max(1.0);

    // headroom so the top step is not drawn on the border
    (overall_duration, (highest_wpm * 1.1).round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
