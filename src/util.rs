/// Format whole seconds as `m:ss`, or `h:mm:ss` past an hour
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Progress fraction as a whole percentage, clamped to 0..=100
pub fn percent(fraction: f64) -> u16 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u16
}

/// Average reading rate achieved over a run
pub fn effective_wpm(words: usize, secs: u64) -> Option<f64> {
    match secs {
        0 => None,
        s => Some(words as f64 * 60.0 / s as f64),
    }
}
