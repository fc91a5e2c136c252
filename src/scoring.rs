//! Pure scoring helpers shared by the session and the leaderboard.

/// Standard word length used for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

/// `(correct_chars / 5) / minutes`, rounded. Zero when no time has elapsed.
pub fn words_per_minute(correct_chars: usize, elapsed_seconds: f64) -> u32 {
    if elapsed_seconds <= 0.0 {
        return 0;
    }
    let minutes = elapsed_seconds / 60.0;
    (correct_chars as f64 / CHARS_PER_WORD / minutes).round() as u32
}

/// Correct share of typed characters as a rounded percentage; 100 when nothing was typed.
pub fn accuracy_percent(correct_chars: usize, total_chars: usize) -> u32 {
    if total_chars == 0 {
        return 100;
    }
    ((correct_chars as f64 / total_chars as f64) * 100.0).round() as u32
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Rounded mean of integer samples, 0 for an empty series.
pub fn rounded_mean(values: &[u32]) -> u32 {
    let as_f64: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
    mean(&as_f64).map_or(0, |m| m.round() as u32)
}

/// `100 - coefficient of variation` of a WPM series, floored at 0.
///
/// A series whose mean is zero (including an empty one) scores 0.
pub fn consistency_score(wpms: &[u32]) -> u32 {
    let series: Vec<f64> = wpms.iter().map(|&w| f64::from(w)).collect();
    let (Some(avg), Some(sd)) = (mean(&series), std_dev(&series)) else {
        return 0;
    };
    if avg <= 0.0 {
        return 0;
    }
    (100.0 - 100.0 * sd / avg).round().max(0.0) as u32
}
