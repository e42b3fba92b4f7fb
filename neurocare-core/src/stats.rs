use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::ScoreSample;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); undefined below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation coefficient. `None` when the series differ in length,
/// have fewer than two points, or either is constant.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(covariance / (var_x * var_y).sqrt())
}

/// Percentage change from `from` to `to`; undefined when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// Rounds half up (towards positive infinity), matching how scores have
/// always been rounded for display.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn round_to_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// Mean score per calendar day, ascending by date.
pub fn daily_means<'a, I>(samples: I) -> Vec<(NaiveDate, f64)>
where
    I: IntoIterator<Item = &'a ScoreSample>,
{
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        by_day.entry(sample.date()).or_default().push(sample.score);
    }
    by_day
        .into_iter()
        .filter_map(|(day, scores)| mean(&scores).map(|avg| (day, avg)))
        .collect()
}

/// Correlation between day number (1, 2, ... over days with activity) and the
/// daily mean score. Positive means improving. Undefined trends count as 0.
pub fn daily_trend_correlation<'a, I>(samples: I) -> f64
where
    I: IntoIterator<Item = &'a ScoreSample>,
{
    let daily = daily_means(samples);
    let day_numbers: Vec<f64> = (1..=daily.len()).map(|n| n as f64).collect();
    let averages: Vec<f64> = daily.iter().map(|(_, avg)| *avg).collect();
    pearson_correlation(&day_numbers, &averages).unwrap_or(0.0)
}
