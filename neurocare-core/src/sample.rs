use chrono::{DateTime, Days, NaiveDate, Utc};
use neurocare_types::GameKind;

/// A single recorded game result, the unit every analytic works on.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSample {
    pub game: GameKind,
    pub score: f64,
    pub level: Option<i32>,
    pub recorded_at: DateTime<Utc>,
}

impl ScoreSample {
    pub fn new(game: GameKind, score: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            game,
            score,
            level: None,
            recorded_at,
        }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.recorded_at.date_naive()
    }
}

/// Midnight (UTC) of the day `days` before `now`. Windows such as "the last 30
/// days" include everything recorded at or after this instant.
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let today = now.date_naive();
    let start = today
        .checked_sub_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MIN);
    start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

pub fn since(samples: &[ScoreSample], start: DateTime<Utc>) -> Vec<&ScoreSample> {
    samples.iter().filter(|s| s.recorded_at >= start).collect()
}

pub fn between<'a>(
    samples: &'a [ScoreSample],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&'a ScoreSample> {
    samples
        .iter()
        .filter(|s| s.recorded_at >= start && s.recorded_at < end)
        .collect()
}

pub fn scores_of<'a, I>(samples: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a ScoreSample>,
{
    samples.into_iter().map(|s| s.score).collect()
}
