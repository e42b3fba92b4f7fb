use neurocare_types::{GameKind, Prediction};
use std::fmt::Write;

use crate::ScoreSample;

const UNCOMPUTED_LABEL: &str = "Not computed";

struct GameSummary {
    game: GameKind,
    attempts: u32,
    total: f64,
    max_level: i32,
}

/// Per-game summaries in the order each game first appears.
fn summarize_games(samples: &[ScoreSample]) -> Vec<GameSummary> {
    let mut summaries: Vec<GameSummary> = Vec::new();
    for sample in samples {
        let index = match summaries.iter().position(|s| s.game == sample.game) {
            Some(index) => index,
            None => {
                summaries.push(GameSummary {
                    game: sample.game,
                    attempts: 0,
                    total: 0.0,
                    max_level: 0,
                });
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[index];
        summary.attempts += 1;
        summary.total += sample.score;
        summary.max_level = summary.max_level.max(sample.level.unwrap_or(0));
    }
    summaries
}

/// Labels that call for a follow-up rather than general advice.
pub fn needs_follow_up(risk_label: &str) -> bool {
    let label = risk_label.to_lowercase();
    label.contains("high") || label.contains("mci")
}

/// Renders the patient-facing Markdown report.
pub fn render_report(
    patient_code: &str,
    samples: &[ScoreSample],
    prediction: Option<&Prediction>,
) -> String {
    let mut report = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut report, patient_code, samples, prediction);
    report
}

fn write_report(
    out: &mut String,
    patient_code: &str,
    samples: &[ScoreSample],
    prediction: Option<&Prediction>,
) -> std::fmt::Result {
    writeln!(out, "# Cognitive Assessment Report - Patient #{patient_code}\n")?;
    writeln!(out, "## Summary")?;
    writeln!(
        out,
        "Based on your performance across multiple cognitive games, our system has analyzed your results.\n"
    )?;
    writeln!(out, "## Your Performance\n")?;

    for summary in summarize_games(samples) {
        writeln!(out, "### {}", summary.game.heading())?;
        writeln!(out, "- Games Played: {}", summary.attempts)?;
        writeln!(
            out,
            "- Average Score: {:.1}",
            summary.total / summary.attempts as f64
        )?;
        writeln!(out, "- Highest Level Reached: {}\n", summary.max_level)?;
    }

    let risk_label = prediction
        .map(|p| p.risk_label.as_str())
        .filter(|label| !label.is_empty())
        .unwrap_or(UNCOMPUTED_LABEL);
    let probability = prediction.map(|p| p.risk_probability).unwrap_or(0.0);

    writeln!(out, "## Assessment Result\n")?;
    writeln!(out, "**Risk Level:** {risk_label}")?;
    writeln!(out, "**Confidence:** {:.1}%\n", probability * 100.0)?;

    writeln!(out, "### What This Means")?;
    if needs_follow_up(risk_label) {
        writeln!(
            out,
            "Your cognitive assessment shows patterns that may require further medical evaluation.\n"
        )?;
        writeln!(out, "### Next Steps")?;
        writeln!(out, "1. Schedule a follow-up appointment with your doctor")?;
        writeln!(out, "2. Discuss these results in detail")?;
        writeln!(
            out,
            "3. Your doctor may recommend additional clinical assessments\n"
        )?;
    } else {
        writeln!(
            out,
            "Your cognitive assessment shows healthy performance patterns.\n"
        )?;
        writeln!(out, "### Recommendations")?;
        writeln!(out, "1. Continue playing cognitive games regularly")?;
        writeln!(out, "2. Maintain a healthy lifestyle")?;
        writeln!(out, "3. Schedule regular check-ups with your doctor\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn samples() -> Vec<ScoreSample> {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        vec![
            ScoreSample::new(GameKind::StroopTest, 70.0, at).with_level(2),
            ScoreSample::new(GameKind::MemoryMatch, 50.0, at),
            ScoreSample::new(GameKind::StroopTest, 75.0, at).with_level(4),
        ]
    }

    fn prediction(label: &str, probability: f64) -> Prediction {
        Prediction {
            id: 1,
            patient_code: "1001".to_string(),
            model_version: None,
            risk_label: label.to_string(),
            risk_probability: probability,
            input_summary: None,
            computed_at: "2024-05-01T09:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_report_game_sections() {
        let report = render_report("1001", &samples(), None);
        assert!(report.starts_with("# Cognitive Assessment Report - Patient #1001\n"));

        let stroop = report.find("### STROOP TEST").unwrap();
        let memory = report.find("### MEMORY MATCH").unwrap();
        assert!(stroop < memory);
        assert!(report.contains("- Games Played: 2\n- Average Score: 72.5\n- Highest Level Reached: 4"));
        assert!(report.contains("- Highest Level Reached: 0"));

        assert!(report.contains("**Risk Level:** Not computed"));
        assert!(report.contains("**Confidence:** 0.0%"));
        assert!(report.contains("### Recommendations"));
    }

    #[test]
    fn test_high_risk_report_has_next_steps() {
        let high = prediction("High", 0.74);
        let report = render_report("1001", &samples(), Some(&high));
        assert!(report.contains("**Risk Level:** High"));
        assert!(report.contains("**Confidence:** 74.0%"));
        assert!(report.contains("### Next Steps"));
        assert!(!report.contains("### Recommendations"));
    }

    #[test]
    fn test_follow_up_labels() {
        assert!(needs_follow_up("High"));
        assert!(needs_follow_up("Possible MCI"));
        assert!(!needs_follow_up("Low"));
        assert!(!needs_follow_up("Medium"));
    }
}
