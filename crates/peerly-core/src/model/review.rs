use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::table::TableRow;

/// Review status of the reviewed team, as a colour code.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    Red,
    Blue,
    Green,
    Purple,
    #[default]
    Brown,
}

impl TeamStatus {
    pub fn label(self) -> &'static str {
        match self {
            TeamStatus::Red => "Not Completed",
            TeamStatus::Blue => "Completed, No Grade",
            TeamStatus::Green => "No Submitted Work",
            TeamStatus::Purple => "No Review",
            TeamStatus::Brown => "Grade Assigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRound {
    pub round: u32,
    #[serde(default)]
    pub calculated_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub review_volume: u64,
    #[serde(default)]
    pub review_comment_count: u64,
}

impl ReviewRound {
    /// Score as a whole percentage of the maximum; `None` when unscored.
    #[allow(clippy::cast_possible_truncation)]
    pub fn percentage(&self) -> Option<i64> {
        let score = self.calculated_score?;
        Some(match self.max_score {
            Some(max) if max > 0.0 => (score / max * 100.0).round() as i64,
            _ => 0,
        })
    }
}

impl fmt::Display for ReviewRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percentage() {
            Some(pct) => write!(f, "Round {}: {pct}%", self.round),
            None => write!(f, "Round {}: -", self.round),
        }
    }
}

/// One reviewer/team pairing in a review report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub id: i64,
    pub reviewer_name: String,
    pub reviewer_username: String,
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub reviews_completed: u32,
    #[serde(default)]
    pub reviews_selected: u32,
    #[serde(default)]
    pub team_reviewed_name: String,
    #[serde(default)]
    pub team_reviewed_status: TeamStatus,
    #[serde(default)]
    pub has_consent: bool,
    #[serde(default)]
    pub calculated_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub rounds: Vec<ReviewRound>,
    #[serde(default)]
    pub review_comment: Option<String>,
    #[serde(default)]
    pub review_volume: Option<u64>,
    #[serde(default)]
    pub review_comment_count: u64,
    #[serde(default)]
    pub assigned_grade: Option<f64>,
    #[serde(default)]
    pub instructor_comment: Option<String>,
}

impl ReviewRow {
    /// Sort key for "Scores Awarded": first round's score, else -1.
    pub fn score_key(&self) -> f64 {
        self.rounds
            .first()
            .and_then(|r| r.calculated_score)
            .unwrap_or(-1.0)
    }

    /// Sort key for "Metrics": first round's volume, else the row's, else 0.
    pub fn volume_key(&self) -> u64 {
        self.rounds
            .first()
            .map(|r| r.review_volume)
            .or(self.review_volume)
            .unwrap_or(0)
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        term.is_empty()
            || self.reviewer_name.to_lowercase().contains(&term)
            || self.reviewer_username.to_lowercase().contains(&term)
    }
}

impl TableRow for ReviewRow {
    fn row_id(&self) -> i64 {
        self.id
    }
}

/// `GET /review_reports/<assignment_id>` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    #[serde(default)]
    pub report_data: Vec<ReviewRow>,
    #[serde(default)]
    pub average_volume: f64,
}

/// `PATCH /review_reports/<review_id>/update_grade` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpdate {
    pub assigned_grade: Option<f64>,
    pub instructor_comment: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round(score: Option<f64>, max: Option<f64>, volume: u64) -> ReviewRound {
        ReviewRound {
            round: 1,
            calculated_score: score,
            max_score: max,
            review_volume: volume,
            review_comment_count: 0,
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(round(Some(17.0), Some(20.0), 0).percentage(), Some(85));
        assert_eq!(round(Some(2.0), Some(3.0), 0).percentage(), Some(67));
        assert_eq!(round(Some(5.0), Some(0.0), 0).percentage(), Some(0));
        assert_eq!(round(None, Some(10.0), 0).to_string(), "Round 1: -");
    }

    #[test]
    fn status_labels() {
        assert_eq!(TeamStatus::Purple.label(), "No Review");
        assert_eq!("blue".parse::<TeamStatus>().unwrap().label(), "Completed, No Grade");
    }

    #[test]
    fn row_parses_camel_case() {
        let row: ReviewRow = serde_json::from_value(json!({
            "id": 11,
            "reviewerName": "Ada Lovelace",
            "reviewerUsername": "ada",
            "teamReviewedName": "Team 4",
            "teamReviewedStatus": "red",
            "rounds": [{"round": 1, "calculatedScore": 8, "maxScore": 10, "reviewVolume": 120, "reviewCommentCount": 4}],
            "reviewVolume": 300
        }))
        .unwrap();
        assert_eq!(row.team_reviewed_status, TeamStatus::Red);
        assert!((row.score_key() - 8.0).abs() < f64::EPSILON);
        assert_eq!(row.volume_key(), 120);
    }

    #[test]
    fn sort_keys_fall_back() {
        let row = ReviewRow {
            rounds: vec![],
            review_volume: None,
            ..serde_json::from_value(json!({"id": 1, "reviewerName": "a", "reviewerUsername": "b"})).unwrap()
        };
        assert!((row.score_key() + 1.0).abs() < f64::EPSILON);
        assert_eq!(row.volume_key(), 0);
    }

    #[test]
    fn search_matches_name_or_username() {
        let row: ReviewRow =
            serde_json::from_value(json!({"id": 1, "reviewerName": "Ada Lovelace", "reviewerUsername": "countess"}))
                .unwrap();
        assert!(row.matches_search("LOVE"));
        assert!(row.matches_search("count"));
        assert!(!row.matches_search("babbage"));
    }
}
