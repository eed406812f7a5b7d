use crate::{GameConfig, GamePoint, PadelScoreManager, Pair, ScoreError, ScoreSnapshot, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scored point as the analyzer recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub team: TeamId,
    /// Point-action code from the taxonomy ("smash_winner", "unforced_net", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl PointRecord {
    pub fn new(team: TeamId, action: Option<String>) -> Self {
        Self {
            team,
            action,
            recorded_at: Utc::now(),
        }
    }
}

pub fn point_sequence(records: &[PointRecord]) -> Vec<TeamId> {
    records.iter().map(|r| r.team).collect()
}

/// Statistics derived by replaying a point log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub points_won: Pair<u32>,
    pub games_won: Pair<u32>,
    pub tie_breaks_won: Pair<u32>,
    /// Games per team at the end of each completed set (a tie-break counts as a game).
    pub set_scores: Vec<Pair<u32>>,
    pub longest_streak: Pair<u32>,
    /// Points played with both teams at 40 or beyond.
    pub deuce_points_won: Pair<u32>,
    pub actions: BTreeMap<String, Pair<u32>>,
}

impl MatchStats {
    /// Replay `records` on top of `base` (or a fresh match). Points the engine
    /// rejects because the match was already over are skipped.
    pub fn compute(
        config: GameConfig,
        base: Option<&ScoreSnapshot>,
        records: &[PointRecord],
    ) -> Result<Self, ScoreError> {
        let mut manager = PadelScoreManager::new(config)?;
        if let Some(snapshot) = base {
            manager.restore_score(snapshot);
        }

        let mut stats = Self::default();
        let mut streak: Option<(TeamId, u32)> = None;

        for record in records {
            let team = record.team;
            let before = manager.score();
            let Ok(outcome) = manager.add_point(team) else {
                continue;
            };

            stats.points_won[team] += 1;

            let run = match streak {
                Some((holder, n)) if holder == team => n + 1,
                _ => 1,
            };
            streak = Some((team, run));
            stats.longest_streak[team] = stats.longest_streak[team].max(run);

            if !before.tie_break
                && before.game_points.team1 >= GamePoint::Forty
                && before.game_points.team2 >= GamePoint::Forty
            {
                stats.deuce_points_won[team] += 1;
            }

            if outcome.game_won == Some(team) {
                stats.games_won[team] += 1;
                if before.tie_break {
                    stats.tie_breaks_won[team] += 1;
                }
            }

            if outcome.set_won == Some(team) {
                let mut games = before.current_game;
                games[team] += 1;
                stats.set_scores.push(games);
            }

            if let Some(action) = &record.action {
                stats.actions.entry(action.clone()).or_default()[team] += 1;
            }
        }

        Ok(stats)
    }

    pub fn total_points(&self) -> u32 {
        self.points_won.team1 + self.points_won.team2
    }

    /// Share of points won by `team`, in percent.
    pub fn point_share(&self, team: TeamId) -> f64 {
        let total = self.total_points();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.points_won[team]) * 100.0 / f64::from(total)
    }

    /// `"6-4 3-6 7-6"` style line of completed sets.
    pub fn set_line(&self) -> String {
        self.set_scores
            .iter()
            .map(|s| format!("{}-{}", s.team1, s.team2))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TeamId::{Team1, Team2};

    fn records(teams: &[TeamId]) -> Vec<PointRecord> {
        teams.iter().map(|&t| PointRecord::new(t, None)).collect()
    }

    fn game(team: TeamId) -> Vec<TeamId> {
        vec![team; 4]
    }

    #[test]
    fn love_set_counts_points_games_and_streak() {
        let points: Vec<TeamId> = (0..6).flat_map(|_| game(Team1)).collect();
        let stats =
            MatchStats::compute(GameConfig::best_of_three_golden_point(), None, &records(&points))
                .unwrap();

        assert_eq!(stats.points_won, Pair::new(24, 0));
        assert_eq!(stats.games_won, Pair::new(6, 0));
        assert_eq!(stats.set_scores, vec![Pair::new(6, 0)]);
        assert_eq!(stats.longest_streak, Pair::new(24, 0));
        assert_eq!(stats.set_line(), "6-0");
        assert_eq!(stats.point_share(Team1), 100.0);
    }

    #[test]
    fn tie_break_set_is_recorded_with_the_extra_game() {
        let mut points = Vec::new();
        for _ in 0..5 {
            points.extend(game(Team1));
            points.extend(game(Team2));
        }
        points.extend(vec![Team2; 7]);

        let stats = MatchStats::compute(GameConfig::default(), None, &records(&points)).unwrap();
        assert_eq!(stats.set_scores, vec![Pair::new(5, 6)]);
        assert_eq!(stats.tie_breaks_won, Pair::new(0, 1));
        assert_eq!(stats.games_won, Pair::new(5, 6));
        assert_eq!(stats.longest_streak.team2, 11);
    }

    #[test]
    fn deuce_points_are_counted_for_both_scoring_rules() {
        let deuce = [Team1, Team1, Team1, Team2, Team2, Team2];

        let mut golden = deuce.to_vec();
        golden.push(Team2);
        let stats = MatchStats::compute(GameConfig::best_of_three_golden_point(), None, &records(&golden))
            .unwrap();
        assert_eq!(stats.deuce_points_won, Pair::new(0, 1));
        assert_eq!(stats.games_won, Pair::new(0, 1));

        let mut advantage = deuce.to_vec();
        advantage.extend([Team1, Team2, Team2, Team2]);
        let stats = MatchStats::compute(GameConfig::default(), None, &records(&advantage)).unwrap();
        assert_eq!(stats.deuce_points_won, Pair::new(1, 3));
        assert_eq!(stats.games_won, Pair::new(0, 1));
    }

    #[test]
    fn actions_are_tallied_per_team() {
        let log = vec![
            PointRecord::new(Team1, Some("smash_winner".into())),
            PointRecord::new(Team2, Some("unforced_net".into())),
            PointRecord::new(Team1, Some("smash_winner".into())),
            PointRecord::new(Team2, None),
        ];
        let stats = MatchStats::compute(GameConfig::default(), None, &log).unwrap();
        assert_eq!(stats.actions.len(), 2);
        assert_eq!(stats.actions["smash_winner"], Pair::new(2, 0));
        assert_eq!(stats.actions["unforced_net"], Pair::new(0, 1));
        assert_eq!(stats.total_points(), 4);
        assert_eq!(stats.point_share(Team2), 50.0);
    }

    #[test]
    fn points_after_the_match_are_ignored() {
        let config = GameConfig {
            sets_to_win: 1,
            games_per_set: 1,
            no_advantage: true,
            tie_break_enabled: false,
        };
        let mut points: Vec<TeamId> = (0..2).flat_map(|_| game(Team2)).collect();
        points.extend([Team1, Team1]);
        let stats = MatchStats::compute(config, None, &records(&points)).unwrap();
        assert_eq!(stats.points_won, Pair::new(0, 8));
        assert_eq!(stats.set_scores, vec![Pair::new(0, 2)]);
    }

    #[test]
    fn replay_starts_from_the_base_snapshot() {
        let base = ScoreSnapshot {
            sets: Pair::new(1, 0),
            current_set: 2,
            current_game: Pair::new(5, 4),
            tie_break: false,
            tie_break_score: None,
        };
        let stats =
            MatchStats::compute(GameConfig::default(), Some(&base), &records(&game(Team1))).unwrap();
        assert_eq!(stats.set_scores, vec![Pair::new(6, 4)]);
        assert_eq!(stats.games_won, Pair::new(1, 0));
    }

    #[test]
    fn empty_log_has_no_share() {
        let stats = MatchStats::compute(GameConfig::default(), None, &[]).unwrap();
        assert_eq!(stats.total_points(), 0);
        assert_eq!(stats.point_share(Team1), 0.0);
        assert_eq!(stats.set_line(), "");
    }

    #[test]
    fn records_serialise_with_optional_action() {
        let record = PointRecord::new(Team2, None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["team"], "team2");
        assert!(json.get("action").is_none());
        let back: PointRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(point_sequence(&[record]), vec![Team2]);
    }
}
