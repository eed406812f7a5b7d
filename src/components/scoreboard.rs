use padel_core::{PadelScore, Pair, TeamId};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Header row plus one row per team.
pub const SCOREBOARD_HEIGHT: u16 = 3;

const SET_COL_WIDTH: u16 = 4;
const POINT_COL_WIDTH: u16 = 7;
const MIN_NAME_WIDTH: u16 = 8;

/// Classic broadcast scoreboard: one column per set, then the running game.
pub struct Scoreboard<'a> {
    pub teams: Pair<&'a str>,
    pub score: &'a PadelScore,
    /// Sets won before the first recorded point (a restored score). Their game
    /// counts are unknown, so they share one `PRV` column.
    pub earlier_sets: Pair<u32>,
    /// Final games of every completed set, oldest first.
    pub completed_sets: &'a [Pair<u32>],
    pub winner: Option<TeamId>,
}

struct SetColumn {
    label: String,
    games: Pair<u32>,
}

impl Scoreboard<'_> {
    fn set_columns(&self) -> Vec<SetColumn> {
        let earlier = self.earlier_sets.team1.saturating_add(self.earlier_sets.team2);
        let mut cols = Vec::new();
        if earlier > 0 {
            cols.push(SetColumn {
                label: "PRV".to_string(),
                games: self.earlier_sets,
            });
        }
        let mut played: Vec<Pair<u32>> = self.completed_sets.to_vec();
        if self.winner.is_none() {
            played.push(self.score.current_game);
        }
        for (idx, games) in played.into_iter().enumerate() {
            cols.push(SetColumn {
                label: format!("S{}", u64::from(earlier) + idx as u64 + 1),
                games,
            });
        }
        cols
    }

    fn point_cell(&self, team: TeamId) -> String {
        if let Some(winner) = self.winner {
            return if winner == team { "WIN".to_string() } else { String::new() };
        }
        if self.score.tie_break {
            return self.score.tie_break_score[team].to_string();
        }
        self.score.game_points[team].to_string()
    }
}

impl Widget for Scoreboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let sets = self.set_columns();
        let fixed = SET_COL_WIDTH * sets.len() as u16 + POINT_COL_WIDTH;
        let name_width = area.width.saturating_sub(fixed);
        if name_width < MIN_NAME_WIDTH || area.height < SCOREBOARD_HEIGHT {
            let line = format!(
                "{} {}-{} {}",
                self.teams.team1,
                self.score.sets.team1,
                self.score.sets.team2,
                self.teams.team2
            );
            buf.set_stringn(area.x, area.y, line, area.width as usize, Style::default());
            return;
        }

        let header = Style::default().fg(Color::DarkGray);
        let points_label = if self.score.tie_break { "TB" } else { "PTS" };
        for (idx, set) in sets.iter().enumerate() {
            let x = area.x + name_width + SET_COL_WIDTH * idx as u16;
            buf.set_stringn(x, area.y, format!("{:>3}", set.label), 3, header);
        }
        let points_x = area.x + name_width + SET_COL_WIDTH * sets.len() as u16;
        buf.set_string(points_x, area.y, format!("{points_label:>5}"), header);

        for (row, team) in TeamId::BOTH.into_iter().enumerate() {
            let y = area.y + 1 + row as u16;
            let name_style = if self.winner == Some(team) {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            };
            buf.set_stringn(
                area.x,
                y,
                self.teams[team],
                name_width.saturating_sub(1) as usize,
                name_style,
            );

            for (idx, set) in sets.iter().enumerate() {
                let x = area.x + name_width + SET_COL_WIDTH * idx as u16;
                let current = self.winner.is_none() && idx == sets.len() - 1;
                let style = if current {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Gray)
                };
                buf.set_string(x, y, format!("{:>3}", set.games[team]), style);
            }

            buf.set_string(
                points_x,
                y,
                format!("{:>5}", self.point_cell(team)),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            );
        }
    }
}
