use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::scoreboard::{SCOREBOARD_HEIGHT, Scoreboard};
use crate::state::app_state::{BackendStatus, MatchState};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use padel_core::stats::MatchStats;
use padel_core::{ActionCategory, MatchPhase, Pair, PointOutcome, TeamId};

static TABS: &[&str; 4] = &["Score", "Points", "Stats", "Live"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status(f, layout.status, app);
        }

        match app.state.active_tab {
            MenuItem::Score => draw_score(f, layout.main, app),
            MenuItem::Points => draw_points(f, layout.main, app),
            MenuItem::Stats => draw_stats(f, layout.main, app),
            MenuItem::Live => draw_live(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main, app),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Score => 0,
        MenuItem::Points => 1,
        MenuItem::Stats => 2,
        MenuItem::Live => 3,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }
    let backend = match app.state.backend {
        BackendStatus::Unknown => Span::styled("backend: ...", Style::default().fg(Color::DarkGray)),
        BackendStatus::Offline => Span::styled("backend: offline", Style::default().fg(Color::DarkGray)),
        BackendStatus::Online => Span::styled("backend: online", Style::default().fg(Color::Green)),
    };
    let relay = match (&app.state.live.endpoint, app.state.live.connected) {
        (None, _) => Span::styled("relay: off", Style::default().fg(Color::DarkGray)),
        (Some(_), true) => Span::styled("relay: live", Style::default().fg(Color::Green)),
        (Some(_), false) => Span::styled("relay: connecting", Style::default().fg(Color::Yellow)),
    };
    let saved = app
        .state
        .last_saved_at
        .as_deref()
        .map(|at| format!("saved {at}"))
        .unwrap_or_else(|| "not saved yet".to_string());

    let mut spans = vec![
        Span::raw(" "),
        backend,
        Span::raw("  "),
        relay,
        Span::raw("  "),
        Span::styled(saved, Style::default().fg(Color::Gray)),
    ];
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(err.to_string(), Style::default().fg(Color::Red)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_score(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let block = default_border(Color::White).title(format!(" {} ", game.match_id));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [header, board_area, _gap, game_line, outcome_line, key_legend, actions_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(SCOREBOARD_HEIGHT + 2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(inner);

    f.render_widget(
        Paragraph::new(format!(
            "{}  |  {}",
            game.engine.config().describe(),
            game.source.label()
        ))
        .style(Style::default().fg(Color::Gray)),
        header,
    );

    let stats = game.stats();
    let score = game.engine.score();
    let board_block = default_border(Color::DarkGray);
    let board_inner = board_block.inner(board_area);
    f.render_widget(board_block, board_area);
    f.render_widget(
        Scoreboard {
            teams: Pair::new(game.team_name(TeamId::Team1), game.team_name(TeamId::Team2)),
            score: &score,
            earlier_sets: game.base.map(|base| base.sets).unwrap_or_default(),
            completed_sets: &stats.set_scores,
            winner: game.engine.match_winner(),
        },
        board_inner,
    );

    let (game_text, game_style) = match game.engine.phase() {
        MatchPhase::Finished => (
            format!("Final: {}", game.engine.formatted_score()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        MatchPhase::InTieBreak => (
            game.engine.current_game_score(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        MatchPhase::InGame => (
            format!("Game: {}", game.engine.current_game_score()),
            Style::default().fg(Color::Cyan),
        ),
    };
    f.render_widget(Paragraph::new(game_text).style(game_style), game_line);

    if let Some(text) = outcome_text(game, game.last_outcome) {
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
            outcome_line,
        );
    }

    f.render_widget(
        Paragraph::new("Keys: a/\u{2190}=team 1  d/\u{2192}=team 2  u=undo  j/k=action  Esc=clear  s=save")
            .style(Style::default().fg(Color::DarkGray)),
        key_legend,
    );

    draw_action_picker(f, actions_area, app);
}

fn outcome_text(game: &MatchState, outcome: PointOutcome) -> Option<String> {
    if let Some(team) = outcome.match_won {
        return Some(format!("Game, set and match {}", game.team_name(team)));
    }
    if let Some(team) = outcome.set_won {
        return Some(format!("Set {}", game.team_name(team)));
    }
    outcome
        .game_won
        .map(|team| format!("Game {}", game.team_name(team)))
}

fn draw_action_picker(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::DarkGray).title(" Next point action ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let picker = &app.state.picker;
    if picker.actions.is_empty() {
        f.render_widget(
            Paragraph::new("No point actions loaded")
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    // Keep the selection in view.
    let rows = inner.height as usize;
    let selected = picker.selected.unwrap_or(0);
    let start = selected.saturating_sub(rows.saturating_sub(1));

    let lines: Vec<Line> = picker
        .actions
        .iter()
        .enumerate()
        .skip(start)
        .take(rows)
        .map(|(idx, action)| {
            let is_selected = picker.selected == Some(idx);
            let marker = if is_selected { '>' } else { ' ' };
            let style = if is_selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(category_color(action.category))
            };
            Line::from(vec![
                Span::styled(format!("{marker} {:<24}", action.label), style),
                Span::styled(action.category.label(), Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn category_color(category: ActionCategory) -> Color {
    match category {
        ActionCategory::Winner => Color::Green,
        ActionCategory::ForcedError => Color::Yellow,
        ActionCategory::UnforcedError => Color::Red,
        ActionCategory::Other => Color::White,
    }
}

fn draw_points(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let block = default_border(Color::White).title(format!(" Points ({}) ", game.records.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let log = game.point_log(&app.state.picker.actions);
    if log.is_empty() {
        f.render_widget(
            Paragraph::new("No points scored yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let max_rows = inner.height as usize;
    let skip = log.len().saturating_sub(max_rows);
    let lines: Vec<Line> = log
        .iter()
        .skip(skip)
        .map(|entry| {
            let team_color = match entry.team {
                TeamId::Team1 => Color::Cyan,
                TeamId::Team2 => Color::Magenta,
            };
            let marker = if entry.outcome.game_won.is_some() { "*" } else { " " };
            let text = format!(
                "{:>4} {} {:<20} {:<24} {:<16} {marker}{}",
                entry.number,
                entry.time,
                game.team_name(entry.team),
                entry.action.as_deref().unwrap_or("-"),
                entry.game_score,
                entry.score,
            );
            let clipped: String = text.chars().take(inner.width as usize).collect();
            Line::from(Span::styled(clipped, Style::default().fg(team_color)))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let block = default_border(Color::White).title(" Stats ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let stats = game.stats();
    let mut lines = vec![
        Line::from(format!(
            "{:<24}{:>20}{:>20}",
            "",
            game.team_name(TeamId::Team1),
            game.team_name(TeamId::Team2)
        ))
        .style(Style::default().add_modifier(Modifier::BOLD)),
        stat_line("Points won", stats.points_won),
        Line::from(format!(
            "{:<24}{:>19.1}%{:>19.1}%",
            "Point share",
            stats.point_share(TeamId::Team1),
            stats.point_share(TeamId::Team2)
        )),
        stat_line("Games won", stats.games_won),
        stat_line("Tie-breaks won", stats.tie_breaks_won),
        stat_line("Longest point streak", stats.longest_streak),
        stat_line("Deuce points won", stats.deuce_points_won),
        Line::from(""),
        Line::from(format!("Sets: {}", set_line_or_dash(&stats))),
        Line::from(""),
    ];

    if stats.actions.is_empty() {
        lines.push(Line::from(
            Span::styled("No tagged points yet", Style::default().fg(Color::DarkGray)),
        ));
    } else {
        lines.push(
            Line::from("Point actions").style(Style::default().add_modifier(Modifier::BOLD)),
        );
        for (code, counts) in &stats.actions {
            let label = app
                .state
                .picker
                .actions
                .iter()
                .find(|a| &a.code == code)
                .map(|a| a.label.as_str())
                .unwrap_or(code.as_str());
            lines.push(stat_line(label, *counts));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn stat_line(label: &str, values: Pair<u32>) -> Line<'static> {
    Line::from(format!("{label:<24}{:>20}{:>20}", values.team1, values.team2))
}

fn set_line_or_dash(stats: &MatchStats) -> String {
    if stats.set_scores.is_empty() {
        "-".to_string()
    } else {
        stats.set_line()
    }
}

fn draw_live(f: &mut Frame, area: Rect, app: &App) {
    let live = &app.state.live;
    let block = default_border(Color::White).title(" Live courts ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !live.is_enabled() {
        f.render_widget(
            Paragraph::new("Set PADELFLOW_RELAY_WS to follow live courts")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let [courts_area, feed_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(7)]).areas(inner);

    let mut lines = Vec::new();
    if live.courts.is_empty() {
        lines.push(Line::from(Span::styled(
            "No courts reporting",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for court in live.courts.values() {
        let own = court.match_id == app.state.game.match_id;
        let style = match court.phase {
            MatchPhase::Finished => Style::default().fg(Color::Green),
            _ if own => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::White),
        };
        let status = match court.phase {
            MatchPhase::Finished => "final".to_string(),
            _ => court.game_score.clone(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", court.match_id), Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} vs {}  {}  {}", court.team1, court.team2, court.formatted, status),
                style,
            ),
        ]));
    }
    f.render_widget(Paragraph::new(lines), courts_area);

    let feed_block = default_border(Color::DarkGray).title(" Relay ");
    let feed_inner = feed_block.inner(feed_area);
    f.render_widget(feed_block, feed_area);
    let feed: Vec<Line> = live
        .messages
        .iter()
        .rev()
        .take(feed_inner.height as usize)
        .rev()
        .map(|m| Line::from(format!("{} {}", m.time, m.body)))
        .collect();
    f.render_widget(
        Paragraph::new(feed).style(Style::default().fg(Color::DarkGray)),
        feed_inner,
    );
}

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = [
        ("a / \u{2190}", "point for team 1"),
        ("d / \u{2192}", "point for team 2"),
        ("u", "undo last point"),
        ("j / k", "pick the action for the next point"),
        ("Esc", "clear the action (closes help)"),
        ("s", "save now"),
        ("1-4", "Score, Points, Stats, Live"),
        ("f", "full screen"),
        ("\"", "toggle log pane"),
        ("q / Ctrl-C", "quit"),
    ];
    let mut lines: Vec<Line> = rows
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>12}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Match file: {}", app.match_path().display()),
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
