//! Live match list screen rendering
//!
//! Renders the header with the rate-limit indicators, the error banner, and
//! either a loading skeleton, the empty-state prompt, or one card per match.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, ErrorBanner};
use crate::data::{Match, Severity};
use crate::rate_limit::{RateLimitState, DEFAULT_LIMIT};

/// Rows taken by one match card, borders included
const CARD_HEIGHT: u16 = 5;

/// Placeholder cards shown while the first load is in flight
const SKELETON_CARDS: usize = 3;

/// Score as "home - away"; an unreported side shows as "-"
pub fn score_text(m: &Match) -> String {
    let side = |score: Option<u32>| score.map_or_else(|| "-".to_string(), |s| s.to_string());
    format!("{} - {}", side(m.home_score), side(m.away_score))
}

/// Goal and card totals, only for matches that have events
pub fn events_summary(m: &Match) -> Option<String> {
    if m.events.is_empty() {
        return None;
    }
    Some(format!(
        "\u{26BD} {} | \u{1F7E8} {}",
        m.goal_count(),
        m.card_count()
    ))
}

/// One-line text form of a match, used by `--once`
pub fn summary_line(m: &Match) -> String {
    let mut line = format!(
        "[{}] {} {} {} ({}, {})",
        m.competition,
        m.home_team,
        score_text(m),
        m.away_team,
        m.elapsed,
        m.status
    );
    if !m.events.is_empty() {
        line.push_str(&format!(
            " goals: {}, cards: {}",
            m.goal_count(),
            m.card_count()
        ));
    }
    line
}

/// Remaining-calls indicator, plus the countdown once a reset is known
pub fn rate_limit_text(state: &RateLimitState, now_ms: i64) -> String {
    let mut text = format!("API Calls Left: {}/{}", state.remaining, DEFAULT_LIMIT);
    if state.reset_at_ms.is_some() {
        text.push_str(&format!(
            "  Resets in: {}s",
            state.seconds_until_reset(now_ms)
        ));
    }
    text
}

/// Renders the whole screen
pub fn render_match_list(frame: &mut Frame, app: &App, now_ms: i64) {
    let area = frame.area();
    let banner_height = if app.view.error.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, now_ms, chunks[0]);
    if let Some(banner) = &app.view.error {
        render_banner(frame, banner, app.can_refresh(now_ms), chunks[1]);
    }

    if app.view.loading && !app.view.is_manual_refresh {
        render_skeleton(frame, chunks[2]);
    } else if app.view.matches.is_empty() {
        render_empty_state(frame, chunks[2]);
    } else {
        render_cards(frame, app, chunks[2]);
    }

    let footer = Paragraph::new(Line::from(Span::styled(
        " j/k: move  r: refresh  ?: help  q: quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(footer, chunks[3]);
}

fn render_header(frame: &mut Frame, app: &App, now_ms: i64, area: Rect) {
    let state = app.rate_limit().rolled_over(now_ms);
    let refresh_enabled = app.can_refresh(now_ms);

    let refresh_label = if app.view.loading && app.view.is_manual_refresh {
        Span::styled("Refreshing...", Style::default().fg(Color::Cyan))
    } else if refresh_enabled {
        Span::styled("[r] Refresh", Style::default().fg(Color::Green))
    } else {
        Span::styled("[r] Refresh", Style::default().fg(Color::DarkGray))
    };

    let remaining_color = if state.can_auto_fetch() {
        Color::White
    } else if state.can_fetch() {
        Color::Yellow
    } else {
        Color::Red
    };

    let mut spans = vec![
        Span::styled(
            rate_limit_text(&state, now_ms),
            Style::default().fg(remaining_color),
        ),
        Span::raw("   "),
        refresh_label,
    ];
    if let Some(updated) = &app.view.last_updated {
        spans.push(Span::styled(
            format!("   Last updated: {}", updated),
            Style::default().fg(Color::Gray),
        ));
    }

    let block = Block::default()
        .title(Span::styled(
            " Live Football ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_banner(frame: &mut Frame, banner: &ErrorBanner, retry_enabled: bool, area: Rect) {
    let color = match banner.severity {
        Severity::Warning => Color::Yellow,
        Severity::Critical => Color::Red,
    };

    let mut spans = vec![Span::styled(
        format!("\u{26A0} {}", banner.message),
        Style::default().fg(color),
    )];
    if banner.offers_retry() {
        let retry_style = if retry_enabled {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled("  [t] Try again", retry_style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_skeleton(frame: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); SKELETON_CARDS])
        .split(area);

    let placeholder = Style::default().fg(Color::DarkGray);
    for row in rows.iter() {
        let lines = vec![
            Line::from(Span::styled("\u{2591}".repeat(18), placeholder)),
            Line::from(Span::styled("\u{2591}".repeat(32), placeholder)),
            Line::from(Span::styled("\u{2591}".repeat(10), placeholder)),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(placeholder);
        frame.render_widget(Paragraph::new(lines).block(block), *row);
    }
}

fn render_empty_state(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No live matches currently",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Press c to check again",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let visible = usize::from((area.height / CARD_HEIGHT).max(1));
    let offset = app.selected_index.saturating_sub(visible - 1);
    let shown: Vec<(usize, &Match)> = app
        .view
        .matches
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); shown.len()])
        .split(area);

    for ((index, m), row) in shown.into_iter().zip(rows.iter()) {
        render_card(frame, m, index == app.selected_index, *row);
    }
}

fn render_card(frame: &mut Frame, m: &Match, selected: bool, area: Rect) {
    let border_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let header = Line::from(vec![
        Span::styled(m.competition.clone(), Style::default().fg(Color::Magenta)),
        Span::raw("  "),
        Span::styled(m.status.clone(), Style::default().fg(Color::Gray)),
    ]);

    let teams = Line::from(vec![
        Span::raw(m.home_team.clone()),
        Span::raw("  "),
        Span::styled(
            score_text(m),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(m.away_team.clone()),
    ]);

    let mut footer = vec![Span::styled(
        m.elapsed.to_string(),
        Style::default().fg(Color::Green),
    )];
    if let Some(summary) = events_summary(m) {
        footer.push(Span::raw("   "));
        footer.push(Span::raw(summary));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(
        Paragraph::new(vec![header, teams, Line::from(footer)]).block(block),
        area,
    );
}
