//! UI rendering
//!
//! Render functions draw the state; they never change it.

use libsprint::{BestTime, RenderedImage, SubmissionState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_textarea::TextArea;

use crate::app::AppState;

pub fn render(frame: &mut Frame, state: &AppState, editor: &TextArea) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Team bar
            Constraint::Min(5),    // Editor + results
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    render_team_bar(frame, rows[0], state);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    frame.render_widget(editor, columns[0]);
    render_results(frame, columns[1], state);
    render_status_bar(frame, rows[2], state);

    if state.help_visible {
        render_help_overlay(frame, area);
    }

    if let Some(ref error) = state.error {
        render_error_overlay(frame, area, error);
    }
}

fn styled(state: &AppState, style: Style) -> Style {
    if state.config.colors_enabled {
        style
    } else {
        Style::default()
    }
}

fn render_team_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let team = match &state.team {
        Some(team) if !team.team_name.is_empty() => format!("Team {} (#{})", team.team_name, team.team_id),
        Some(team) => format!("Team #{}", team.team_id),
        None => "No team: run `sprint-team register <NAME>` or `sprint-team join <NAME>`".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(" Code Sprint ", styled(state, Style::default().add_modifier(Modifier::BOLD))),
        Span::raw("| "),
        Span::styled(team, styled(state, Style::default().fg(Color::Cyan))),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let results = &state.results;
    let label = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    let (status, status_style) = match &results.submission {
        SubmissionState::Idle => ("Ready".to_string(), Style::default()),
        SubmissionState::Submitting => ("Processing...".to_string(), Style::default().fg(Color::Yellow)),
        SubmissionState::Succeeded(result) => (
            format!("Time taken: {} seconds", result.elapsed_seconds),
            Style::default().fg(Color::Green),
        ),
        SubmissionState::Failed(_) => ("Failed".to_string(), Style::default().fg(Color::Red)),
    };
    lines.push(Line::from(Span::styled(status, styled(state, status_style))));

    let best = match results.best_time {
        BestTime::Seconds(seconds) => format!("{} seconds", seconds),
        BestTime::Unset => "-".to_string(),
    };
    let best = if results.refreshing { format!("{} (refreshing)", best) } else { best };
    lines.push(Line::from(vec![Span::styled("Best time: ", label), Span::raw(best)]));

    if let Some(at) = &results.last_completed {
        lines.push(Line::from(vec![Span::styled("Last run: ", label), Span::raw(at.clone())]));
    }

    if let Some(result) = results.submission.result() {
        let image = match &result.image {
            RenderedImage::Produced(data) => format!("rendered ({} bytes base64)", data.len()),
            RenderedImage::NotProduced => "No image generated!".to_string(),
        };
        lines.push(Line::from(vec![Span::styled("Image: ", label), Span::raw(image)]));

        if let Some(output) = result.output.as_deref().filter(|o| !o.is_empty()) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Output:", label)));
            lines.extend(output.lines().map(|line| Line::from(line.to_string())));
        }
    }

    if let Some(error) = &results.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Error:",
            styled(state, label.fg(Color::Red)),
        )));
        lines.extend(
            error
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), styled(state, Style::default().fg(Color::Red))))),
        );
    }

    let results_widget = Paragraph::new(lines)
        .block(Block::default().title(" Results ").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(results_widget, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let hints = if state.can_submit() {
        "Ctrl+S: Submit | Ctrl+R: Reset | Ctrl+B: Best time | F1: Help | Ctrl+Q: Quit"
    } else {
        "Submitting... | F1: Help | Ctrl+C: Force quit"
    };

    let message_style = if state.status.is_error {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let lines = vec![
        Line::from(Span::styled(
            state.status.message.clone().unwrap_or_default(),
            styled(state, message_style),
        )),
        Line::from(Span::styled(hints, styled(state, Style::default().fg(Color::Gray)))),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP)),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);

    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("  Ctrl+S   - Submit code"),
        Line::from("  Ctrl+R   - Reset code to template (press twice)"),
        Line::from("  Ctrl+B   - Refresh best time"),
        Line::from("  F1       - Toggle help"),
        Line::from("  Esc      - Close help / cancel reset / dismiss error"),
        Line::from("  Ctrl+Q   - Quit"),
        Line::from(""),
        Line::from("Editor:"),
        Line::from("  ( [ { \" ' ` insert their closing pair"),
        Line::from("  Every edit is saved immediately"),
        Line::from(""),
        Line::from("Press Esc or F1 to close"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help, popup_area);
}

fn render_error_overlay(frame: &mut Frame, area: Rect, error: &str) {
    let popup_area = centered_rect(70, 30, area);

    let error_text = vec![
        Line::from(Span::styled("Error", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(error),
        Line::from(""),
        Line::from("Press Esc to dismiss"),
    ];

    let error_widget = Paragraph::new(error_text)
        .block(
            Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(error_widget, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsprint::SubmissionResult;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(state: &AppState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let editor = TextArea::default();
        terminal.draw(|frame| render(frame, state, &editor)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_results_show_no_image_and_output() {
        let mut state = AppState::new();
        state.results.submission = SubmissionState::Succeeded(SubmissionResult {
            elapsed_seconds: 4.2,
            image: RenderedImage::NotProduced,
            output: Some("ok".to_string()),
            submission_id: None,
        });
        state.results.best_time = BestTime::Seconds(3.5);

        let screen = draw(&state);
        assert!(screen.contains("Time taken: 4.2 seconds"));
        assert!(screen.contains("No image generated!"));
        assert!(screen.contains("Best time: 3.5 seconds"));
        assert!(screen.contains("ok"));
    }

    #[test]
    fn test_missing_team_hint() {
        let screen = draw(&AppState::new());
        assert!(screen.contains("No team"));
    }
}
