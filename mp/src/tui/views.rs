//! TUI views and rendering
//!
//! Pure functions of the controller state and the UI-only `App` state.
//! Nothing here mutates either.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::trace;

use super::app::{App, LoginField};
use crate::controller::{AppState, Screen};
use crate::domain::ActionPlan;

const BRAND: &str = "Pinterest-to-Life";

/// Palette (pastel)
mod colors {
    use ratatui::style::Color;

    pub const PINK: Color = Color::Rgb(255, 209, 220);
    pub const LILAC: Color = Color::Rgb(224, 187, 228);
    pub const SAGE: Color = Color::Rgb(178, 172, 136);
    pub const INDIGO: Color = Color::Rgb(129, 140, 248);
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const SUCCESS: Color = Color::Rgb(50, 205, 50);
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255);
    pub const DIM: Color = Color::DarkGray;
}

/// Main render function
pub fn render(state: &AppState, app: &App, frame: &mut Frame) {
    trace!(screen = %state.screen, "render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    if !state.initialized {
        let spinner = Paragraph::new("Loading...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors::PINK));
        frame.render_widget(spinner, chunks[1]);
        return;
    }

    match state.screen {
        Screen::Landing => render_landing(frame, chunks[1]),
        Screen::Pricing => render_pricing(frame, chunks[1]),
        Screen::Login => render_login(state, app, frame, chunks[1]),
        Screen::Dashboard => render_dashboard(state, app, frame, chunks[1]),
        Screen::Processing => render_processing(app, frame, chunks[1]),
        Screen::Result => {
            if let Some(plan) = &state.plan {
                render_result(plan, app, frame, chunks[1]);
            }
        }
    }

    render_footer(state.screen, frame, chunks[2]);
}

fn render_header(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" P ", Style::default().bg(colors::PINK).fg(ratatui::style::Color::Black)),
        Span::raw(" "),
        Span::styled(BRAND, Style::default().fg(colors::INDIGO).add_modifier(Modifier::BOLD)),
    ];
    if let Some(email) = state.email() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(email.to_string(), Style::default().fg(colors::LILAC)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_footer(screen: Screen, frame: &mut Frame, area: Rect) {
    let keys: &[(&str, &str)] = match screen {
        Screen::Landing => &[("Enter", "get started"), ("p", "pricing"), ("q", "quit")],
        Screen::Pricing => &[("Enter", "get started"), ("Esc", "back"), ("q", "quit")],
        Screen::Login => &[
            ("Tab", "switch field"),
            ("Enter", "submit"),
            ("^T", "sign in/up"),
            ("^O", "continue with OAuth"),
            ("Esc", "back"),
        ],
        Screen::Dashboard => &[("Enter", "generate"), ("^U", "clear"), ("^L", "logout"), ("^C", "quit")],
        Screen::Processing => &[("^L", "logout"), ("^C", "quit")],
        Screen::Result => &[("n", "new board"), ("j/k", "scroll"), ("^L", "logout"), ("q", "quit")],
    };

    let mut spans = Vec::new();
    for (key, label) in keys {
        spans.push(Span::styled(format!(" <{}>", key), Style::default().fg(colors::KEYBIND)));
        spans.push(Span::styled(format!(" {}", label), Style::default().fg(colors::DIM)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Centered sub-rectangle of at most `width` x `height`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_landing(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Turn inspiration",
            Style::default().fg(colors::INDIGO).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "into action ✨",
            Style::default().fg(colors::PINK).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from("From Pinterest boards to real-life plans."),
        Line::from("We help you build the life you've been pinning."),
        Line::from(""),
        Line::from(Span::styled(
            "[ Get started for free ]",
            Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD),
        )),
    ];
    let body = Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true });
    frame.render_widget(body, centered(area, 70, 9));
}

fn render_pricing(frame: &mut Frame, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(centered(area, 72, 10));

    let tier = |name: &str, price: &str, perks: &[&str]| {
        let mut lines = vec![
            Line::from(Span::styled(price.to_string(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
        ];
        lines.extend(perks.iter().map(|p| Line::from(format!("• {}", p))));
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", name)))
            .wrap(Wrap { trim: true })
    };

    frame.render_widget(
        tier("Free", "$0 / month", &["3 boards per month", "Weekly roadmap", "First steps & habits"]),
        columns[0],
    );
    frame.render_widget(
        tier("Bestie", "$5 / month", &["Unlimited boards", "Everything in Free", "Priority generation"]),
        columns[1],
    );
}

fn render_login(state: &AppState, app: &App, frame: &mut Frame, area: Rect) {
    let title = if app.sign_up_mode {
        "Join the vibe 🌸"
    } else {
        "Welcome back, Bestie! 🌸"
    };

    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            Style::default().fg(colors::PINK)
        } else {
            Style::default().fg(colors::DIM)
        };
        Paragraph::new(value).block(Block::default().borders(Borders::ALL).title(label.to_string()).border_style(style))
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(2),
        ])
        .split(centered(area, 60, 14));

    frame.render_widget(
        Paragraph::new(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))).alignment(Alignment::Center),
        rows[0],
    );
    frame.render_widget(
        field(" Email address ", app.email_input.clone(), app.focus == LoginField::Email),
        rows[1],
    );
    frame.render_widget(
        field(
            " Password ",
            "•".repeat(app.password_input.chars().count()),
            app.focus == LoginField::Password,
        ),
        rows[2],
    );

    let action = if state.auth_pending {
        "Working..."
    } else if app.sign_up_mode {
        "Create account"
    } else {
        "Sign in"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(format!("[ {} ]", action), Style::default().fg(colors::KEYBIND)))
            .alignment(Alignment::Center),
        rows[3],
    );

    let message = if let Some(error) = &state.auth_error {
        Some(Span::styled(error.clone(), Style::default().fg(colors::ERROR)))
    } else {
        state
            .notice
            .as_ref()
            .map(|notice| Span::styled(notice.clone(), Style::default().fg(colors::SUCCESS)))
    };
    if let Some(message) = message {
        frame.render_widget(
            Paragraph::new(Line::from(message))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            rows[4],
        );
    }
}

fn render_dashboard(state: &AppState, app: &App, frame: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(centered(area, 76, 12));

    if let Some(error) = &state.error {
        let banner = Paragraph::new(error.as_str())
            .style(Style::default().fg(colors::ERROR))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, rows[0]);
    }

    let intro = vec![
        Line::from(Span::styled(
            "Bring your vision board to life ✨",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Paste a link to any Pinterest board.",
            Style::default().fg(colors::DIM),
        )),
    ];
    frame.render_widget(Paragraph::new(intro).alignment(Alignment::Center), rows[1]);

    let input = if app.url_input.is_empty() {
        Paragraph::new(Span::styled(
            "https://pinterest.com/username/my-aesthetic-board",
            Style::default().fg(colors::DIM),
        ))
    } else {
        Paragraph::new(app.url_input.as_str())
    };
    frame.render_widget(
        input.block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Pinterest Board URL ")
                .border_style(Style::default().fg(colors::PINK)),
        ),
        rows[2],
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Try boards like \"Minimalist Home\", \"Daily Wellness\", or \"Career Goals\".",
            Style::default().fg(colors::DIM),
        ))
        .alignment(Alignment::Center),
        rows[3],
    );
}

fn render_processing(app: &App, frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            app.loading_message(),
            Style::default().fg(colors::PINK).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Our AI is hand-crafting your unique action plan...",
            Style::default().fg(colors::DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered(area, 70, 3),
    );
}

/// Lines of the result screen
fn plan_lines(plan: &ActionPlan) -> Vec<Line<'static>> {
    let heading = |text: &str| {
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(colors::INDIGO).add_modifier(Modifier::BOLD),
        ))
    };

    let mut lines = vec![
        Line::from(Span::styled("PLAN GENERATED", Style::default().fg(colors::SUCCESS))),
        Line::from(Span::styled(
            plan.goal.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Weekly Roadmap"),
    ];
    for day in &plan.weekly_plan {
        lines.push(Line::from(Span::styled(
            format!("  {}", day.day),
            Style::default().fg(colors::LILAC).add_modifier(Modifier::BOLD),
        )));
        lines.extend(day.actions.iter().map(|a| Line::from(format!("    • {}", a))));
    }

    lines.push(Line::from(""));
    lines.push(heading("First Steps"));
    lines.extend(
        plan.first_steps
            .iter()
            .enumerate()
            .map(|(i, step)| Line::from(format!("  {}. {}", i + 1, step))),
    );

    lines.push(Line::from(""));
    lines.push(heading("Suggested Habits"));
    lines.extend(
        plan.suggested_habits
            .iter()
            .map(|habit| Line::from(Span::styled(format!("  ✿ {}", habit), Style::default().fg(colors::SAGE)))),
    );
    lines
}

fn render_result(plan: &ActionPlan, app: &App, frame: &mut Frame, area: Rect) {
    let body = Paragraph::new(plan_lines(plan))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));
    frame.render_widget(body, area);
}
