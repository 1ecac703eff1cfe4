use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use auditor_core::{AuditReport, RelayMode, ERROR_TEXT};
use crate::app::{App, InputMode};

/// Width of the audit summary panel beside the result
const REPORT_WIDTH: u16 = 34;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [prompt_area, output_area] = Layout::vertical([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_prompt(app, frame, prompt_area);

    if let Some(report) = app.report.clone() {
        let [result_area, report_area] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(REPORT_WIDTH),
        ])
        .areas(output_area);
        render_result(app, frame, result_area);
        render_report(&report, frame, report_area);
    } else {
        render_result(app, frame, output_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Contract Auditor ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}] ", app.mode.display_name()), Style::default().fg(Color::Yellow)),
        Span::styled(app.model().to_string(), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Ctrl+S ", key_style),
            Span::styled(" submit ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" indent ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
            Span::styled(" Ctrl+C ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" submit ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" m ", key_style),
            Span::styled(
                match app.mode {
                    RelayMode::Ask => " audit mode ",
                    RelayMode::Audit => " prompt mode ",
                },
                label_style,
            ),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" x ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(match app.mode {
            RelayMode::Ask => " Prompt ",
            RelayMode::Audit => " Contract ",
        });

    let inner_width = usize::from(area.width.saturating_sub(2));
    let inner_height = usize::from(area.height.saturating_sub(2));

    let (cursor_line, cursor_col) = app.cursor_line_col();

    // Keep the cursor visible in both directions. Offsets stay in usize and
    // only the visible window is handed to the widget.
    let scroll_y = if inner_height == 0 {
        0
    } else {
        cursor_line.saturating_sub(inner_height - 1)
    };
    let scroll_x = if inner_width == 0 || cursor_col < inner_width {
        0
    } else {
        cursor_col - inner_width + 1
    };

    let text = if app.prompt.is_empty() {
        Text::from(Span::styled(
            app.mode.placeholder(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(
            app.prompt
                .split('\n')
                .skip(scroll_y)
                .take(inner_height)
                .map(|line| Line::from(line.chars().skip(scroll_x).take(inner_width).collect::<String>()))
                .collect::<Vec<_>>(),
        )
    };

    let input = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing && inner_width > 0 && inner_height > 0 {
        // Both offsets are bounded by the inner area, which fits in u16
        let x = u16::try_from(cursor_col - scroll_x).unwrap_or(u16::MAX);
        let y = u16::try_from(cursor_line - scroll_y).unwrap_or(u16::MAX);
        frame.set_cursor_position((
            area.x.saturating_add(x).saturating_add(1),
            area.y.saturating_add(y).saturating_add(1),
        ));
    }
}

fn render_result(app: &mut App, frame: &mut Frame, area: Rect) {
    app.result_height = area.height.saturating_sub(2);

    let failed = app.result == ERROR_TEXT;
    let border_color = if failed { Color::Red } else { Color::DarkGray };

    let title = if app.is_loading() {
        // Animated ellipsis: cycles through ".", "..", "..."
        format!(" Result (running{}) ", ".".repeat(app.animation_frame as usize + 1))
    } else {
        " Result ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let text = if app.result.is_empty() {
        let hint = if app.is_loading() {
            "Waiting for the model..."
        } else {
            "Submit a prompt to see the raw response here."
        };
        Text::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if failed {
        Text::from(Span::styled(app.result.as_str(), Style::default().fg(Color::Red)))
    } else {
        // Only the visible window; the offset can exceed what u16 scrolling allows
        Text::from(
            app.result
                .lines()
                .skip(app.result_scroll)
                .take(usize::from(app.result_height))
                .map(Line::from)
                .collect::<Vec<_>>(),
        )
    };

    let result = Paragraph::new(text).block(block);

    frame.render_widget(result, area);
}

fn render_report(report: &AuditReport, frame: &mut Frame, area: Rect) {
    let score_color = match report.score {
        0..=49 => Color::Red,
        50..=79 => Color::Yellow,
        _ => Color::Green,
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Score     ", label),
            Span::styled(report.score.to_string(), Style::default().fg(score_color).bold()),
        ]),
        Line::from(vec![
            Span::styled("Critical  ", label),
            Span::styled(report.critical.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::styled("High      ", label),
            Span::styled(report.high.to_string(), Style::default().fg(Color::LightRed)),
        ]),
        Line::from(vec![
            Span::styled("Medium    ", label),
            Span::styled(report.medium.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::default(),
        Line::from(Span::raw(report.summary.clone())),
    ];

    if !report.issues.is_empty() {
        lines.push(Line::default());
        for issue in &report.issues {
            lines.push(Line::from(format!("• {}", issue)));
        }
    }

    let panel = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title(" Audit "),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(panel, area);
}
