use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use tabnab_core::notify::Severity;
use tabnab_core::types::{TileCoord, VisibilityState};

use crate::App;

/// Largest tile map drawn cell-per-tile; bigger grids are downsampled.
const MAP_MAX_COLS: u32 = 40;
const MAP_MAX_ROWS: u32 = 14;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    // -- Left panel: monitor state --

    let status = app.status.lock().unwrap();

    let (banner_label, banner_bg) = match (status.visibility, status.severity) {
        (VisibilityState::Hidden, _) => ("HIDDEN (press v to reveal)".to_string(), Color::DarkGray),
        (_, Severity::Alert) => (format!("ALERT {}", status.badge), Color::Red),
        (_, Severity::Warn) => (format!("WARN {}", status.badge), Color::Yellow),
        (_, Severity::None) => ("VISIBLE (no significant change)".to_string(), Color::Green),
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled(" v", Style::default().fg(Color::Yellow)),
        Span::raw(" hide/show  "),
        Span::styled("m", Style::default().fg(Color::Yellow)),
        Span::raw(" morph  "),
        Span::styled("u", Style::default().fg(Color::Yellow)),
        Span::raw(" widget  "),
        Span::styled("p", Style::default().fg(Color::Yellow)),
        Span::raw(" pristine  "),
        Span::styled("n", Style::default().fg(Color::Yellow)),
        Span::raw(" noise  "),
        Span::styled("f", Style::default().fg(Color::Yellow)),
        Span::raw(" failures  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" reload  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]));
    lines.push(Line::from(""));

    if !status.title.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(" {}", status.title),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
    }

    let heartbeat = if status.heartbeat_active { "beating" } else { "stopped" };
    let baseline = match status.baseline_at_ms {
        Some(at) => format!("captured @ {}ms", at),
        None => "none yet".to_string(),
    };
    lines.push(Line::from(vec![
        Span::raw(" heartbeat "),
        Span::styled(heartbeat, Style::default().fg(Color::Cyan)),
        Span::raw("   baseline "),
        Span::styled(baseline, Style::default().fg(Color::Cyan)),
    ]));

    let mut flags = Vec::new();
    if status.installed {
        flags.push("installed");
    }
    if status.detected {
        flags.push("detected");
    }
    if app.noise_on {
        flags.push("noise");
    }
    if app.failures_on {
        flags.push("capture-failures");
    }
    lines.push(Line::from(Span::styled(
        format!(" markers: {}", if flags.is_empty() { "-".to_string() } else { flags.join(", ") }),
        Style::default().fg(Color::DarkGray),
    )));

    if let Some(last) = &status.last {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw(" last detection: "),
            Span::styled(
                format!("{:.1}%", last.percent),
                Style::default().fg(severity_color(status.severity)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} tiles via {} @ {}ms", last.changed_tiles, last.pass, last.at_ms),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    // Changed-tile map of the last diff
    let (gx, gy) = status.grid;
    if gx > 0 && gy > 0 && !status.changed.is_empty() {
        lines.push(Line::from(""));
        for row in tile_map(gx, gy, &status.changed) {
            lines.push(Line::from(Span::styled(
                format!("   {}", row),
                Style::default().fg(Color::Red),
            )));
        }
    }

    if !status.history.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " history",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        for event in status.history.iter().rev().take(8) {
            lines.push(Line::from(Span::styled(
                format!("   {:>6.1}%  {} tiles  {}  @ {}ms", event.percent, event.changed_tiles, event.pass, event.at_ms),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    drop(status);

    // Split left panel into banner (1 line) + body
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    let banner_width = left_chunks[0].width as usize;
    let pad_total = banner_width.saturating_sub(banner_label.chars().count());
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    let centered = format!("{}{}{}", " ".repeat(pad_left), banner_label, " ".repeat(pad_right));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered,
        Style::default().fg(Color::Black).bg(banner_bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, left_chunks[0]);

    let body = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(body, left_chunks[1]);

    // -- Right panel: logs --
    if app.log_visible && chunks.len() > 1 {
        let visible_height = chunks[1].height.saturating_sub(2) as usize;
        let total = app.log_messages.len();
        let max_scroll = total.saturating_sub(visible_height);
        let scroll = app.log_scroll.min(max_scroll);
        let start = total.saturating_sub(visible_height + scroll);
        let end = total.saturating_sub(scroll);
        let log_lines: Vec<Line> = app.log_messages[start..end]
            .iter()
            .map(|m| parse_log_line(m))
            .collect();

        let log_panel = Paragraph::new(log_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Logs ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(log_panel, chunks[1]);
    }

    // Modal on top of everything
    if let Some(confirm) = &app.confirm {
        confirm.render(f);
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Alert => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::None => Color::Green,
    }
}

/// ASCII map of the changed-tile grid. Grids wider/taller than the cap
/// are bucketed; a bucket is marked when any tile inside it changed.
fn tile_map(gx: u32, gy: u32, changed: &std::collections::BTreeSet<TileCoord>) -> Vec<String> {
    let step_x = gx.div_ceil(MAP_MAX_COLS).max(1);
    let step_y = gy.div_ceil(MAP_MAX_ROWS).max(1);
    let cols = gx.div_ceil(step_x);
    let rows = gy.div_ceil(step_y);

    let mut marked = vec![false; (cols * rows) as usize];
    for tile in changed {
        let cx = (tile.x / step_x).min(cols - 1);
        let cy = (tile.y / step_y).min(rows - 1);
        marked[(cy * cols + cx) as usize] = true;
    }

    (0..rows)
        .map(|cy| {
            (0..cols)
                .map(|cx| if marked[(cy * cols + cx) as usize] { "▓▓" } else { "··" })
                .collect()
        })
        .collect()
}

/// Parse a structured log line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line for TUI rendering.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    if parts.len() < 5 {
        // Fallback for unstructured messages
        return Line::from(raw);
    }

    let level = parts[0];
    let prefix = parts[1];
    let color_idx: u8 = parts[2].parse().unwrap_or(0);
    let timestamp = parts[3];
    let message = parts[4];

    let prefix_color = match color_idx {
        1 => Color::DarkGray,  // COLOR_GRAY
        2 => Color::LightBlue, // COLOR_BLUE
        3 => Color::Cyan,      // COLOR_CYAN
        _ => Color::White,
    };

    let mut spans = Vec::new();

    spans.push(Span::styled(timestamp, Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw(" "));

    // Level tag: only warn/error/debug get one; info stays bare.
    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        "DEBUG" => spans.push(Span::styled("debug ", Style::default().fg(Color::DarkGray))),
        _ => {}
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(
            prefix,
            Style::default().fg(prefix_color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(message, Style::default().fg(prefix_color)));

    Line::from(spans)
}
