use crate::theme::{desk_theme, DeskTheme, BAR_EMPTY, BAR_FILLED};
use chrono::{DateTime, Local};
use deskpulse_core::snapshot::clamp_percent;
use deskpulse_core::{ellipsize, ActivitySnapshot, Panel, RenderedArt, SystemSnapshot, ViewState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
    Frame,
};

const GITHUB_WIDTH: u16 = 49;
const RIGHT_WIDTH: u16 = 50;
const CLOCK_HEIGHT: u16 = 7;
const SYSTEM_HEIGHT: u16 = 7;
const STAT_LABEL_WIDTH: usize = 16;
const SYSTEM_BAR_WIDTH: usize = 20;
const MAX_TEXT_WIDTH: usize = 42;
const UNAVAILABLE: &str = "unavailable";

pub fn render(frame: &mut Frame, view: &ViewState) {
    let theme = desk_theme();
    let area = frame.size().inner(&Margin {
        vertical: 1,
        horizontal: 2,
    });
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(GITHUB_WIDTH), Constraint::Length(RIGHT_WIDTH)])
        .split(area);

    let gpu_rows = view
        .system
        .value()
        .map(|system| u16::from(system.gpu_percent.is_some()))
        .unwrap_or(0);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(CLOCK_HEIGHT),
            Constraint::Length(SYSTEM_HEIGHT + gpu_rows),
            Constraint::Min(0),
        ])
        .split(columns[1]);

    frame.render_widget(
        Paragraph::new(github_lines(&view.activity, &theme))
            .block(panel_block("GITHUB", view.activity.status(), &theme)),
        columns[0],
    );
    frame.render_widget(
        Paragraph::new(clock_lines(view.clock, &theme))
            .alignment(Alignment::Center)
            .block(panel_block("TIME", None, &theme)),
        right[0],
    );
    frame.render_widget(
        Paragraph::new(system_lines(&view.system, &theme))
            .block(panel_block("SYSTEM", view.system.status(), &theme)),
        right[1],
    );
    let text_width = text_width(right[2]);
    frame.render_widget(
        Paragraph::new(playback_lines(view, text_width, &theme))
            .block(panel_block("SPOTIFY", playback_status(view), &theme)),
        right[2],
    );
}

fn text_width(area: Rect) -> usize {
    // Two border columns plus one padding column per side.
    usize::from(area.width.saturating_sub(4)).min(MAX_TEXT_WIDTH)
}

/// Player failures take precedence over artwork failures.
fn playback_status(view: &ViewState) -> Option<&str> {
    view.playback.status().or_else(|| view.art.status())
}

fn panel_block<'a>(name: &'a str, status: Option<&'a str>, theme: &DeskTheme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .padding(Padding::horizontal(1))
        .title(panel_title(name, status, theme))
}

fn panel_title<'a>(name: &'a str, status: Option<&'a str>, theme: &DeskTheme) -> Line<'a> {
    let mut spans = vec![Span::styled(format!(" {name} "), theme.title_style())];
    if let Some(status) = status {
        spans.push(Span::styled(
            format!("[{status}] "),
            Style::default().fg(theme.status),
        ));
    }
    Line::from(spans)
}

fn unavailable(theme: &DeskTheme) -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(UNAVAILABLE, theme.muted_style()))]
}

fn github_lines(panel: &Panel<ActivitySnapshot>, theme: &DeskTheme) -> Vec<Line<'static>> {
    let Some(activity) = panel.value() else {
        return unavailable(theme);
    };
    let mut lines = vec![
        stat_line("COMMITS", activity.commit_count, theme),
        stat_line("PRS MERGED", activity.merged_pr_count, theme),
        stat_line("ISSUES", activity.closed_issue_count, theme),
        Line::default(),
    ];
    if activity.latest_feed.is_empty() {
        lines.push(Line::from(Span::styled(
            "No recent activity.",
            theme.muted_style(),
        )));
        return lines;
    }
    lines.push(Line::from(Span::styled("LATEST:", theme.muted_style())));
    lines.extend(activity.latest_feed.iter().map(|entry| {
        Line::from(Span::styled(
            format!("\u{2022} {entry}"),
            theme.muted_style(),
        ))
    }));
    lines
}

fn stat_line(label: &str, value: u32, theme: &DeskTheme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label:<width$}", width = STAT_LABEL_WIDTH),
            theme.muted_style(),
        ),
        Span::styled(value.to_string(), theme.value_style()),
    ])
}

fn clock_lines(clock: DateTime<Local>, theme: &DeskTheme) -> Vec<Line<'static>> {
    vec![
        Line::default(),
        Line::from(Span::styled(
            clock.format("%H:%M:%S").to_string(),
            theme.value_style().fg(theme.clock),
        )),
        Line::from(Span::styled(
            clock.format("%a, %b %d").to_string(),
            theme.muted_style(),
        )),
    ]
}

fn system_lines(panel: &Panel<SystemSnapshot>, theme: &DeskTheme) -> Vec<Line<'static>> {
    let Some(system) = panel.value() else {
        return unavailable(theme);
    };
    let mut lines = vec![
        Line::default(),
        meter_line("CPU", system.cpu_percent, theme.cpu, theme),
        meter_line("MEM", system.mem_percent, theme.mem, theme),
    ];
    if let Some(gpu) = system.gpu_percent {
        lines.push(meter_line("GPU", gpu, theme.gpu, theme));
    }
    lines
}

fn meter_line(label: &str, percent: f64, color: Color, theme: &DeskTheme) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{label} {:>3.0}% ", clamp_percent(percent)),
        Style::default().fg(theme.text),
    )];
    spans.extend(bar_spans(percent, SYSTEM_BAR_WIDTH, color, theme));
    Line::from(spans)
}

/// Filled and empty cell counts for a `width`-cell bar.
pub fn bar_split(percent: f64, width: usize) -> (usize, usize) {
    let filled = ((clamp_percent(percent) / 100.0) * width as f64).floor() as usize;
    let filled = filled.min(width);
    (filled, width - filled)
}

fn bar_spans(percent: f64, width: usize, color: Color, theme: &DeskTheme) -> Vec<Span<'static>> {
    let (filled, empty) = bar_split(percent, width);
    vec![
        Span::styled(BAR_FILLED.repeat(filled), Style::default().fg(color)),
        Span::styled(BAR_EMPTY.repeat(empty), Style::default().fg(theme.border)),
    ]
}

fn playback_lines(view: &ViewState, text_width: usize, theme: &DeskTheme) -> Vec<Line<'static>> {
    let Some(playback) = view.playback.value() else {
        return unavailable(theme);
    };
    if !playback.is_playing {
        return vec![
            Line::default(),
            Line::default(),
            Line::from(Span::styled("(Paused)", theme.muted_style())).alignment(Alignment::Center),
        ];
    }

    let mut lines = Vec::new();
    if let Some(art) = view.art.value() {
        lines.extend(art_lines(art));
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        ellipsize(&format!("\u{266a} {}", playback.track), text_width),
        theme.value_style().fg(theme.music),
    )));
    lines.push(Line::from(Span::styled(
        ellipsize(&playback.artist, text_width),
        theme.muted_style(),
    )));
    lines.push(Line::from(bar_spans(
        playback.progress_percent,
        text_width,
        theme.music,
        theme,
    )));
    lines
}

/// One centred line per half-block row: foreground paints the upper pixel.
fn art_lines(art: &RenderedArt) -> Vec<Line<'static>> {
    art.rows()
        .iter()
        .map(|row| {
            let spans: Vec<Span<'static>> = row
                .iter()
                .map(|cell| {
                    let [tr, tg, tb] = cell.top;
                    let [br, bg, bb] = cell.bottom;
                    Span::styled(
                        "\u{2580}",
                        Style::default()
                            .fg(Color::Rgb(tr, tg, tb))
                            .bg(Color::Rgb(br, bg, bb)),
                    )
                })
                .collect();
            Line::from(spans).alignment(Alignment::Center)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use deskpulse_core::raster::pack_half_blocks;
    use deskpulse_core::{Cadence, Dashboard, Message, PlaybackSnapshot, SourceError};
    use ratatui::{backend::TestBackend, Terminal};

    fn now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 1, 2, 9, 5, 7)
            .single()
            .expect("local time")
    }

    fn screen(view: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 50)).expect("terminal");
        terminal.draw(|frame| render(frame, view)).expect("draw");
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn bar_split_clamps_and_floors() {
        assert_eq!(bar_split(50.0, 20), (10, 10));
        assert_eq!(bar_split(99.9, 10), (9, 1));
        assert_eq!(bar_split(150.0, 8), (8, 0));
        assert_eq!(bar_split(-5.0, 8), (0, 8));
        assert_eq!(bar_split(f64::NAN, 4), (0, 4));
    }

    #[test]
    fn never_populated_panels_read_unavailable() {
        let theme = desk_theme();
        let lines = github_lines(&Panel::default(), &theme);
        assert_eq!(line_text(&lines[0]), UNAVAILABLE);
        let lines = system_lines(&Panel::default(), &theme);
        assert_eq!(line_text(&lines[0]), UNAVAILABLE);
    }

    #[test]
    fn github_panel_lists_feed_with_bullets() {
        let theme = desk_theme();
        let mut panel = Panel::default();
        panel.succeed(ActivitySnapshot {
            commit_count: 3,
            merged_pr_count: 1,
            closed_issue_count: 0,
            latest_feed: vec!["a/b: fix: x".to_string()],
        });
        let text: Vec<String> = github_lines(&panel, &theme).iter().map(line_text).collect();
        assert_eq!(text[0], "COMMITS         3");
        assert_eq!(text[1], "PRS MERGED      1");
        assert_eq!(text[4], "LATEST:");
        assert_eq!(text[5], "\u{2022} a/b: fix: x");

        panel.succeed(ActivitySnapshot::default());
        let text: Vec<String> = github_lines(&panel, &theme).iter().map(line_text).collect();
        assert_eq!(text.last().map(String::as_str), Some("No recent activity."));
    }

    #[test]
    fn gpu_meter_only_when_present() {
        let theme = desk_theme();
        let mut panel = Panel::default();
        panel.succeed(SystemSnapshot::new(12.0, 50.0, None));
        assert_eq!(system_lines(&panel, &theme).len(), 3);
        panel.succeed(SystemSnapshot::new(12.0, 50.0, Some(40.0)));
        let lines = system_lines(&panel, &theme);
        assert_eq!(lines.len(), 4);
        assert!(line_text(&lines[3]).starts_with("GPU  40% "));
    }

    #[test]
    fn full_screen_shows_clock_status_and_paused_player() {
        let mut dash = Dashboard::new(now(), Cadence::default());
        dash.update(Message::Activity(Err(SourceError::Status(502))));
        dash.update(Message::Playback(Ok(PlaybackSnapshot::idle())));
        let text = screen(dash.view());

        assert!(text.contains("09:05:07"));
        assert!(text.contains("Fri, Jan 02"));
        assert!(text.contains("[Err 502]"));
        assert!(text.contains(UNAVAILABLE));
        assert!(text.contains("(Paused)"));
    }

    #[test]
    fn playing_track_renders_art_above_track_info() {
        let mut dash = Dashboard::new(now(), Cadence::default());
        let playback = PlaybackSnapshot {
            is_playing: true,
            track: "Windowlicker".to_string(),
            artist: "Aphex Twin".to_string(),
            progress_percent: 50.0,
            artwork_url: "https://img/1".to_string(),
        };
        dash.update(Message::Playback(Ok(playback)));
        let art = pack_half_blocks(&image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([200, 10, 10]),
        ));
        dash.update(Message::ArtRendered {
            url: "https://img/1".to_string(),
            art: Ok(art),
        });

        let lines = playback_lines(dash.view(), 42, &desk_theme());
        assert_eq!(lines.len(), 2 + 1 + 3);
        assert_eq!(line_text(&lines[0]), "\u{2580}".repeat(4));
        assert_eq!(lines[0].alignment, Some(Alignment::Center));
        assert_eq!(line_text(&lines[3]), "\u{266a} Windowlicker");
        assert_eq!(line_text(&lines[4]), "Aphex Twin");
        assert_eq!(
            line_text(&lines[5]),
            format!("{}{}", BAR_FILLED.repeat(21), BAR_EMPTY.repeat(21))
        );

        let text = screen(dash.view());
        assert!(text.contains("Windowlicker"));
    }

    #[test]
    fn art_failure_status_surfaces_in_spotify_title() {
        let mut dash = Dashboard::new(now(), Cadence::default());
        dash.update(Message::Playback(Ok(PlaybackSnapshot {
            is_playing: true,
            artwork_url: "https://img/2".to_string(),
            ..PlaybackSnapshot::default()
        })));
        dash.update(Message::ArtRendered {
            url: "https://img/2".to_string(),
            art: Err(SourceError::Status(404)),
        });
        assert_eq!(playback_status(dash.view()), Some("Err 404"));
    }
}
