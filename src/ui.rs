pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, LineGauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::clock::Clock;
use crate::engine::PlaybackResult;
use crate::focus::compute_focus;
use crate::session::{ReadingSession, ReadingView};
use crate::time_series::close_series;
use crate::util::{effective_wpm, format_clock, percent};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl<C: Clock + Clone + 'static> Widget for &ReadingSession<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.view();

        match view.result {
            Some(result) => render_results(self.title(), &view, &result, area, buf),
            None if self.is_running() => render_reading(&view, area, buf),
            None => render_idle(self.title(), area, buf),
        }
    }
}

fn render_idle(title: &str, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(2), Constraint::Fill(1)])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled(title.to_string(), bold_style)),
        Line::from(Span::styled(
            "(space) start / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);
}

fn render_reading(view: &ReadingView, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN.min(area.height / 4))
        .constraints([
            Constraint::Length(1), // progress
            Constraint::Fill(1),
            Constraint::Length(1), // upper tick
            Constraint::Length(1), // word
            Constraint::Length(1), // lower tick
            Constraint::Fill(1),
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    LineGauge::default()
        .filled_style(Style::default().fg(Color::Magenta))
        .unfilled_style(dim_style)
        .line_set(symbols::line::THICK)
        .ratio(view.progress().clamp(0.0, 1.0))
        .label(format!("{:>3}%", percent(view.progress())))
        .render(chunks[0], buf);

    render_tick(chunks[2], buf, "╷");
    if let Some(word) = view.word.as_deref() {
        render_focus_word(word, chunks[3], buf);
    }
    render_tick(chunks[4], buf, "╵");

    let mut status = vec![
        Span::styled(format!("{} wpm", view.wpm), bold_style.fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format!("{} / {} words", view.position, view.total), bold_style),
    ];
    if view.paused {
        status.push(Span::raw("   "));
        status.push(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ));
    }
    Paragraph::new(Line::from(status))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    Paragraph::new(Span::styled(
        if view.paused {
            "(space) resume / (↑/↓) speed / (esc) stop"
        } else {
            "(space) pause / (↑/↓) speed / (esc) stop"
        },
        italic_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[7], buf);
}

fn center_x(area: Rect) -> u16 {
    area.x + area.width / 2
}

fn render_tick(area: Rect, buf: &mut Buffer, symbol: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    buf.set_string(
        center_x(area),
        area.y,
        symbol,
        Style::default().fg(Color::Red).add_modifier(Modifier::DIM),
    );
}

/// Draw `word` with its focus character pinned to the centre column
fn render_focus_word(word: &str, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let Some(split) = compute_focus(word) else {
        return;
    };

    let text_style = Style::default().add_modifier(Modifier::BOLD);
    let focus_style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);

    let center = center_x(area);
    let right = area.right();
    let before_width = split.before.width() as u16;
    let start = center.saturating_sub(before_width).max(area.x);

    buf.set_stringn(
        start,
        area.y,
        split.before,
        usize::from(center - start),
        text_style,
    );
    let (after_x, _) = buf.set_stringn(
        center,
        area.y,
        split.focus.to_string(),
        usize::from(right - center),
        focus_style,
    );
    if after_x < right {
        buf.set_stringn(
            after_x,
            area.y,
            split.after,
            usize::from(right - after_x),
            text_style,
        );
    }
}

fn render_results(
    title: &str,
    view: &ReadingView,
    result: &PlaybackResult,
    area: Rect,
    buf: &mut Buffer,
) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN.min(area.height / 4))
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // outcome
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points = close_series(&view.wpm_coords, result.duration_secs as f64);
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(&points, result.duration_secs);
    let tuples: Vec<(f64, f64)> = points.into_iter().map(Into::into).collect();
    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    let mut stats = format!(
        "{} wpm   {} words   {}",
        result.end_wpm,
        result.total_words_read,
        format_clock(result.duration_secs)
    );
    if let Some(avg) = effective_wpm(result.total_words_read, result.duration_secs) {
        stats.push_str(&format!("   {avg:.0} avg"));
    }
    Paragraph::new(Span::styled(stats, bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let outcome = if result.stopped_by_user {
        format!("{title}: stopped at {}%", percent(view.progress()))
    } else {
        format!("{title}: finished")
    };
    Paragraph::new(Span::styled(
        outcome,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);

    Paragraph::new(Span::styled("(r)estart / (esc)ape", italic_style)).render(chunks[4], buf);
}
