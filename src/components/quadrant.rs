use campus_api::view::{MatchRow, Quadrant};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Widget};

use crate::components::theme::{ThemeColor, resolve, status_style};

/// One big-screen region: the assigned sport and its live scores.
pub struct QuadrantView<'a> {
    pub quadrant: &'a Quadrant,
    pub index: usize,
    pub selected: bool,
}

impl Widget for QuadrantView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match self.quadrant {
            Quadrant::Unassigned => format!(" Q{} ", self.index + 1),
            Quadrant::Sport { sport_name, .. } => format!(" Q{}: {sport_name} ", self.index + 1),
        };
        let border = if self.selected { ThemeColor::Accent } else { ThemeColor::Dim };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(resolve(border))
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let live = match self.quadrant {
            Quadrant::Unassigned => {
                render_centered(Line::from(Span::styled("Unassigned", resolve(ThemeColor::Dim))), inner, buf);
                return;
            }
            Quadrant::Sport { live, .. } => live,
        };

        if live.is_empty() {
            render_centered(Line::from(Span::styled("No live matches", resolve(ThemeColor::Dim))), inner, buf);
            return;
        }

        // Two rows per match when there is room: scoreline, then venue.
        let roomy = inner.height as usize >= live.len() * 2;
        let mut y = inner.y;
        for row in live {
            if y >= inner.y + inner.height {
                break;
            }
            let line = score_line(row, inner.width as usize);
            buf.set_string(inner.x, y, line, status_style(row.status));
            y += 1;

            if roomy && y < inner.y + inner.height {
                let detail = venue_line(row);
                let clipped: String = detail.chars().take(inner.width as usize).collect();
                buf.set_string(inner.x, y, clipped, resolve(ThemeColor::Dim));
                y += 1;
            }
        }
    }
}

fn render_centered(line: Line, area: Rect, buf: &mut Buffer) {
    let w = (line.width() as u16).min(area.width);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height / 2;
    buf.set_line(x, y, &line, area.width);
}

/// `Owls        2 - 1      Eagles`, padded or clipped to exactly `width` columns.
pub fn score_line(row: &MatchRow, width: usize) -> String {
    let score = format!(" {} - {} ", row.points_a, row.points_b);
    let score_w = score.chars().count();
    if width <= score_w {
        return score.chars().take(width).collect();
    }

    let side = (width - score_w) / 2;
    let extra = (width - score_w) % 2;
    let a = truncate_name(&row.team_a, side);
    let b: String = row.team_b.chars().take(side + extra).collect();
    format!("{a}{score}{b:>w$}", w = side + extra)
}

pub fn venue_line(row: &MatchRow) -> String {
    let mut parts = Vec::new();
    if !row.venue.is_empty() {
        parts.push(row.venue.clone());
    }
    if let Some(court) = &row.court_number {
        parts.push(format!("court {court}"));
    }
    if let Some(referee) = &row.referee_name {
        parts.push(format!("ref {referee}"));
    }
    parts.join(" · ")
}

/// Clip to `max` characters and pad with spaces to exactly `max`.
pub fn truncate_name(name: &str, max: usize) -> String {
    let mut s: String = name.chars().take(max).collect();
    while s.chars().count() < max {
        s.push(' ');
    }
    s
}
