use campus_api::MatchStatus;
use tui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeColor {
    Primary,
    Accent,
    Dim,
    Live,
    Final,
    Error,
    Selected,
}

pub fn resolve(color: ThemeColor) -> Style {
    match color {
        ThemeColor::Primary => Style::default().fg(Color::Rgb(0, 122, 195)),
        ThemeColor::Accent => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ThemeColor::Dim => Style::default().fg(Color::Indexed(240)),
        ThemeColor::Live => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ThemeColor::Final => Style::default().fg(Color::Gray),
        ThemeColor::Error => Style::default().fg(Color::Red),
        ThemeColor::Selected => Style::default().fg(Color::Black).bg(Color::Yellow),
    }
}

pub fn status_style(status: MatchStatus) -> Style {
    match status {
        MatchStatus::Scheduled => resolve(ThemeColor::Primary),
        MatchStatus::Live => resolve(ThemeColor::Live),
        MatchStatus::Completed => resolve(ThemeColor::Final),
    }
}
