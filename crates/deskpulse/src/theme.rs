use ratatui::style::{Color, Modifier, Style};

pub const BAR_FILLED: &str = "\u{2588}";
pub const BAR_EMPTY: &str = "\u{2591}";

#[derive(Debug, Clone, Copy)]
pub struct DeskTheme {
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub clock: Color,
    pub cpu: Color,
    pub mem: Color,
    pub gpu: Color,
    pub music: Color,
    pub status: Color,
}

pub fn desk_theme() -> DeskTheme {
    DeskTheme {
        border: Color::Rgb(56, 56, 56),
        title: Color::Rgb(120, 120, 120),
        text: Color::Rgb(255, 255, 255),
        muted: Color::Rgb(120, 120, 120),
        clock: Color::Rgb(115, 245, 159),
        cpu: Color::Rgb(245, 83, 133),
        mem: Color::Rgb(125, 86, 244),
        gpu: Color::Rgb(115, 245, 159),
        music: Color::Rgb(29, 185, 84),
        status: Color::Rgb(245, 158, 11),
    }
}

impl DeskTheme {
    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }

    pub fn value_style(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }
}
