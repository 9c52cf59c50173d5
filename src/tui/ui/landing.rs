use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{prompt::QUICK_QUESTIONS, tui::ui::inputarea::InputArea};

pub const TITLE: &str = "AI Krishi Sahayak for Maharashtra Farmers";
pub const TAGLINE: &str = "तुमचे कृषी मित्र - आता मराठीत (Your Farming Friend - Now in Marathi)";

/// 首页：区县选择、问题输入和快捷提问
pub struct Landing<'a> {
    pub district: &'a str,
    pub input: &'a InputArea,
}

impl Landing<'_> {
    /// 首页各部分的位置，返回 [标题, 区县, 输入框, 快捷提问, 提示]
    pub fn layout(area: Rect) -> [Rect; 5] {
        let width = area.width.min(90);
        let centered = Rect {
            x: area.x + (area.width - width) / 2,
            width,
            ..area
        };
        let [_, title, district, input, chips, hints, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Fill(1),
        ])
        .areas(centered);
        [title, district, input, chips, hints]
    }

    pub fn input_area(area: Rect) -> Rect {
        Self::layout(area)[2]
    }
}

/// 快捷提问对应的功能键
pub fn chip_key(idx: usize) -> String {
    format!("F{}", idx + 5)
}

impl Widget for &Landing<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [title, district, input, chips, hints] = Landing::layout(area);

        Paragraph::new(vec![
            Line::from(Span::styled(
                TITLE,
                Style::new().light_green().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(TAGLINE, Style::new().green())),
        ])
        .alignment(Alignment::Center)
        .render(title, buf);

        Paragraph::new(Line::from(vec![
            Span::raw("📍 "),
            Span::styled(self.district.to_string(), Style::new().light_yellow().bold()),
            Span::styled("   (Tab: next, F2: choose)", Style::new().dark_gray()),
        ]))
        .block(
            Block::default()
                .title(" जिल्हा (District) ")
                .borders(Borders::ALL)
                .style(Style::new().light_blue()),
        )
        .render(district, buf);

        self.input.render(input, buf);

        let mut spans = Vec::new();
        for (idx, question) in QUICK_QUESTIONS.iter().enumerate() {
            spans.push(Span::styled(format!(" {} ", chip_key(idx)), Style::new().black().on_light_green()));
            spans.push(Span::styled(format!(" {}   ", question), Style::new().light_green()));
        }
        Paragraph::new(Line::from(spans))
            .block(Block::default().title(" Quick questions ").borders(Borders::ALL))
            .render(chips, buf);

        Paragraph::new(Line::from(vec![
            Span::styled("Enter", Style::new().yellow()),
            Span::raw(" ask  "),
            Span::styled("Esc", Style::new().yellow()),
            Span::raw(" quit"),
        ]))
        .alignment(Alignment::Center)
        .render(hints, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_landing_shows_district_and_chips() {
        let input = InputArea::default();
        let landing = Landing {
            district: "Nashik",
            input: &input,
        };
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        (&landing).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains(TITLE));
        assert!(text.contains("Nashik"));
        assert!(text.contains("F5"));
        assert!(text.contains("Tur irrigation"));
    }

    #[test]
    fn test_input_area_inside_frame() {
        let area = Rect::new(0, 0, 120, 40);
        let input = Landing::input_area(area);
        assert_eq!(input.height, 3);
        assert!(input.width <= 90);
        assert!(area.contains(input.as_position()));
    }
}
