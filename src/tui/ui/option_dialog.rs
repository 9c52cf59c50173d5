use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::tui::get_str_width;

const MAX_ROWS: usize = 8;

/// 弹出式选择框，用于选择区县
#[derive(Clone, Default)]
pub struct OptionDialog {
    pub title: String,
    options: Vec<String>,
    state: ListState,
    pub visible: bool,
}

impl OptionDialog {
    /// 打开选择框，current 大小写不敏感地匹配为默认选中项
    pub fn show(&mut self, title: &str, options: Vec<String>, current: Option<&str>) {
        let selected = current
            .and_then(|c| options.iter().position(|o| o.eq_ignore_ascii_case(c)))
            .unwrap_or(0);
        self.title = title.to_string();
        self.visible = !options.is_empty();
        self.state = ListState::default().with_selected(self.visible.then_some(selected));
        self.options = options;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.options.clear();
        self.state = ListState::default();
    }

    pub fn next(&mut self) {
        if let Some(i) = self.state.selected() {
            self.state.select(Some((i + 1).min(self.options.len().saturating_sub(1))));
        }
    }

    pub fn previous(&mut self) {
        if let Some(i) = self.state.selected() {
            self.state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn get_selected_option(&self) -> Option<&String> {
        self.state.selected().and_then(|i| self.options.get(i))
    }

    /// 选择框大小随标题和选项宽度变化，在 area 内居中
    pub fn dialog_area(&self, area: Rect) -> Rect {
        let text_width = self
            .options
            .iter()
            .map(|o| get_str_width(o).saturating_add(6))
            .chain(std::iter::once(get_str_width(&self.title)))
            .max()
            .unwrap_or(0);
        let width = text_width.saturating_add(4).clamp(30, 80).min(area.width);
        let height = (self.options.len().min(MAX_ROWS) as u16 + 4).min(area.height);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Widget for &OptionDialog {
    fn render(self, area: Rect, buf: &mut ratatui::prelude::Buffer) {
        if !self.visible {
            return;
        }
        let area = self.dialog_area(area);
        let block = Block::default()
            .title(Span::styled(format!(" {} ", self.title), Style::new().bold().white()))
            .borders(Borders::ALL)
            .style(Style::new().on_black().light_blue());
        let inner = block.inner(area);
        Clear.render(area, buf);
        block.render(area, buf);

        let [list_area, hint_area] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
        let items = self
            .options
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{:2}. {}", i + 1, name));
        let list = List::new(items)
            .style(Style::new().white())
            .highlight_style(Style::new().fg(Color::White).bg(Color::Blue))
            .highlight_symbol("> ");
        // 渲染时会修正滚动偏移，不影响自身状态
        let mut state = self.state.clone();
        StatefulWidget::render(list, list_area, buf, &mut state);

        let hints = Line::from(vec![
            Span::styled("↑/↓", Style::new().yellow()),
            Span::raw(" move "),
            Span::styled("Enter", Style::new().yellow()),
            Span::raw(" select "),
            Span::styled("Esc", Style::new().yellow()),
            Span::raw(" cancel"),
        ]);
        Paragraph::new(hints).render(hint_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn districts() -> Vec<String> {
        ["Beed", "Latur", "Nashik", "Pune", "Nagpur"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_show_selects_current() {
        let mut dialog = OptionDialog::default();
        dialog.show("District", districts(), Some("nashik"));
        assert!(dialog.visible);
        assert_eq!(dialog.get_selected_option().map(String::as_str), Some("Nashik"));
        dialog.show("District", districts(), Some("Mumbai"));
        assert_eq!(dialog.get_selected_option().map(String::as_str), Some("Beed"));
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut dialog = OptionDialog::default();
        dialog.show("District", districts(), None);
        dialog.previous();
        assert_eq!(dialog.get_selected_option().map(String::as_str), Some("Beed"));
        for _ in 0..10 {
            dialog.next();
        }
        assert_eq!(dialog.get_selected_option().map(String::as_str), Some("Nagpur"));
        dialog.hide();
        assert!(!dialog.visible);
        assert!(dialog.get_selected_option().is_none());
    }

    #[test]
    fn test_empty_options_stay_hidden() {
        let mut dialog = OptionDialog::default();
        dialog.show("District", vec![], None);
        assert!(!dialog.visible);
        dialog.next();
        assert!(dialog.get_selected_option().is_none());
    }

    #[test]
    fn test_dialog_centered_in_area() {
        let mut dialog = OptionDialog::default();
        dialog.show("District", districts(), None);
        let area = dialog.dialog_area(Rect::new(0, 0, 120, 40));
        assert_eq!(area.width, 30);
        assert_eq!(area.height, 9);
        assert_eq!(area.x, 45);
        assert_eq!(area.y, 15);
        let small = dialog.dialog_area(Rect::new(0, 0, 20, 5));
        assert_eq!(small.width, 20);
        assert_eq!(small.height, 5);
    }
}
