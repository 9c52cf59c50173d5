use ratatui::{
    style::{Style, Stylize},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::tui::get_char_width;

const IDLE_TITLE: &str = "विचार करा... (Type your question...)";
const WAITING_TITLE: &str = "उत्तराची वाट पाहत आहे... (Waiting for answer...)";

/// 单行输入框，光标按字符计数
#[derive(Clone, Default)]
pub struct InputArea {
    pub content: String,
    /// 光标前的字符数
    cursor: usize,
    /// 等待回复期间禁止提交
    pub disabled: bool,
}

impl InputArea {
    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map_or(self.content.len(), |(idx, _)| idx)
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index();
        self.content.insert(idx, c);
        self.cursor += 1;
    }

    /// 删除光标前的字符
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index();
        self.content.remove(idx);
    }

    /// 删除光标处的字符
    pub fn delete(&mut self) {
        if self.cursor < self.content.chars().count() {
            let idx = self.byte_index();
            self.content.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.content.chars().count());
    }

    /// 光标之前内容的显示宽度
    pub fn cursor_width(&self) -> usize {
        self.content
            .chars()
            .take(self.cursor)
            .map(|c| usize::from(get_char_width(c)))
            .sum()
    }

    pub fn height(&self) -> u16 {
        3
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// 取出输入内容并清空
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    /// 可以提交：未禁用且内容非空白
    pub fn can_submit(&self) -> bool {
        !self.disabled && !self.content.trim().is_empty()
    }

    /// 超出框宽时左侧隐藏的字符数和宽度，保证光标可见
    fn hidden_prefix(&self, inner_width: u16) -> (usize, usize) {
        let total = self.cursor_width();
        let mut skip = 0;
        let mut hidden = 0;
        for c in self.content.chars().take(self.cursor) {
            if total - hidden < usize::from(inner_width) {
                break;
            }
            hidden += usize::from(get_char_width(c));
            skip += 1;
        }
        (skip, hidden)
    }

    fn visible_content(&self, inner_width: u16) -> String {
        let (skip, _) = self.hidden_prefix(inner_width);
        self.content.chars().skip(skip).collect()
    }

    /// 光标相对输入框内部的列
    pub fn cursor_column(&self, inner_width: u16) -> u16 {
        let (_, hidden) = self.hidden_prefix(inner_width);
        // 隐藏前缀后剩余宽度小于 inner_width
        (self.cursor_width() - hidden).min(usize::from(inner_width)) as u16
    }
}

impl Widget for &InputArea {
    fn render(self, area: ratatui::prelude::Rect, buf: &mut ratatui::prelude::Buffer) {
        let (title, style) = if self.disabled {
            (WAITING_TITLE, Style::new().dark_gray())
        } else {
            (IDLE_TITLE, Style::new().green())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::new().light_blue());
        Paragraph::new(self.visible_content(area.width.saturating_sub(2)))
            .style(style)
            .block(block)
            .render(area, buf);
    }
}
