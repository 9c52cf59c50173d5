use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Widget},
};

use crate::{
    model::{Role, Turn},
    tui::get_char_width,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Turn(Role),
    /// 命令输出等界面提示，不属于会话记录
    Notice,
    /// 等待回复时的占位
    Pending,
}

/// 一条消息在界面上的显示块，按宽度预先折行
#[derive(Clone)]
pub struct MessageBlock {
    pub turn: Option<Turn>,
    pub kind: BlockKind,
    title: String,
    lines: Vec<Line<'static>>,
    pub line_count: usize,
    pub width: u16,
}

impl MessageBlock {
    pub fn from_turn(turn: &Turn, width: u16) -> Self {
        let title = format!(
            "{} · {}",
            turn.role().title(),
            turn.created_at().format("%H:%M")
        );
        let lines = match turn.role() {
            Role::User => wrap_text(turn.content(), Style::new().green(), inner_width(width)),
            Role::Assistant => render_markdown(turn.content(), inner_width(width)),
        };
        Self::build(Some(turn.clone()), BlockKind::Turn(turn.role()), title, lines, width)
    }

    pub fn notice(text: &str, width: u16) -> Self {
        let lines = wrap_text(text, Style::new().cyan(), inner_width(width));
        Self::build(None, BlockKind::Notice, "Info".into(), lines, width)
    }

    pub fn pending(width: u16) -> Self {
        let lines = wrap_text("● ● ●  विचार करत आहे... (thinking...)", Style::new().dark_gray(), inner_width(width));
        Self::build(None, BlockKind::Pending, Role::Assistant.title().into(), lines, width)
    }

    fn build(turn: Option<Turn>, kind: BlockKind, title: String, lines: Vec<Line<'static>>, width: u16) -> Self {
        // 上下边框各占一行
        let line_count = lines.len() + 2;
        Self {
            turn,
            kind,
            title,
            lines,
            line_count,
            width,
        }
    }

    fn border_style(&self) -> Style {
        match self.kind {
            BlockKind::Turn(Role::User) => Style::new().green(),
            BlockKind::Turn(Role::Assistant) | BlockKind::Pending => Style::new().light_blue(),
            BlockKind::Notice => Style::new().dark_gray(),
        }
    }

    /// 从第 start_line 行开始渲染，用于块的上半部分滚出窗口的情况
    pub fn render_block(&self, area: Rect, buf: &mut Buffer, start_line: usize) {
        let mut borders = Borders::LEFT | Borders::RIGHT;
        let mut scroll = 0;
        if start_line == 0 {
            borders |= Borders::TOP;
        } else {
            scroll = start_line - 1;
        }
        // 底部被截断时不画下边框，避免盖住内容
        if usize::from(area.height) >= self.line_count.saturating_sub(start_line) {
            borders |= Borders::BOTTOM;
        }
        let mut block = Block::default()
            .padding(Padding::ZERO)
            .style(self.border_style())
            .borders(borders);
        // 标题只在完整显示顶部时绘制，否则会额外占用一行
        if start_line == 0 {
            block = block.title(self.title.clone());
        }
        // 只取窗口内的行，行数可能超出 u16
        let visible: Vec<Line<'static>> = self
            .lines
            .iter()
            .skip(scroll)
            .take(usize::from(area.height))
            .cloned()
            .collect();
        Paragraph::new(visible)
            .block(block)
            .render(area, buf);
    }
}

impl Widget for &MessageBlock {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_block(area, buf, 0);
    }
}

fn inner_width(width: u16) -> u16 {
    width.saturating_sub(2).max(1)
}

/// 按显示宽度折行纯文本
pub fn wrap_text(text: &str, style: Style, width: u16) -> Vec<Line<'static>> {
    text.split('\n')
        .flat_map(|line| wrap_segments(vec![(line.to_string(), style)], width))
        .collect()
}

/// 简单的 markdown 显示：标题加粗、列表符号替换、`**` 包围的文字加粗
pub fn render_markdown(text: &str, width: u16) -> Vec<Line<'static>> {
    let base = Style::new().yellow();
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let trimmed = raw.trim_start();
        let segments = if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim_start();
            vec![(heading.to_string(), base.add_modifier(Modifier::BOLD).light_yellow())]
        } else if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            let indent = &raw[..raw.len() - trimmed.len()];
            let mut segs = vec![(format!("{}• ", indent), base)];
            segs.extend(bold_segments(item, base));
            segs
        } else {
            bold_segments(raw, base)
        };
        lines.extend(wrap_segments(segments, width));
    }
    lines
}

fn bold_segments(text: &str, base: Style) -> Vec<(String, Style)> {
    text.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            let style = if i % 2 == 1 {
                base.add_modifier(Modifier::BOLD)
            } else {
                base
            };
            (part.to_string(), style)
        })
        .collect()
}

fn wrap_segments(segments: Vec<(String, Style)>, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut width_count = 0;
    for (text, style) in segments {
        let mut buffer = String::new();
        for c in text.chars() {
            let char_width = get_char_width(c);
            if width_count + char_width > width && width_count > 0 {
                if !buffer.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut buffer), style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                width_count = 0;
            }
            buffer.push(c);
            width_count += char_width;
        }
        if !buffer.is_empty() {
            spans.push(Span::styled(buffer, style));
        }
    }
    lines.push(Line::from(spans));
    lines
}
