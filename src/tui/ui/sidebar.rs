use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::client::SidebarData;

/// 聊天页右侧的信息栏
#[derive(Clone, Default)]
pub struct Sidebar {
    pub district: String,
    /// None 表示数据还在加载
    pub data: Option<SidebarData>,
    /// 配置中的默认补贴提示，后端没有方案时显示
    pub subsidy_tip: String,
}

impl Sidebar {
    pub fn new(district: &str, subsidy_tip: &str) -> Self {
        Self {
            district: district.to_string(),
            data: None,
            subsidy_tip: subsidy_tip.to_string(),
        }
    }

    /// 切换区县后重新进入加载状态
    pub fn loading(&mut self, district: &str) {
        self.district = district.to_string();
        self.data = None;
    }

    /// 只接收当前区县的数据，旧请求的结果忽略
    pub fn update(&mut self, district: &str, data: SidebarData) -> bool {
        if self.district != district {
            return false;
        }
        self.data = Some(data);
        true
    }

    fn weather_lines(&self) -> Vec<Line<'static>> {
        match &self.data {
            None => vec![Line::from("Loading...".dark_gray())],
            Some(SidebarData { weather: Some(w), .. }) => vec![
                Line::from(Span::styled(
                    format!("{:.0}°C", w.temp),
                    Style::new().light_yellow().add_modifier(Modifier::BOLD),
                )),
                Line::from(w.weather.clone()),
                Line::from(Span::styled(
                    w.city.clone().unwrap_or_else(|| self.district.clone()),
                    Style::new().dark_gray(),
                )),
            ],
            Some(_) => vec![Line::from("Weather unavailable".dark_gray())],
        }
    }

    fn subsidy_lines(&self) -> Vec<Line<'static>> {
        let scheme = self.data.as_ref().and_then(|d| d.schemes.first());
        match scheme {
            Some(s) => vec![
                Line::from(Span::styled(s.name.clone(), Style::new().bold())),
                Line::from(s.benefit.clone()),
            ],
            None => vec![Line::from(self.subsidy_tip.clone())],
        }
    }

    fn price_lines(&self) -> Vec<Line<'static>> {
        match &self.data {
            None => vec![Line::from("Loading prices...".dark_gray())],
            Some(data) if data.prices.is_empty() => {
                vec![Line::from("Prices unavailable".dark_gray())]
            }
            Some(data) => data
                .prices
                .iter()
                .map(|p| {
                    let change_style = if p.change.starts_with('-') {
                        Style::new().red()
                    } else {
                        Style::new().green()
                    };
                    Line::from(vec![
                        Span::raw(format!("{:<10}", p.commodity)),
                        Span::raw(format!(" ₹{:.0} ", p.price)),
                        Span::styled(p.change.clone(), change_style),
                    ])
                })
                .collect(),
        }
    }
}

fn section(title: &'static str, lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::new().light_green()),
        )
        .render(area, buf);
}

impl Widget for &Sidebar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let price_count = self.data.as_ref().map(|d| d.prices.len()).unwrap_or(1).max(1) as u16;
        let [weather, subsidy, prices] = Layout::vertical([
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Min(price_count.min(10) + 2),
        ])
        .areas(area);
        section(" Weather ", self.weather_lines(), weather, buf);
        section(" Subsidy Suggestion ", self.subsidy_lines(), subsidy, buf);
        section(" Market Trends ", self.price_lines(), prices, buf);
    }
}
