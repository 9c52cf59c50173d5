use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Style, Stylize},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation},
};

use crate::tui::{
    app::{App, View},
    state_manager::StateManager,
    ui::landing::Landing,
};

/// 侧边栏宽度，终端太窄时不显示
const SIDEBAR_WIDTH: u16 = 34;
const SIDEBAR_MIN_TERMINAL_WIDTH: u16 = 80;

/// 渲染器，负责处理应用程序界面的渲染逻辑
pub struct Renderer;

impl Renderer {
    pub fn render(app: &mut App, frame: &mut Frame<'_>) {
        match app.view {
            View::Landing => Self::render_landing(app, frame),
            View::Chat => Self::render_chat(app, frame),
        }
        if app.option_dialog.visible {
            frame.render_widget(&app.option_dialog, frame.area());
        }
    }

    fn render_landing(app: &mut App, frame: &mut Frame<'_>) {
        let area = frame.area();
        let landing = Landing {
            district: &app.district,
            input: &app.input,
        };
        frame.render_widget(&landing, area);
        Self::set_cursor(app, frame, Landing::input_area(area));
    }

    /// 聊天页：顶部标题栏，左侧消息和输入框，右侧信息栏
    ///
    /// 根据当前滚动位置和窗口大小计算需要显示的消息块，
    /// 上半部分被滚出窗口的块只显示剩余部分
    fn render_chat(app: &mut App, frame: &mut Frame<'_>) {
        let [header, body] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(frame.area());
        Self::render_header(app, frame, header);

        let (main, sidebar) = if body.width >= SIDEBAR_MIN_TERMINAL_WIDTH {
            let [main, sidebar] =
                Layout::horizontal([Constraint::Fill(1), Constraint::Length(SIDEBAR_WIDTH)]).areas(body);
            (main, Some(sidebar))
        } else {
            (body, None)
        };

        let [mut area, input_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(app.input.height())]).areas(main);
        // 最右一列留给滚动条
        let mut scroll_area = area;
        scroll_area.x = area.x + area.width.saturating_sub(1);
        scroll_area.width = 1;
        area.width = area.width.saturating_sub(1);
        app.width = area.width;
        app.window_height = usize::from(area.height);
        StateManager::refresh(app);

        let st = app.index;
        let bottom = area.y + area.height;
        let mut y = area.y;
        let mut block_start_line = 0usize;
        for blk in app.blocks.iter() {
            let block_end_line = block_start_line + blk.line_count;
            if block_end_line > st {
                let skip = st.saturating_sub(block_start_line);
                // 剩余窗口高度不超过 u16，取较小值后可以安全转换
                let height = (blk.line_count - skip).min(usize::from(bottom - y)) as u16;
                let blk_area = Rect { y, height, ..area };
                blk.render_block(blk_area, frame.buffer_mut(), skip);
                y += height;
                if y >= bottom {
                    break;
                }
            }
            block_start_line = block_end_line;
        }

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .begin_symbol(None)
                .end_symbol(None),
            scroll_area,
            &mut app.vertical_scroll_state,
        );
        frame.render_widget(&app.input, input_area);
        Self::set_cursor(app, frame, input_area);

        if let Some(sidebar_area) = sidebar {
            frame.render_widget(&app.sidebar, sidebar_area);
        }
    }

    fn render_header(app: &App, frame: &mut Frame<'_>, area: Rect) {
        let header = Line::from(vec![
            Span::styled(" AI Krishi Sahayak", Style::new().light_green().bold()),
            Span::raw(" — "),
            Span::styled("Online", Style::new().green()),
            Span::raw(" • "),
            Span::styled(app.district.clone(), Style::new().light_yellow()),
            Span::styled("   Esc: end chat  F2: district  /help", Style::new().dark_gray()),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn set_cursor(app: &App, frame: &mut Frame<'_>, input_area: Rect) {
        if app.input.disabled || app.option_dialog.visible {
            return;
        }
        let inner_width = input_area.width.saturating_sub(2).max(1);
        let column = app.input.cursor_column(inner_width).min(inner_width - 1);
        frame.set_cursor_position(Position::new(input_area.x + 1 + column, input_area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::{
        chat::tests::ScriptedGateway,
        client::DashboardClient,
        config::Config,
        connection::DirectConnection,
    };

    fn app() -> App {
        let dashboard =
            DashboardClient::new(DirectConnection::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap());
        App::with_clients(Config::default(), ScriptedGateway::new(vec![]), dashboard)
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn test_render_chat_view() {
        let mut app = app();
        app.start_chat(None);
        app.chat.clone().unwrap().submit("Soybean drought help").await;
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| Renderer::render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Online"));
        assert!(text.contains("Beed"));
        assert!(text.contains("Soybean drought help"));
        assert!(text.contains("Market Trends"));
        assert!(text.contains("Loading prices..."));
    }

    #[tokio::test]
    async fn test_render_scrolled_history_in_small_terminal() {
        let mut app = app();
        app.start_chat(None);
        let chat = app.chat.clone().unwrap();
        for i in 0..6 {
            chat.submit(&format!("question {}", i)).await;
        }
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| Renderer::render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        // 跟随到底部，最后一条回复可见，侧边栏不显示
        assert!(text.contains("answer to question 5"));
        assert!(!text.contains("Market Trends"));
    }

    #[tokio::test]
    async fn test_render_bottom_of_very_long_answer() {
        let long_answer: String = (0..70_000).map(|i| format!("line {}\n", i)).collect::<String>() + "last line";
        let dashboard =
            DashboardClient::new(DirectConnection::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap());
        let mut app = App::with_clients(
            Config::default(),
            ScriptedGateway::new(vec![Ok(long_answer.as_str())]),
            dashboard,
        );
        app.start_chat(None);
        app.chat.clone().unwrap().submit("q").await;
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| Renderer::render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("last line"));
        assert!(text.contains("line 69999"));
    }

    #[tokio::test]
    async fn test_render_landing_with_dialog() {
        let mut app = app();
        app.show_district_dialog();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| Renderer::render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Nagpur"));
        assert!(text.contains("Select District"));
    }
}
