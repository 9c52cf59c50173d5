use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::Duration,
};

use log::{debug, info};
use ratatui::{
    DefaultTerminal,
    crossterm::event::Event,
    widgets::ScrollbarState,
};

use crate::{
    chat::{Chat, SubmitOutcome},
    client::{ChatGateway, DashboardClient, HttpChatGateway, SidebarData},
    config::Config,
    connection::{DirectConnection, GatewayError},
    tui::{
        appchat::AppChat,
        appevent::AppEvent,
        commands,
        renderer::Renderer,
        ui::{inputarea::InputArea, messageblock::MessageBlock, option_dialog::OptionDialog, sidebar::Sidebar},
    },
};

/// 后台任务发回界面的事件
#[derive(Debug)]
pub enum ETuiEvent {
    ScrollToBottom,
    /// 一次提交结束
    ChatFinished(SubmitOutcome),
    /// 侧边栏数据，附带请求时的区县
    Sidebar(String, SidebarData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Chat,
}

pub struct App {
    pub config: Config,
    gateway: Arc<dyn ChatGateway>,
    pub dashboard: DashboardClient,
    pub district: String,
    pub view: View,
    /// 只在聊天页存在，结束对话时销毁
    pub chat: Option<Chat>,
    pub should_exit: Arc<AtomicBool>,
    pub index: usize,
    /// 有新内容时自动滚到底部
    pub follow: bool,
    pub input: InputArea,
    pub window_height: usize,
    pub turn_blocks: Vec<MessageBlock>,
    pub blocks: Vec<MessageBlock>,
    /// 界面提示，记录插入时的消息数量
    pub info_messages: Vec<(usize, String)>,
    pub sidebar: Sidebar,
    pub option_dialog: OptionDialog,
    pub width: u16,
    pub max_line: usize,
    pub vertical_scroll_state: ScrollbarState,
    pub dirty: bool,
    event_tx: mpsc::Sender<Event>,
    pub event_rx: mpsc::Receiver<Event>,
    pub tui_tx: mpsc::Sender<ETuiEvent>,
    tui_rx: mpsc::Receiver<ETuiEvent>,
}

impl App {
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let connection = DirectConnection::new(&config.base_url, config.request_timeout())?;
        let gateway = Arc::new(HttpChatGateway::new(connection.clone()));
        let dashboard = DashboardClient::new(connection);
        Ok(Self::with_clients(config, gateway, dashboard))
    }

    pub fn with_clients(config: Config, gateway: Arc<dyn ChatGateway>, dashboard: DashboardClient) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let (tui_tx, tui_rx) = mpsc::channel();
        let district = config.default_district.clone();
        let sidebar = Sidebar::new(&district, &config.subsidy_tip);
        Self {
            config,
            gateway,
            dashboard,
            district,
            view: View::Landing,
            chat: None,
            should_exit: Arc::new(AtomicBool::new(false)),
            index: 0,
            follow: true,
            input: InputArea::default(),
            window_height: 20,
            turn_blocks: vec![],
            blocks: vec![],
            info_messages: vec![],
            sidebar,
            option_dialog: OptionDialog::default(),
            width: 20,
            max_line: 0,
            vertical_scroll_state: ScrollbarState::new(1),
            dirty: true,
            event_tx,
            event_rx,
            tui_tx,
            tui_rx,
        }
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal, seed: Option<String>) -> color_eyre::Result<()> {
        let tx = self.event_tx.clone();
        let should_exit = self.should_exit.clone();
        std::thread::spawn(move || AppEvent::watch_events(tx, should_exit));

        if let Some(seed) = seed {
            self.start_chat(Some(seed));
        }
        while !self.should_exit.load(Ordering::Relaxed) {
            self.handle_tui_events();
            AppEvent::handle_events(&mut self);
            if self.dirty {
                terminal.draw(|frame| Renderer::render(&mut self, frame))?;
                self.dirty = false;
            }
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
        Ok(())
    }

    /// 处理后台任务发来的事件
    pub fn handle_tui_events(&mut self) {
        while let Ok(event) = self.tui_rx.try_recv() {
            self.dirty = true;
            match event {
                ETuiEvent::ScrollToBottom => self.follow = true,
                ETuiEvent::ChatFinished(outcome) => {
                    debug!("提交结束: {:?}", outcome);
                    self.follow = true;
                }
                ETuiEvent::Sidebar(district, data) => {
                    if !self.sidebar.update(&district, data) {
                        debug!("忽略区县 {} 的旧侧边栏数据", district);
                    }
                }
            }
        }
    }

    /// 离开首页，创建会话并提交初始问题
    pub fn start_chat(&mut self, seed: Option<String>) {
        info!("开始对话，区县 {}", self.district);
        let chat = Chat::new(&self.district, self.gateway.clone(), self.config.chat_texts());
        self.chat = Some(chat);
        self.view = View::Chat;
        self.reset_view();
        self.sidebar.loading(&self.district);
        AppChat::refresh_sidebar(self);
        if let Some(seed) = seed {
            AppChat::deliver_seed(self, &seed);
        }
        self.dirty = true;
    }

    /// 结束对话回到首页，会话记录随之丢弃
    pub fn end_chat(&mut self) {
        if self.chat.take().is_some() {
            info!("结束对话，返回首页");
        }
        self.view = View::Landing;
        self.reset_view();
        self.input.disabled = false;
        self.dirty = true;
    }

    fn reset_view(&mut self) {
        self.turn_blocks.clear();
        self.blocks.clear();
        self.info_messages.clear();
        self.max_line = 0;
        self.index = 0;
        self.follow = true;
        self.input.clear();
    }

    /// 切换区县，名字不在配置列表里时返回 false
    ///
    /// 聊天页中切换会重置整个会话
    pub fn change_district(&mut self, name: &str) -> bool {
        let Some(district) = self.config.find_district(name).map(str::to_string) else {
            self.add_info_message(&format!("Unknown district: {}", name.trim()));
            return false;
        };
        self.district = district.clone();
        let reset = self
            .chat
            .as_ref()
            .map(|chat| chat.change_region(&district))
            .unwrap_or(false);
        if reset {
            self.turn_blocks.clear();
            self.info_messages.clear();
            self.index = 0;
            self.follow = true;
            self.sidebar.loading(&district);
            AppChat::refresh_sidebar(self);
        }
        self.dirty = true;
        true
    }

    /// 首页按顺序切换到下一个区县
    pub fn next_district(&mut self) {
        let districts = &self.config.districts;
        let idx = districts
            .iter()
            .position(|d| d == &self.district)
            .map(|i| (i + 1) % districts.len())
            .unwrap_or(0);
        if let Some(next) = districts.get(idx).cloned() {
            self.change_district(&next);
        }
    }

    pub fn show_district_dialog(&mut self) {
        self.option_dialog.show(
            "जिल्हा निवडा (Select District)",
            self.config.districts.clone(),
            Some(self.district.as_str()),
        );
        self.dirty = true;
    }

    /// 聊天页的提示信息，位置跟在当前最后一条消息之后
    pub fn add_info_message(&mut self, text: &str) {
        let position = self
            .chat
            .as_ref()
            .map(|c| c.snapshot().turns.len())
            .unwrap_or(0);
        self.info_messages.push((position, text.to_string()));
        self.follow = true;
        self.dirty = true;
    }

    /// 执行斜杠命令，返回是否找到命令
    pub fn execute_command(&mut self, line: &str) -> bool {
        let line = line.trim().trim_start_matches('/');
        let (name, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match commands::find(name) {
            Some(cmd) => cmd.execute(self, args.trim()),
            None => {
                self.add_info_message(&format!("Unknown command /{}, try /help", name));
                false
            }
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_index = self.max_line.saturating_sub(self.window_height);
        self.index = self.index.saturating_add(lines).min(max_index);
        self.follow = self.index == max_index;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.index = self.index.saturating_sub(lines);
        self.follow = false;
    }
}
