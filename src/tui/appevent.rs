use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::Duration,
};

use log::{debug, error};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    prompt::QUICK_QUESTIONS,
    tui::{
        app::{App, View},
        appchat::AppChat,
    },
};

/// 事件处理器，负责处理键盘事件和事件监听
pub struct AppEvent;

impl AppEvent {
    /// 在独立线程中监听终端事件，转发到事件通道
    pub fn watch_events(tx: mpsc::Sender<Event>, should_exit: Arc<AtomicBool>) {
        while !should_exit.load(Ordering::Relaxed) {
            // poll 带超时，退出标记能及时生效
            match event::poll(Duration::from_millis(100)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    error!("Failed to poll event: {}", e);
                    break;
                }
            }
            match event::read() {
                Ok(ev @ (Event::Key(_) | Event::Resize(_, _))) => {
                    if let Err(e) = tx.send(ev) {
                        error!("Failed to send event: {}", e);
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read event: {}", e);
                    break;
                }
            }
        }
    }

    /// Esc 逐级返回：先关对话框，再结束对话，首页时退出
    fn back(app: &mut App) {
        if app.option_dialog.visible {
            app.option_dialog.hide();
        } else if app.view == View::Chat {
            app.end_chat();
        } else {
            app.should_exit.store(true, Ordering::Relaxed);
        }
    }

    /// 对话框打开时键盘只作用于对话框
    fn dialog_key(app: &mut App, code: KeyCode) {
        match code {
            KeyCode::Esc => app.option_dialog.hide(),
            KeyCode::Down => app.option_dialog.next(),
            KeyCode::Up => app.option_dialog.previous(),
            KeyCode::Enter => {
                let selected = app.option_dialog.get_selected_option().cloned();
                app.option_dialog.hide();
                if let Some(district) = selected {
                    app.change_district(&district);
                }
            }
            _ => {}
        }
    }

    /// 回车：首页开始对话，聊天页执行命令或提交问题
    fn confirm(app: &mut App) {
        match app.view {
            View::Landing if app.input.can_submit() => {
                let text = app.input.take();
                app.start_chat(Some(text));
            }
            View::Landing => {}
            View::Chat if app.input.content.trim_start().starts_with('/') => {
                let line = app.input.take();
                app.execute_command(&line);
            }
            // 等待回复时保留输入内容
            View::Chat if app.input.can_submit() => {
                let text = app.input.content.clone();
                match AppChat::submit(app, &text) {
                    Ok(()) => app.input.clear(),
                    Err(reason) => debug!("提交被拒绝: {:?}", reason),
                }
            }
            View::Chat => {}
        }
    }

    /// 首页的快捷提问
    fn quick_question(app: &mut App, idx: usize) {
        if app.view != View::Landing {
            return;
        }
        if let Some(question) = QUICK_QUESTIONS.get(idx) {
            app.input.clear();
            app.start_chat(Some(question.to_string()));
        }
    }

    pub fn handle_key(app: &mut App, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            app.should_exit.store(true, Ordering::Relaxed);
            return;
        }
        if app.option_dialog.visible {
            Self::dialog_key(app, key.code);
            return;
        }
        let page = app.window_height.max(1);
        match key.code {
            KeyCode::Esc => Self::back(app),
            KeyCode::Enter => Self::confirm(app),
            KeyCode::Down => app.scroll_down(1),
            KeyCode::Up => app.scroll_up(1),
            KeyCode::PageDown => app.scroll_down(page),
            KeyCode::PageUp => app.scroll_up(page),
            KeyCode::Left => app.input.move_left(),
            KeyCode::Right => app.input.move_right(),
            KeyCode::Backspace => app.input.backspace(),
            KeyCode::Delete => app.input.delete(),
            KeyCode::Tab if app.view == View::Landing => app.next_district(),
            KeyCode::F(2) => app.show_district_dialog(),
            KeyCode::F(n @ 5..=7) => Self::quick_question(app, usize::from(n - 5)),
            KeyCode::Char(c) => app.input.insert(c),
            _ => {}
        }
    }

    /// 处理所有已到达的终端事件
    pub fn handle_events(app: &mut App) {
        while let Ok(ev) = app.event_rx.try_recv() {
            app.dirty = true;
            if let Event::Key(key) = ev {
                Self::handle_key(app, key);
            }
        }
    }
}
