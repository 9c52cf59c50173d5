use std::sync::mpsc;

use log::debug;

use crate::{
    chat::{Chat, PendingTurn, RejectReason},
    tui::{
        app::{App, ETuiEvent},
        send_event,
    },
};

/// 聊天处理器，负责把提交交给后台任务
pub struct AppChat;

impl AppChat {
    /// 提交输入框内容
    ///
    /// 用户消息同步写入会话，界面立刻可以显示；请求在后台任务中完成，
    /// 结束后通过 ETuiEvent::ChatFinished 通知界面
    pub fn submit(app: &mut App, text: &str) -> Result<(), RejectReason> {
        let Some(chat) = app.chat.clone() else {
            debug!("首页没有会话，忽略提交");
            return Ok(());
        };
        let pending = chat.begin_submit(text)?;
        Self::spawn_resolve(chat, pending, app.tui_tx.clone());
        app.dirty = true;
        Ok(())
    }

    /// 提交首页带过来的初始问题
    pub fn deliver_seed(app: &mut App, text: &str) {
        let Some(chat) = app.chat.clone() else {
            return;
        };
        match chat.begin_seed(text) {
            Ok(pending) => Self::spawn_resolve(chat, pending, app.tui_tx.clone()),
            Err(reason) => debug!("初始问题未提交: {:?}", reason),
        }
    }

    fn spawn_resolve(chat: Chat, pending: PendingTurn, tx: mpsc::Sender<ETuiEvent>) {
        send_event(&tx, ETuiEvent::ScrollToBottom);
        tokio::spawn(async move {
            let outcome = chat.resolve(pending).await;
            send_event(&tx, ETuiEvent::ChatFinished(outcome));
        });
    }

    /// 后台拉取当前区县的侧边栏数据
    pub fn refresh_sidebar(app: &App) {
        let dashboard = app.dashboard.clone();
        let district = app.district.clone();
        let tx = app.tui_tx.clone();
        tokio::spawn(async move {
            let data = dashboard.sidebar(&district).await;
            send_event(&tx, ETuiEvent::Sidebar(district, data));
        });
    }
}
