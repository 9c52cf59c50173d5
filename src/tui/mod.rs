use std::sync::mpsc;

use log::error;

use crate::{config::Config, tui::app::{App, ETuiEvent}};

mod app;
mod appchat;
mod appevent;
mod commands;
mod renderer;
mod state_manager;
mod ui;

/// 启动终端界面，seed 不为空时直接进入对话并提交该问题
pub async fn run(config: Config, seed: Option<String>) -> color_eyre::Result<()> {
    color_eyre::install()?;
    // 先创建 App，失败时终端还没进入备用屏幕
    let app = App::new(config)?;
    let term = ratatui::init();
    let res = app.run(term, seed).await;
    ratatui::restore();
    res?;
    Ok(())
}

pub fn get_char_width(c: char) -> u16 {
    unicode_width::UnicodeWidthChar::width(c).unwrap_or(1) as u16
}

/// 字符串显示宽度，超出 u16 时取最大值
pub fn get_str_width(s: &str) -> u16 {
    s.chars().fold(0, |width, c| width.saturating_add(get_char_width(c)))
}

/// 向界面发送事件，界面已退出时只记录日志
pub fn send_event(tx: &mpsc::Sender<ETuiEvent>, event: ETuiEvent) {
    if let Err(e) = tx.send(event) {
        error!("发送界面事件失败: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_width_counts_wide_chars() {
        assert_eq!(get_str_width("Beed"), 4);
        assert_eq!(get_str_width("中文"), 4);
    }

    #[tokio::test]
    async fn test_bad_backend_url_fails_before_terminal_setup() {
        let config = Config {
            base_url: "backend:8000".into(),
            ..Config::default()
        };
        assert!(App::new(config.clone()).is_err());
        let err = run(config, None).await.unwrap_err();
        assert!(err.to_string().contains("backend:8000"));
    }

    #[test]
    fn test_str_width_saturates_on_huge_paste() {
        let pasted = "中".repeat(40_000);
        assert_eq!(get_str_width(&pasted), u16::MAX);
    }
}
