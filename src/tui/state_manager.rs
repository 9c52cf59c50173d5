use log::debug;

use crate::{
    model::Turn,
    tui::{app::App, ui::messageblock::MessageBlock},
};

/// 状态管理器，负责把会话快照转换成显示块
pub struct StateManager;

impl StateManager {
    /// 刷新显示状态
    ///
    /// 1. 读取会话快照
    /// 2. 增量更新消息块
    /// 3. 按插入位置合并界面提示，等待中追加占位块
    /// 4. 计算总行数并更新滚动条
    pub fn refresh(app: &mut App) {
        debug!("refresh");
        let Some(chat) = app.chat.clone() else {
            app.turn_blocks.clear();
            app.blocks.clear();
            app.max_line = 0;
            return;
        };
        let snapshot = chat.snapshot();
        app.input.disabled = snapshot.pending;

        Self::update_blocks_incremental(app, &snapshot.turns);
        Self::compose_blocks(app, snapshot.turns.len(), snapshot.pending);
        Self::update_scrollbar_state(app);
    }

    /// 增量更新消息块
    ///
    /// 找到第一个和快照不一致的块，从那里开始重建；宽度变化时全部重建
    fn update_blocks_incremental(app: &mut App, turns: &[Turn]) {
        let width = app.width;
        if app.turn_blocks.first().is_some_and(|b| b.width != width) {
            app.turn_blocks.clear();
        }
        let first_diff = app
            .turn_blocks
            .iter()
            .zip(turns)
            .position(|(block, turn)| block.turn.as_ref() != Some(turn))
            .unwrap_or(app.turn_blocks.len().min(turns.len()));
        app.turn_blocks.truncate(first_diff);
        for turn in &turns[first_diff..] {
            app.turn_blocks.push(MessageBlock::from_turn(turn, width));
        }
    }

    fn compose_blocks(app: &mut App, turn_count: usize, pending: bool) {
        let width = app.width;
        let mut blocks = Vec::with_capacity(app.turn_blocks.len() + app.info_messages.len() + 1);
        let mut notices = app.info_messages.iter().peekable();
        for (idx, block) in app.turn_blocks.iter().enumerate() {
            blocks.push(block.clone());
            while let Some((_, text)) = notices.next_if(|(pos, _)| *pos <= idx + 1) {
                blocks.push(MessageBlock::notice(text, width));
            }
        }
        // 位置超出当前记录的提示放在最后
        for (_, text) in notices {
            blocks.push(MessageBlock::notice(text, width));
        }
        if pending {
            blocks.push(MessageBlock::pending(width));
        }
        debug!("{} 条消息，{} 个显示块", turn_count, blocks.len());
        app.max_line = blocks.iter().map(|b| b.line_count).sum();
        app.blocks = blocks;
    }

    /// 更新滚动条状态，跟随模式下滚到底部
    pub fn update_scrollbar_state(app: &mut App) {
        let max_index = app.max_line.saturating_sub(app.window_height);
        if app.follow || app.index > max_index {
            app.index = max_index;
        }
        app.vertical_scroll_state = app
            .vertical_scroll_state
            .content_length(max_index.max(1))
            .position(app.index);
    }
}
