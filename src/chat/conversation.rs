use crate::{model::Turn, prompt::ChatTexts};

/// 一个区县下的会话记录
///
/// 第一条永远是该区县的问候语；除了整体重置外只追加不修改。
/// 不做条数上限，记录长度随会话增长。
#[derive(Debug, Clone)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    texts: ChatTexts,
}

impl ConversationStore {
    pub fn new(region: &str, texts: ChatTexts) -> Self {
        let mut store = Self {
            turns: Vec::new(),
            texts,
        };
        store.reset(region);
        store
    }

    /// 丢弃全部记录，只保留新区县的问候语
    pub fn reset(&mut self, region: &str) {
        self.turns = vec![Turn::assistant(self.texts.greeting(region))];
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn fallback_message(&self) -> &str {
        &self.texts.fallback_message
    }
}
