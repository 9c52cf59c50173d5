use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    chat::conversation::ConversationStore,
    connection::GatewayError,
    model::{Turn, param::ChatRequest},
    prompt::ChatTexts,
};

/// 会话请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EChatState {
    /// 没有进行中的请求
    Idle,
    /// 有一个请求在等待后端返回
    Awaiting,
}

/// 提交被拒绝的原因，都不算错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    Busy,
    SeedConsumed,
}

/// 一次提交的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 追加了后端的回复
    Answered,
    /// 请求失败，追加了兜底回复
    Fallback,
    /// 请求期间区县已切换，或者不是当前进行中的请求，结果被丢弃
    Discarded,
    Rejected(RejectReason),
}

/// 已发出、等待结果的请求
///
/// id 是会话内的请求序号，只有当前进行中的请求能结束等待。
/// epoch 记录发出时的区县代次，区县切换后旧请求的结果不再写入记录
#[derive(Debug)]
pub struct PendingTurn {
    id: u64,
    epoch: u64,
    pub request: ChatRequest,
}

/// 界面渲染用的只读快照
#[derive(Debug, Clone)]
pub struct ChatSnapshot {
    pub turns: Vec<Turn>,
    pub pending: bool,
    pub region: String,
}

/// Chat 状态管理
/// 负责会话记录、请求中标记、初始问题锁存和区县重置
#[derive(Debug)]
pub struct ChatState {
    session_id: Uuid,
    region: String,
    store: ConversationStore,
    state: EChatState,
    /// 初始问题是否已经提交过
    seed_consumed: bool,
    /// 区县代次，每次重置加一
    epoch: u64,
    /// 最近一次发出的请求序号
    last_request: u64,
    /// 进行中的请求序号
    in_flight: Option<u64>,
}

impl ChatState {
    pub fn new(region: &str, texts: ChatTexts) -> Self {
        let session_id = Uuid::new_v4();
        info!("创建会话 {} 区县 {}", session_id, region);
        Self {
            session_id,
            region: region.to_string(),
            store: ConversationStore::new(region, texts),
            state: EChatState::Idle,
            seed_consumed: false,
            epoch: 0,
            last_request: 0,
            in_flight: None,
        }
    }

    pub fn get_state(&self) -> EChatState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.get_state() == EChatState::Awaiting
    }

    pub fn is_seed_consumed(&self) -> bool {
        self.seed_consumed
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    /// 用户提交一条消息
    ///
    /// 校验通过后立即追加用户消息并进入等待状态，返回待发送的请求。
    /// 请求中的历史是追加之前的记录。
    pub fn begin_submit(&mut self, text: &str) -> Result<PendingTurn, RejectReason> {
        let text = text.trim();
        if text.is_empty() {
            debug!("忽略空消息");
            return Err(RejectReason::Empty);
        }
        if self.is_pending() {
            debug!("会话 {} 正忙碌，拒绝提交", self.session_id);
            return Err(RejectReason::Busy);
        }
        let request = ChatRequest::new(text, self.region.clone(), self.store.turns());
        self.store.append(Turn::user(text));
        self.state = EChatState::Awaiting;
        self.last_request += 1;
        self.in_flight = Some(self.last_request);
        info!(
            "会话 {} 提交消息，区县 {}，历史 {} 条",
            self.session_id,
            self.region,
            request.history.len()
        );
        Ok(PendingTurn {
            id: self.last_request,
            epoch: self.epoch,
            request,
        })
    }

    /// 提交外部传入的初始问题，同一会话（同一区县）只生效一次
    pub fn begin_seed(&mut self, text: &str) -> Result<PendingTurn, RejectReason> {
        if self.is_seed_consumed() {
            debug!("初始问题已提交过，忽略");
            return Err(RejectReason::SeedConsumed);
        }
        let pending = self.begin_submit(text)?;
        self.seed_consumed = true;
        Ok(pending)
    }

    /// 请求结束，写入回复或兜底回复并回到空闲
    ///
    /// 不是当前进行中请求的结果不改变任何状态
    pub fn complete(
        &mut self,
        pending: PendingTurn,
        result: Result<String, GatewayError>,
    ) -> SubmitOutcome {
        if !self.is_pending() || self.in_flight != Some(pending.id) {
            warn!(
                "会话 {} 收到未知请求 {} 的结果，当前进行中 {:?}，忽略",
                self.session_id, pending.id, self.in_flight
            );
            return SubmitOutcome::Discarded;
        }
        self.state = EChatState::Idle;
        self.in_flight = None;
        if pending.epoch != self.epoch {
            warn!(
                "会话 {} 区县已从 {} 切换到 {}，丢弃过期回复",
                self.session_id, pending.request.district, self.region
            );
            return SubmitOutcome::Discarded;
        }
        match result {
            Ok(text) => {
                self.store.append(Turn::assistant(text));
                debug!("会话 {} 共 {} 条消息", self.session_id, self.store.len());
                SubmitOutcome::Answered
            }
            Err(e) => {
                error!("会话 {} 请求失败: {}", self.session_id, e);
                let fallback = self.store.fallback_message().to_string();
                self.store.append(Turn::assistant(fallback));
                SubmitOutcome::Fallback
            }
        }
    }

    /// 切换区县：丢弃全部记录，重置初始问题锁存
    ///
    /// 区县相同时不做任何事，返回 false。进行中的请求不会被取消，
    /// 它返回后结果被丢弃。
    pub fn change_region(&mut self, region: &str) -> bool {
        if self.region == region {
            return false;
        }
        info!("会话 {} 区县 {} -> {}", self.session_id, self.region, region);
        self.region = region.to_string();
        self.store.reset(region);
        self.seed_consumed = false;
        self.epoch += 1;
        true
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            turns: self.store.snapshot(),
            pending: self.is_pending(),
            region: self.region.clone(),
        }
    }
}
