use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::ChatGateway;
use crate::prompt::ChatTexts;

pub mod chat_state;
pub mod conversation;

pub use chat_state::{ChatSnapshot, ChatState, PendingTurn, RejectReason, SubmitOutcome};

/// 会话控制器
///
/// 持有会话状态和后端对话服务，界面只通过它提交消息、切换区县、读取快照。
/// 克隆后共享同一个会话。
#[derive(Clone)]
pub struct Chat {
    state: Arc<Mutex<ChatState>>,
    gateway: Arc<dyn ChatGateway>,
}

impl Chat {
    pub fn new(region: &str, gateway: Arc<dyn ChatGateway>, texts: ChatTexts) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::new(region, texts))),
            gateway,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 提交用户输入并等待结果
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        match self.begin_submit(text) {
            Ok(pending) => self.resolve(pending).await,
            Err(reason) => SubmitOutcome::Rejected(reason),
        }
    }

    /// 提交初始问题，同一区县下重复投递不生效
    pub async fn deliver_seed(&self, text: &str) -> SubmitOutcome {
        match self.begin_seed(text) {
            Ok(pending) => self.resolve(pending).await,
            Err(reason) => SubmitOutcome::Rejected(reason),
        }
    }

    /// 同步阶段：校验并追加用户消息，界面可以立刻刷新
    pub fn begin_submit(&self, text: &str) -> Result<PendingTurn, RejectReason> {
        self.lock().begin_submit(text)
    }

    pub fn begin_seed(&self, text: &str) -> Result<PendingTurn, RejectReason> {
        self.lock().begin_seed(text)
    }

    /// 异步阶段：调用后端并写入结果，等待期间不持有锁
    pub async fn resolve(&self, pending: PendingTurn) -> SubmitOutcome {
        let result = self.gateway.chat(&pending.request).await;
        self.lock().complete(pending, result)
    }

    pub fn change_region(&self, region: &str) -> bool {
        self.lock().change_region(region)
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.lock().snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    pub fn region(&self) -> String {
        self.lock().region().to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::{Mutex as AsyncMutex, mpsc};

    use super::*;
    use crate::{
        connection::GatewayError,
        model::{Role, param::ChatRequest},
        prompt::DEFAULT_FALLBACK_MESSAGE,
    };

    /// 按顺序返回预设结果的对话服务，记录收到的请求
    pub(crate) struct ScriptedGateway {
        replies: std::sync::Mutex<Vec<Result<String, String>>>,
        pub requests: std::sync::Mutex<Vec<ChatRequest>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedGateway {
        pub(crate) fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                requests: std::sync::Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            match self.replies.lock().unwrap().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(GatewayError::Protocol(e)),
                None => Ok(format!("answer to {}", request.message)),
            }
        }
    }

    /// 由测试手动放行的对话服务，用来模拟请求进行中
    struct GatedGateway {
        started: mpsc::UnboundedSender<ChatRequest>,
        release: AsyncMutex<mpsc::UnboundedReceiver<Result<String, String>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatGateway for GatedGateway {
        async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.send(request.clone()).unwrap();
            match self.release.lock().await.recv().await {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(GatewayError::Protocol(e)),
                None => Err(GatewayError::Protocol("closed".into())),
            }
        }
    }

    fn chat_with(gateway: Arc<dyn ChatGateway>) -> Chat {
        Chat::new("Beed", gateway, ChatTexts::default())
    }

    #[tokio::test]
    async fn test_scenario_a_single_exchange() {
        let gateway = ScriptedGateway::new(vec![Ok("Use mulching and protective irrigation.")]);
        let chat = chat_with(gateway.clone());
        let outcome = chat.submit("Soybean drought help").await;
        assert_eq!(outcome, SubmitOutcome::Answered);

        let snap = chat.snapshot();
        assert_eq!(snap.turns.len(), 3);
        assert!(snap.turns[0].content().contains("Beed"));
        assert_eq!(snap.turns[1].role(), Role::User);
        assert_eq!(snap.turns[1].content(), "Soybean drought help");
        assert_eq!(snap.turns[2].role(), Role::Assistant);
        assert_eq!(snap.turns[2].content(), "Use mulching and protective irrigation.");
        assert!(!snap.pending);

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].district, "Beed");
        assert_eq!(requests[0].history.len(), 1);
        assert_eq!(requests[0].history[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_turn_count_grows_two_per_submission() {
        let gateway = ScriptedGateway::new(vec![]);
        let chat = chat_with(gateway.clone());
        for n in 1..=6 {
            chat.submit(&format!("question {}", n)).await;
            assert_eq!(chat.snapshot().turns.len(), 1 + 2 * n);
        }
        // 每次请求的历史都是提交前的完整记录
        let requests = gateway.requests.lock().unwrap();
        for (i, req) in requests.iter().enumerate() {
            assert_eq!(req.history.len(), 1 + 2 * i);
        }
    }

    #[tokio::test]
    async fn test_scenario_b_region_change_discards_history() {
        let chat = chat_with(ScriptedGateway::new(vec![]));
        chat.submit("Soybean drought help").await;
        assert_eq!(chat.snapshot().turns.len(), 3);
        assert!(chat.change_region("Latur"));
        let snap = chat.snapshot();
        assert_eq!(snap.turns.len(), 1);
        assert!(snap.turns[0].content().contains("Latur"));
        assert_eq!(snap.region, "Latur");
    }

    #[tokio::test]
    async fn test_scenario_c_failure_appends_fallback() {
        let chat = chat_with(ScriptedGateway::new(vec![Err("connection reset")]));
        let outcome = chat.submit("Cotton pest control").await;
        assert_eq!(outcome, SubmitOutcome::Fallback);
        let snap = chat.snapshot();
        assert_eq!(snap.turns.len(), 3);
        assert_eq!(snap.turns.last().unwrap().content(), DEFAULT_FALLBACK_MESSAGE);
        assert!(!snap.pending);

        // 失败后会话仍然可用
        assert_eq!(chat.submit("again").await, SubmitOutcome::Answered);
        assert_eq!(chat.snapshot().turns.len(), 5);
    }

    #[tokio::test]
    async fn test_custom_fallback_text() {
        let texts = ChatTexts {
            fallback_message: "Try later".into(),
            ..Default::default()
        };
        let chat = Chat::new("Pune", ScriptedGateway::new(vec![Err("x")]), texts);
        chat.submit("q").await;
        assert_eq!(chat.snapshot().turns[2].content(), "Try later");
    }

    #[tokio::test]
    async fn test_seed_delivered_twice_submits_once() {
        let gateway = ScriptedGateway::new(vec![]);
        let chat = chat_with(gateway.clone());
        assert_eq!(chat.deliver_seed("Tur irrigation").await, SubmitOutcome::Answered);
        assert_eq!(
            chat.deliver_seed("Tur irrigation").await,
            SubmitOutcome::Rejected(RejectReason::SeedConsumed)
        );
        assert_eq!(chat.snapshot().turns.len(), 3);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        // 切换区县后锁存复位
        chat.change_region("Nashik");
        assert_eq!(chat.deliver_seed("Tur irrigation").await, SubmitOutcome::Answered);
        assert_eq!(chat.snapshot().turns.len(), 3);
    }

    #[tokio::test]
    async fn test_blank_input_is_silent() {
        let gateway = ScriptedGateway::new(vec![]);
        let chat = chat_with(gateway.clone());
        assert_eq!(chat.submit("   ").await, SubmitOutcome::Rejected(RejectReason::Empty));
        assert_eq!(chat.snapshot().turns.len(), 1);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    fn gated() -> (
        Arc<GatedGateway>,
        mpsc::UnboundedReceiver<ChatRequest>,
        mpsc::UnboundedSender<Result<String, String>>,
    ) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let (release_tx, release_rx) = mpsc::unbounded_channel();
        let gateway = Arc::new(GatedGateway {
            started: started_tx,
            release: AsyncMutex::new(release_rx),
            calls: AtomicUsize::new(0),
        });
        (gateway, started_rx, release_tx)
    }

    #[tokio::test]
    async fn test_pending_exclusivity() {
        let gateway = ScriptedGateway::new(vec![]);
        let chat = chat_with(gateway.clone());
        let pending = chat.begin_submit("first").unwrap();
        assert!(chat.is_pending());

        assert_eq!(chat.submit("second").await, SubmitOutcome::Rejected(RejectReason::Busy));
        assert_eq!(chat.snapshot().turns.len(), 2);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);

        assert_eq!(chat.resolve(pending).await, SubmitOutcome::Answered);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(chat.snapshot().turns.len(), 3);
        assert!(!chat.is_pending());
    }

    #[tokio::test]
    async fn test_stale_reply_after_region_change_is_dropped() {
        let (gateway, mut started, release) = gated();
        let chat = chat_with(gateway.clone());

        let task = {
            let chat = chat.clone();
            tokio::spawn(async move { chat.submit("Beed soil question").await })
        };
        let request = started.recv().await.unwrap();
        assert_eq!(request.district, "Beed");

        // 请求进行中切换区县，立即生效
        chat.change_region("Latur");
        let snap = chat.snapshot();
        assert_eq!(snap.turns.len(), 1);
        assert!(snap.pending);

        // 等待中的请求仍然阻止新的提交
        assert_eq!(chat.submit("Latur question").await, SubmitOutcome::Rejected(RejectReason::Busy));

        release.send(Ok("Beed answer".into())).unwrap();
        let outcome = task.await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Discarded);

        let snap = chat.snapshot();
        assert_eq!(snap.turns.len(), 1);
        assert!(snap.turns[0].content().contains("Latur"));
        assert!(!snap.pending);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }
}
