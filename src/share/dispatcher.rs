//! 分享分发器 - 管理多个渠道并将 payload 发送到每个已配置的渠道

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use super::content_type::ContentType;
use super::destination::{Destination, SendResult};
use super::payload::ContentPayload;

/// 单次分发的结果（按渠道注册顺序）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub results: Vec<(String, SendResult)>,
}

impl DispatchReport {
    /// 指定渠道的结果
    pub fn get(&self, destination_id: &str) -> Option<&SendResult> {
        self.results
            .iter()
            .find(|(id, _)| id == destination_id)
            .map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn sent_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_sent()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, SendResult::Failed(_)))
            .count()
    }
}

/// 分发结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// 未分享（不符合资格或内容不存在），没有调用任何渠道
    NotShared { reason: String },
    /// 已分发
    Dispatched(DispatchReport),
}

impl DispatchOutcome {
    pub fn not_shared(reason: impl Into<String>) -> Self {
        DispatchOutcome::NotShared {
            reason: reason.into(),
        }
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            DispatchOutcome::Dispatched(report) => Some(report),
            DispatchOutcome::NotShared { .. } => None,
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched(_))
    }
}

/// 分享分发器
pub struct ShareDispatcher {
    /// 所有注册的渠道
    destinations: Vec<Arc<dyn Destination>>,
    /// 是否为 dry-run 模式
    dry_run: bool,
    /// 是否并行发送
    parallel: bool,
}

impl ShareDispatcher {
    pub fn new() -> Self {
        Self {
            destinations: Vec::new(),
            dry_run: false,
            parallel: false,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 并行发送到各渠道（结果顺序仍与注册顺序一致）
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 注册渠道；id 已存在时替换原渠道并保留其位置
    pub fn register_destination(&mut self, destination: Arc<dyn Destination>) {
        match self.destinations.iter_mut().find(|d| d.id() == destination.id()) {
            Some(existing) => {
                warn!(destination = destination.id(), "Replacing destination with duplicate id");
                *existing = destination;
            }
            None => {
                info!(destination = destination.id(), "Registering share destination");
                self.destinations.push(destination);
            }
        }
    }

    pub fn destinations(&self) -> &[Arc<dyn Destination>] {
        &self.destinations
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn destination_ids(&self) -> Vec<&str> {
        self.destinations.iter().map(|d| d.id()).collect()
    }

    /// 已启用且已配置的渠道
    pub fn enabled_destinations(&self) -> Vec<Arc<dyn Destination>> {
        self.destinations
            .iter()
            .filter(|d| d.is_enabled() && d.is_configured())
            .cloned()
            .collect()
    }

    /// 构建 payload 并分发；payload 构建失败时不调用任何渠道
    pub fn dispatch(&self, content_type: &dyn ContentType, content_id: &str) -> DispatchOutcome {
        let payload = match content_type.try_build_payload(content_id) {
            Ok(payload) => payload,
            Err(rejection) => {
                let reason = rejection.to_string();
                info!(
                    content_type = content_type.id(),
                    content_id,
                    reason = %reason,
                    "Content not shared"
                );
                return DispatchOutcome::not_shared(reason);
            }
        };

        DispatchOutcome::Dispatched(self.dispatch_payload(&payload))
    }

    /// 将 payload 发送到所有已启用的渠道
    pub fn dispatch_payload(&self, payload: &ContentPayload) -> DispatchReport {
        let active: Vec<&Arc<dyn Destination>> = self
            .destinations
            .iter()
            .filter(|d| {
                let enabled = d.is_enabled();
                if !enabled {
                    debug!(destination = d.id(), "Destination disabled, omitted");
                }
                enabled
            })
            .collect();

        let results = if self.parallel && !self.dry_run {
            self.send_parallel(&active, payload)
        } else {
            active
                .iter()
                .map(|d| (d.id().to_string(), self.send_one(d.as_ref(), payload)))
                .collect()
        };

        for (id, result) in &results {
            info!(destination = %id, result = %result, "Share result");
        }

        DispatchReport { results }
    }

    fn send_parallel(
        &self,
        active: &[&Arc<dyn Destination>],
        payload: &ContentPayload,
    ) -> Vec<(String, SendResult)> {
        thread::scope(|scope| {
            let handles: Vec<_> = active
                .iter()
                .map(|d| {
                    let destination = d.as_ref();
                    (
                        destination.id().to_string(),
                        scope.spawn(move || self.send_one(destination, payload)),
                    )
                })
                .collect();

            handles
                .into_iter()
                .map(|(id, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        warn!(destination = %id, "Destination panicked during send");
                        SendResult::Failed("destination panicked".to_string())
                    });
                    (id, result)
                })
                .collect()
        })
    }

    fn send_one(&self, destination: &dyn Destination, payload: &ContentPayload) -> SendResult {
        if !destination.is_configured() {
            warn!(destination = destination.id(), "Destination not properly configured");
            return SendResult::Skipped("not configured".to_string());
        }

        if self.dry_run {
            eprintln!("[DRY-RUN] Would share to destination: {}", destination.id());
            return SendResult::Skipped("dry-run".to_string());
        }

        // 单个渠道 panic 不影响后续渠道
        panic::catch_unwind(AssertUnwindSafe(|| destination.send(payload))).unwrap_or_else(|_| {
            warn!(destination = destination.id(), "Destination panicked during send");
            SendResult::Failed("destination panicked".to_string())
        })
    }
}

impl Default for ShareDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::eligibility::Rejection;
    use chrono::NaiveDateTime;
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 测试用的 mock 渠道
    struct MockDestination {
        id: String,
        enabled: bool,
        configured: bool,
        result: SendResult,
        send_count: AtomicUsize,
    }

    impl MockDestination {
        fn new(id: &str, result: SendResult) -> Self {
            Self {
                id: id.to_string(),
                enabled: true,
                configured: true,
                result,
                send_count: AtomicUsize::new(0),
            }
        }

        fn unconfigured(id: &str) -> Self {
            Self {
                configured: false,
                ..Self::new(id, SendResult::Sent)
            }
        }

        fn disabled(id: &str) -> Self {
            Self {
                enabled: false,
                configured: false,
                ..Self::new(id, SendResult::Sent)
            }
        }

        fn get_send_count(&self) -> usize {
            self.send_count.load(Ordering::SeqCst)
        }
    }

    impl Destination for MockDestination {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            &self.id
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn is_configured(&self) -> bool {
            self.enabled && self.configured
        }

        fn format_message(&self, payload: &ContentPayload) -> String {
            payload.title.clone()
        }

        fn send(&self, _payload: &ContentPayload) -> SendResult {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    /// 发送时 panic 的渠道
    struct PanickingDestination;

    impl Destination for PanickingDestination {
        fn id(&self) -> &str {
            "panicky"
        }

        fn name(&self) -> &str {
            "panicky"
        }

        fn is_enabled(&self) -> bool {
            true
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn format_message(&self, _payload: &ContentPayload) -> String {
            String::new()
        }

        fn send(&self, _payload: &ContentPayload) -> SendResult {
            panic!("transport exploded");
        }
    }

    /// 测试用的内容类型，记录 build_payload 调用次数
    struct MockContentType {
        payload: Option<ContentPayload>,
        builds: Mutex<usize>,
        checks: AtomicUsize,
    }

    impl MockContentType {
        fn new(payload: Option<ContentPayload>) -> Self {
            Self {
                payload,
                builds: Mutex::new(0),
                checks: AtomicUsize::new(0),
            }
        }
    }

    impl ContentType for MockContentType {
        fn id(&self) -> &str {
            "post"
        }

        fn name(&self) -> &str {
            "Posts"
        }

        fn hooks(&self) -> Vec<(&'static str, crate::share::content_type::PublishEvent)> {
            Vec::new()
        }

        fn is_enabled(&self) -> bool {
            true
        }

        // 模拟内容在构建和再次检查之间被修改：再次检查会给出另一个原因
        fn check(&self, _content_id: &str) -> Result<(), Rejection> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            if self.payload.is_some() {
                Ok(())
            } else {
                Err(Rejection::AutoDraft)
            }
        }

        fn try_build_payload(&self, _content_id: &str) -> Result<ContentPayload, Rejection> {
            *self.builds.lock().unwrap() += 1;
            self.payload.clone().ok_or(Rejection::NotFound)
        }
    }

    fn payload() -> ContentPayload {
        let ts = NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        ContentPayload {
            title: "Hi".to_string(),
            excerpt: "World".to_string(),
            url: "https://example.com/hi".to_string(),
            author: "Alice".to_string(),
            published_at: ts,
            modified_at: ts,
            categories: vec![],
            tags: vec![],
            image_url: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_dispatcher_register_destination() {
        let mut dispatcher = ShareDispatcher::new();
        assert_eq!(dispatcher.destination_count(), 0);

        dispatcher.register_destination(Arc::new(MockDestination::new("a", SendResult::Sent)));
        assert_eq!(dispatcher.destination_count(), 1);
        assert_eq!(dispatcher.destination_ids(), vec!["a"]);
    }

    #[test]
    fn test_duplicate_destination_id_replaces_in_place() {
        let first = Arc::new(MockDestination::new("a", SendResult::Sent));
        let replacement = Arc::new(MockDestination::new(
            "a",
            SendResult::Failed("second".to_string()),
        ));
        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(first.clone());
        dispatcher.register_destination(Arc::new(MockDestination::new("b", SendResult::Sent)));
        dispatcher.register_destination(replacement.clone());

        assert_eq!(dispatcher.destination_ids(), vec!["a", "b"]);

        let report = dispatcher.dispatch_payload(&payload());
        assert_eq!(report.len(), 2);
        assert_eq!(report.get("a"), Some(&SendResult::Failed("second".to_string())));
        assert_eq!(first.get_send_count(), 0);
        assert_eq!(replacement.get_send_count(), 1);
    }

    #[test]
    fn test_failure_does_not_stop_later_destinations() {
        let first = Arc::new(MockDestination::new("first", SendResult::Sent));
        let second = Arc::new(MockDestination::new(
            "second",
            SendResult::Failed("connection reset".to_string()),
        ));
        let third = Arc::new(MockDestination::new("third", SendResult::Sent));

        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(first.clone());
        dispatcher.register_destination(second.clone());
        dispatcher.register_destination(third.clone());

        let report = dispatcher.dispatch_payload(&payload());
        assert_eq!(report.len(), 3);
        assert_eq!(report.results[0], ("first".to_string(), SendResult::Sent));
        assert_eq!(
            report.results[1],
            ("second".to_string(), SendResult::Failed("connection reset".to_string()))
        );
        assert_eq!(report.results[2], ("third".to_string(), SendResult::Sent));
        assert_eq!(first.get_send_count(), 1);
        assert_eq!(second.get_send_count(), 1);
        assert_eq!(third.get_send_count(), 1);
    }

    #[test]
    fn test_panicking_destination_is_isolated() {
        let last = Arc::new(MockDestination::new("last", SendResult::Sent));
        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(Arc::new(PanickingDestination));
        dispatcher.register_destination(last.clone());

        let report = dispatcher.dispatch_payload(&payload());
        assert_eq!(
            report.get("panicky"),
            Some(&SendResult::Failed("destination panicked".to_string()))
        );
        assert_eq!(report.get("last"), Some(&SendResult::Sent));
        assert_eq!(last.get_send_count(), 1);
    }

    #[test]
    fn test_unconfigured_is_skipped_and_disabled_is_omitted() {
        let unconfigured = Arc::new(MockDestination::unconfigured("half"));
        let disabled = Arc::new(MockDestination::disabled("off"));
        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(unconfigured.clone());
        dispatcher.register_destination(disabled.clone());

        let report = dispatcher.dispatch_payload(&payload());
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get("half"),
            Some(&SendResult::Skipped("not configured".to_string()))
        );
        assert_eq!(report.get("off"), None);
        assert_eq!(unconfigured.get_send_count(), 0);
        assert_eq!(disabled.get_send_count(), 0);
    }

    #[test]
    fn test_dry_run_does_not_send() {
        let dest = Arc::new(MockDestination::new("a", SendResult::Sent));
        let mut dispatcher = ShareDispatcher::new().with_dry_run(true);
        dispatcher.register_destination(dest.clone());

        let report = dispatcher.dispatch_payload(&payload());
        assert_eq!(report.get("a"), Some(&SendResult::Skipped("dry-run".to_string())));
        assert_eq!(dest.get_send_count(), 0);
    }

    #[test]
    fn test_parallel_preserves_order_and_isolation() {
        let mut dispatcher = ShareDispatcher::new().with_parallel(true);
        dispatcher.register_destination(Arc::new(MockDestination::new("a", SendResult::Sent)));
        dispatcher.register_destination(Arc::new(PanickingDestination));
        dispatcher.register_destination(Arc::new(MockDestination::new(
            "c",
            SendResult::Failed("nope".to_string()),
        )));
        dispatcher.register_destination(Arc::new(MockDestination::unconfigured("d")));

        let report = dispatcher.dispatch_payload(&payload());
        let ids: Vec<&str> = report.results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "panicky", "c", "d"]);
        assert_eq!(report.sent_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert!(report.get("d").unwrap().is_skipped());
    }

    #[test]
    fn test_dispatch_short_circuits_without_payload() {
        let dest = Arc::new(MockDestination::new("a", SendResult::Sent));
        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(dest.clone());

        let content = MockContentType::new(None);
        let outcome = dispatcher.dispatch(&content, "1");
        assert_eq!(outcome, DispatchOutcome::not_shared("content not found"));
        assert_eq!(dest.get_send_count(), 0);
    }

    #[test]
    fn test_not_shared_reason_comes_from_the_build_snapshot() {
        let dispatcher = ShareDispatcher::new();
        let content = MockContentType::new(None);

        let outcome = dispatcher.dispatch(&content, "1");
        assert_eq!(outcome, DispatchOutcome::not_shared("content not found"));
        assert_eq!(*content.builds.lock().unwrap(), 1);
        assert_eq!(content.checks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_builds_payload_once() {
        let a = Arc::new(MockDestination::new("a", SendResult::Sent));
        let b = Arc::new(MockDestination::new("b", SendResult::Sent));
        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(a.clone());
        dispatcher.register_destination(b.clone());

        let content = MockContentType::new(Some(payload()));
        let outcome = dispatcher.dispatch(&content, "1");
        assert!(outcome.is_dispatched());
        assert_eq!(outcome.report().unwrap().sent_count(), 2);
        assert_eq!(*content.builds.lock().unwrap(), 1);
    }

    #[test]
    fn test_enabled_destinations() {
        let mut dispatcher = ShareDispatcher::new();
        dispatcher.register_destination(Arc::new(MockDestination::new("a", SendResult::Sent)));
        dispatcher.register_destination(Arc::new(MockDestination::unconfigured("b")));
        dispatcher.register_destination(Arc::new(MockDestination::disabled("c")));

        let ids: Vec<String> = dispatcher
            .enabled_destinations()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }
}
