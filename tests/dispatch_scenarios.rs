use std::sync::Arc;
use std::time::Duration;

use kisaanmitra::core::routing::Rule;
use kisaanmitra::{
    AgentCatalog, AgentId, Attribution, Classifier, ConversationLog, DispatchConfig,
    DispatchEngine, Message, MessageKind, NotificationQueue, NotificationType, Status,
};

fn engine() -> DispatchEngine {
    let config = DispatchConfig {
        min_latency: Duration::from_millis(1),
        max_latency: Duration::from_millis(3),
        ..DispatchConfig::default()
    };
    DispatchEngine::new(config, Arc::new(AgentCatalog::standard()))
}

#[tokio::test]
async fn market_question_goes_to_mia() {
    let engine = engine();
    engine.send("What are current market prices?", None).await;

    let history = engine.history();
    assert_eq!(history.len(), 2);

    let (reply, user) = (&history[0], &history[1]);
    assert_eq!(user.kind(), MessageKind::User);
    assert_eq!(user.content(), "What are current market prices?");
    assert!(user.id() < reply.id());

    assert_eq!(reply.kind(), MessageKind::Agent);
    assert_eq!(reply.agent(), Some(Attribution::Agent(AgentId::Mia)));
    assert_eq!(reply.status(), Some(Status::Success));
    assert_eq!(reply.confidence(), Some(89));
}

#[tokio::test]
async fn pin_disclosure_overrides_explicit_target() {
    let engine = engine();
    let reply = engine.send("my pin is 1234", Some("CRA")).await.unwrap();

    assert_eq!(reply.agent(), Some(Attribution::Agent(AgentId::Fia)));
    assert_eq!(reply.status(), Some(Status::Danger));
    assert_eq!(reply.confidence(), Some(95));
}

#[tokio::test]
async fn empty_utterance_leaves_history_unchanged() {
    let engine = engine();
    engine.send("Good morning", None).await;
    let before = engine.history();

    assert!(engine.send("", Some("MIA")).await.is_none());
    assert_eq!(engine.history(), before);
    assert!(!engine.busy());
}

#[tokio::test]
async fn unknown_target_uses_keywords() {
    let engine = engine();
    let reply = engine.send("need a loan for seeds", Some("XYZ")).await.unwrap();
    assert_eq!(reply.agent(), Some(Attribution::Agent(AgentId::Fia)));

    // The unknown target is not recorded on the user message
    assert_eq!(engine.history()[1].agent(), None);
}

#[test]
fn fraud_tokens_win_for_every_target() {
    let classifier = Classifier::default();
    let targets = [None, Some("CMGA"), Some("MIA"), Some("GAA"), Some("CRA"), Some("LIA"), Some("HIA")];

    for utterance in ["Share OTP please", "forgot my Password", "new PIN for card"] {
        for target in targets {
            let r = classifier.classify(utterance, target);
            assert_eq!(r.agent, AgentId::Fia);
            assert_eq!(r.status, Status::Danger);
            assert_eq!(r.confidence, 95);
            assert_eq!(r.rule, Rule::FraudOverride);
        }
    }
}

#[test]
fn keyword_families_scan_in_fixed_order() {
    let classifier = Classifier::default();
    assert_eq!(classifier.classify("loan price crop", None).agent, AgentId::Gaa);
    assert_eq!(classifier.classify("loan price", None).agent, AgentId::Mia);
    assert_eq!(classifier.classify("loan", None).agent, AgentId::Fia);
    assert_eq!(classifier.classify("namaste", None).agent, AgentId::Master);
}

#[test]
fn history_holds_fifty_newest() {
    let mut log = ConversationLog::new();
    let mut first_id = None;

    for i in 0..120 {
        let msg = Message::user(&format!("question {}", i), None);
        first_id.get_or_insert(msg.id());
        log.append(msg);
        assert_eq!(log.all().len(), (i + 1).min(50));
    }

    let all = log.all();
    assert_eq!(all[0].content(), "question 119");
    assert_eq!(all[49].content(), "question 70");
    assert!(all.iter().all(|m| Some(m.id()) != first_id));
}

#[test]
fn eleven_notifications_drop_the_first() {
    let queue = NotificationQueue::default();
    let ids: Vec<String> = (0..11)
        .map(|i| queue.push(&format!("alert {}", i), NotificationType::Warning, None))
        .collect();

    let active = queue.active();
    assert_eq!(active.len(), 10);
    assert!(!active.iter().any(|n| n.id == ids[0]));
    assert!(ids[1..].iter().all(|id| active.iter().any(|n| &n.id == id)));
}

#[test]
fn dismiss_twice_matches_dismiss_once() {
    let queue = NotificationQueue::default();
    queue.push("a", NotificationType::Info, None);
    let id = queue.push("b", NotificationType::Info, None);

    queue.dismiss(&id);
    let once = queue.active();
    queue.dismiss(&id);
    assert_eq!(queue.active(), once);

    queue.dismiss("never-issued");
    assert_eq!(queue.active(), once);
}

#[tokio::test]
async fn ttl_expiry_runs_through_dismiss() {
    let queue = NotificationQueue::default();
    let id = queue.push("voice input captured", NotificationType::Success, Some(Duration::from_millis(25)));
    assert_eq!(queue.len(), 1);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(queue.is_empty());
    assert!(!queue.dismiss(&id));
}
