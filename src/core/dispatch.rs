//! Request dispatch for KisaanMitra.
//!
//! [`DispatchEngine::send`] is the single inbound entry point: it records the
//! user utterance, asks the backend for a reply under the execution
//! contract, and records the reply (or an error). All failures are recovered
//! into an `error` message; nothing escapes to the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;

use super::backend::{execute_with_contract, Backend, ExecutionContract, SimulatedBackend};
use super::conversation::{ConversationLog, DEFAULT_HISTORY_CAPACITY};
use super::events::{CoreEvent, EventBus, DEFAULT_EVENT_CAPACITY};
use super::message::{Attribution, Message};
use super::notification::{NotificationQueue, NotificationType, DEFAULT_NOTIFICATION_CAPACITY};
use super::routing::Classifier;
use crate::agent::{AgentCatalog, AgentId};

/// Engine tuning. See `config::DispatchSettings` for the on-disk form.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub min_latency: Duration,
    pub max_latency: Duration,
    pub timeout: Duration,
    pub notify_on_failure: bool,
    pub failure_notification_ttl: Duration,
    pub history_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_latency: Duration::from_millis(1000),
            max_latency: Duration::from_millis(3000),
            timeout: Duration::from_secs(30),
            notify_on_failure: true,
            failure_notification_ttl: Duration::from_millis(5000),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

struct EngineInner {
    catalog: Arc<AgentCatalog>,
    backend: Arc<dyn Backend>,
    contract: ExecutionContract,
    history: Mutex<ConversationLog>,
    notifications: NotificationQueue,
    events: EventBus,
    in_flight: AtomicUsize,
    notify_on_failure: bool,
    failure_ttl: Duration,
}

impl EngineInner {
    fn history(&self) -> MutexGuard<'_, ConversationLog> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn append(&self, message: Message) {
        self.history().append(message.clone());
        self.events.publish(CoreEvent::MessageAppended { message });
    }

    fn report_failure(&self, attribution: Attribution, reason: &str) -> Message {
        if self.notify_on_failure {
            self.notifications.push(
                &format!("{} could not answer: {}", attribution, reason),
                NotificationType::Error,
                Some(self.failure_ttl),
            );
        }

        let message = Message::error(
            &format!(
                "Sorry, {} could not process your request ({}). Please try again.",
                attribution, reason
            ),
            attribution,
        );
        self.append(message.clone());
        message
    }
}

/// Tracks one in-flight request.
///
/// Dropping it always releases the busy count. A request dropped before
/// [`RequestGuard::complete`] (the caller cancelled the future) is recorded
/// as a failure so every user message still gets its paired reply.
struct RequestGuard<'a> {
    engine: &'a EngineInner,
    attribution: Attribution,
    completed: bool,
}

impl<'a> RequestGuard<'a> {
    fn begin(engine: &'a EngineInner, attribution: Attribution) -> Self {
        if engine.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            engine.events.publish(CoreEvent::BusyChanged { busy: true });
        }
        Self {
            engine,
            attribution,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("Request for {} cancelled before a reply", self.attribution);
            self.engine.report_failure(self.attribution, "request cancelled");
        }
        if self.engine.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.engine.events.publish(CoreEvent::BusyChanged { busy: false });
        }
    }
}

/// Orchestrates requests over the shared history and notification queue.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct DispatchEngine {
    inner: Arc<EngineInner>,
}

impl DispatchEngine {
    /// Engine backed by the simulated, latency-injecting backend.
    pub fn new(config: DispatchConfig, catalog: Arc<AgentCatalog>) -> Self {
        let backend = SimulatedBackend::new(
            Classifier::new(catalog.clone()),
            config.min_latency,
            config.max_latency,
        );
        Self::with_backend(config, catalog, Arc::new(backend))
    }

    /// Engine with a caller-supplied backend.
    pub fn with_backend(
        config: DispatchConfig,
        catalog: Arc<AgentCatalog>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let events = EventBus::new(DEFAULT_EVENT_CAPACITY);
        let notifications = NotificationQueue::new(config.notification_capacity, events.clone());

        tracing::debug!(
            "Dispatch engine using '{}' backend, timeout {:?}",
            backend.name(),
            config.timeout
        );

        Self {
            inner: Arc::new(EngineInner {
                catalog,
                backend,
                contract: ExecutionContract {
                    timeout: config.timeout,
                },
                history: Mutex::new(ConversationLog::with_capacity(config.history_capacity)),
                notifications,
                events,
                in_flight: AtomicUsize::new(0),
                notify_on_failure: config.notify_on_failure,
                failure_ttl: config.failure_notification_ttl,
            }),
        }
    }

    /// Send an utterance, optionally to an explicit agent.
    ///
    /// Returns the reply that was appended (`agent` or `error` kind), or
    /// `None` when the utterance is blank and nothing was recorded. Unknown
    /// targets are not an error; routing falls back to keyword inference.
    pub async fn send(&self, utterance: &str, target: Option<&str>) -> Option<Message> {
        let text = utterance.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring blank utterance");
            return None;
        }

        let inner = &*self.inner;
        let explicit = target.and_then(|t| {
            let resolved = inner.catalog.resolve(t);
            if resolved.is_none() {
                tracing::debug!("Unknown target '{}', using keyword routing", t);
            }
            resolved
        });
        let attribution = explicit.map(Attribution::Agent).unwrap_or(Attribution::System);

        let guard = RequestGuard::begin(inner, attribution);
        inner.append(Message::user(text, explicit));

        let reply = match execute_with_contract(inner.backend.clone(), text, target, &inner.contract)
            .await
        {
            Ok(result) => {
                tracing::info!(
                    "Routed to {} via {:?} ({}, {}%)",
                    result.agent,
                    result.rule,
                    result.status,
                    result.confidence
                );
                let message =
                    Message::agent_reply(result.agent, &result.content, result.status, result.confidence);
                inner.append(message.clone());
                message
            }
            Err(e) => {
                tracing::warn!("Dispatch failed for {}: {}", attribution, e);
                inner.report_failure(attribution, &e.message)
            }
        };

        guard.complete();
        Some(reply)
    }

    /// True while any request is in flight.
    pub fn busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// History snapshot, newest first.
    pub fn history(&self) -> Vec<Message> {
        self.inner.history().all()
    }

    pub fn search_history(&self, keyword: &str) -> Vec<Message> {
        self.inner.history().search(keyword)
    }

    pub fn history_by_agent(&self, agent: AgentId) -> Vec<Message> {
        self.inner.history().by_agent(agent)
    }

    pub fn clear_history(&self) {
        self.inner.history().clear();
        self.inner.events.publish(CoreEvent::HistoryCleared);
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.inner.notifications
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.inner.catalog
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }
}
