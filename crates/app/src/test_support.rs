//! In-memory port implementations shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use her_domain::error::HubError;
use her_domain::event::Event;

use crate::channels::Outbox;
use crate::ports::{BusClient, Intake, Notifier, UserCommand};

fn refused(what: &str) -> HubError {
    HubError::transport(std::io::Error::other(format!("{what} refused")))
}

/// Poll `condition` until it holds, panicking after one second.
pub async fn eventually(condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not met within one second");
}

#[derive(Debug, Default)]
struct BusState {
    fail_connect: bool,
    fail_publish: bool,
    fail_subscribe: Option<String>,
    stall_unsubscribe: bool,
    connected: bool,
    subscribed: Vec<String>,
    unsubscribed: Vec<String>,
    published: Vec<Event>,
    publish_attempts: usize,
    disconnected: bool,
}

/// Shared view of everything the fake bus was asked to do.
#[derive(Debug, Clone, Default)]
pub struct BusLog {
    state: Arc<Mutex<BusState>>,
    pending: Arc<AtomicUsize>,
}

impl BusLog {
    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn fail_publish(&self, fail: bool) {
        self.state.lock().unwrap().fail_publish = fail;
    }

    pub fn fail_subscribe(&self, topic: &str) {
        self.state.lock().unwrap().fail_subscribe = Some(topic.to_string());
    }

    /// Make `unsubscribe` wait forever, like a broker that never answers.
    pub fn stall_unsubscribe(&self, stall: bool) {
        self.state.lock().unwrap().stall_unsubscribe = stall;
    }

    pub fn connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.state.lock().unwrap().subscribed.clone()
    }

    pub fn unsubscribed(&self) -> Vec<String> {
        self.state.lock().unwrap().unsubscribed.clone()
    }

    pub fn published(&self) -> Vec<Event> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn publish_attempts(&self) -> usize {
        self.state.lock().unwrap().publish_attempts
    }

    pub fn disconnected(&self) -> bool {
        self.state.lock().unwrap().disconnected
    }

    /// Inbound messages pushed but not yet returned by `next_message`.
    pub fn pending_inbound(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Feeds broker messages to a [`FakeBus`].
#[derive(Debug, Clone)]
pub struct BusFeed {
    tx: mpsc::UnboundedSender<Result<Event, HubError>>,
    pending: Arc<AtomicUsize>,
}

impl BusFeed {
    pub fn push(&self, event: Event) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.tx.send(Ok(event)).unwrap();
    }

    pub fn push_error(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.tx.send(Err(refused("poll"))).unwrap();
    }
}

#[derive(Debug)]
pub struct FakeBus {
    log: BusLog,
    inbound: mpsc::UnboundedReceiver<Result<Event, HubError>>,
}

pub fn fake_bus() -> (FakeBus, BusFeed, BusLog) {
    let (tx, inbound) = mpsc::unbounded_channel();
    let log = BusLog::default();
    let feed = BusFeed {
        tx,
        pending: log.pending.clone(),
    };
    (
        FakeBus {
            log: log.clone(),
            inbound,
        },
        feed,
        log,
    )
}

impl BusClient for FakeBus {
    async fn connect(&mut self) -> Result<(), HubError> {
        let mut state = self.log.state.lock().unwrap();
        if state.fail_connect {
            return Err(refused("connection"));
        }
        state.connected = true;
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), HubError> {
        let mut state = self.log.state.lock().unwrap();
        if state.fail_subscribe.as_deref() == Some(topic) {
            return Err(refused("subscription"));
        }
        state.subscribed.push(topic.to_string());
        Ok(())
    }

    async fn publish(&mut self, event: &Event) -> Result<(), HubError> {
        let mut state = self.log.state.lock().unwrap();
        state.publish_attempts += 1;
        if state.fail_publish {
            return Err(refused("publication"));
        }
        state.published.push(event.clone());
        Ok(())
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<(), HubError> {
        let stall = {
            let mut state = self.log.state.lock().unwrap();
            state.unsubscribed.push(topic.to_string());
            state.stall_unsubscribe
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Event, HubError> {
        match self.inbound.recv().await {
            Some(message) => {
                self.log.pending.fetch_sub(1, Ordering::SeqCst);
                message
            }
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self, _timeout: Duration) {
        self.log.state.lock().unwrap().disconnected = true;
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    fail_connect: bool,
    fail_send: bool,
    connected: bool,
    sent: Vec<String>,
    replies: Vec<(String, String)>,
    stopped: bool,
}

/// Shared view of everything the fake notifier was asked to do.
#[derive(Debug, Clone, Default)]
pub struct NotifierLog {
    state: Arc<Mutex<NotifierState>>,
}

impl NotifierLog {
    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn fail_send(&self, fail: bool) {
        self.state.lock().unwrap().fail_send = fail;
    }

    pub fn connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().replies.clone()
    }

    pub fn stopped(&self) -> bool {
        self.state.lock().unwrap().stopped
    }
}

#[derive(Debug)]
pub struct FakeNotifier {
    log: NotifierLog,
    commands: Option<mpsc::Receiver<UserCommand>>,
}

/// Build a fake notifier and the sender that plays the user typing commands.
pub fn fake_notifier() -> (FakeNotifier, mpsc::Sender<UserCommand>, NotifierLog) {
    let (tx, rx) = mpsc::channel(16);
    let log = NotifierLog::default();
    (
        FakeNotifier {
            log: log.clone(),
            commands: Some(rx),
        },
        tx,
        log,
    )
}

pub fn user_command(name: &str) -> UserCommand {
    UserCommand {
        name: name.to_string(),
        arguments: String::new(),
        conversation: "42".to_string(),
    }
}

impl Notifier for FakeNotifier {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn connect(&mut self) -> Result<mpsc::Receiver<UserCommand>, HubError> {
        let mut state = self.log.state.lock().unwrap();
        if state.fail_connect {
            return Err(refused("login"));
        }
        state.connected = true;
        let (_, empty) = mpsc::channel(1);
        Ok(self.commands.take().unwrap_or(empty))
    }

    async fn send_text(&self, body: &str) -> Result<(), HubError> {
        let mut state = self.log.state.lock().unwrap();
        if state.fail_send {
            return Err(refused("message"));
        }
        state.sent.push(body.to_string());
        Ok(())
    }

    async fn reply(&self, conversation: &str, body: &str) -> Result<(), HubError> {
        self.log
            .state
            .lock()
            .unwrap()
            .replies
            .push((conversation.to_string(), body.to_string()));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), HubError> {
        self.log.state.lock().unwrap().stopped = true;
        Ok(())
    }
}

/// Intake that sends a fixed list of events, then waits for shutdown.
#[derive(Debug)]
pub struct ScriptedIntake {
    events: Vec<Event>,
}

impl ScriptedIntake {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl Intake for ScriptedIntake {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn start(
        self,
        to_bus: Outbox,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>, HubError> {
        Ok(tokio::spawn(async move {
            for event in self.events {
                to_bus.send(event).await;
            }
            shutdown.cancelled().await;
        }))
    }
}
