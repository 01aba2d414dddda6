use crate::router::{Location, Navigator};
use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, trace};

/// How long the input reader waits before checking whether to stop
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Mouse input event
    Mouse(MouseEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,

    /// Route change requested from outside the input path
    Navigate(Location),

    /// Status message event
    StatusMessage(String),

    /// Clear status message event
    ClearStatus,
}

/// Event handler for managing input events
///
/// Ticks come from their own timer, so a steady stream of terminal input
/// never holds them back.
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,

    /// Tick interval for periodic events
    tick_interval: Duration,

    /// Created on first use so the handler can be built outside a runtime
    ticker: Option<Interval>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            ticker: None,
        }
    }

    /// Start forwarding terminal input into the event channel
    ///
    /// The reader runs on a blocking thread and stops once the handler is dropped.
    pub fn start_input(&self) {
        let sender = self.sender.clone();

        tokio::task::spawn_blocking(move || {
            while !sender.is_closed() {
                match crossterm::event::poll(INPUT_POLL) {
                    Ok(true) => match crossterm::event::read() {
                        Ok(event) => {
                            if let Some(event) = convert_crossterm_event(event) {
                                if sender.send(event).is_err() {
                                    break;
                                }
                            }
                        }
                        Err(e) => trace!(error = %e, "terminal read failed"),
                    },
                    Ok(false) => {}
                    Err(e) => trace!(error = %e, "terminal poll failed"),
                }
            }
            debug!("input reader stopped");
        });
    }

    /// Get the next event
    ///
    /// A due tick is delivered before anything waiting in the channel.
    pub async fn next(&mut self) -> Option<Event> {
        let period = self.tick_interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        tokio::select! {
            biased;

            _ = ticker.tick() => Some(Event::Tick),
            event = self.receiver.recv() => event,
        }
    }

    /// Send an internal event
    pub fn send(&self, event: Event) -> Result<()> {
        self.sender.send(event)?;
        Ok(())
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

/// Convert crossterm events to application events
fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        // Release/repeat reports would double every keystroke on some terminals
        CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Press => Some(Event::Key(key_event)),
        CrosstermEvent::Key(_) => None,
        CrosstermEvent::Mouse(mouse_event) => Some(Event::Mouse(mouse_event)),
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        CrosstermEvent::FocusGained | CrosstermEvent::FocusLost | CrosstermEvent::Paste(_) => None,
    }
}

/// Navigator that routes requests through the application event loop
#[derive(Debug, Clone)]
pub struct EventNavigator {
    sender: mpsc::UnboundedSender<Event>,
}

impl EventNavigator {
    pub fn new(sender: mpsc::UnboundedSender<Event>) -> Self {
        Self { sender }
    }
}

impl Navigator for EventNavigator {
    fn navigate(&self, to: &Location) {
        if self.sender.send(Event::Navigate(to.clone())).is_err() {
            trace!(to = %to, "event loop gone, navigation dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers, MouseEventKind};

    #[tokio::test]
    async fn test_internal_events_are_delivered() {
        let mut handler = EventHandler::default();
        handler.send(Event::StatusMessage("hello".to_string())).unwrap();

        // The first tick is due immediately
        assert!(matches!(handler.next().await, Some(Event::Tick)));
        match handler.next().await {
            Some(Event::StatusMessage(message)) => assert_eq!(message, "hello"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ticks_keep_coming_under_continuous_input() {
        let mut handler = EventHandler::new(Duration::from_millis(10));
        let sender = handler.sender();
        let flood = tokio::spawn(async move {
            let moved = MouseEvent {
                kind: MouseEventKind::Moved,
                column: 1,
                row: 1,
                modifiers: KeyModifiers::NONE,
            };
            while sender.send(Event::Mouse(moved)).is_ok() {
                tokio::task::yield_now().await;
            }
        });

        let ticks = tokio::time::timeout(Duration::from_secs(2), async {
            let mut ticks = 0;
            while ticks < 3 {
                if let Some(Event::Tick) = handler.next().await {
                    ticks += 1;
                }
            }
            ticks
        })
        .await
        .expect("ticks starved by input");

        assert_eq!(ticks, 3);
        flood.abort();
    }

    #[test]
    fn test_key_releases_are_dropped() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let mut release = press;
        release.kind = KeyEventKind::Release;

        assert!(matches!(convert_crossterm_event(CrosstermEvent::Key(press)), Some(Event::Key(_))));
        assert!(convert_crossterm_event(CrosstermEvent::Key(release)).is_none());
        assert!(matches!(convert_crossterm_event(CrosstermEvent::Resize(80, 24)), Some(Event::Resize(80, 24))));
    }

    #[tokio::test]
    async fn test_event_navigator_sends_navigate() {
        let handler = EventHandler::default();
        let navigator = EventNavigator::new(handler.sender());
        navigator.navigate(&Location::new("/reports"));

        let mut handler = handler;
        match handler.receiver.try_recv() {
            Ok(Event::Navigate(location)) => assert_eq!(location.path(), "/reports"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
