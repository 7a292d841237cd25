//! Timers for mute expiry.
//!
//! A notify-settings record with a future `mute_until` means the chat (or
//! topic) becomes unmuted at that instant without any further server
//! traffic. The scheduler arms one timer per target and emits a follow-up
//! notify event when it fires, so the application never has to poll.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;

use telegraphe_proto::ServerClock;

use crate::events::{DomainEvent, EventSink};

/// What a mute timer is armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuteTarget {
    Chat(i64),
    Topic(i64, i32),
}

/// Arms at most one pending timer per target. Re-arming a target aborts
/// the previous timer first, so a burst of notify updates for the same
/// chat leaves exactly one timer behind.
pub struct MuteScheduler {
    clock: ServerClock,
    sink: EventSink,
    timers: HashMap<MuteTarget, JoinHandle<()>>,
}

impl MuteScheduler {
    pub fn new(clock: ServerClock, sink: EventSink) -> Self {
        Self {
            clock,
            sink,
            timers: HashMap::new(),
        }
    }

    /// Arm (or disarm) the timer for `target`.
    ///
    /// `mute_until` in the past or absent cancels any pending timer.
    pub fn schedule(&mut self, target: MuteTarget, mute_until: Option<i64>) {
        if let Some(handle) = self.timers.remove(&target) {
            handle.abort();
        }

        let Some(mute_until) = mute_until else {
            return;
        };
        let delay_secs = mute_until - self.clock.now_unix();
        if delay_secs <= 0 {
            return;
        }

        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_secs as u64)).await;
            sink(unmute_event(target));
        });
        self.timers.insert(target, handle);
    }

    /// Number of armed timers. Finished tasks may still be counted until
    /// the next `schedule` call for their target.
    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for MuteScheduler {
    fn drop(&mut self) {
        for handle in self.timers.values() {
            handle.abort();
        }
    }
}

fn unmute_event(target: MuteTarget) -> DomainEvent {
    match target {
        MuteTarget::Chat(chat_id) => DomainEvent::NotifyExceptionUpdated {
            chat_id,
            mute_until: None,
            is_silent: false,
            should_show_previews: None,
        },
        MuteTarget::Topic(chat_id, topic_id) => DomainEvent::TopicNotifyExceptionUpdated {
            chat_id,
            topic_id,
            mute_until: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collecting_sink() -> (EventSink, Arc<Mutex<Vec<DomainEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        let sink: EventSink = Arc::new(move |event| captured.lock().unwrap().push(event));
        (sink, events)
    }

    #[tokio::test]
    async fn test_rearming_keeps_one_timer() {
        let (sink, _events) = collecting_sink();
        let clock = ServerClock::fixed(1_000);
        let mut scheduler = MuteScheduler::new(clock, sink);

        scheduler.schedule(MuteTarget::Chat(-5), Some(2_000));
        scheduler.schedule(MuteTarget::Chat(-5), Some(3_000));
        assert_eq!(scheduler.active_timers(), 1);

        scheduler.schedule(MuteTarget::Chat(-6), Some(3_000));
        assert_eq!(scheduler.active_timers(), 2);
    }

    #[tokio::test]
    async fn test_past_mute_until_disarms() {
        let (sink, events) = collecting_sink();
        let clock = ServerClock::fixed(1_000);
        let mut scheduler = MuteScheduler::new(clock, sink);

        scheduler.schedule(MuteTarget::Chat(-5), Some(2_000));
        scheduler.schedule(MuteTarget::Chat(-5), Some(500));
        assert_eq!(scheduler.active_timers(), 0);
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_unmute_event() {
        let (sink, events) = collecting_sink();
        let clock = ServerClock::fixed(1_000);
        let mut scheduler = MuteScheduler::new(clock, sink);

        scheduler.schedule(MuteTarget::Topic(-9, 4), Some(1_010));
        tokio::time::sleep(Duration::from_secs(11)).await;

        let events = events.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            &[DomainEvent::TopicNotifyExceptionUpdated {
                chat_id: -9,
                topic_id: 4,
                mute_until: None,
            }]
        );
    }
}
