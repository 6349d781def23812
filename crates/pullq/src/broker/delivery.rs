//! Per-subscription delivery state.
//!
//! Every message published to a topic gets one delivery entry in each bound
//! subscription. An entry is either pending (never delivered, or handed back
//! after its ack deadline passed) or reserved by a pull. Acknowledging a
//! reservation before its deadline removes the entry for good.

use crate::Message;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

/// A published message, shared by every subscription it was fanned out to.
#[derive(Debug)]
pub(crate) struct StoredMessage {
    pub id: Uuid,
    /// Monotonic publish position across the broker.
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub data: String,
}

impl StoredMessage {
    pub fn new(sequence: u64, data: String, time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            time,
            data,
        }
    }

    /// A `message_ttl` of 0 means messages never expire.
    pub fn is_expired(&self, message_ttl: u32, now: DateTime<Utc>) -> bool {
        message_ttl != 0
            && now.signed_duration_since(self.time) >= Duration::seconds(i64::from(message_ttl))
    }
}

#[derive(Debug)]
struct Reservation {
    message: Arc<StoredMessage>,
    reserved_at: DateTime<Utc>,
    tries: u32,
}

impl Reservation {
    fn deadline_passed(&self, ack_deadline: u32, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.reserved_at) >= Duration::seconds(i64::from(ack_deadline))
    }

    fn to_message(&self) -> Message {
        Message {
            id: self.message.id,
            time: self.message.time,
            tries: self.tries,
            data: self.message.data.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryQueue {
    pending: VecDeque<Arc<StoredMessage>>,
    reserved: HashMap<Uuid, Reservation>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: Arc<StoredMessage>) {
        self.pending.push_back(message);
    }

    /// Reserve up to `max` messages.
    ///
    /// Reservations whose ack deadline has passed are handed out again first,
    /// oldest reservation first, then never-delivered messages in publish order.
    pub fn reserve(&mut self, max: usize, ack_deadline: u32, now: DateTime<Utc>) -> Vec<Message> {
        let mut out = Vec::with_capacity(max.min(self.len()));
        if max == 0 {
            return out;
        }

        let mut expired: Vec<(DateTime<Utc>, u64, Uuid)> = self
            .reserved
            .values()
            .filter(|r| r.deadline_passed(ack_deadline, now))
            .map(|r| (r.reserved_at, r.message.sequence, r.message.id))
            .collect();
        expired.sort_unstable();

        for (_, _, id) in expired.into_iter().take(max) {
            if let Some(reservation) = self.reserved.get_mut(&id) {
                reservation.reserved_at = now;
                reservation.tries += 1;
                out.push(reservation.to_message());
            }
        }

        while out.len() < max {
            let Some(message) = self.pending.pop_front() else {
                break;
            };
            let reservation = Reservation {
                message,
                reserved_at: now,
                tries: 1,
            };
            out.push(reservation.to_message());
            self.reserved.insert(reservation.message.id, reservation);
        }

        out
    }

    /// Finalize delivery of `id`. Returns false when `id` is unknown, already
    /// acknowledged, or its reservation deadline has passed.
    pub fn ack(&mut self, id: &Uuid, ack_deadline: u32, now: DateTime<Utc>) -> bool {
        match self.reserved.get(id) {
            Some(reservation) if !reservation.deadline_passed(ack_deadline, now) => {
                self.reserved.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Drop every entry whose message outlived `message_ttl`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, message_ttl: u32, now: DateTime<Utc>) -> usize {
        if message_ttl == 0 {
            return 0;
        }
        let before = self.len();
        self.pending.retain(|m| !m.is_expired(message_ttl, now));
        self.reserved
            .retain(|_, r| !r.message.is_expired(message_ttl, now));
        before - self.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn reserved_len(&self) -> usize {
        self.reserved.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.reserved.len()
    }
}
