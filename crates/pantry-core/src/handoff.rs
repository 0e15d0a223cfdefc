use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A one-shot message carrying a value from one screen to the next.
///
/// The receiving side reads it with [`peek`](Self::peek) and consumes it with
/// [`acknowledge`](Self::acknowledge); after that it no longer exists, so the
/// same payload can never be picked up twice.
#[derive(Debug)]
#[must_use = "a handoff that is never acknowledged is lost"]
pub struct Handoff<T> {
    id: Uuid,
    created_at: DateTime<Utc>,
    payload: T,
}

impl<T> Handoff<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            payload,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn peek(&self) -> &T {
        &self.payload
    }

    /// Take the payload, consuming the handoff.
    pub fn acknowledge(self) -> T {
        tracing::debug!("Handoff {} acknowledged", self.id);
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Entry, Section};

    #[test]
    fn test_handoff_delivers_payload_once() {
        let generated = vec![Section::new("mon", "Monday").with_entries(vec![Entry::label("Eggs")])];

        let handoff = Handoff::new(generated.clone());
        assert_eq!(handoff.peek(), &generated);

        let received = handoff.acknowledge();
        assert_eq!(received, generated);
    }

    #[test]
    fn test_handoffs_have_distinct_ids() {
        let a = Handoff::new(1);
        let b = Handoff::new(1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.acknowledge() + b.acknowledge(), 2);
    }
}
