//! Per-conversation in-flight guard.
//!
//! At most one generation may be in flight per conversation; concurrent
//! history writes would race. The permit is RAII: dropping it (turn
//! complete, failed, or the consumer walked away from a stream) releases
//! the conversation.

use compact_str::CompactString;
use llm::{ChatError, Result};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Tracks which conversations have a generation in flight.
#[derive(Clone, Default)]
pub(crate) struct TurnGuards {
    inner: Arc<Mutex<BTreeSet<Uuid>>>,
}

impl TurnGuards {
    /// Claim a conversation for one turn.
    ///
    /// Fails with `ConversationBusy` when another turn holds the permit.
    pub fn acquire(&self, id: Uuid) -> Result<TurnPermit> {
        let mut busy = self.inner.lock().expect("guard lock poisoned");
        if !busy.insert(id) {
            return Err(ChatError::ConversationBusy(CompactString::from(
                id.to_string(),
            )));
        }
        Ok(TurnPermit {
            id,
            guards: Arc::clone(&self.inner),
        })
    }
}

/// Permit for one in-flight turn; releases the conversation on drop.
pub(crate) struct TurnPermit {
    id: Uuid,
    guards: Arc<Mutex<BTreeSet<Uuid>>>,
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        self.guards
            .lock()
            .expect("guard lock poisoned")
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_busy() {
        let guards = TurnGuards::default();
        let id = Uuid::new_v4();

        let permit = guards.acquire(id).unwrap();
        assert!(matches!(
            guards.acquire(id),
            Err(ChatError::ConversationBusy(_))
        ));

        drop(permit);
        assert!(guards.acquire(id).is_ok());
    }

    #[test]
    fn distinct_conversations_do_not_contend() {
        let guards = TurnGuards::default();
        let _a = guards.acquire(Uuid::new_v4()).unwrap();
        let _b = guards.acquire(Uuid::new_v4()).unwrap();
    }
}
