//! Session and transaction-id bookkeeping.
//!
//! Outside a session every command carries transaction id 0. OpenSession
//! itself uses 0; the first transaction inside the session is 1 and ids
//! wrap from `0xFFFF_FFFE` back to 1, skipping the reserved values.

use tracing::info;

const LAST_TRANSACTION_ID: u32 = 0xFFFF_FFFE;

/// Host-side view of the single PTP session a device allows.
#[derive(Debug, Default)]
pub struct Session {
    active: bool,
    session_id: u32,
    next_transaction_id: u32,
    last_session_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The open session's id, or 0 when closed.
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// Return the id for the next transaction and advance the counter.
    ///
    /// Must be called exactly once per transaction.
    pub fn next_transaction_id(&mut self) -> u32 {
        if !self.active {
            return 0;
        }
        let id = self.next_transaction_id;
        self.next_transaction_id = if id >= LAST_TRANSACTION_ID { 1 } else { id + 1 };
        id
    }

    /// Choose the id to offer in the next OpenSession. Never 0.
    pub fn next_session_id(&mut self) -> u32 {
        self.last_session_id = self.last_session_id.wrapping_add(1).max(1);
        self.last_session_id
    }

    /// Mark the session open with `session_id`.
    pub fn open(&mut self, session_id: u32) {
        self.active = true;
        self.session_id = session_id;
        self.next_transaction_id = 1;
        info!(session_id, "session opened");
    }

    /// Mark the session closed. Always succeeds, even when already closed.
    pub fn close(&mut self) {
        if self.active {
            info!(session_id = self.session_id, "session closed");
        }
        self.active = false;
        self.session_id = 0;
        self.next_transaction_id = 0;
    }
}
