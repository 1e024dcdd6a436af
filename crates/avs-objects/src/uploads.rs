//! One-time upload tickets
//!
//! `POST /api/objects/upload` hands out a ticket; the bytes are then `PUT` to
//! the ticket URL. A ticket is consumed by its first successful redemption
//! and lapses after its time-to-live.

use crate::error::{ObjectError, ObjectResult};
use crate::path::ObjectPath;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// Default ticket lifetime
pub const DEFAULT_TICKET_TTL: Duration = Duration::from_secs(15 * 60);

/// An issued upload slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub id: String,
    pub path: ObjectPath,
    pub expires_at: Instant,
}

impl UploadTicket {
    /// URL the client uploads to (and later reads from)
    #[inline]
    #[must_use]
    pub fn upload_url(&self) -> String {
        self.path.public_url()
    }
}

/// Outstanding upload tickets
#[derive(Debug)]
pub struct UploadTickets {
    pending: DashMap<String, UploadTicket>,
    ttl: Duration,
}

impl Default for UploadTickets {
    fn default() -> Self {
        Self::new(DEFAULT_TICKET_TTL)
    }
}

impl UploadTickets {
    /// Create registry with the given lifetime
    #[inline]
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh ticket
    ///
    /// # Errors
    /// Never in practice; the generated id is always a valid segment
    pub fn issue(&self) -> ObjectResult<UploadTicket> {
        self.purge_expired();
        let id = Uuid::new_v4().simple().to_string();
        let ticket = UploadTicket {
            path: ObjectPath::upload(&id)?,
            id: id.clone(),
            expires_at: Instant::now() + self.ttl,
        };
        self.pending.insert(id, ticket.clone());
        debug!(ticket = %ticket.id, "Issued upload ticket");
        Ok(ticket)
    }

    /// Consume a ticket, returning where the upload goes
    ///
    /// # Errors
    /// [`ObjectError::TicketNotFound`] for unknown, used or expired tickets
    pub fn redeem(&self, id: &str) -> ObjectResult<ObjectPath> {
        let (_, ticket) = self
            .pending
            .remove(id)
            .ok_or(ObjectError::TicketNotFound)?;
        if ticket.expires_at <= Instant::now() {
            return Err(ObjectError::TicketNotFound);
        }
        Ok(ticket.path)
    }

    /// Drop expired tickets
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.pending.retain(|_, ticket| ticket.expires_at > now);
    }

    /// Number of outstanding tickets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no tickets are outstanding
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
