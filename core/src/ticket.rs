//! Ticket codes carried by the QR image on a participant's pass.
//!
//! The payload is `usn=<USN>&eid=<event id>`, either bare or as the query of
//! a URL (`https://host/check-in?usn=...&eid=...`).

use crate::error::RegistrationError;
use crate::types::{EventId, UserId};
use serde::Deserialize;

/// A decoded ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketCode {
    /// Ticket holder
    pub user_id: UserId,
    /// Event the ticket admits to
    pub event_id: EventId,
}

#[derive(Deserialize)]
struct RawTicket {
    usn: Option<String>,
    eid: Option<String>,
}

impl TicketCode {
    /// Build a ticket for a holder and event.
    #[must_use]
    pub const fn new(user_id: UserId, event_id: EventId) -> Self {
        Self { user_id, event_id }
    }

    /// Decode a scanned payload.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidArgument`] if either key is missing
    /// or empty, or if `eid` is not an integer.
    pub fn parse(payload: &str) -> Result<Self, RegistrationError> {
        let payload = payload.trim();
        let query = match payload.split_once('?') {
            Some((_, query)) => query,
            None => payload,
        };
        // Drop any fragment the scanner kept.
        let query = query.split('#').next().unwrap_or_default();

        let raw: RawTicket = serde_urlencoded::from_str(query)
            .map_err(|e| RegistrationError::InvalidArgument(format!("unreadable ticket: {e}")))?;

        let usn = raw
            .usn
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RegistrationError::InvalidArgument("ticket has no usn".to_string()))?;
        let eid = raw
            .eid
            .ok_or_else(|| RegistrationError::InvalidArgument("ticket has no eid".to_string()))?;

        Ok(Self {
            user_id: UserId::new(usn),
            event_id: eid.parse()?,
        })
    }

    /// Encode as the bare query payload.
    #[must_use]
    pub fn to_payload(&self) -> String {
        serde_urlencoded::to_string([
            ("usn", self.user_id.as_str().to_string()),
            ("eid", self.event_id.to_string()),
        ])
        .unwrap_or_else(|_| format!("usn={}&eid={}", self.user_id, self.event_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_query() {
        let ticket = TicketCode::parse("usn=1BM21CS042&eid=17").ok();
        assert_eq!(
            ticket,
            Some(TicketCode::new(UserId::new("1BM21CS042"), EventId::new(17)))
        );
    }

    #[test]
    fn parses_url_with_query_in_any_order() {
        let ticket =
            TicketCode::parse("https://epass.example/check-in?eid=3&usn=1BM22IS001#top").ok();
        assert_eq!(
            ticket,
            Some(TicketCode::new(UserId::new("1BM22IS001"), EventId::new(3)))
        );
    }

    #[test]
    fn missing_keys_are_invalid() {
        for payload in ["eid=3", "usn=1BM22IS001", "", "usn=&eid=3"] {
            assert!(
                matches!(
                    TicketCode::parse(payload),
                    Err(RegistrationError::InvalidArgument(_))
                ),
                "payload {payload:?} should be rejected"
            );
        }
    }

    #[test]
    fn non_integer_event_id_is_invalid() {
        assert!(matches!(
            TicketCode::parse("usn=1BM22IS001&eid=abc"),
            Err(RegistrationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn payload_round_trips() {
        let ticket = TicketCode::new(UserId::new("1BM21CS042"), EventId::new(9));
        assert_eq!(TicketCode::parse(&ticket.to_payload()).ok(), Some(ticket));
    }
}
