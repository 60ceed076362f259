//! The conversation of the selected ticket, kept in sync with realtime changes.

use crate::models::{Ticket, TicketResponse};
use crate::realtime::ChangeKind;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Row belongs to another ticket, or is already known.
    Ignored,
    Inserted,
    Updated,
    Removed,
}

#[derive(Debug, Clone)]
pub struct Thread {
    pub ticket: Ticket,
    /// Optimistic entries still waiting for their stored row.
    pending: HashSet<Uuid>,
}

impl Thread {
    pub fn new(mut ticket: Ticket) -> Self {
        sort(&mut ticket.ticket_responses);
        Self {
            ticket,
            pending: HashSet::new(),
        }
    }

    /// Take a newer copy of the ticket row, keeping unsent entries marked.
    pub(crate) fn replace_ticket(&mut self, mut ticket: Ticket) {
        sort(&mut ticket.ticket_responses);
        self.pending
            .retain(|id| ticket.ticket_responses.iter().any(|r| r.id == *id));
        self.ticket = ticket;
    }

    pub fn is_pending(&self, response_id: Uuid) -> bool {
        self.pending.contains(&response_id)
    }

    /// `temp-…` for an entry still being sent, the row id otherwise.
    pub fn label(&self, response_id: Uuid) -> String {
        if self.is_pending(response_id) {
            format!("temp-{response_id}")
        } else {
            response_id.to_string()
        }
    }

    pub fn ticket_id(&self) -> Uuid {
        self.ticket.id
    }

    pub fn responses(&self) -> &[TicketResponse] {
        &self.ticket.ticket_responses
    }

    pub fn contains(&self, response_id: Uuid) -> bool {
        self.ticket
            .ticket_responses
            .iter()
            .any(|r| r.id == response_id)
    }

    /// Apply a `ticket_responses` change. Rows of other tickets are ignored and
    /// an insert of a known id is dropped. Responses stay ordered by `created_at`.
    pub fn merge(&mut self, kind: ChangeKind, record: TicketResponse) -> MergeOutcome {
        if record.ticket_id != self.ticket.id {
            return MergeOutcome::Ignored;
        }
        let responses = &mut self.ticket.ticket_responses;
        let position = responses.iter().position(|r| r.id == record.id);

        let outcome = match (kind, position) {
            (ChangeKind::Insert, Some(_)) => MergeOutcome::Ignored,
            (ChangeKind::Insert, None) | (ChangeKind::Update, None) => {
                responses.push(record);
                MergeOutcome::Inserted
            }
            (ChangeKind::Update, Some(index)) => {
                let attachments = std::mem::take(&mut responses[index].attachments);
                responses[index] = record;
                if responses[index].attachments.is_empty() {
                    responses[index].attachments = attachments;
                }
                MergeOutcome::Updated
            }
            (ChangeKind::Delete, Some(index)) => {
                responses.remove(index);
                MergeOutcome::Removed
            }
            (ChangeKind::Delete, None) => MergeOutcome::Ignored,
        };
        sort(responses);
        outcome
    }

    fn push_local(&mut self, response: TicketResponse) {
        self.ticket.ticket_responses.push(response);
        sort(&mut self.ticket.ticket_responses);
    }

    pub(crate) fn push_pending(&mut self, response: TicketResponse) {
        self.pending.insert(response.id);
        self.push_local(response);
    }

    pub(crate) fn remove_local(&mut self, response_id: Uuid) -> Option<TicketResponse> {
        self.pending.remove(&response_id);
        let index = self
            .ticket
            .ticket_responses
            .iter()
            .position(|r| r.id == response_id)?;
        Some(self.ticket.ticket_responses.remove(index))
    }

    /// Swap a temporary entry for the stored row. If realtime already delivered
    /// the row, the temporary entry is just dropped.
    pub(crate) fn confirm_local(&mut self, temp_id: Uuid, stored: TicketResponse) {
        self.remove_local(temp_id);
        if !self.contains(stored.id) {
            self.push_local(stored);
        }
    }

    /// Locally flip the counterpart's responses to read. Returns how many changed.
    pub fn apply_read(&mut self, viewer_is_admin: bool) -> usize {
        apply_read(&mut self.ticket, viewer_is_admin)
    }

    pub fn unread_count(&self, viewer_is_admin: bool) -> usize {
        self.ticket.unread_count(viewer_is_admin)
    }
}

pub(crate) fn apply_read(ticket: &mut Ticket, viewer_is_admin: bool) -> usize {
    let now = chrono::Utc::now();
    let mut changed = 0;
    for response in ticket
        .ticket_responses
        .iter_mut()
        .filter(|r| r.is_admin != viewer_is_admin && !r.is_read)
    {
        response.is_read = true;
        response.read_at = Some(now);
        changed += 1;
    }
    changed
}

fn sort(responses: &mut [TicketResponse]) {
    responses.sort_by_key(|r| r.created_at);
}
