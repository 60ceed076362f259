//! Ticket lists per status bucket, paged from the server.

use super::{thread, DeskApi, Notifier};
use crate::forms::ticket::DEFAULT_PAGE_SIZE;
use crate::models::{Ticket, TicketStatus};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Bucket {
    pub tickets: Vec<Ticket>,
    pub loading: bool,
    pub has_more: bool,
    offset: i64,
}

#[derive(Debug)]
pub struct TicketBoard {
    viewer_is_admin: bool,
    page_size: i64,
    buckets: HashMap<TicketStatus, Bucket>,
}

impl TicketBoard {
    pub fn new(viewer_is_admin: bool) -> Self {
        let buckets = TicketStatus::ALL
            .into_iter()
            .map(|status| {
                (
                    status,
                    Bucket {
                        has_more: true,
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self {
            viewer_is_admin,
            page_size: DEFAULT_PAGE_SIZE,
            buckets,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn bucket(&self, status: TicketStatus) -> Option<&Bucket> {
        self.buckets.get(&status)
    }

    pub fn find(&self, id: Uuid) -> Option<&Ticket> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.tickets.iter())
            .find(|ticket| ticket.id == id)
    }

    fn find_mut(&mut self, id: Uuid) -> Option<&mut Ticket> {
        self.buckets
            .values_mut()
            .flat_map(|bucket| bucket.tickets.iter_mut())
            .find(|ticket| ticket.id == id)
    }

    /// Load the next page of `status`. A full page means more may follow.
    pub async fn load_more(
        &mut self,
        api: &dyn DeskApi,
        status: TicketStatus,
        notifier: &dyn Notifier,
    ) -> bool {
        let page_size = self.page_size;
        let bucket = self.buckets.entry(status).or_default();
        if bucket.loading {
            return false;
        }
        bucket.loading = true;
        let offset = bucket.offset;

        let result = api.list_tickets(status, offset, page_size).await;
        let bucket = self.buckets.entry(status).or_default();
        bucket.loading = false;
        match result {
            Ok(page) => {
                bucket.has_more = page.len() as i64 == page_size;
                bucket.offset += page.len() as i64;
                for ticket in page {
                    if !bucket.tickets.iter().any(|known| known.id == ticket.id) {
                        bucket.tickets.push(ticket);
                    }
                }
                true
            }
            Err(err) => {
                tracing::error!("Failed to load {} tickets: {}", status, err);
                notifier.toast("Failed to load tickets", &err.to_string());
                false
            }
        }
    }

    /// Drop everything and load the first page of every bucket.
    pub async fn refresh(&mut self, api: &dyn DeskApi, notifier: &dyn Notifier) {
        for status in TicketStatus::ALL {
            self.buckets.insert(
                status,
                Bucket {
                    has_more: true,
                    ..Default::default()
                },
            );
            self.load_more(api, status, notifier).await;
        }
    }

    /// Mark the counterpart's responses of a ticket as read, on the server and here.
    pub async fn mark_messages_as_read(
        &mut self,
        api: &dyn DeskApi,
        ticket_id: Uuid,
        notifier: &dyn Notifier,
    ) -> usize {
        if let Err(err) = api.mark_read(ticket_id).await {
            tracing::error!("Failed to mark ticket {} as read: {}", ticket_id, err);
            notifier.toast("Failed to mark messages as read", &err.to_string());
            return 0;
        }
        let viewer_is_admin = self.viewer_is_admin;
        self.find_mut(ticket_id)
            .map(|ticket| thread::apply_read(ticket, viewer_is_admin))
            .unwrap_or(0)
    }

    /// Place a changed ticket in the bucket of its current status, newest first.
    pub fn upsert(&mut self, ticket: Ticket) {
        for bucket in self.buckets.values_mut() {
            bucket.tickets.retain(|known| known.id != ticket.id);
        }
        let bucket = self.buckets.entry(ticket.status).or_default();
        let at = bucket
            .tickets
            .iter()
            .position(|known| known.created_at < ticket.created_at)
            .unwrap_or(bucket.tickets.len());
        bucket.tickets.insert(at, ticket);
    }

    pub fn unread_count(&self, ticket_id: Uuid) -> usize {
        self.find(ticket_id)
            .map(|ticket| ticket.unread_count(self.viewer_is_admin))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingNotifier;
    use crate::client::thread::tests::{response, ticket};
    use crate::client::ClientError;
    use crate::forms::ticket::NewResponse;
    use crate::models::TicketResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct PagedApi {
        total: usize,
        calls: Mutex<Vec<(TicketStatus, i64, i64)>>,
        read_calls: Mutex<Vec<Uuid>>,
        fail: bool,
    }

    impl PagedApi {
        fn new(total: usize) -> Self {
            Self {
                total,
                calls: Mutex::new(vec![]),
                read_calls: Mutex::new(vec![]),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl DeskApi for PagedApi {
        async fn list_tickets(
            &self,
            status: TicketStatus,
            offset: i64,
            limit: i64,
        ) -> Result<Vec<Ticket>, ClientError> {
            self.calls.lock().unwrap().push((status, offset, limit));
            if self.fail {
                return Err(ClientError::Api {
                    code: 500,
                    message: "Failed to fetch tickets".into(),
                });
            }
            let remaining = self.total.saturating_sub(offset as usize);
            let count = remaining.min(limit as usize);
            Ok((0..count)
                .map(|_| {
                    let mut t = ticket(Uuid::new_v4());
                    t.status = status;
                    t
                })
                .collect())
        }

        async fn mark_read(&self, ticket_id: Uuid) -> Result<Vec<TicketResponse>, ClientError> {
            self.read_calls.lock().unwrap().push(ticket_id);
            Ok(vec![])
        }

        async fn send_response(
            &self,
            _ticket_id: Uuid,
            _response: &NewResponse,
        ) -> Result<TicketResponse, ClientError> {
            Err(ClientError::Validation("not used".into()))
        }
    }

    #[tokio::test]
    async fn test_has_more_until_a_short_page() {
        let api = PagedApi::new(25);
        let notifier = RecordingNotifier::default();
        let mut board = TicketBoard::new(true);

        assert!(board.load_more(&api, TicketStatus::Open, &notifier).await);
        let bucket = board.bucket(TicketStatus::Open).unwrap();
        assert_eq!(bucket.tickets.len(), 20);
        assert!(bucket.has_more);

        board.load_more(&api, TicketStatus::Open, &notifier).await;
        let bucket = board.bucket(TicketStatus::Open).unwrap();
        assert_eq!(bucket.tickets.len(), 25);
        assert!(!bucket.has_more);
        assert!(!bucket.loading);

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[1], (TicketStatus::Open, 20, 20));
    }

    #[tokio::test]
    async fn test_failed_load_toasts_and_keeps_state() {
        let mut api = PagedApi::new(5);
        api.fail = true;
        let notifier = RecordingNotifier::default();
        let mut board = TicketBoard::new(false).with_page_size(10);

        assert!(!board.load_more(&api, TicketStatus::Closed, &notifier).await);
        assert_eq!(notifier.count(), 1);
        let bucket = board.bucket(TicketStatus::Closed).unwrap();
        assert!(bucket.tickets.is_empty());
        assert!(bucket.has_more);
    }

    #[tokio::test]
    async fn test_mark_read_flips_counterpart_locally() {
        let api = PagedApi::new(0);
        let notifier = RecordingNotifier::default();
        let mut board = TicketBoard::new(false);

        let id = Uuid::new_v4();
        let mut t = ticket(id);
        t.ticket_responses = vec![response(id, 1, true), response(id, 2, false)];
        board.upsert(t);
        assert_eq!(board.unread_count(id), 1);

        assert_eq!(board.mark_messages_as_read(&api, id, &notifier).await, 1);
        assert_eq!(board.unread_count(id), 0);
        assert_eq!(board.mark_messages_as_read(&api, id, &notifier).await, 0);
        assert_eq!(api.read_calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_moves_ticket_between_buckets() {
        let mut board = TicketBoard::new(true);
        let id = Uuid::new_v4();
        let mut t = ticket(id);
        board.upsert(t.clone());
        assert_eq!(board.bucket(TicketStatus::Open).unwrap().tickets.len(), 1);

        t.status = TicketStatus::Closed;
        board.upsert(t);
        assert!(board.bucket(TicketStatus::Open).unwrap().tickets.is_empty());
        assert_eq!(board.bucket(TicketStatus::Closed).unwrap().tickets.len(), 1);
    }
}
