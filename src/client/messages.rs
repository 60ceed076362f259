//! Sending a reply: optimistic entry, sequential uploads, then the response row.

use super::{ClientError, Composer, DeskApi, Draft, Notifier, Thread};
use crate::connectors::storage::{self, ObjectStorage};
use crate::forms::ticket::{AttachmentMeta, NewResponse};
use crate::models::{Attachment, TicketResponse, User};
use chrono::Utc;
use uuid::Uuid;

const SEND_FAILED: &str = "Failed to send message";

pub struct MessageSender<'a> {
    api: &'a dyn DeskApi,
    storage: &'a dyn ObjectStorage,
    notifier: &'a dyn Notifier,
}

impl<'a> MessageSender<'a> {
    pub fn new(
        api: &'a dyn DeskApi,
        storage: &'a dyn ObjectStorage,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            api,
            storage,
            notifier,
        }
    }

    /// Send the composer's draft into `thread`.
    ///
    /// The first failing upload or the failing insert aborts the rest: the optimistic
    /// entry is removed, the draft is put back and a single toast is shown.
    pub async fn send(
        &self,
        user: &User,
        thread: &mut Thread,
        composer: &mut Composer,
        avatar_id: Option<Uuid>,
    ) -> Result<TicketResponse, ClientError> {
        if !composer.can_send() {
            return Err(ClientError::Validation(
                "Message or attachment is required".to_string(),
            ));
        }
        let draft = composer.take();
        let temp_id = Uuid::new_v4();
        thread.push_pending(optimistic(temp_id, thread.ticket_id(), user, &draft, avatar_id));
        tracing::debug!("sending {} for ticket {}", thread.label(temp_id), thread.ticket_id());

        match self.deliver(user, thread.ticket_id(), &draft, avatar_id).await {
            Ok(stored) => {
                thread.confirm_local(temp_id, stored.clone());
                Ok(stored)
            }
            Err(err) => {
                thread.remove_local(temp_id);
                composer.restore(draft);
                self.notifier.toast(SEND_FAILED, &err.to_string());
                Err(err)
            }
        }
    }

    async fn deliver(
        &self,
        user: &User,
        ticket_id: Uuid,
        draft: &Draft,
        avatar_id: Option<Uuid>,
    ) -> Result<TicketResponse, ClientError> {
        let mut attachments = Vec::with_capacity(draft.files.len());
        for file in &draft.files {
            storage::validate_file(file.size(), &file.content_type)?;
            let path = storage::object_path(user.id, ticket_id, &file.name);
            let stored_path = self
                .storage
                .upload(&path, &file.content_type, file.bytes.clone())
                .await
                .map_err(|err| ClientError::Upload(format!("{}: {}", file.name, err)))?;
            attachments.push(AttachmentMeta {
                path: stored_path,
                name: file.name.clone(),
                file_type: file.content_type.clone(),
                size: file.bytes.len() as i64,
            });
        }

        let request = NewResponse {
            message: draft.text.trim().to_string(),
            avatar_id,
            attachments,
        };
        self.api.send_response(ticket_id, &request).await
    }
}

fn optimistic(
    temp_id: Uuid,
    ticket_id: Uuid,
    user: &User,
    draft: &Draft,
    avatar_id: Option<Uuid>,
) -> TicketResponse {
    let now = Utc::now();
    TicketResponse {
        id: temp_id,
        ticket_id,
        user_id: Some(user.id),
        message: draft.text.trim().to_string(),
        is_admin: user.is_admin(),
        avatar_id,
        is_read: false,
        read_at: None,
        created_at: now,
        attachments: draft
            .files
            .iter()
            .map(|file| Attachment {
                id: Uuid::new_v4(),
                response_id: temp_id,
                ticket_id,
                file_path: String::new(),
                file_name: file.name.clone(),
                file_size: file.bytes.len() as i64,
                file_type: file.content_type.clone(),
                uploaded_by: Some(user.id),
                created_at: now,
            })
            .collect(),
    }
}
