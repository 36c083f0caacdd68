use std::collections::HashMap;

use chrono::Utc;

use crate::errors::ApiError;
use crate::models::{
    ConversationSummary, Delivery, Message, ParticipantInfo, ParticipantType, ThreadMessage, Viewer,
};
use crate::services::messaging::ChatBackend;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const SELF_LABEL: &str = "You";
const SEND_FAILED: &str = "Message could not be sent";

/// The other side of `message` from the viewer's point of view.
pub fn counterpart<'a>(message: &'a Message, viewer: &Viewer) -> (i64, Option<&'a ParticipantInfo>) {
    if viewer.sent(message) {
        (message.receiver_id, message.receiver.as_ref())
    } else {
        (message.sender_id, message.sender.as_ref())
    }
}

/// Groups a flat message list into one summary per counterpart.
///
/// Summaries come out in order of each counterpart's first appearance. The
/// latest message is the one with the greatest `sent_at`; among equal
/// timestamps the earliest in the input wins.
pub fn summarize(messages: &[Message], viewer: &Viewer) -> Vec<ConversationSummary> {
    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, Vec<&Message>> = HashMap::new();

    for message in messages {
        let (id, _) = counterpart(message, viewer);
        groups
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(message);
    }

    order
        .into_iter()
        .filter_map(|id| {
            let mut group = groups.remove(&id)?;
            // Stable, so ties keep input order.
            group.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
            let latest = *group.first()?;

            let infos: Vec<&ParticipantInfo> = group
                .iter()
                .filter_map(|m| counterpart(m, viewer).1)
                .collect();
            let name = infos
                .iter()
                .find_map(|i| i.name.clone())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            let avatar = infos.iter().find_map(|i| i.avatar.clone());

            Some(ConversationSummary {
                counterpart_id: id,
                counterpart_name: name,
                counterpart_avatar: avatar,
                last_message: latest.clone(),
                unread_count: group.iter().filter(|m| m.is_unread()).count(),
            })
        })
        .collect()
}

/// Assigns sender and receiver roles for display in an open thread.
///
/// A message counts as the viewer's when it carries the viewer's type or
/// does not come from the counterpart.
pub fn label_thread(
    messages: Vec<Message>,
    viewer: &Viewer,
    counterpart_id: i64,
    counterpart_name: &str,
) -> Vec<ThreadMessage> {
    messages
        .into_iter()
        .map(|mut message| {
            let from_viewer =
                message.sender_type == viewer.kind || message.sender_id != counterpart_id;
            let sender_name = if from_viewer {
                message.sender_type = viewer.kind;
                message.receiver_type = viewer.kind.opposite();
                SELF_LABEL.to_string()
            } else {
                message.sender_type = viewer.kind.opposite();
                message.receiver_type = viewer.kind;
                counterpart_name.to_string()
            };
            ThreadMessage {
                message,
                sender_name,
                delivery: Delivery::Confirmed,
            }
        })
        .collect()
}

/// Case-insensitive substring match on the counterpart name.
pub fn filter_summaries<'a>(
    summaries: &'a [ConversationSummary],
    query: &str,
) -> Vec<&'a ConversationSummary> {
    let needle = query.to_lowercase();
    summaries
        .iter()
        .filter(|s| s.counterpart_name.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveConversation {
    pub counterpart_id: i64,
    pub counterpart_name: String,
}

/// Chat view state: summaries, the open thread and outgoing deliveries.
///
/// Outgoing messages are shown immediately as `Pending`. A failed send stays
/// in the thread as `Failed` until it is retried or discarded, and the
/// summary goes back to its last confirmed message.
pub struct ChatSession {
    viewer: Viewer,
    summaries: Vec<ConversationSummary>,
    active: Option<ActiveConversation>,
    thread: Vec<ThreadMessage>,
}

impl ChatSession {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            summaries: Vec::new(),
            active: None,
            thread: Vec::new(),
        }
    }

    pub fn summaries(&self) -> &[ConversationSummary] {
        &self.summaries
    }

    pub fn active(&self) -> Option<&ActiveConversation> {
        self.active.as_ref()
    }

    pub fn thread(&self) -> &[ThreadMessage] {
        &self.thread
    }

    pub fn summary(&self, counterpart_id: i64) -> Option<&ConversationSummary> {
        self.summaries
            .iter()
            .find(|s| s.counterpart_id == counterpart_id)
    }

    fn summary_mut(&mut self, counterpart_id: i64) -> Option<&mut ConversationSummary> {
        self.summaries
            .iter_mut()
            .find(|s| s.counterpart_id == counterpart_id)
    }

    pub fn search(&self, query: &str) -> Vec<&ConversationSummary> {
        filter_summaries(&self.summaries, query)
    }

    /// Rebuilds summaries from the backend and selects the first one.
    pub async fn load(&mut self, backend: &dyn ChatBackend) -> Result<(), ApiError> {
        let messages = backend.user_messages().await?;
        self.summaries = summarize(&messages, &self.viewer);
        self.active = self.summaries.first().map(|s| ActiveConversation {
            counterpart_id: s.counterpart_id,
            counterpart_name: s.counterpart_name.clone(),
        });
        self.thread.clear();

        tracing::info!(
            messages = messages.len(),
            conversations = self.summaries.len(),
            "loaded conversations"
        );
        Ok(())
    }

    /// Fetches and labels one thread, then marks it read.
    pub async fn open(&mut self, backend: &dyn ChatBackend, counterpart_id: i64) -> Result<(), ApiError> {
        let name = self
            .summary(counterpart_id)
            .map(|s| s.counterpart_name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        let messages = backend.conversation(counterpart_id).await?;
        self.thread = label_thread(messages, &self.viewer, counterpart_id, &name);
        self.active = Some(ActiveConversation {
            counterpart_id,
            counterpart_name: name,
        });

        backend.mark_read(counterpart_id).await?;
        if let Some(summary) = self.summary_mut(counterpart_id) {
            summary.unread_count = 0;
        }
        Ok(())
    }

    /// Sends `content` to the active counterpart. Returns the local id of
    /// the thread entry.
    pub async fn send(&mut self, backend: &dyn ChatBackend, content: &str) -> Result<String, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::EmptyMessage);
        }
        let active = self.active.clone().ok_or(ApiError::NoActiveConversation)?;

        let local_id = uuid::Uuid::new_v4().to_string();
        let message = Message {
            id: None,
            sender_id: self.viewer.id,
            sender_type: ParticipantType::User,
            receiver_id: active.counterpart_id,
            receiver_type: ParticipantType::Association,
            message_content: content.to_string(),
            sent_at: Utc::now(),
            read_at: None,
            sender: None,
            receiver: None,
        };

        self.thread.push(ThreadMessage {
            message,
            sender_name: SELF_LABEL.to_string(),
            delivery: Delivery::Pending {
                local_id: local_id.clone(),
            },
        });

        self.deliver(backend, &active, &local_id).await?;
        Ok(local_id)
    }

    /// Resends a failed entry. Never called automatically.
    pub async fn retry(&mut self, backend: &dyn ChatBackend, local_id: &str) -> Result<(), ApiError> {
        let active = self.active.clone().ok_or(ApiError::NoActiveConversation)?;
        let entry = self
            .entry_mut(local_id)
            .filter(|e| matches!(e.delivery, Delivery::Failed { .. }))
            .ok_or_else(|| ApiError::NotFound(format!("failed message {local_id}")))?;

        entry.delivery = Delivery::Pending {
            local_id: local_id.to_string(),
        };
        entry.message.sent_at = Utc::now();

        self.deliver(backend, &active, local_id).await
    }

    /// Drops a failed entry from the thread.
    pub fn discard(&mut self, local_id: &str) -> bool {
        let before = self.thread.len();
        self.thread.retain(|e| {
            !matches!(&e.delivery, Delivery::Failed { local_id: id, .. } if id == local_id)
        });
        self.thread.len() != before
    }

    fn entry_mut(&mut self, local_id: &str) -> Option<&mut ThreadMessage> {
        self.thread
            .iter_mut()
            .find(|e| e.delivery.local_id() == Some(local_id))
    }

    async fn deliver(
        &mut self,
        backend: &dyn ChatBackend,
        active: &ActiveConversation,
        local_id: &str,
    ) -> Result<(), ApiError> {
        let pending = match self.entry_mut(local_id) {
            Some(entry) => entry.message.clone(),
            None => return Err(ApiError::NotFound(format!("message {local_id}"))),
        };
        let previous = self.patch_summary(active, &pending);

        let result = backend
            .send_to_association(active.counterpart_id, &pending.message_content)
            .await;

        match result {
            Ok(server_id) => {
                let mut confirmed = pending.clone();
                confirmed.id = server_id;
                if let Some(entry) = self.entry_mut(local_id) {
                    entry.message = confirmed.clone();
                    entry.delivery = Delivery::Confirmed;
                }
                if let Some(summary) = self.summary_mut(active.counterpart_id) {
                    if summary.last_message == pending {
                        summary.last_message = confirmed;
                    }
                }
                tracing::info!(counterpart_id = active.counterpart_id, id = ?server_id, "message sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, counterpart_id = active.counterpart_id, "failed to send message");
                if let Some(entry) = self.entry_mut(local_id) {
                    entry.delivery = Delivery::Failed {
                        local_id: local_id.to_string(),
                        reason: e.user_message(SEND_FAILED),
                    };
                }
                self.restore_summary(active.counterpart_id, &pending, previous);
                Err(e)
            }
        }
    }

    /// Points the summary at `message`, creating it for a first message.
    /// Returns what it pointed at before.
    fn patch_summary(&mut self, active: &ActiveConversation, message: &Message) -> Option<Message> {
        match self.summary_mut(active.counterpart_id) {
            Some(summary) => Some(std::mem::replace(&mut summary.last_message, message.clone())),
            None => {
                self.summaries.insert(
                    0,
                    ConversationSummary {
                        counterpart_id: active.counterpart_id,
                        counterpart_name: active.counterpart_name.clone(),
                        counterpart_avatar: None,
                        last_message: message.clone(),
                        unread_count: 0,
                    },
                );
                None
            }
        }
    }

    fn restore_summary(&mut self, counterpart_id: i64, pending: &Message, previous: Option<Message>) {
        let still_pending = self
            .summary(counterpart_id)
            .map(|s| s.last_message == *pending)
            .unwrap_or(false);
        if !still_pending {
            return;
        }
        match previous {
            Some(prev) => {
                if let Some(summary) = self.summary_mut(counterpart_id) {
                    summary.last_message = prev;
                }
            }
            None => self.summaries.retain(|s| s.counterpart_id != counterpart_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone};

    use super::*;

    const DONOR: Viewer = Viewer {
        id: 1,
        kind: ParticipantType::User,
    };

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn from_association(id: i64, association: i64, name: Option<&str>, minutes: i64, read: bool) -> Message {
        Message {
            id: Some(id),
            sender_id: association,
            sender_type: ParticipantType::Association,
            receiver_id: DONOR.id,
            receiver_type: ParticipantType::User,
            message_content: format!("message {id}"),
            sent_at: at(minutes),
            read_at: read.then(|| at(minutes + 1)),
            sender: name.map(|n| ParticipantInfo {
                name: Some(n.to_string()),
                avatar: None,
            }),
            receiver: None,
        }
    }

    fn from_donor(id: i64, association: i64, minutes: i64) -> Message {
        Message {
            id: Some(id),
            sender_id: DONOR.id,
            sender_type: ParticipantType::User,
            receiver_id: association,
            receiver_type: ParticipantType::Association,
            message_content: format!("message {id}"),
            sent_at: at(minutes),
            read_at: None,
            sender: None,
            receiver: None,
        }
    }

    #[test]
    fn empty_input_has_no_summaries() {
        assert!(summarize(&[], &DONOR).is_empty());
    }

    #[test]
    fn one_summary_per_counterpart() {
        let messages = vec![
            from_association(1, 10, Some("Food Bank"), 0, true),
            from_association(2, 20, Some("Shelter"), 1, false),
            from_donor(3, 10, 2),
            from_association(4, 30, None, 3, false),
            from_donor(5, 40, 4),
        ];
        let summaries = summarize(&messages, &DONOR);
        let ids: Vec<i64> = summaries.iter().map(|s| s.counterpart_id).collect();
        assert_eq!(ids, vec![10, 20, 30, 40]);
    }

    #[test]
    fn latest_message_and_unread_count() {
        let messages = vec![
            from_association(1, 10, Some("Food Bank"), 5, true),
            from_association(2, 10, Some("Food Bank"), 9, false),
            from_association(3, 10, Some("Food Bank"), 2, false),
            from_donor(4, 10, 7),
        ];
        let summaries = summarize(&messages, &DONOR);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message.id, Some(2));
        // message 4 has no read marker either
        assert_eq!(summaries[0].unread_count, 3);
        assert_eq!(summaries[0].counterpart_name, "Food Bank");
    }

    #[test]
    fn ties_keep_input_order() {
        let messages = vec![
            from_association(1, 10, None, 3, true),
            from_association(2, 10, None, 5, true),
            from_association(3, 10, None, 5, true),
        ];
        let summaries = summarize(&messages, &DONOR);
        assert_eq!(summaries[0].last_message.id, Some(2));
    }

    #[test]
    fn unknown_name_fallback() {
        let summaries = summarize(&[from_association(1, 10, None, 0, true)], &DONOR);
        assert_eq!(summaries[0].counterpart_name, UNKNOWN_NAME);
    }

    #[test]
    fn labels_roles_relative_to_counterpart() {
        let thread = label_thread(
            vec![from_association(1, 10, None, 0, true), from_donor(2, 10, 1)],
            &DONOR,
            10,
            "Food Bank",
        );
        assert!(!thread[0].is_from_user());
        assert_eq!(thread[0].sender_name, "Food Bank");
        assert_eq!(thread[0].message.receiver_type, ParticipantType::User);
        assert!(thread[1].is_from_user());
        assert_eq!(thread[1].sender_name, SELF_LABEL);
        assert_eq!(thread[1].message.receiver_type, ParticipantType::Association);
    }

    #[test]
    fn search_is_case_insensitive() {
        let summaries = summarize(
            &[
                from_association(1, 10, Some("Food Bank"), 0, true),
                from_association(2, 20, Some("Winter Shelter"), 0, true),
            ],
            &DONOR,
        );
        let hits = filter_summaries(&summaries, "FOOD");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].counterpart_id, 10);
        assert_eq!(filter_summaries(&summaries, "").len(), 2);
    }

    // ── ChatSession ──

    struct MockBackend {
        messages: Vec<Message>,
        fail_send: AtomicBool,
        ack_only: AtomicBool,
        sent: Mutex<Vec<(i64, String)>>,
        marked: Mutex<Vec<i64>>,
    }

    impl MockBackend {
        fn new(messages: Vec<Message>) -> Self {
            Self {
                messages,
                fail_send: AtomicBool::new(false),
                ack_only: AtomicBool::new(false),
                sent: Mutex::new(vec![]),
                marked: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn user_messages(&self) -> Result<Vec<Message>, ApiError> {
            Ok(self.messages.clone())
        }

        async fn conversation(&self, counterpart_id: i64) -> Result<Vec<Message>, ApiError> {
            Ok(self
                .messages
                .iter()
                .filter(|m| counterpart(m, &DONOR).0 == counterpart_id)
                .cloned()
                .collect())
        }

        async fn send_to_association(&self, association_id: i64, content: &str) -> Result<Option<i64>, ApiError> {
            if self.fail_send.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    message: None,
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((association_id, content.to_string()));
            if self.ack_only.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(Some(100 + sent.len() as i64))
        }

        async fn mark_read(&self, counterpart_id: i64) -> Result<(), ApiError> {
            self.marked.lock().unwrap().push(counterpart_id);
            Ok(())
        }
    }

    fn inbox() -> Vec<Message> {
        vec![
            from_association(1, 10, Some("Food Bank"), 0, false),
            from_association(2, 10, Some("Food Bank"), 1, false),
            from_association(3, 20, Some("Shelter"), 2, true),
        ]
    }

    #[tokio::test]
    async fn load_selects_first_conversation() {
        let backend = MockBackend::new(inbox());
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();

        assert_eq!(chat.summaries().len(), 2);
        assert_eq!(chat.active().unwrap().counterpart_id, 10);
    }

    #[tokio::test]
    async fn load_of_empty_inbox_has_no_active() {
        let backend = MockBackend::new(vec![]);
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();

        assert!(chat.summaries().is_empty());
        assert!(chat.active().is_none());
    }

    #[tokio::test]
    async fn open_marks_read() {
        let backend = MockBackend::new(inbox());
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();
        assert_eq!(chat.summary(10).unwrap().unread_count, 2);

        chat.open(&backend, 10).await.unwrap();

        assert_eq!(chat.thread().len(), 2);
        assert_eq!(chat.summary(10).unwrap().unread_count, 0);
        assert_eq!(*backend.marked.lock().unwrap(), vec![10]);
    }

    #[tokio::test]
    async fn send_appends_and_updates_summary() {
        let backend = MockBackend::new(inbox());
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();
        chat.open(&backend, 10).await.unwrap();

        chat.send(&backend, "Hello there").await.unwrap();

        let last = chat.thread().last().unwrap();
        assert_eq!(last.message.sender_type, ParticipantType::User);
        assert_eq!(last.message.message_content, "Hello there");
        assert_eq!(last.sender_name, SELF_LABEL);
        assert_eq!(last.delivery, Delivery::Confirmed);
        assert_eq!(last.message.id, Some(101));

        let summary = chat.summary(10).unwrap();
        assert_eq!(summary.last_message, last.message);
        assert_eq!(*backend.sent.lock().unwrap(), vec![(10, "Hello there".to_string())]);
    }

    #[tokio::test]
    async fn send_without_server_id_is_confirmed() {
        let backend = MockBackend::new(inbox());
        backend.ack_only.store(true, Ordering::SeqCst);
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();
        chat.open(&backend, 10).await.unwrap();

        chat.send(&backend, "Got it").await.unwrap();

        let last = chat.thread().last().unwrap();
        assert_eq!(last.delivery, Delivery::Confirmed);
        assert_eq!(last.message.id, None);
        assert_eq!(chat.summary(10).unwrap().last_message, last.message);
        assert_eq!(backend.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_is_visible_and_rolled_back() {
        let backend = MockBackend::new(inbox());
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();
        chat.open(&backend, 10).await.unwrap();
        let before = chat.summary(10).unwrap().last_message.clone();

        backend.fail_send.store(true, Ordering::SeqCst);
        let err = chat.send(&backend, "Hello").await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        let last = chat.thread().last().unwrap();
        assert_eq!(last.delivery.as_str(), "failed");
        assert_eq!(chat.summary(10).unwrap().last_message, before);

        let local_id = last.delivery.local_id().unwrap().to_string();
        backend.fail_send.store(false, Ordering::SeqCst);
        chat.retry(&backend, &local_id).await.unwrap();

        let last = chat.thread().last().unwrap();
        assert_eq!(last.delivery, Delivery::Confirmed);
        assert_eq!(chat.summary(10).unwrap().last_message, last.message);
        assert_eq!(chat.thread().len(), 3);
    }

    #[tokio::test]
    async fn discard_removes_only_failed() {
        let backend = MockBackend::new(inbox());
        let mut chat = ChatSession::new(DONOR);
        chat.load(&backend).await.unwrap();
        chat.open(&backend, 10).await.unwrap();

        backend.fail_send.store(true, Ordering::SeqCst);
        let _ = chat.send(&backend, "lost").await;
        let local_id = chat.thread().last().unwrap().delivery.local_id().unwrap().to_string();

        assert!(chat.discard(&local_id));
        assert!(!chat.discard(&local_id));
        assert_eq!(chat.thread().len(), 2);
    }

    #[tokio::test]
    async fn first_message_creates_then_drops_summary_on_failure() {
        let backend = MockBackend::new(vec![]);
        let mut chat = ChatSession::new(DONOR);
        chat.open(&backend, 99).await.unwrap();

        backend.fail_send.store(true, Ordering::SeqCst);
        assert!(chat.send(&backend, "hi").await.is_err());
        assert!(chat.summary(99).is_none());

        backend.fail_send.store(false, Ordering::SeqCst);
        chat.send(&backend, "hi again").await.unwrap();
        let summary = chat.summary(99).unwrap();
        assert_eq!(summary.counterpart_name, UNKNOWN_NAME);
        assert_eq!(summary.last_message.message_content, "hi again");
    }

    #[tokio::test]
    async fn send_rejects_blank_and_inactive() {
        let backend = MockBackend::new(vec![]);
        let mut chat = ChatSession::new(DONOR);
        assert!(matches!(
            chat.send(&backend, "hello").await,
            Err(ApiError::NoActiveConversation)
        ));

        chat.open(&backend, 10).await.unwrap();
        assert!(matches!(chat.send(&backend, "   ").await, Err(ApiError::EmptyMessage)));
        assert!(chat.thread().is_empty());
    }
}
