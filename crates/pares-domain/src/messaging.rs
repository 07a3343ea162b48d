use chrono::{DateTime, Utc};

use crate::ValidationError;
use crate::model::{Conversation, Message};

const PREVIEW_CHARS: usize = 120;

/// Conversations where `user_id` takes part, most recent first. Passing
/// `None` lists every conversation.
pub fn conversations_for(conversations: &[Conversation], user_id: Option<&str>) -> Vec<Conversation> {
    let mut rows: Vec<Conversation> = conversations
        .iter()
        .filter(|conversation| {
            user_id.is_none_or(|user_id| {
                conversation.customer_id == user_id || conversation.service_provider_id == user_id
            })
        })
        .cloned()
        .collect();
    rows.sort_by(|left, right| right.last_message_time.cmp(&left.last_message_time));
    rows
}

pub fn messages_in(messages: &[Message], conversation_id: &str) -> Vec<Message> {
    let mut rows: Vec<Message> = messages
        .iter()
        .filter(|message| message.conversation_id == conversation_id)
        .cloned()
        .collect();
    rows.sort_by(|left, right| left.timestamp.cmp(&right.timestamp));
    rows
}

pub fn validate_outgoing(sender_id: &str, receiver_id: &str, content: &str) -> Result<(), ValidationError> {
    if sender_id.trim().is_empty() {
        return Err(ValidationError::new("senderId", "Sender is required."));
    }
    if receiver_id.trim().is_empty() {
        return Err(ValidationError::new("receiverId", "Receiver is required."));
    }
    if content.trim().is_empty() {
        return Err(ValidationError::new("content", "Message content is required."));
    }
    Ok(())
}

/// Moves the conversation's preview to the newest message.
pub fn record_delivery(conversation: &mut Conversation, message: &Message) {
    conversation.last_message = preview(&message.content);
    conversation.last_message_time = latest(conversation.last_message_time, message.timestamp);
    if !message.is_read {
        conversation.unread_count = conversation.unread_count.saturating_add(1);
    }
}

fn latest(left: DateTime<Utc>, right: DateTime<Utc>) -> DateTime<Utc> {
    if right > left { right } else { left }
}

fn preview(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
