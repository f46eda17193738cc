use super::{Chat, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type of message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Photo,
    Document,
    Sticker,
    Location,
    Contact,
    Other,
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Text => "text",
            MessageType::Photo => "photo",
            MessageType::Document => "document",
            MessageType::Sticker => "sticker",
            MessageType::Location => "location",
            MessageType::Contact => "contact",
            MessageType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sticker {
    pub file_id: String,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    pub user_id: Option<i64>,
}

/// An incoming message, edited message or channel post
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub sender_chat: Option<Chat>,
    pub chat: Chat,
    /// Unix timestamp
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<PhotoSize>,
    pub document: Option<Document>,
    pub sticker: Option<Sticker>,
    pub location: Option<Location>,
    pub contact: Option<Contact>,
}

impl Message {
    pub fn new(message_id: i64, chat: Chat) -> Self {
        Self {
            message_id,
            from: None,
            sender_chat: None,
            chat,
            date: Utc::now().timestamp(),
            text: None,
            caption: None,
            reply_to_message: None,
            photo: Vec::new(),
            document: None,
            sticker: None,
            location: None,
            contact: None,
        }
    }

    pub fn from_text(message_id: i64, chat: Chat, text: impl Into<String>) -> Self {
        let mut msg = Self::new(message_id, chat);
        msg.text = Some(text.into());
        msg
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.from = Some(user);
        self
    }

    pub fn with_reply_to(mut self, message: Message) -> Self {
        self.reply_to_message = Some(Box::new(message));
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_photo(mut self, photo: PhotoSize) -> Self {
        self.photo.push(photo);
        self
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Text if present, otherwise the media caption
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }

    pub fn message_type(&self) -> MessageType {
        if !self.photo.is_empty() {
            MessageType::Photo
        } else if self.document.is_some() {
            MessageType::Document
        } else if self.sticker.is_some() {
            MessageType::Sticker
        } else if self.location.is_some() {
            MessageType::Location
        } else if self.contact.is_some() {
            MessageType::Contact
        } else if self.text.is_some() {
            MessageType::Text
        } else {
            MessageType::Other
        }
    }
}
