//! # Microsoft Graph Provider
//!
//! Typed access to the Graph REST API over an injected [`HttpClient`].
//!
//! ## Overview
//!
//! This crate provides:
//! - Drive scope resolution (`/drives/{id}`, `/users/{id}/drive`, ... or `/me/drive`)
//! - Users, drives and mail operations with OData query support
//! - Mail attachments, inline or through a chunked upload session
//! - Status-code translation into [`GraphError`] categories and
//!   [`Conditional`] outcomes for ETag requests
//!
//! [`HttpClient`]: bridge_traits::http::HttpClient

pub mod client;
pub mod drives;
pub mod error;
pub mod mail;
pub mod query;
pub mod recipients;
pub mod response;
pub mod scope;
pub mod types;
pub mod upload;
pub mod users;

pub use client::{GraphClient, CLIENT_REQUEST_ID};
pub use drives::{
    ConflictBehavior, DownloadParams, DriveOwner, Drives, GetItemParams, ListChangesParams,
    ListChildrenParams, UploadTarget, MAX_SIMPLE_UPLOAD_SIZE,
};
pub use error::{GraphError, Result};
pub use mail::{
    AttachmentSource, BodyType, Importance, ListMessagesParams, Mail, MessageDraft, MessageHeader,
    StructuredMessage,
};
pub use query::ODataQuery;
pub use recipients::Recipient;
pub use response::{Conditional, ErrorContext, ServiceError};
pub use scope::{DefaultScope, DriveScope, DriveTarget, ItemRef};
pub use types::{
    Attachment, AttachmentResult, Collection, Drive, DriveItem, ItemBody, Message, UploadSessionInfo,
    User,
};
pub use upload::{
    ByteRange, ChunkPlan, TransferState, TransferStrategy, INLINE_ATTACHMENT_LIMIT,
    MAX_ATTACHMENT_SIZE, UPLOAD_CHUNK_SIZE,
};
pub use users::{ListUsersParams, Users};
