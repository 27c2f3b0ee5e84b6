//! Blocking adapter
//!
//! Same operations as the async facade, driven to completion on a private
//! current-thread runtime. Must not be called from inside an async runtime.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::error::Result;
use crate::{
    AttachmentResult, AttachmentSource, Collection, Conditional, ConflictBehavior, DownloadParams,
    Drive, DriveItem, DriveOwner, DriveScope, GetItemParams, GraphClient, GraphConfig,
    ListChangesParams, ListChildrenParams, ListMessagesParams, ListUsersParams, Message,
    MessageDraft, UploadTarget, User,
};

type GraphResult<T> = provider_msgraph::Result<T>;

/// Blocking Graph client
#[derive(Clone)]
pub struct MsGraph {
    inner: crate::MsGraph,
    runtime: Arc<Runtime>,
}

impl MsGraph {
    pub fn new(config: GraphConfig) -> Result<Self> {
        let inner = crate::MsGraph::new(config)?;
        Self::from_async(inner)
    }

    /// Drive an existing async client
    pub fn from_async(inner: crate::MsGraph) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    pub fn client(&self) -> &GraphClient {
        self.inner.client()
    }

    pub fn users(&self) -> Users<'_> {
        Users { graph: self }
    }

    pub fn drives(&self) -> Drives<'_> {
        Drives { graph: self }
    }

    pub fn mail(&self) -> Mail<'_> {
        Mail { graph: self }
    }

    pub fn invalidate_token(&self) {
        self.runtime.block_on(self.inner.invalidate_token());
    }
}

pub struct Users<'a> {
    graph: &'a MsGraph,
}

impl Users<'_> {
    pub fn list_users(&self, params: &ListUsersParams) -> GraphResult<Collection<User>> {
        let users = self.graph.inner.users();
        self.graph.runtime.block_on(users.list_users(params))
    }

    pub fn get_user(&self, user_id: &str, select: Option<&str>) -> GraphResult<User> {
        let users = self.graph.inner.users();
        self.graph.runtime.block_on(users.get_user(user_id, select))
    }
}

pub struct Drives<'a> {
    graph: &'a MsGraph,
}

impl Drives<'_> {
    pub fn list_drives(&self, owner: &DriveOwner, select: Option<&str>) -> GraphResult<Collection<Drive>> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.list_drives(owner, select))
    }

    pub fn get_drive(&self, scope: &DriveScope, select: Option<&str>) -> GraphResult<Drive> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.get_drive(scope, select))
    }

    pub fn get_item(&self, params: &GetItemParams) -> GraphResult<Conditional<DriveItem>> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.get_item(params))
    }

    pub fn list_followed(
        &self,
        user_id: Option<&str>,
        select: Option<&str>,
    ) -> GraphResult<Collection<DriveItem>> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.list_followed(user_id, select))
    }

    pub fn list_children(&self, params: &ListChildrenParams) -> GraphResult<Collection<DriveItem>> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.list_children(params))
    }

    pub fn list_changes(&self, params: &ListChangesParams) -> GraphResult<Collection<DriveItem>> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.list_changes(params))
    }

    pub fn create_folder(
        &self,
        scope: &DriveScope,
        name: &str,
        parent_id: Option<&str>,
        conflict_behavior: ConflictBehavior,
    ) -> GraphResult<DriveItem> {
        let drives = self.graph.inner.drives();
        self.graph
            .runtime
            .block_on(drives.create_folder(scope, name, parent_id, conflict_behavior))
    }

    pub fn update_item(
        &self,
        scope: &DriveScope,
        item_id: &str,
        properties: &Value,
        etag: Option<&str>,
    ) -> GraphResult<Conditional<DriveItem>> {
        let drives = self.graph.inner.drives();
        self.graph
            .runtime
            .block_on(drives.update_item(scope, item_id, properties, etag))
    }

    pub fn upload_content(
        &self,
        scope: &DriveScope,
        target: &UploadTarget,
        content: Bytes,
        content_type: Option<&str>,
    ) -> GraphResult<DriveItem> {
        let drives = self.graph.inner.drives();
        self.graph
            .runtime
            .block_on(drives.upload_content(scope, target, content, content_type))
    }

    pub fn download_content(&self, params: &DownloadParams) -> GraphResult<Conditional<Bytes>> {
        let drives = self.graph.inner.drives();
        self.graph.runtime.block_on(drives.download_content(params))
    }
}

pub struct Mail<'a> {
    graph: &'a MsGraph,
}

impl Mail<'_> {
    pub fn list_messages(
        &self,
        user_id: &str,
        params: &ListMessagesParams,
    ) -> GraphResult<Collection<Message>> {
        let mail = self.graph.inner.mail();
        self.graph.runtime.block_on(mail.list_messages(user_id, params))
    }

    pub fn create_message(
        &self,
        user_id: &str,
        folder_id: Option<&str>,
        draft: &MessageDraft,
    ) -> GraphResult<Message> {
        let mail = self.graph.inner.mail();
        self.graph
            .runtime
            .block_on(mail.create_message(user_id, folder_id, draft))
    }

    pub fn send_message(&self, user_id: &str, message_id: &str) -> GraphResult<()> {
        let mail = self.graph.inner.mail();
        self.graph.runtime.block_on(mail.send_message(user_id, message_id))
    }

    pub fn add_attachment(
        &self,
        user_id: &str,
        message_id: &str,
        source: AttachmentSource,
        is_inline: bool,
        content_type: Option<&str>,
    ) -> GraphResult<AttachmentResult> {
        let mail = self.graph.inner.mail();
        self.graph.runtime.block_on(mail.add_attachment(
            user_id,
            message_id,
            source,
            is_inline,
            content_type,
        ))
    }
}
