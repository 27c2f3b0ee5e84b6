//! Drives and drive items
//!
//! Every operation resolves its drive through [`DriveScope`]; item-level
//! operations then address the item by id or by path, never both.

use std::fmt;
use std::str::FromStr;

use bridge_traits::http::HttpMethod;
use bytes::Bytes;
use core_runtime::logging::redact_if_sensitive;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::client::GraphClient;
use crate::error::{GraphError, Result};
use crate::query::ODataQuery;
use crate::response::{conditional, ensure_success, parse_json, Conditional, ErrorContext};
use crate::scope::{segment, DefaultScope, DriveScope, DriveTarget, ItemRef};
use crate::types::{Collection, Drive, DriveItem};

/// Largest payload accepted by a simple `PUT .../content` upload (250 MiB)
pub const MAX_SIMPLE_UPLOAD_SIZE: u64 = 250 * 1024 * 1024;

const READ: ErrorContext = ErrorContext::new("read drive content", "Files.Read or Files.Read.All");
const CREATE_FOLDER: ErrorContext =
    ErrorContext::new("create folders in this drive", "Files.ReadWrite or Files.ReadWrite.All");
const UPDATE: ErrorContext =
    ErrorContext::new("update items in this drive", "Files.ReadWrite or Files.ReadWrite.All");
const UPLOAD: ErrorContext =
    ErrorContext::new("upload content to this drive", "Files.ReadWrite or Files.ReadWrite.All");

/// Owner whose drives are listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOwner {
    User(String),
    Group(String),
    Site(String),
}

impl DriveOwner {
    fn path(&self) -> Result<String> {
        let (collection, id) = match self {
            DriveOwner::User(id) => ("users", id),
            DriveOwner::Group(id) => ("groups", id),
            DriveOwner::Site(id) => ("sites", id),
        };
        if id.trim().is_empty() {
            return Err(GraphError::validation("drive owner id must not be empty"));
        }
        Ok(format!("/{}/{}/drives", collection, segment(id)))
    }
}

/// What happens when a created item's name is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictBehavior {
    #[default]
    Rename,
    Replace,
    Fail,
}

impl ConflictBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictBehavior::Rename => "rename",
            ConflictBehavior::Replace => "replace",
            ConflictBehavior::Fail => "fail",
        }
    }
}

impl fmt::Display for ConflictBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictBehavior {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(ConflictBehavior::Rename),
            "replace" => Ok(ConflictBehavior::Replace),
            "fail" => Ok(ConflictBehavior::Fail),
            other => Err(GraphError::validation(format!(
                "conflict behavior must be rename, replace or fail, got '{}'",
                other
            ))),
        }
    }
}

/// Parameters for [`Drives::get_item`]
#[derive(Debug, Clone, Default)]
pub struct GetItemParams {
    pub scope: DriveScope,
    pub item_id: Option<String>,
    pub item_path: Option<String>,
    /// SharePoint list id; needs a site scope and an item id
    pub list_id: Option<String>,
    pub select: Option<String>,
    pub expand: Option<String>,
    /// Only honored when addressing by item id
    pub include_deleted: bool,
    /// Sent as `if-none-match`
    pub etag: Option<String>,
}

/// Parameters for [`Drives::list_children`]
#[derive(Debug, Clone, Default)]
pub struct ListChildrenParams {
    pub scope: DriveScope,
    pub item_id: Option<String>,
    pub item_path: Option<String>,
    pub select: Option<String>,
    pub expand: Option<String>,
    pub orderby: Option<String>,
    pub top: Option<u32>,
}

/// Parameters for [`Drives::list_changes`]
#[derive(Debug, Clone, Default)]
pub struct ListChangesParams {
    pub scope: DriveScope,
    /// Token from a previous delta link, or `latest` to skip to the present
    pub token: Option<String>,
    pub select: Option<String>,
    pub expand: Option<String>,
    pub top: Option<u32>,
    pub show_sharing_changes: bool,
}

/// Destination of a simple upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// Replace the content of an existing file
    Existing(String),
    /// Create `filename` inside the folder `parent_id`
    New { parent_id: String, filename: String },
}

/// Parameters for [`Drives::download_content`]
#[derive(Debug, Clone, Default)]
pub struct DownloadParams {
    pub scope: DriveScope,
    pub item_id: Option<String>,
    pub item_path: Option<String>,
    /// Sent as `if-none-match`
    pub etag: Option<String>,
    /// Inclusive `(first, last)` byte offsets
    pub byte_range: Option<(u64, u64)>,
}

const DEFAULT_DELTA_PREFER: &str = "hierarchicalsharing";
const SHARING_DELTA_PREFER: &str =
    "deltashowremovedasdeleted, deltatraversepermissiongaps, deltashowsharingchanges";

pub struct Drives<'a> {
    client: &'a GraphClient,
}

impl<'a> Drives<'a> {
    pub(crate) fn new(client: &'a GraphClient) -> Self {
        Self { client }
    }

    /// List the drives of a user, group or site
    #[instrument(skip(self))]
    pub async fn list_drives(&self, owner: &DriveOwner, select: Option<&str>) -> Result<Collection<Drive>> {
        let request = self
            .client
            .request(HttpMethod::Get, &owner.path()?)
            .query_pairs(ODataQuery::new().select(select).into_pairs());

        let response = ensure_success(self.client.send(request).await?, &READ)?;
        let drives: Collection<Drive> = parse_json(&response)?;

        info!(count = drives.value.len(), "Listed drives");
        Ok(drives)
    }

    /// Get one drive. An explicit scope is required.
    #[instrument(skip(self))]
    pub async fn get_drive(&self, scope: &DriveScope, select: Option<&str>) -> Result<Drive> {
        let target = scope.resolve(DefaultScope::Required)?;

        let request = self
            .client
            .request(HttpMethod::Get, &target.base_path())
            .query_pairs(ODataQuery::new().select(select).into_pairs());

        let response = ensure_success(self.client.send(request).await?, &READ)?;
        parse_json(&response)
    }

    /// Item metadata by id, path or root.
    ///
    /// With an ETag, an unchanged item yields [`Conditional::NotModified`].
    #[instrument(skip(self))]
    pub async fn get_item(&self, params: &GetItemParams) -> Result<Conditional<DriveItem>> {
        let target = params.scope.resolve(DefaultScope::Allowed)?;
        let item = ItemRef::resolve(params.item_id.as_deref(), params.item_path.as_deref())?;

        let path = match &params.list_id {
            Some(list_id) => list_item_path(&target, &item, list_id)?,
            None => item.item_path(&target.base_path()),
        };

        let mut query = ODataQuery::new()
            .select(params.select.as_deref())
            .expand(params.expand.as_deref());
        if params.include_deleted && matches!(item, ItemRef::Id(_)) {
            query = query.param("includeDeletedItems", "true");
        }

        let mut request = self
            .client
            .request(HttpMethod::Get, &path)
            .query_pairs(query.into_pairs());
        if let Some(etag) = &params.etag {
            request = request.header("if-none-match", etag.clone());
        }

        let response = self.client.send(request).await?;
        conditional(response, &READ, |r| parse_json(&r))
    }

    /// Items the user follows; `/me` when no user is given
    #[instrument(skip(self))]
    pub async fn list_followed(
        &self,
        user_id: Option<&str>,
        select: Option<&str>,
    ) -> Result<Collection<DriveItem>> {
        let scope = DriveScope {
            user_id: user_id.map(str::to_string),
            ..Default::default()
        };
        let target = scope.resolve(DefaultScope::Allowed)?;

        let request = self
            .client
            .request(HttpMethod::Get, &format!("{}/following", target.base_path()))
            .query_pairs(ODataQuery::new().select(select).into_pairs());

        let response = ensure_success(self.client.send(request).await?, &READ)?;
        parse_json(&response)
    }

    /// Children of a folder, the drive root by default
    #[instrument(skip(self))]
    pub async fn list_children(&self, params: &ListChildrenParams) -> Result<Collection<DriveItem>> {
        let target = params.scope.resolve(DefaultScope::Allowed)?;
        let item = ItemRef::resolve(params.item_id.as_deref(), params.item_path.as_deref())?;

        let query = ODataQuery::new()
            .select(params.select.as_deref())
            .expand(params.expand.as_deref())
            .orderby(params.orderby.as_deref())
            .top(params.top);

        let request = self
            .client
            .request(HttpMethod::Get, &item.nested_path(&target.base_path(), "children"))
            .query_pairs(query.into_pairs());

        let response = ensure_success(self.client.send(request).await?, &READ)?;
        let children: Collection<DriveItem> = parse_json(&response)?;

        info!(count = children.value.len(), "Listed children");
        Ok(children)
    }

    /// Delta query over the whole drive.
    ///
    /// Follow `next_link` until a page carries `delta_link`, then keep that
    /// link's token for the next call.
    #[instrument(skip(self, params), fields(token = %params.token.as_deref().map(|t| redact_if_sensitive("token", t)).unwrap_or_default()))]
    pub async fn list_changes(&self, params: &ListChangesParams) -> Result<Collection<DriveItem>> {
        let target = params.scope.resolve(DefaultScope::Allowed)?;

        let mut query = ODataQuery::new()
            .select(params.select.as_deref())
            .expand(params.expand.as_deref())
            .top(params.top);

        let mut path = format!("{}/root/delta", target.base_path());
        match params.token.as_deref() {
            Some("latest") => query = query.param("token", "latest"),
            // Tokens come out of a delta link and are already URL text
            Some(token) if !token.is_empty() => {
                path.push_str(&format!("(token='{}')", token));
            }
            _ => {}
        }

        let prefer = if params.show_sharing_changes {
            SHARING_DELTA_PREFER
        } else {
            DEFAULT_DELTA_PREFER
        };

        let request = self
            .client
            .request(HttpMethod::Get, &path)
            .query_pairs(query.into_pairs())
            .header("Prefer", prefer);

        let response = ensure_success(self.client.send(request).await?, &READ)?;
        let changes: Collection<DriveItem> = parse_json(&response)?;

        info!(
            count = changes.value.len(),
            complete = changes.delta_link.is_some(),
            "Fetched drive changes"
        );
        Ok(changes)
    }

    /// Create a folder under `parent_id`, or under the root.
    /// An explicit scope is required.
    #[instrument(skip(self))]
    pub async fn create_folder(
        &self,
        scope: &DriveScope,
        name: &str,
        parent_id: Option<&str>,
        conflict_behavior: ConflictBehavior,
    ) -> Result<DriveItem> {
        let target = scope.resolve(DefaultScope::Required)?;
        if name.trim().is_empty() {
            return Err(GraphError::validation("folder name must not be empty"));
        }

        let parent = ItemRef::resolve(parent_id, None)?;
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": conflict_behavior.as_str(),
        });

        let request = self
            .client
            .request(HttpMethod::Post, &parent.nested_path(&target.base_path(), "children"))
            .json(&body)?;

        let response = ensure_success(self.client.send(request).await?, &CREATE_FOLDER)?;
        let folder: DriveItem = parse_json(&response)?;

        info!(id = %folder.id, "Folder created");
        Ok(folder)
    }

    /// `PATCH` item properties.
    ///
    /// With an ETag the update is conditional; a stale ETag yields
    /// [`Conditional::PreconditionFailed`] and nothing is changed.
    #[instrument(skip(self, properties))]
    pub async fn update_item(
        &self,
        scope: &DriveScope,
        item_id: &str,
        properties: &Value,
        etag: Option<&str>,
    ) -> Result<Conditional<DriveItem>> {
        let target = scope.resolve(DefaultScope::Allowed)?;
        if item_id.trim().is_empty() {
            return Err(GraphError::validation("item_id must not be empty"));
        }
        if !properties.is_object() {
            return Err(GraphError::validation("item properties must be a JSON object"));
        }

        let path = ItemRef::Id(item_id.to_string()).item_path(&target.base_path());
        let mut request = self.client.request(HttpMethod::Patch, &path).json(properties)?;
        if let Some(etag) = etag {
            request = request.header("if-match", etag);
        }

        let response = self.client.send(request).await?;
        let outcome = conditional(response, &UPDATE, |r| parse_json(&r))?;
        if outcome.is_modified() {
            info!(item_id, "Item updated");
        }
        Ok(outcome)
    }

    /// Simple single-request upload, up to [`MAX_SIMPLE_UPLOAD_SIZE`].
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload_content(
        &self,
        scope: &DriveScope,
        target_item: &UploadTarget,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<DriveItem> {
        if content.len() as u64 > MAX_SIMPLE_UPLOAD_SIZE {
            return Err(GraphError::validation(format!(
                "content is {} bytes; simple uploads are limited to 250 MiB",
                content.len()
            )));
        }
        let target = scope.resolve(DefaultScope::Allowed)?;
        let base = target.base_path();

        let path = match target_item {
            UploadTarget::Existing(item_id) => {
                if item_id.trim().is_empty() {
                    return Err(GraphError::validation("item_id must not be empty"));
                }
                format!("{}/items/{}/content", base, segment(item_id))
            }
            UploadTarget::New {
                parent_id,
                filename,
            } => {
                if parent_id.trim().is_empty() || filename.trim().is_empty() {
                    return Err(GraphError::validation(
                        "creating a file needs both parent_id and filename",
                    ));
                }
                format!(
                    "{}/items/{}:/{}:/content",
                    base,
                    segment(parent_id),
                    segment(filename)
                )
            }
        };

        let request = self
            .client
            .request(HttpMethod::Put, &path)
            .header(
                "Content-Type",
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(content);

        let response = ensure_success(self.client.send(request).await?, &UPLOAD)?;
        let item: DriveItem = parse_json(&response)?;

        info!(id = %item.id, created = matches!(target_item, UploadTarget::New { .. }), "Content uploaded");
        Ok(item)
    }

    /// Download file content, optionally a byte range of it.
    ///
    /// The service answers with a redirect to a storage URL; the transport
    /// follows it. With an ETag, unchanged content yields
    /// [`Conditional::NotModified`].
    #[instrument(skip(self))]
    pub async fn download_content(&self, params: &DownloadParams) -> Result<Conditional<Bytes>> {
        let target = params.scope.resolve(DefaultScope::Allowed)?;
        if params.item_id.is_none() && params.item_path.is_none() {
            return Err(GraphError::validation("item_id or item_path is required"));
        }
        let item = ItemRef::resolve(params.item_id.as_deref(), params.item_path.as_deref())?;

        let mut request = self
            .client
            .request(HttpMethod::Get, &item.nested_path(&target.base_path(), "content"));
        if let Some(etag) = &params.etag {
            request = request.header("if-none-match", etag.clone());
        }
        if let Some((first, last)) = params.byte_range {
            if first > last {
                return Err(GraphError::validation(format!(
                    "invalid byte range {}-{}",
                    first, last
                )));
            }
            request = request.header("Range", format!("bytes={}-{}", first, last));
        }

        let response = self.client.send(request).await?;
        let outcome = conditional(response, &READ, |r| Ok(r.body))?;
        if let Conditional::Modified(content) = &outcome {
            debug!(bytes = content.len(), "Content downloaded");
        }
        Ok(outcome)
    }
}

/// `/sites/{site}/lists/{list}/items/{id}/driveItem`
fn list_item_path(target: &DriveTarget, item: &ItemRef, list_id: &str) -> Result<String> {
    let DriveTarget::Site(site_id) = target else {
        return Err(GraphError::validation("list_id can only be used with site_id"));
    };
    let ItemRef::Id(item_id) = item else {
        return Err(GraphError::validation("list_id requires item_id"));
    };
    if list_id.trim().is_empty() {
        return Err(GraphError::validation("list_id must not be empty"));
    }
    Ok(format!(
        "/sites/{}/lists/{}/items/{}/driveItem",
        segment(site_id),
        segment(list_id),
        segment(item_id)
    ))
}
