//! Graph resource models
//!
//! Only the commonly used properties are typed. Everything else the service
//! returns (including properties requested through `$select`/`$expand`) is
//! kept in `extra`.

use std::fmt;

use core_runtime::logging::redact_if_sensitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection response (`{"value": [...], "@odata.nextLink": ...}`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    #[serde(rename = "@odata.nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,

    /// Present on the last page of a delta query
    #[serde(rename = "@odata.deltaLink", skip_serializing_if = "Option::is_none")]
    pub delta_link: Option<String>,

    #[serde(rename = "@odata.count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Directory user
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub job_title: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document library or OneDrive
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub drive_type: Option<String>,
    pub web_url: Option<String>,
    pub quota: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File, folder or other item stored in a drive
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub size: Option<u64>,
    #[serde(rename = "eTag")]
    pub e_tag: Option<String>,
    #[serde(rename = "cTag")]
    pub c_tag: Option<String>,
    pub web_url: Option<String>,
    pub last_modified_date_time: Option<String>,
    pub parent_reference: Option<Value>,
    pub folder: Option<Value>,
    pub file: Option<Value>,
    /// Set on items removed since the previous delta token
    pub deleted: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

/// Mail message
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub subject: Option<String>,
    pub is_draft: Option<bool>,
    pub importance: Option<String>,
    pub body: Option<ItemBody>,
    pub from: Option<Value>,
    #[serde(default)]
    pub to_recipients: Vec<Value>,
    pub received_date_time: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    pub content_type: Option<String>,
    pub content: Option<String>,
}

/// Attachment created on a message
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub is_inline: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upload session descriptor returned by `createUploadSession`
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionInfo {
    /// Opaque, pre-authorized, time-limited URL
    #[serde(default)]
    pub upload_url: String,
    pub expiration_date_time: Option<String>,
    #[serde(default)]
    pub next_expected_ranges: Vec<String>,
}

impl fmt::Debug for UploadSessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSessionInfo")
            .field("upload_url", &redact_if_sensitive("upload_url", &self.upload_url))
            .field("expiration_date_time", &self.expiration_date_time)
            .field("next_expected_ranges", &self.next_expected_ranges)
            .finish()
    }
}

/// Result of adding an attachment
#[derive(Debug, Clone)]
pub enum AttachmentResult {
    /// Small payload sent in one request; the created attachment
    Inline(Attachment),
    /// Large payload sent through an upload session
    Session {
        session: UploadSessionInfo,
        /// Body of the final chunk acknowledgment, when the service sent one
        acknowledgment: Option<Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_session_debug_hides_url() {
        let session: UploadSessionInfo = serde_json::from_str(
            r#"{"uploadUrl":"https://outlook.office.com/api/v2.0/AttachmentSessions('s1')?authtoken=abc","expirationDateTime":"2026-10-20T10:00:00Z"}"#,
        )
        .unwrap();

        let printed = format!("{:?}", AttachmentResult::Session { session, acknowledgment: None });

        assert!(!printed.contains("authtoken"));
        assert!(printed.contains("[REDACTED]"));
        assert!(printed.contains("2026-10-20T10:00:00Z"));
    }

    #[test]
    fn test_collection_with_links() {
        let json = r#"{
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users",
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=X",
            "value": [{"id": "1", "displayName": "Adele Vance", "officeLocation": "18/2111"}]
        }"#;

        let page: Collection<User> = serde_json::from_str(json).unwrap();

        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.is_some());
        assert_eq!(page.value[0].display_name.as_deref(), Some("Adele Vance"));
        assert_eq!(page.value[0].extra["officeLocation"], "18/2111");
    }

    #[test]
    fn test_drive_item_flags() {
        let json = r#"{"id": "01AB", "name": "Docs", "eTag": "\"{A},1\"", "folder": {"childCount": 3}}"#;
        let item: DriveItem = serde_json::from_str(json).unwrap();

        assert!(item.is_folder());
        assert!(!item.is_deleted());
        assert_eq!(item.e_tag.as_deref(), Some("\"{A},1\""));
    }

    #[test]
    fn test_delta_page() {
        let json = r#"{
            "value": [{"id": "02", "deleted": {"state": "deleted"}}],
            "@odata.deltaLink": "https://graph.microsoft.com/v1.0/me/drive/root/delta(token='abc')"
        }"#;

        let page: Collection<DriveItem> = serde_json::from_str(json).unwrap();
        assert!(page.value[0].is_deleted());
        assert!(page.delta_link.unwrap().contains("token='abc'"));
    }
}
