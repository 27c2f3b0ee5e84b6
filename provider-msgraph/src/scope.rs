//! Request addressing
//!
//! Resolves the mutually exclusive scope identifiers a caller may supply into
//! exactly one base resource path. Supplying more than one identifier is a
//! validation error regardless of the combination; there is no precedence.

use crate::error::{GraphError, Result};

/// Percent-encode one path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode a slash-separated path, keeping the separators.
/// Leading and trailing slashes are dropped.
pub(crate) fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Loose drive addressing as supplied by the caller.
///
/// At most one field may be set. With none set, operations that support it
/// fall back to the signed-in user's drive (`/me/drive`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveScope {
    pub drive_id: Option<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub site_id: Option<String>,
}

/// Resolved drive addressing: exactly one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveTarget {
    Drive(String),
    User(String),
    Group(String),
    Site(String),
    Me,
}

/// Whether an operation accepts the `/me/drive` fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultScope {
    Allowed,
    Required,
}

impl DriveScope {
    /// Current-context default
    pub fn me() -> Self {
        Self::default()
    }

    pub fn drive(id: impl Into<String>) -> Self {
        Self::default().with_drive_id(id)
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::default().with_user_id(id)
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::default().with_group_id(id)
    }

    pub fn site(id: impl Into<String>) -> Self {
        Self::default().with_site_id(id)
    }

    pub fn with_drive_id(mut self, id: impl Into<String>) -> Self {
        self.drive_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn with_group_id(mut self, id: impl Into<String>) -> Self {
        self.group_id = Some(id.into());
        self
    }

    pub fn with_site_id(mut self, id: impl Into<String>) -> Self {
        self.site_id = Some(id.into());
        self
    }

    fn supplied(&self) -> Vec<(&'static str, &str)> {
        [
            ("drive_id", &self.drive_id),
            ("user_id", &self.user_id),
            ("group_id", &self.group_id),
            ("site_id", &self.site_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    /// Resolve to exactly one target.
    ///
    /// # Errors
    ///
    /// `GraphError::Validation` if two or more identifiers are set, if an
    /// identifier is blank, or if none is set and `default` is `Required`.
    pub fn resolve(&self, default: DefaultScope) -> Result<DriveTarget> {
        let supplied = self.supplied();

        if supplied.len() > 1 {
            let names: Vec<&str> = supplied.iter().map(|(name, _)| *name).collect();
            return Err(GraphError::validation(format!(
                "only one of drive_id, user_id, group_id, site_id may be given, got {}",
                names.join(", ")
            )));
        }

        let Some((name, value)) = supplied.into_iter().next() else {
            return match default {
                DefaultScope::Allowed => Ok(DriveTarget::Me),
                DefaultScope::Required => Err(GraphError::validation(
                    "one of drive_id, user_id, group_id, site_id is required",
                )),
            };
        };

        if value.trim().is_empty() {
            return Err(GraphError::validation(format!("{} must not be empty", name)));
        }

        let value = value.to_string();
        Ok(match name {
            "drive_id" => DriveTarget::Drive(value),
            "user_id" => DriveTarget::User(value),
            "group_id" => DriveTarget::Group(value),
            _ => DriveTarget::Site(value),
        })
    }
}

impl DriveTarget {
    /// Path of the drive root resource, relative to the API base URL
    pub fn base_path(&self) -> String {
        match self {
            DriveTarget::Drive(id) => format!("/drives/{}", segment(id)),
            DriveTarget::User(id) => format!("/users/{}/drive", segment(id)),
            DriveTarget::Group(id) => format!("/groups/{}/drive", segment(id)),
            DriveTarget::Site(id) => format!("/sites/{}/drive", segment(id)),
            DriveTarget::Me => "/me/drive".to_string(),
        }
    }
}

/// Drive item addressing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Root,
    Id(String),
    Path(String),
}

impl ItemRef {
    /// Resolve an optional id and an optional path; both is a validation
    /// error, neither is the drive root. The id `root` also means the root.
    pub fn resolve(item_id: Option<&str>, item_path: Option<&str>) -> Result<Self> {
        match (item_id, item_path) {
            (Some(_), Some(_)) => Err(GraphError::validation(
                "item_id and item_path cannot be used together",
            )),
            (Some(id), None) if id.trim().is_empty() => {
                Err(GraphError::validation("item_id must not be empty"))
            }
            (Some("root"), None) => Ok(ItemRef::Root),
            (Some(id), None) => Ok(ItemRef::Id(id.to_string())),
            (None, Some(path)) if path.trim_matches('/').is_empty() => Ok(ItemRef::Root),
            (None, Some(path)) => Ok(ItemRef::Path(path.to_string())),
            (None, None) => Ok(ItemRef::Root),
        }
    }

    /// Item resource path under a drive base
    pub fn item_path(&self, base: &str) -> String {
        match self {
            ItemRef::Root => format!("{}/root", base),
            ItemRef::Id(id) => format!("{}/items/{}", base, segment(id)),
            ItemRef::Path(path) => format!("{}/root:/{}", base, encode_path(path)),
        }
    }

    /// Path of a navigation property (`children`, `content`) of the item.
    ///
    /// Path-addressed items need the closing colon before the property.
    pub fn nested_path(&self, base: &str, property: &str) -> String {
        match self {
            ItemRef::Path(_) => format!("{}:/{}", self.item_path(base), property),
            _ => format!("{}/{}", self.item_path(base), property),
        }
    }
}

/// Mailbox base path for app-only access.
///
/// Client credentials have no signed-in user, so `/me` is unavailable and a
/// user id or principal name is required.
pub fn mailbox_path(user_id: &str) -> Result<String> {
    if user_id.trim().is_empty() {
        return Err(GraphError::validation(
            "user_id is required with client credentials; /me needs delegated authentication",
        ));
    }
    Ok(format!("/users/{}", segment(user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_identifier_paths() {
        let cases = [
            (DriveScope::drive("b!abc"), "/drives/b%21abc"),
            (DriveScope::user("alice@contoso.com"), "/users/alice%40contoso.com/drive"),
            (DriveScope::group("g1"), "/groups/g1/drive"),
            (DriveScope::site("s1"), "/sites/s1/drive"),
            (DriveScope::me(), "/me/drive"),
        ];

        for (scope, expected) in cases {
            let target = scope.resolve(DefaultScope::Allowed).unwrap();
            assert_eq!(target.base_path(), expected);
        }
    }

    #[test]
    fn test_every_pair_of_identifiers_is_rejected() {
        let setters: [fn(DriveScope) -> DriveScope; 4] = [
            |s| s.with_drive_id("d"),
            |s| s.with_user_id("u"),
            |s| s.with_group_id("g"),
            |s| s.with_site_id("s"),
        ];

        for mask in 0u8..16 {
            if mask.count_ones() < 2 {
                continue;
            }
            let mut scope = DriveScope::default();
            for (bit, setter) in setters.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    scope = setter(scope);
                }
            }

            for default in [DefaultScope::Allowed, DefaultScope::Required] {
                assert!(
                    matches!(scope.resolve(default), Err(GraphError::Validation(_))),
                    "mask {:04b} should be rejected",
                    mask
                );
            }
        }
    }

    #[test]
    fn test_required_scope() {
        assert!(matches!(
            DriveScope::me().resolve(DefaultScope::Required),
            Err(GraphError::Validation(_))
        ));
        assert_eq!(
            DriveScope::user("u").resolve(DefaultScope::Required).unwrap(),
            DriveTarget::User("u".to_string())
        );
    }

    #[test]
    fn test_blank_identifier_rejected() {
        assert!(matches!(
            DriveScope::drive("  ").resolve(DefaultScope::Allowed),
            Err(GraphError::Validation(_))
        ));
    }

    #[test]
    fn test_item_ref_resolution() {
        assert_eq!(ItemRef::resolve(None, None).unwrap(), ItemRef::Root);
        assert_eq!(ItemRef::resolve(Some("root"), None).unwrap(), ItemRef::Root);
        assert_eq!(ItemRef::resolve(None, Some("/")).unwrap(), ItemRef::Root);
        assert_eq!(
            ItemRef::resolve(Some("01AB"), None).unwrap(),
            ItemRef::Id("01AB".to_string())
        );
        assert!(matches!(
            ItemRef::resolve(Some("01AB"), Some("/Docs")),
            Err(GraphError::Validation(_))
        ));
    }

    #[test]
    fn test_item_paths() {
        let base = "/me/drive";

        assert_eq!(ItemRef::Root.nested_path(base, "children"), "/me/drive/root/children");
        assert_eq!(
            ItemRef::Id("01AB".to_string()).nested_path(base, "content"),
            "/me/drive/items/01AB/content"
        );
        assert_eq!(
            ItemRef::Path("/Reports/Q3 2024.xlsx".to_string()).item_path(base),
            "/me/drive/root:/Reports/Q3%202024.xlsx"
        );
        assert_eq!(
            ItemRef::Path("Reports/".to_string()).nested_path(base, "children"),
            "/me/drive/root:/Reports:/children"
        );
    }

    #[test]
    fn test_mailbox_path() {
        assert_eq!(mailbox_path("u1").unwrap(), "/users/u1");
        assert!(matches!(mailbox_path(""), Err(GraphError::Validation(_))));
    }
}
