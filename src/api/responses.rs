//! Shared API response types
//!
//! List endpoints answer either with a bare JSON array or with a Spring
//! `Page` envelope (`{"content": [...], "totalElements": ...}`) depending on
//! whether paging parameters were sent. Both shapes are accepted here and
//! flattened before leaving the api layer.

use serde::Deserialize;

use crate::models::{Identity, UserId, UserRole};

// ============================================================================
// List Response Types
// ============================================================================

/// A list in either of the backend's two shapes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    /// `[...]`
    RawList(Vec<T>),
    /// `{"content": [...], ...}`
    PagedEnvelope(PagedEnvelope<T>),
}

/// Spring `Page` envelope
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedEnvelope<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl<T> ListResponse<T> {
    /// Flatten to the items
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::RawList(items) => items,
            ListResponse::PagedEnvelope(page) => page.content,
        }
    }

    /// Total number of items on the server, if known
    pub fn total(&self) -> usize {
        match self {
            ListResponse::RawList(items) => items.len(),
            ListResponse::PagedEnvelope(page) => page
                .total_elements
                .map(|t| t as usize)
                .unwrap_or(page.content.len()),
        }
    }
}

// ============================================================================
// User Response Types
// ============================================================================

/// User record returned by registration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
}

impl From<UserProfile> for Identity {
    fn from(profile: UserProfile) -> Self {
        Identity {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            role: profile.role,
        }
    }
}
