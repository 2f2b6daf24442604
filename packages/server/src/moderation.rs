use common::storage::BlobId;
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{CatalogError, SlideCatalog};

/// Visibility of a slide. Every record starts out `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModerationState {
    Pending,
    Approved,
}

impl ModerationState {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Pending
        }
    }

    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Decline,
}

impl ModerationAction {
    /// State after the action. Both actions are valid from both states.
    pub fn target(self) -> ModerationState {
        match self {
            Self::Approve => ModerationState::Approved,
            Self::Decline => ModerationState::Pending,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Decline => "declined",
        }
    }
}

/// Applies `action` to the record for `file_id`.
///
/// Returns the matched count: 0 for an unknown id, 1 otherwise, even when
/// the record was already in the target state.
#[tracing::instrument(skip(catalog))]
pub async fn moderate(
    catalog: &dyn SlideCatalog,
    file_id: BlobId,
    action: ModerationAction,
) -> Result<u64, CatalogError> {
    let matched = catalog
        .update_approval(file_id, action.target().is_approved())
        .await?;
    if matched > 0 {
        tracing::info!(%file_id, "Slide {}", action.verb());
    }
    Ok(matched)
}
