use shared::{
    domain::{Contact, ContactId},
    error::{ApiError, ErrorCode},
    protocol::{ContactActionForm, ContactSummary, ContactUpdate},
};
use storage::Storage;
use tracing::debug;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Result of the dual-purpose contact action endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A favorite flag was set; the updated record is returned to the caller
    /// with no redirect.
    Updated(Contact),
    /// A blank contact was created; the HTTP layer redirects to its edit view.
    Created(Contact),
}

pub async fn list_contacts(
    ctx: &ApiContext,
    query: Option<&str>,
) -> Result<Vec<ContactSummary>, ApiError> {
    let contacts = ctx
        .storage
        .list_contacts(query)
        .await
        .map_err(internal)?;
    Ok(contacts.into_iter().map(ContactSummary::from).collect())
}

pub async fn get_contact(ctx: &ApiContext, id: &ContactId) -> Result<Contact, ApiError> {
    ctx.storage
        .get_contact(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "contact not found"))
}

pub async fn update_contact(
    ctx: &ApiContext,
    id: &ContactId,
    update: &ContactUpdate,
) -> Result<Contact, ApiError> {
    ctx.storage
        .update_contact(id, update)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "contact not found"))
}

pub async fn delete_contact(ctx: &ApiContext, id: &ContactId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_contact(id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "contact not found"));
    }
    Ok(())
}

/// Dual-purpose action handler. With a `favorite` field the form sets the
/// identified contact's flag; without one it creates a blank contact. A
/// `favorite` without a `contactId` is a precondition failure and aborts the
/// request rather than silently proceeding.
pub async fn contact_action(
    ctx: &ApiContext,
    form: ContactActionForm,
) -> Result<ActionOutcome, ApiError> {
    match form.favorite {
        Some(raw) => {
            let contact_id = form
                .contact_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ApiError::new(ErrorCode::Validation, "missing contactId param"))?;
            let favorite = raw == "true";
            debug!(contact_id = %contact_id, favorite, "setting favorite flag");
            let contact = ctx
                .storage
                .set_favorite(&ContactId(contact_id), favorite)
                .await
                .map_err(internal)?
                .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "contact not found"))?;
            Ok(ActionOutcome::Updated(contact))
        }
        None => {
            let contact = ctx.storage.create_empty_contact().await.map_err(internal)?;
            debug!(contact_id = %contact.id, "created blank contact");
            Ok(ActionOutcome::Created(contact))
        }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
