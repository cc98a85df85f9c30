use serde::{Deserialize, Serialize};

use crate::domain::{Contact, ContactId};

/// Form field names of the contact action endpoint. The submission channel
/// builds payloads keyed by these and the server decodes them back.
pub const FIELD_CONTACT_ID: &str = "contactId";
pub const FIELD_FAVORITE: &str = "favorite";

/// Sidebar row: just enough to render a name and the favorite marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub id: ContactId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    pub favorite: bool,
}

impl From<Contact> for ContactSummary {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            first: contact.first,
            last: contact.last,
            favorite: contact.favorite,
        }
    }
}

/// Partial edit of a contact's profile fields. Absent fields keep their
/// stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Dual-purpose action form: `favorite` present means "set the identified
/// contact's flag", absent means "create a blank contact".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactActionForm {
    #[serde(default, rename = "contactId", skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<String>,
}
