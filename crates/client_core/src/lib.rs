use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Contact, ContactId},
    error::{ApiError, ApiException},
    protocol::{ContactSummary, ContactUpdate, FIELD_CONTACT_ID, FIELD_FAVORITE},
};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::warn;
use url::Url;

/// Snapshot of the submission channel as observed by controls: whether a
/// background form post is in flight and, if so, exactly what it carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionState {
    pub pending: bool,
    pub payload: Option<HashMap<String, String>>,
}

impl SubmissionState {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get(name))
            .map(String::as_str)
    }
}

/// Network seam for background form posts.
#[async_trait]
pub trait SubmitBackend: Send + Sync {
    async fn post_form(&self, form: &HashMap<String, String>) -> Result<()>;
}

struct ChannelState {
    generation: u64,
    observable: SubmissionState,
}

/// Background form-post channel. While a submission is in flight its exact
/// payload stays observable through [`SubmissionChannel::state`]; once it
/// settles the state returns to idle and updated persisted data flows back
/// through the normal data-loading path.
///
/// Policy for overlapping submissions: display follows the last-submitted
/// payload. A newer submission supersedes an older in-flight one, and a stale
/// settle never clears (or resurrects) the newer payload.
#[derive(Clone)]
pub struct SubmissionChannel {
    backend: Arc<dyn SubmitBackend>,
    state: Arc<RwLock<ChannelState>>,
}

impl SubmissionChannel {
    pub fn new(backend: Arc<dyn SubmitBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(ChannelState {
                generation: 0,
                observable: SubmissionState::default(),
            })),
        }
    }

    pub async fn state(&self) -> SubmissionState {
        self.state.read().await.observable.clone()
    }

    /// Makes `payload` the observable in-flight submission and posts it in
    /// the background. Failures are logged and surface only as "no pending
    /// submission"; there are no retries.
    pub async fn submit(&self, payload: HashMap<String, String>) -> JoinHandle<()> {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.observable = SubmissionState {
                pending: true,
                payload: Some(payload.clone()),
            };
            state.generation
        };

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            if let Err(error) = backend.post_form(&payload).await {
                warn!(%error, "background form submission failed");
            }
            let mut state = shared.write().await;
            if state.generation == generation {
                state.observable = SubmissionState::default();
            }
        })
    }
}

/// View-model for the favorite button of one contact. Holds the read-only
/// persisted snapshot for the current render; the displayed value is
/// predicted from the in-flight payload while a submission is pending.
#[derive(Debug, Clone)]
pub struct FavoriteToggle {
    contact_id: ContactId,
    persisted_favorite: bool,
}

impl FavoriteToggle {
    pub fn new(contact_id: ContactId, persisted_favorite: bool) -> Self {
        Self {
            contact_id,
            persisted_favorite,
        }
    }

    pub fn for_contact(contact: &Contact) -> Self {
        Self::new(contact.id.clone(), contact.favorite)
    }

    /// The pending payload's `favorite` field when one is in flight,
    /// otherwise the persisted value. Only the literal "true" counts.
    pub fn displayed(&self, submission: &SubmissionState) -> bool {
        match submission.field(FIELD_FAVORITE) {
            Some(value) => value == "true",
            None => self.persisted_favorite,
        }
    }

    /// Accessible name: states the action the control performs.
    pub fn label(&self, submission: &SubmissionState) -> &'static str {
        if self.displayed(submission) {
            "Remove from favorites"
        } else {
            "Add to favorites"
        }
    }

    pub fn glyph(&self, submission: &SubmissionState) -> char {
        if self.displayed(submission) {
            '★'
        } else {
            '☆'
        }
    }

    /// Negates the displayed value, not the persisted one, so rapid repeated
    /// activation toggles relative to what the user currently sees.
    pub fn activation_payload(&self, submission: &SubmissionState) -> HashMap<String, String> {
        let next = !self.displayed(submission);
        HashMap::from([
            (FIELD_CONTACT_ID.to_string(), self.contact_id.0.clone()),
            (FIELD_FAVORITE.to_string(), next.to_string()),
        ])
    }

    pub async fn activate(&self, channel: &SubmissionChannel) -> JoinHandle<()> {
        let payload = self.activation_payload(&channel.state().await);
        channel.submit(payload).await
    }
}

/// HTTP client for the contact server. Redirect following is disabled so the
/// create-contact redirect can be observed instead of chased.
pub struct ContactsClient {
    http: Client,
    base_url: Url,
}

impl ContactsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid server url")?;
        let http = Client::builder()
            .redirect(Policy::none())
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path '{path}'"))
    }

    pub async fn list_contacts(&self, query: Option<&str>) -> Result<Vec<ContactSummary>> {
        let mut url = self.endpoint("/contacts")?;
        if let Some(q) = query {
            url.query_pairs_mut().append_pair("q", q);
        }
        let response = self.http.get(url).send().await?;
        decode_json(response).await
    }

    pub async fn get_contact(&self, id: &ContactId) -> Result<Contact> {
        let response = self
            .http
            .get(self.endpoint(&format!("/contacts/{id}"))?)
            .send()
            .await?;
        decode_json(response).await
    }

    /// Posts an empty action form and recovers the new contact's id from the
    /// edit-view redirect.
    pub async fn create_contact(&self) -> Result<ContactId> {
        let response = self
            .http
            .post(self.endpoint("/contacts")?)
            .form(&HashMap::<String, String>::new())
            .send()
            .await?;
        if response.status() != StatusCode::SEE_OTHER {
            return Err(anyhow!(
                "expected edit-view redirect, got status {}",
                response.status()
            ));
        }
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| anyhow!("redirect without location header"))?;
        let id = location
            .strip_prefix("/contacts/")
            .and_then(|rest| rest.strip_suffix("/edit"))
            .ok_or_else(|| anyhow!("unexpected redirect location '{location}'"))?;
        Ok(ContactId(id.to_string()))
    }

    pub async fn set_favorite(&self, id: &ContactId, favorite: bool) -> Result<Contact> {
        let form = HashMap::from([
            (FIELD_CONTACT_ID.to_string(), id.0.clone()),
            (FIELD_FAVORITE.to_string(), favorite.to_string()),
        ]);
        let response = self
            .http
            .post(self.endpoint("/contacts")?)
            .form(&form)
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn update_contact(&self, id: &ContactId, update: &ContactUpdate) -> Result<Contact> {
        let response = self
            .http
            .post(self.endpoint(&format!("/contacts/{id}"))?)
            .form(update)
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn delete_contact(&self, id: &ContactId) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint(&format!("/contacts/{id}/destroy"))?)
            .form(&HashMap::<String, String>::new())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl SubmitBackend for ContactsClient {
    async fn post_form(&self, form: &HashMap<String, String>) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("/contacts")?)
            .form(form)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(err) => ApiException::from(err).into(),
        Err(_) => anyhow!("request failed with status {status}"),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
