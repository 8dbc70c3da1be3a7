use std::time::Duration;

use reqwest::{
    Client,
    ClientBuilder,
    Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::Deserialize;
use serde_with::serde_as;

use crate::{
    prelude::*,
    sensor::{Reading, StateCache},
};

#[must_use]
pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    pub fn try_new(access_token: &str, base_url: Url) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {access_token}"))?,
        )]);
        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Fetch the current states of all the entities.
    #[instrument(skip_all, name = "Fetching the entity states…")]
    pub async fn get_states(&self) -> Result<StateCache> {
        let states: EntityStates =
            self.client.get(self.url("states")?).send().await?.error_for_status()?.json().await?;
        debug!(n_states = states.0.len(), "fetched");
        Ok(states.into())
    }

    fn url(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::msg("the base URL cannot have a path"))?
            .pop_if_empty()
            .push(path);
        Ok(url)
    }
}

#[must_use]
#[serde_as]
#[derive(Deserialize)]
struct EntityStates(#[serde_as(as = "serde_with::VecSkipError<_>")] Vec<EntityState>);

#[derive(Deserialize)]
struct EntityState {
    entity_id: String,
    state: String,
}

impl From<EntityStates> for StateCache {
    fn from(states: EntityStates) -> Self {
        states
            .0
            .into_iter()
            .map(|EntityState { entity_id, state }| {
                let reading = Reading::from_state(&entity_id, &state);
                (entity_id, reading)
            })
            .collect()
    }
}
