//! Start-up fixtures for the collaborators this service does not own: the
//! restaurant directory and the identity provider's issued tokens.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::restaurant::Restaurant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeedIdentity {
    pub token: String,
    #[serde(flatten)]
    pub actor: Actor,
}

#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub identities: Vec<SeedIdentity>,
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|err| AppError::Internal(format!("invalid seed: {err}")))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Internal(format!("failed to read seed {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn apply(self, state: &AppState) -> Result<(), AppError> {
        let restaurants = self.restaurants.len();
        let identities = self.identities.len();

        for restaurant in self.restaurants {
            state.restaurants.register(restaurant)?;
        }
        for identity in self.identities {
            state.identities.bind(identity.token, identity.actor);
        }

        info!(restaurants, identities, "seed data loaded");
        Ok(())
    }
}
