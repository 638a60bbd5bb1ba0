//! Bank registry
//!
//! Bank service points placed in named worlds. Placements keep a minimum
//! distance from each other; removal picks the nearest placement within
//! reach of the query point. All writes are serialized through one lock so
//! the separation check always sees a consistent set.

use tokio::sync::Mutex;

use crate::config::RegistrySettings;
use crate::domain::{HasStatus, Location, ParticipantId, Placement, Status};
use crate::store::{PlacementStore, StoreError};

/// Registry errors. A failed call never changes the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Another placement in the same world is closer than the minimum separation
    #[error("Too close to another bank ({distance:.2} < {min_separation:.2})")]
    TooClose { distance: f64, min_separation: f64 },

    /// No placement within the interaction radius
    #[error("No bank within reach")]
    NotFound,

    /// A coordinate or the yaw is NaN or infinite
    #[error("Invalid location: {0:?}")]
    InvalidLocation(Location),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl HasStatus for RegistryError {
    fn status(&self) -> Status {
        match self {
            RegistryError::TooClose { .. } => Status::TooClose,
            RegistryError::NotFound => Status::NotFound,
            RegistryError::InvalidLocation(_) => Status::InvalidInput,
            RegistryError::Storage(_) => Status::StorageUnavailable,
        }
    }
}

fn check_finite(location: &Location) -> Result<(), RegistryError> {
    if location.is_finite() {
        Ok(())
    } else {
        Err(RegistryError::InvalidLocation(location.clone()))
    }
}

/// Distance from `from` to a placement, `None` across worlds.
pub fn distance_to(from: &Location, placement: &Placement) -> Option<f64> {
    from.distance(&placement.location)
}

/// Index and distance of the nearest placement within `radius`.
/// Equal distances resolve to the earliest inserted placement.
fn nearest_within(placements: &[Placement], from: &Location, radius: f64) -> Option<(usize, f64)> {
    placements
        .iter()
        .enumerate()
        .filter_map(|(index, placement)| distance_to(from, placement).map(|d| (index, d)))
        .filter(|(_, distance)| *distance <= radius)
        .fold(None, |best, (index, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((index, distance)),
        })
}

/// Registry of bank placements over a [`PlacementStore`].
pub struct BankRegistry<S> {
    store: S,
    settings: RegistrySettings,
    placements: Mutex<Vec<Placement>>,
}

impl<S: PlacementStore> BankRegistry<S> {
    /// Load every stored placement.
    pub async fn load(store: S, settings: RegistrySettings) -> Result<Self, RegistryError> {
        let placements = store.load_all().await?;
        tracing::info!(placements = placements.len(), "Bank registry loaded");

        Ok(Self {
            store,
            settings,
            placements: Mutex::new(placements),
        })
    }

    pub fn settings(&self) -> RegistrySettings {
        self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Place a bank at `location`, snapped to the block grid.
    pub async fn add_placement(
        &self,
        location: &Location,
        owner: ParticipantId,
    ) -> Result<Placement, RegistryError> {
        check_finite(location)?;
        let snapped = location.snapped();
        let mut placements = self.placements.lock().await;

        if let Some((_, distance)) = placements
            .iter()
            .filter_map(|p| distance_to(&snapped, p).map(|d| (p, d)))
            .find(|(_, distance)| *distance < self.settings.min_separation)
        {
            tracing::warn!(
                world = %snapped.world,
                x = snapped.x,
                y = snapped.y,
                z = snapped.z,
                distance,
                "Bank placement rejected: too close"
            );
            return Err(RegistryError::TooClose {
                distance,
                min_separation: self.settings.min_separation,
            });
        }

        let placement = Placement::new(snapped, owner);
        self.store.insert(&placement).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to persist bank placement");
        })?;
        placements.push(placement.clone());

        tracing::info!(
            placement_id = %placement.id,
            owner = %owner,
            world = %placement.location.world,
            x = placement.location.x,
            y = placement.location.y,
            z = placement.location.z,
            "Bank placed"
        );
        Ok(placement)
    }

    /// Remove the nearest placement within the interaction radius of `query`.
    pub async fn remove_placement(&self, query: &Location) -> Result<Placement, RegistryError> {
        check_finite(query)?;
        let mut placements = self.placements.lock().await;

        let (index, distance) = nearest_within(&placements, query, self.settings.interaction_radius)
            .ok_or(RegistryError::NotFound)?;

        let id = placements[index].id;
        if !self.store.delete(id).await? {
            tracing::warn!(placement_id = %id, "Removed bank was already missing from the store");
        }
        let removed = placements.remove(index);

        tracing::info!(
            placement_id = %removed.id,
            world = %removed.location.world,
            distance,
            "Bank removed"
        );
        Ok(removed)
    }

    /// All placements in insertion order.
    pub async fn list_placements(&self) -> Vec<Placement> {
        self.placements.lock().await.clone()
    }

    /// Nearest placement in the same world as `from`, with its distance.
    pub async fn nearest(&self, from: &Location) -> Option<(Placement, f64)> {
        let placements = self.placements.lock().await;
        nearest_within(&placements, from, f64::INFINITY)
            .map(|(index, distance)| (placements[index].clone(), distance))
    }

    /// Whether `from` is within interaction reach of any placement.
    pub async fn is_within_reach(&self, from: &Location) -> bool {
        let placements = self.placements.lock().await;
        nearest_within(&placements, from, self.settings.interaction_radius).is_some()
    }

    pub async fn len(&self) -> usize {
        self.placements.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
