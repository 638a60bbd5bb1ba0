//! Domain value types
//!
//! Identifiers, pool selectors and the 3D location model shared by the
//! ledger and the bank registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Balance;

/// Stable, globally unique participant identifier.
///
/// Display names can change; this id cannot. Resolving a name to an id is
/// the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ParticipantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which of the two per-participant pools an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Durable balance held at the bank
    Bank,
    /// Liquid balance carried by the participant
    Wallet,
}

impl Pool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pool::Bank => "bank",
            Pool::Wallet => "wallet",
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a relative adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

/// Both pools of one participant, as read at a single point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub participant: ParticipantId,
    pub bank: Balance,
    pub wallet: Balance,
}

impl AccountSnapshot {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            bank: Balance::zero(),
            wallet: Balance::zero(),
        }
    }

    pub fn pool(&self, pool: Pool) -> Balance {
        match pool {
            Pool::Bank => self.bank,
            Pool::Wallet => self.wallet,
        }
    }

    pub fn pool_mut(&mut self, pool: Pool) -> &mut Balance {
        match pool {
            Pool::Bank => &mut self.bank,
            Pool::Wallet => &mut self.wallet,
        }
    }

    /// Combined holdings across both pools
    pub fn total(&self) -> rust_decimal::Decimal {
        self.bank.value() + self.wallet.value()
    }
}

/// Name of a world. Placements in different worlds never interact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A position in a named world, with orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    pub fn new(world: impl Into<WorldId>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Whether every coordinate and the yaw are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.yaw.is_finite()
    }

    /// Euclidean distance, or `None` when the worlds differ.
    pub fn distance(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }

    /// Snap to the block grid: horizontal axes centred on the block,
    /// vertical axis at block floor, yaw kept, pitch levelled.
    pub fn snapped(&self) -> Location {
        Location {
            world: self.world.clone(),
            x: self.x.floor() + 0.5,
            y: self.y.floor(),
            z: self.z.floor() + 0.5,
            yaw: self.yaw,
            pitch: 0.0,
        }
    }
}

impl From<String> for WorldId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A bank service point placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: Uuid,
    pub location: Location,
    pub owner: ParticipantId,
    pub placed_at: DateTime<Utc>,
}

impl Placement {
    pub fn new(location: Location, owner: ParticipantId) -> Self {
        Self {
            id: Uuid::new_v4(),
            location,
            owner,
            placed_at: Utc::now(),
        }
    }

    pub fn world(&self) -> &WorldId {
        &self.location.world
    }
}
