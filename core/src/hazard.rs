use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

const fn default_weight() -> f64 {
    1.0
}

/// Themed hazard hidden under a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardType {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub loss_message: String,
    /// Relative selection probability.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl HazardType {
    pub fn new(id: &str, label: &str, icon: &str, loss_message: &str, weight: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
            loss_message: loss_message.into(),
            weight,
        }
    }
}

/// Ordered set of hazard types with a precomputed weight total.
///
/// Catalog order matters: weighted selection walks the entries in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HazardType>", into = "Vec<HazardType>")]
pub struct HazardCatalog {
    entries: Vec<HazardType>,
    total_weight: f64,
}

impl HazardCatalog {
    pub fn new(entries: Vec<HazardType>) -> Result<Self> {
        if entries.is_empty() {
            return Err(GameError::EmptyHazardCatalog);
        }
        if entries
            .iter()
            .any(|entry| !entry.weight.is_finite() || entry.weight <= 0.0)
        {
            return Err(GameError::InvalidHazardWeight);
        }
        let total_weight = entries.iter().map(|entry| entry.weight).sum();
        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// The construction-site catalog the game ships with.
    pub fn builtin() -> Self {
        let entries = vec![
            HazardType::new(
                "kfc",
                "Surprise KFC franchise",
                "🍗",
                "Yikes! The local KFC is running a Zinger Box deal - all your trades just took 3-hour smoko",
                1.0,
            ),
            HazardType::new(
                "beer",
                "Beer truck block party",
                "🍺",
                "Crew called it a day after finding a carton in the back of their ranger. Project delayed!",
                1.0,
            ),
            HazardType::new(
                "rain",
                "Rain storm",
                "🌧️",
                "Someone said they spotted rain on the radar, tools down everyone heads home.",
                1.0,
            ),
            HazardType::new(
                "strippers",
                "Bachelor party of strippers",
                "💃",
                "New strip club just opened across the road.  All your trades (except the sparkies) just walked off site.",
                4.0,
            ),
            HazardType::new(
                "disease",
                "Mystery illness",
                "🦠",
                "COVID 25 just hit, no one wants another vax so project shut down until further notice.",
                1.0,
            ),
            HazardType::new(
                "CFMEU",
                "CFMEU visit",
                "🙅🏻‍♂️",
                "Those w*nkers from the CFMEU just rocked up, everybody stop work until they’re gone.",
                1.0,
            ),
        ];
        let total_weight = entries.iter().map(|entry| entry.weight).sum();
        Self {
            entries,
            total_weight,
        }
    }

    pub fn entries(&self) -> &[HazardType] {
        &self.entries
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn get(&self, id: &str) -> Option<&HazardType> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Draws one entry with probability proportional to its weight.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &HazardType {
        let roll = rng.random::<f64>() * self.total_weight;
        self.select(roll)
    }

    /// Walks the catalog subtracting weights from `roll` until it goes non-positive.
    ///
    /// Falls back to the first entry when nothing is selected (non-positive total,
    /// NaN roll, rounding at the upper end).
    pub fn select(&self, roll: f64) -> &HazardType {
        let first = &self.entries[0];
        if self.total_weight.is_nan() || self.total_weight <= 0.0 {
            log::warn!("Hazard catalog has no usable weight, using `{}`", first.id);
            return first;
        }

        let mut remaining = roll;
        for entry in &self.entries {
            remaining -= entry.weight;
            if remaining <= 0.0 {
                return entry;
            }
        }
        first
    }
}

impl TryFrom<Vec<HazardType>> for HazardCatalog {
    type Error = GameError;

    fn try_from(entries: Vec<HazardType>) -> Result<Self> {
        Self::new(entries)
    }
}

impl From<HazardCatalog> for Vec<HazardType> {
    fn from(catalog: HazardCatalog) -> Self {
        catalog.entries
    }
}

impl Default for HazardCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
