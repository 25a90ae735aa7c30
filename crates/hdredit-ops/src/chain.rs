//! Ordered adjustment chain.
//!
//! A chain holds exactly one [`Adjustment`] per [`AdjustmentId`], always in
//! canonical order. It is mutated one entry at a time and never reordered or
//! resized, so an index into [`AdjustmentChain::as_ordered_list`] is stable.
//!
//! ```rust
//! use hdredit_ops::{AdjustmentChain, AdjustmentId};
//!
//! let mut chain = AdjustmentChain::new();
//! assert!(chain.is_identity());
//!
//! chain.set(AdjustmentId::Exposure, Some(true), Some(3.0));
//! assert_eq!(chain.get(AdjustmentId::Exposure).value(), 2.0); // clamped
//! ```

use crate::{Adjustment, AdjustmentId, OpsError, OpsResult};
use serde::{Deserialize, Serialize};

const LEN: usize = AdjustmentId::ALL.len();

/// The ordered set of adjustments applied to one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Adjustment>", into = "Vec<Adjustment>")]
pub struct AdjustmentChain {
    entries: [Adjustment; LEN],
}

impl Default for AdjustmentChain {
    fn default() -> Self {
        Self {
            entries: AdjustmentId::ALL.map(Adjustment::identity),
        }
    }
}

impl AdjustmentChain {
    /// Default chain: every adjustment disabled at its identity value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain from an unordered list.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidChain`] if an identifier is missing or repeated.
    pub fn from_adjustments(list: Vec<Adjustment>) -> OpsResult<Self> {
        let mut slots: [Option<Adjustment>; LEN] = [None; LEN];
        for adj in list {
            let slot = &mut slots[adj.id.index()];
            if slot.is_some() {
                return Err(OpsError::InvalidChain(format!("duplicate adjustment '{}'", adj.id)));
            }
            *slot = Some(adj);
        }

        let missing: Vec<&str> = AdjustmentId::ALL
            .iter()
            .filter(|id| slots[id.index()].is_none())
            .map(|id| id.name())
            .collect();
        if !missing.is_empty() {
            return Err(OpsError::InvalidChain(format!("missing {}", missing.join(", "))));
        }

        let mut chain = Self::default();
        for (entry, slot) in chain.entries.iter_mut().zip(slots) {
            if let Some(adj) = slot {
                *entry = adj;
            }
        }
        Ok(chain)
    }

    /// Updates one entry. `None` leaves that field unchanged; values clamp.
    pub fn set(&mut self, id: AdjustmentId, enabled: Option<bool>, value: Option<f64>) {
        let entry = &mut self.entries[id.index()];
        if let Some(enabled) = enabled {
            entry.enabled = enabled;
        }
        if let Some(value) = value {
            entry.set_value(value);
        }
    }

    /// Entry for `id`.
    #[inline]
    pub fn get(&self, id: AdjustmentId) -> &Adjustment {
        &self.entries[id.index()]
    }

    /// Entries in canonical order.
    #[inline]
    pub fn as_ordered_list(&self) -> &[Adjustment] {
        &self.entries
    }

    /// Enabled entries in canonical order.
    pub fn enabled(&self) -> impl Iterator<Item = &Adjustment> {
        self.entries.iter().filter(|a| a.enabled)
    }

    /// `true` when no entry is enabled.
    pub fn is_identity(&self) -> bool {
        self.enabled().next().is_none()
    }

    /// Restores the default chain.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Applies every enabled entry to an RGB triple, in order.
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        self.entries.iter().fold(rgb, |acc, adj| adj.apply(acc))
    }
}

impl TryFrom<Vec<Adjustment>> for AdjustmentChain {
    type Error = OpsError;

    fn try_from(list: Vec<Adjustment>) -> OpsResult<Self> {
        Self::from_adjustments(list)
    }
}

impl From<AdjustmentChain> for Vec<Adjustment> {
    fn from(chain: AdjustmentChain) -> Self {
        chain.entries.to_vec()
    }
}
