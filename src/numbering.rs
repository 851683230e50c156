use crate::{
    batch::InputImage,
    config::Config,
    error::{LayoutError, Result},
    range,
    strip::StripPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Numbering {
    Number(u32),
    Skipped,
}

impl Numbering {
    pub fn number(self) -> Option<u32> {
        match self {
            Numbering::Number(n) => Some(n),
            Numbering::Skipped => None,
        }
    }
}

/// Assigns display numbers to batch positions.
///
/// Must be fed positions in batch order: the sequential counter only moves
/// for images that receive an automatic number.
#[derive(Debug, Clone)]
pub struct NumberingResolver {
    overrides: BTreeMap<u32, u32>,
    skip: BTreeSet<u32>,
    counter: u32,
}

impl NumberingResolver {
    pub fn new(overrides: BTreeMap<u32, u32>, skip: BTreeSet<u32>) -> Self {
        Self {
            overrides,
            skip,
            counter: 0,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let overrides = range::parse_numbering_overrides(&cfg.numbering.overrides);
        let skip = range::parse_skip(&cfg.numbering.skip)
            .map_err(|e| LayoutError::parse("numbering.skip", e))?;
        Ok(Self::new(overrides, skip))
    }

    /// `position` is 1-based.
    pub fn resolve(&mut self, position: u32) -> Numbering {
        if let Some(&explicit) = self.overrides.get(&position) {
            return Numbering::Number(explicit);
        }
        if self.skip.contains(&position) {
            return Numbering::Skipped;
        }
        self.counter += 1;
        Numbering::Number(self.counter)
    }
}

/// One row of the numbering plan, as printed by `sheetbinder plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub position: u32,
    pub file: String,
    pub numbering: Numbering,
    pub strip_fraction: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberingPlan {
    pub entries: Vec<PlanEntry>,
}

impl NumberingPlan {
    /// `images` must already be in natural-sort order.
    pub fn build(
        resolver: &mut NumberingResolver,
        strip: &StripPolicy,
        images: &[InputImage],
    ) -> NumberingPlan {
        let entries = images
            .iter()
            .enumerate()
            .map(|(i, img)| {
                let position = i as u32 + 1;
                let numbering = resolver.resolve(position);
                PlanEntry {
                    position,
                    file: img.name.clone(),
                    numbering,
                    strip_fraction: numbering.number().and_then(|n| strip.fraction_for(n)),
                }
            })
            .collect();
        NumberingPlan { entries }
    }

    pub fn numbered(&self) -> impl Iterator<Item = (&PlanEntry, u32)> {
        self.entries
            .iter()
            .filter_map(|e| e.numbering.number().map(|n| (e, n)))
    }
}
