//! # Derivative List
//!
//! Registry of a model's derivatives keyed by (usage, quality), with tiered
//! fallback selection. Requests for a missing tier resolve to the nearest
//! higher tier first, then the nearest lower one.

use crate::derivative::{Derivative, DerivativeKey, Quality, Usage};
use crate::error::{Result, VoyagerError};
use std::collections::BTreeMap;
use tracing::warn;

/// Derivatives grouped by usage, each bin ordered by quality
#[derive(Debug, Default)]
pub struct DerivativeList {
    bins: BTreeMap<Usage, BTreeMap<Quality, Derivative>>,
}

impl DerivativeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a derivative. A second derivative for the same key is rejected.
    pub fn add(&mut self, derivative: Derivative) -> Result<&mut Derivative> {
        let (usage, quality) = (derivative.usage(), derivative.quality());
        let bin = self.bins.entry(usage).or_default();
        if bin.contains_key(&quality) {
            return Err(VoyagerError::DuplicateDerivative { usage, quality });
        }
        Ok(bin.entry(quality).or_insert(derivative))
    }

    /// Exact lookup, creating an empty derivative when absent
    pub fn get_or_create(&mut self, usage: Usage, quality: Quality) -> &mut Derivative {
        self.bins
            .entry(usage)
            .or_default()
            .entry(quality)
            .or_insert_with(|| Derivative::new(usage, quality))
    }

    pub fn get(&self, key: DerivativeKey) -> Option<&Derivative> {
        self.bins.get(&key.usage)?.get(&key.quality)
    }

    pub fn get_mut(&mut self, key: DerivativeKey) -> Option<&mut Derivative> {
        self.bins.get_mut(&key.usage)?.get_mut(&key.quality)
    }

    pub fn contains(&self, key: DerivativeKey) -> bool {
        self.get(key).is_some()
    }

    /// Remove and return a derivative; the caller owns its object from now on
    pub fn remove(&mut self, key: DerivativeKey) -> Option<Derivative> {
        let bin = self.bins.get_mut(&key.usage)?;
        let removed = bin.remove(&key.quality);
        if bin.is_empty() {
            self.bins.remove(&key.usage);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.bins.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All derivatives in (usage, quality) order
    pub fn iter(&self) -> impl Iterator<Item = &Derivative> {
        self.bins.values().flat_map(BTreeMap::values)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Derivative> {
        self.bins.values_mut().flat_map(BTreeMap::values_mut)
    }

    /// Lowest quality derivative of a usage bin
    pub fn lowest(&self, usage: Usage) -> Option<&Derivative> {
        self.bins.get(&usage)?.values().next()
    }

    /// Dispose every runtime object and empty the list
    pub fn clear(&mut self) {
        for derivative in self.iter_mut() {
            derivative.dispose();
        }
        self.bins.clear();
    }

    /// Best available derivative for the request.
    ///
    /// Exact match first, then the closest higher tier, then the closest
    /// lower tier. LOD and Stream tiers do not take part in selection.
    pub fn select(&self, usage: Usage, quality: Quality) -> Option<&Derivative> {
        let key = self.select_key(usage, quality)?;
        self.get(key)
    }

    /// Key of the derivative [`DerivativeList::select`] would return
    pub fn select_key(&self, usage: Usage, quality: Quality) -> Option<DerivativeKey> {
        let Some(index) = quality.ladder_index() else {
            warn!(usage = %usage, quality = %quality, "derivative quality not supported");
            return None;
        };

        let bin = match self.bins.get(&usage) {
            Some(bin) if !bin.is_empty() => bin,
            _ => {
                warn!(usage = %usage, quality = %quality, "no suitable derivative found");
                return None;
            }
        };

        if bin.contains_key(&quality) {
            return Some(DerivativeKey::new(usage, quality));
        }

        let ladder = &Quality::LADDER;

        if let Some(higher) = ladder[index + 1..].iter().find(|q| bin.contains_key(*q)) {
            warn!(
                usage = %usage,
                requested = %quality,
                selected = %higher,
                "derivative not found, using higher quality"
            );
            return Some(DerivativeKey::new(usage, *higher));
        }

        if let Some(lower) = ladder[..index].iter().rev().find(|q| bin.contains_key(*q)) {
            warn!(
                usage = %usage,
                requested = %quality,
                selected = %lower,
                "derivative not found, using lower quality"
            );
            return Some(DerivativeKey::new(usage, *lower));
        }

        warn!(usage = %usage, quality = %quality, "no suitable derivative found");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with(usage: Usage, qualities: &[Quality]) -> DerivativeList {
        let mut list = DerivativeList::new();
        for q in qualities {
            list.add(Derivative::new(usage, *q)).unwrap();
        }
        list
    }

    fn selected(list: &DerivativeList, usage: Usage, quality: Quality) -> Option<Quality> {
        list.select(usage, quality).map(Derivative::quality)
    }

    #[test]
    fn test_exact_match() {
        let list = list_with(Usage::Web, &Quality::LADDER);
        for q in Quality::LADDER {
            assert_eq!(selected(&list, Usage::Web, q), Some(q));
        }
    }

    #[test]
    fn test_prefers_higher_then_lower() {
        let list = list_with(Usage::Web, &[Quality::Low, Quality::High]);
        assert_eq!(selected(&list, Usage::Web, Quality::Medium), Some(Quality::High));

        let list = list_with(Usage::Web, &[Quality::Medium, Quality::Highest]);
        assert_eq!(selected(&list, Usage::Web, Quality::High), Some(Quality::Highest));
    }

    #[test]
    fn test_thumb_and_medium_only() {
        let list = list_with(Usage::Web, &[Quality::Thumb, Quality::Medium]);
        assert_eq!(selected(&list, Usage::Web, Quality::Low), Some(Quality::Medium));
        assert_eq!(selected(&list, Usage::Web, Quality::Highest), Some(Quality::Medium));
        assert_eq!(selected(&list, Usage::Web, Quality::Thumb), Some(Quality::Thumb));
    }

    #[test]
    fn test_fallback_is_nearest_in_preferred_direction() {
        // For every subset of the ladder, a fallback never skips an available
        // tier on its side of the request.
        for mask in 1u32..32 {
            let present: Vec<Quality> = Quality::LADDER
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, q)| *q)
                .collect();
            let list = list_with(Usage::Print, &present);

            for request in Quality::LADDER {
                let got = selected(&list, Usage::Print, request).unwrap();
                if present.contains(&request) {
                    assert_eq!(got, request);
                } else if let Some(higher) = present.iter().filter(|q| **q > request).min() {
                    assert_eq!(got, *higher);
                } else {
                    let lower = present.iter().filter(|q| **q < request).max().unwrap();
                    assert_eq!(got, *lower);
                }
            }
        }
    }

    #[test]
    fn test_empty_bin_and_other_usage() {
        let list = list_with(Usage::Print, &[Quality::High]);
        assert!(list.select(Usage::Web, Quality::High).is_none());
        assert!(DerivativeList::new().select(Usage::Web, Quality::Low).is_none());
    }

    #[test]
    fn test_lod_and_stream_unsupported() {
        let mut list = list_with(Usage::Web, &Quality::LADDER);
        list.add(Derivative::new(Usage::Web, Quality::Lod)).unwrap();
        assert!(list.select(Usage::Web, Quality::Lod).is_none());
        assert!(list.select(Usage::Web, Quality::Stream).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut list = list_with(Usage::Web, &[Quality::High]);
        let err = list.add(Derivative::new(Usage::Web, Quality::High)).unwrap_err();
        assert!(matches!(
            err,
            VoyagerError::DuplicateDerivative { usage: Usage::Web, quality: Quality::High }
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_get_or_create_and_remove() {
        let mut list = DerivativeList::new();
        list.get_or_create(Usage::Editorial, Quality::Low).create_model_asset("a.glb");
        assert_eq!(list.get_or_create(Usage::Editorial, Quality::Low).assets().len(), 1);
        assert_eq!(list.len(), 1);

        let key = DerivativeKey::new(Usage::Editorial, Quality::Low);
        assert!(list.remove(key).is_some());
        assert!(list.is_empty());
        assert!(list.remove(key).is_none());
    }

    #[test]
    fn test_iteration_order_and_lowest() {
        let mut list = DerivativeList::new();
        list.add(Derivative::new(Usage::Print, Quality::Low)).unwrap();
        list.add(Derivative::new(Usage::Web, Quality::Highest)).unwrap();
        list.add(Derivative::new(Usage::Web, Quality::Thumb)).unwrap();

        let keys: Vec<_> = list.iter().map(Derivative::key).collect();
        assert_eq!(
            keys,
            vec![
                DerivativeKey::new(Usage::Web, Quality::Thumb),
                DerivativeKey::new(Usage::Web, Quality::Highest),
                DerivativeKey::new(Usage::Print, Quality::Low),
            ]
        );
        assert_eq!(list.lowest(Usage::Web).map(Derivative::quality), Some(Quality::Thumb));
    }
}
