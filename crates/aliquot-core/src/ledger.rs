//! Volume bookkeeping across nested mixes.
//!
//! Walking a mix tree with [`Mix::record_volumes`](crate::Mix::record_volumes)
//! fills a [`VolumeLedger`] with how much of every reagent is *made* (a mix's
//! total volume; zero for stock components) and how much is *consumed* by the
//! mixes that draw from it. Comparing the two shows which intermediates must
//! be scaled up before a protocol can run.
//!
//! Each mix is walked once, tracked by a visited set, so a mix shared by
//! several parents contributes its own consumption only once.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::quantity::Volume;

/// Made and consumed volumes, keyed by reagent name in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct VolumeLedger {
    consumed: IndexMap<String, Volume>,
    made: IndexMap<String, Volume>,
    visited: HashSet<String>,
}

impl VolumeLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` visited. Returns `false` if it already was.
    pub(crate) fn enter(&mut self, name: &str) -> bool {
        self.visited.insert(name.to_string())
    }

    /// Record a stock component: made with zero volume, visited once.
    pub(crate) fn record_leaf(&mut self, name: &str) {
        if self.enter(name) {
            self.make_if_absent(name, Volume::zero());
        }
    }

    pub(crate) fn make(&mut self, name: &str, volume: Volume) {
        self.made.insert(name.to_string(), volume);
    }

    pub(crate) fn make_if_absent(&mut self, name: &str, volume: Volume) {
        self.made.entry(name.to_string()).or_insert(volume);
    }

    pub(crate) fn consume(&mut self, name: &str, volume: Volume) {
        let entry = self.consumed.entry(name.to_string()).or_insert_with(Volume::zero);
        *entry = *entry + volume;
    }

    /// Total volume drawn from `name`; zero if never drawn.
    pub fn consumed(&self, name: &str) -> Volume {
        self.consumed.get(name).copied().unwrap_or_else(Volume::zero)
    }

    /// Volume of `name` that is made; zero for stock components and unknown names.
    pub fn made(&self, name: &str) -> Volume {
        self.made.get(name).copied().unwrap_or_else(Volume::zero)
    }

    /// `made - consumed` for `name`.
    pub fn balance(&self, name: &str) -> Volume {
        self.made(name) - self.consumed(name)
    }

    /// Consumed volumes in first-seen order.
    pub fn consumed_volumes(&self) -> impl Iterator<Item = (&str, Volume)> {
        self.consumed.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Made volumes in first-seen order.
    pub fn made_volumes(&self) -> impl Iterator<Item = (&str, Volume)> {
        self.made.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Mixes (made with a positive volume) from which more is consumed than made.
    pub fn shortfalls(&self) -> Vec<(&str, Volume)> {
        self.made
            .iter()
            .filter(|(_, made)| **made > Volume::zero())
            .filter_map(|(name, _)| {
                let balance = self.balance(name);
                (balance < Volume::zero()).then_some((name.as_str(), -balance))
            })
            .collect()
    }

    /// Returns `true` if `name` has been walked.
    pub fn contains(&self, name: &str) -> bool {
        self.visited.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, FixedVolume};
    use crate::component::Component;
    use crate::mix::Mix;
    use crate::quantity::Concentration;

    fn ul(v: i64) -> Volume {
        Volume::microliters(v)
    }

    fn comp(name: &str) -> Component {
        Component::new(name).with_concentration(Concentration::nanomolar(100))
    }

    #[test]
    fn shared_intermediate_is_walked_once() {
        let inner = Mix::new(
            "inner",
            vec![Box::new(FixedVolume::new([comp("a")], ul(2)).unwrap()) as Box<dyn Action>],
        )
        .unwrap()
        .with_fixed_total_volume(ul(10));
        let outer = Mix::new(
            "outer",
            vec![
                Box::new(FixedVolume::new([&inner], ul(4)).unwrap()) as Box<dyn Action>,
                Box::new(FixedVolume::new([&inner, &inner], ul(4)).unwrap()),
            ],
        )
        .unwrap()
        .with_fixed_total_volume(ul(20));

        let ledger = outer.volume_ledger().unwrap();
        assert_eq!(ledger.made("outer"), ul(20));
        assert_eq!(ledger.made("inner"), ul(10));
        assert_eq!(ledger.consumed("inner"), ul(12));
        // a is drawn only by the single walk of inner
        assert_eq!(ledger.consumed("a"), ul(2));
        assert_eq!(ledger.consumed("Buffer"), ul(16));
        assert_eq!(ledger.shortfalls(), vec![("inner", ul(2))]);
    }

    #[test]
    fn leaves_are_made_with_zero_volume() {
        let mut ledger = VolumeLedger::new();
        ledger.record_leaf("x");
        assert!(ledger.contains("x"));
        assert_eq!(ledger.made("x"), Volume::zero());
        assert_eq!(ledger.consumed("x"), Volume::zero());
        assert!(ledger.shortfalls().is_empty());
    }
}
