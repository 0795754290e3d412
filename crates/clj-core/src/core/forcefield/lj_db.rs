use super::params::{CombiningRule, LjPair, LjParameter, LookupError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Compact identifier of an interned [`LjParameter`]. Id 0 is the dummy parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LjId(pub u32);

impl LjId {
    pub const DUMMY: LjId = LjId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct RegistryInner {
    parameters: Vec<LjParameter>,
    index: HashMap<(u64, u64), LjId>,
}

impl RegistryInner {
    fn new() -> Self {
        let dummy = LjParameter::dummy();
        let mut index = HashMap::new();
        index.insert(key_of(&dummy), LjId::DUMMY);
        Self {
            parameters: vec![dummy],
            index,
        }
    }
}

fn key_of(param: &LjParameter) -> (u64, u64) {
    (param.sigma.to_bits(), param.epsilon.to_bits())
}

/// Interns LJ parameters into small integer ids.
///
/// The registry is the only mutable piece of LJ bookkeeping. A single lock guards
/// each lookup-or-insert; evaluation code works from an [`LjSnapshot`] taken once
/// and never touches the registry.
#[derive(Debug)]
pub struct LjParameterRegistry {
    inner: Mutex<RegistryInner>,
}

impl Default for LjParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LjParameterRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::new()),
        }
    }

    pub fn intern(&self, param: LjParameter) -> LjId {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let key = key_of(&param);
        if let Some(&id) = inner.index.get(&key) {
            return id;
        }
        let id = LjId(inner.parameters.len() as u32);
        inner.parameters.push(param);
        inner.index.insert(key, id);
        id
    }

    pub fn intern_all<I>(&self, params: I) -> Vec<LjId>
    where
        I: IntoIterator<Item = LjParameter>,
    {
        params.into_iter().map(|p| self.intern(p)).collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .parameters
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Copies the current parameters out and precomputes every combined pair
    /// under `rule`.
    pub fn snapshot(&self, rule: CombiningRule) -> Arc<LjSnapshot> {
        let parameters = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .parameters
            .clone();
        debug!(
            "Building LJ snapshot of {} parameters ({:?} combining)",
            parameters.len(),
            rule
        );
        Arc::new(LjSnapshot::build(parameters, rule))
    }
}

/// Immutable parameter list plus the dense combined-pair matrix for one rule.
#[derive(Debug, Clone)]
pub struct LjSnapshot {
    rule: CombiningRule,
    parameters: Vec<LjParameter>,
    pairs: Vec<LjPair>,
}

impl LjSnapshot {
    fn build(parameters: Vec<LjParameter>, rule: CombiningRule) -> Self {
        let n = parameters.len();
        let mut pairs = Vec::with_capacity(n * n);
        for a in &parameters {
            for b in &parameters {
                pairs.push(LjPair::combine(a, b, rule));
            }
        }
        Self {
            rule,
            parameters,
            pairs,
        }
    }

    pub fn rule(&self) -> CombiningRule {
        self.rule
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameter(&self, id: LjId) -> Result<LjParameter, LookupError> {
        self.parameters
            .get(id.index())
            .copied()
            .ok_or(LookupError::InvalidLjId {
                id: id.0,
                len: self.parameters.len(),
            })
    }

    /// Combined σ/ε for two interned parameters, read from the matrix built
    /// with the snapshot. This is the lookup for callers that hold `LjId`s
    /// per atom; batches resolve [`LjSnapshot::parameter`] and combine per lane.
    pub fn pair(&self, a: LjId, b: LjId) -> Result<LjPair, LookupError> {
        let n = self.parameters.len();
        for id in [a, b] {
            if id.index() >= n {
                return Err(LookupError::InvalidLjId { id: id.0, len: n });
            }
        }
        Ok(self.pairs[a.index() * n + b.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn interning_the_same_parameter_twice_returns_the_same_id() {
        let registry = LjParameterRegistry::new();
        let a = registry.intern(LjParameter::new(3.4, 0.1));
        let b = registry.intern(LjParameter::new(3.4, 0.1));
        let c = registry.intern(LjParameter::new(3.1, 0.2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn dummy_parameter_is_preregistered_as_id_zero() {
        let registry = LjParameterRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.intern(LjParameter::dummy()), LjId::DUMMY);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_interning() {
        let registry = LjParameterRegistry::new();
        let a = registry.intern(LjParameter::new(3.0, 0.5));
        let snapshot = registry.snapshot(CombiningRule::Arithmetic);
        let late = registry.intern(LjParameter::new(2.0, 0.5));

        assert_eq!(snapshot.parameter(a), Ok(LjParameter::new(3.0, 0.5)));
        assert!(matches!(
            snapshot.parameter(late),
            Err(LookupError::InvalidLjId { id: 2, len: 2 })
        ));
    }

    #[test]
    fn pair_lookup_matches_direct_combination_and_is_symmetric() {
        let registry = LjParameterRegistry::new();
        let ids = registry.intern_all([LjParameter::new(3.0, 0.25), LjParameter::new(4.0, 1.0)]);
        let snapshot = registry.snapshot(CombiningRule::Geometric);

        let ab = snapshot.pair(ids[0], ids[1]).unwrap();
        let ba = snapshot.pair(ids[1], ids[0]).unwrap();
        let direct = LjPair::combine(
            &LjParameter::new(3.0, 0.25),
            &LjParameter::new(4.0, 1.0),
            CombiningRule::Geometric,
        );
        assert_eq!(ab, ba);
        assert_eq!(ab, direct);
        assert_eq!(snapshot.rule(), CombiningRule::Geometric);
        assert!(snapshot.pair(ids[0], LjId(99)).is_err());
    }

    #[test]
    fn concurrent_interning_assigns_unique_ids() {
        let registry = Arc::new(LjParameterRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let epsilon = if t % 2 == 0 { 0.1 } else { 0.2 };
                    (0..50)
                        .map(|i| registry.intern(LjParameter::new(1.0 + i as f64, epsilon)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 1 + 2 * 50);
    }
}
