//! StatProvider - Pluggable storage for (carrier, stat) pairs

use crate::carrier::Carrier;
use crate::types::StatId;
use std::sync::Arc;

/// Redirects storage of specific stats away from the built-in store
pub trait StatProvider: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Whether this provider owns `stat` on `carrier`
    fn can_provide(&self, carrier: &Carrier, stat: &StatId) -> bool;

    fn get_stat(&self, carrier: &Carrier, stat: &StatId) -> i64;

    fn set_stat(&self, carrier: &mut Carrier, stat: &StatId, value: i64);
}

/// Catch-all provider backed by the carrier's StatStore
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStatProvider;

impl StatProvider for DefaultStatProvider {
    fn name(&self) -> &str {
        "default"
    }

    fn can_provide(&self, _carrier: &Carrier, _stat: &StatId) -> bool {
        true
    }

    fn get_stat(&self, carrier: &Carrier, stat: &StatId) -> i64 {
        carrier.stats().get(stat)
    }

    fn set_stat(&self, carrier: &mut Carrier, stat: &StatId, value: i64) {
        let next = carrier.stats().with(stat, value);
        carrier.replace_stats(next);
    }
}

/// Maps `relic:durability_used` onto the carrier's own damage value
#[derive(Debug, Clone)]
pub struct DurabilityProvider {
    stat: StatId,
}

impl DurabilityProvider {
    pub const STAT: &'static str = "relic:durability_used";

    pub fn new() -> Self {
        DurabilityProvider {
            stat: StatId::new_unchecked(Self::STAT),
        }
    }
}

impl Default for DurabilityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StatProvider for DurabilityProvider {
    fn name(&self) -> &str {
        "durability"
    }

    fn can_provide(&self, carrier: &Carrier, stat: &StatId) -> bool {
        carrier.max_damage > 0 && *stat == self.stat
    }

    fn get_stat(&self, carrier: &Carrier, _stat: &StatId) -> i64 {
        i64::from(carrier.damage)
    }

    fn set_stat(&self, carrier: &mut Carrier, _stat: &StatId, value: i64) {
        carrier.damage = value.clamp(0, i64::from(carrier.max_damage)) as u32;
    }
}

/// Ordered provider list; the most recently registered provider is asked first
/// and the default provider always answers last.
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn StatProvider>>,
    fallback: DefaultStatProvider,
}

impl Default for ProviderChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderChain {
    pub fn new() -> Self {
        ProviderChain {
            providers: Vec::new(),
            fallback: DefaultStatProvider,
        }
    }

    /// Copy of this chain with `provider` placed in front
    pub fn with_provider(&self, provider: Arc<dyn StatProvider>) -> ProviderChain {
        let mut providers = Vec::with_capacity(self.providers.len() + 1);
        providers.push(provider);
        providers.extend(self.providers.iter().cloned());
        ProviderChain {
            providers,
            fallback: DefaultStatProvider,
        }
    }

    /// First provider that claims the pair
    pub fn resolve(&self, carrier: &Carrier, stat: &StatId) -> &dyn StatProvider {
        self.providers
            .iter()
            .find(|p| p.can_provide(carrier, stat))
            .map(|p| p.as_ref())
            .unwrap_or(&self.fallback as &dyn StatProvider)
    }

    pub fn get_stat(&self, carrier: &Carrier, stat: &StatId) -> i64 {
        self.resolve(carrier, stat).get_stat(carrier, stat)
    }

    pub fn set_stat(&self, carrier: &mut Carrier, stat: &StatId, value: i64) {
        let provider = self.resolve(carrier, stat);
        provider.set_stat(carrier, stat, value);
    }

    /// Provider names in lookup order, default included
    pub fn names(&self) -> Vec<&str> {
        self.providers
            .iter()
            .map(|p| p.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, i64);

    impl StatProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn can_provide(&self, _carrier: &Carrier, stat: &StatId) -> bool {
            stat.path() == "fixed"
        }

        fn get_stat(&self, _carrier: &Carrier, _stat: &StatId) -> i64 {
            self.1
        }

        fn set_stat(&self, _carrier: &mut Carrier, _stat: &StatId, _value: i64) {}
    }

    fn id(raw: &str) -> StatId {
        StatId::parse(raw).unwrap()
    }

    #[test]
    fn test_default_provider_is_catch_all() {
        let chain = ProviderChain::new();
        let mut carrier = Carrier::new("relic:sword");
        chain.set_stat(&mut carrier, &id("kills"), 4);
        assert_eq!(chain.get_stat(&carrier, &id("kills")), 4);
        assert_eq!(chain.names(), vec!["default"]);
    }

    #[test]
    fn test_latest_registration_wins() {
        let chain = ProviderChain::new()
            .with_provider(Arc::new(Fixed("first", 1)))
            .with_provider(Arc::new(Fixed("second", 2)));

        let carrier = Carrier::new("relic:sword");
        assert_eq!(chain.get_stat(&carrier, &id("fixed")), 2);
        assert_eq!(chain.get_stat(&carrier, &id("other")), 0);
        assert_eq!(chain.names(), vec!["second", "first", "default"]);
    }

    #[test]
    fn test_durability_provider_clamps() {
        let chain = ProviderChain::new().with_provider(Arc::new(DurabilityProvider::new()));
        let stat = id(DurabilityProvider::STAT);
        let mut pick = Carrier::new("relic:pickaxe").with_durability(250);

        chain.set_stat(&mut pick, &stat, 300);
        assert_eq!(pick.damage, 250);
        chain.set_stat(&mut pick, &stat, -5);
        assert_eq!(pick.damage, 0);
        assert!(pick.stats().is_empty());

        // items without durability fall through to the store
        let mut stone = Carrier::new("relic:stone");
        chain.set_stat(&mut stone, &stat, 3);
        assert_eq!(stone.stat(&stat), 3);
    }
}
