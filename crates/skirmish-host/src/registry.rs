use std::collections::HashMap;

use skirmish_core::battle::BattleMode;
use skirmish_core::error::SetupError;
use skirmish_core::mode::{ModeId, ModeSettings};

/// Factory function type for creating battle modes.
type ModeFactory = fn(ModeSettings) -> Box<dyn BattleMode>;

/// Registry mapping mode selectors to factory functions.
pub struct ModeRegistry {
    factories: HashMap<ModeId, ModeFactory>,
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_defaults();
        registry
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    fn register_defaults(&mut self) {
        #[cfg(feature = "survivor")]
        self.register(ModeId::LastSurvivor, |settings| {
            Box::new(skirmish_survivor::LastSurvivor::new(settings))
        });
        #[cfg(feature = "fewest-deaths")]
        self.register(ModeId::FewestDeaths, |settings| {
            Box::new(skirmish_fewest_deaths::FewestDeaths::new(settings))
        });
    }

    pub fn register(&mut self, id: ModeId, factory: ModeFactory) {
        self.factories.insert(id, factory);
    }

    /// Build a fresh mode for one battle.
    pub fn create(&self, id: ModeId, settings: ModeSettings) -> Result<Box<dyn BattleMode>, SetupError> {
        let factory = self
            .factories
            .get(&id)
            .ok_or_else(|| SetupError::UnknownMode(id.to_string()))?;
        tracing::debug!(mode = %id, "Creating battle mode");
        Ok(factory(settings))
    }

    /// Parse a textual selector and build the mode it names.
    pub fn create_from_selector(
        &self,
        selector: &str,
        settings: ModeSettings,
    ) -> Result<Box<dyn BattleMode>, SetupError> {
        self.create(selector.parse()?, settings)
    }

    /// Return the number of registered mode types.
    pub fn available_modes(&self) -> usize {
        self.factories.len()
    }
}
