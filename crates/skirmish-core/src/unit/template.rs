//! Unit templates.
//!
//! Templates are the static description a unit is spawned from. Derived
//! pools are computed once, at spawn:
//!
//! | pool      | formula              |
//! |-----------|----------------------|
//! | health    | 10 + 5 × vitality    |
//! | physical  | 2 × resistance       |
//! | magical   | 2 × will             |
//! | vision    | base + focus / 2     |

use serde::{Deserialize, Serialize};
use skirmish_grid::Cell;

use super::{Attributes, CombatUnit, Pool, UnitCategory, UnitFlags};
use crate::condition::ConditionLedger;
use crate::config::EngineConfig;
use crate::ids::{OwnerId, UnitId};

/// Static description of a unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Display name.
    pub name: String,
    /// Category.
    pub category: UnitCategory,
    /// Footprint edge length.
    #[serde(default = "default_size")]
    pub size: u32,
    /// Base attributes.
    pub attributes: Attributes,
}

fn default_size() -> u32 {
    1
}

impl UnitTemplate {
    /// Creates a size-1 template.
    #[must_use]
    pub fn new(name: impl Into<String>, category: UnitCategory, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            category,
            size: 1,
            attributes,
        }
    }

    /// Sets the footprint size.
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    /// Builds a fresh unit from this template.
    #[must_use]
    pub fn spawn(
        &self,
        id: UnitId,
        owner: OwnerId,
        position: Cell,
        config: &EngineConfig,
    ) -> CombatUnit {
        let a = self.attributes;
        CombatUnit {
            id,
            owner,
            name: self.name.clone(),
            category: self.category,
            position,
            size: self.size.max(1),
            attributes: a,
            hp: Pool::full(a.vitality.saturating_mul(5).saturating_add(10)),
            physical: Pool::full(a.resistance.saturating_mul(2)),
            magical: Pool::full(a.will.saturating_mul(2)),
            vision: config.base_vision.saturating_add(a.focus / 2),
            moves_left: 0,
            actions_left: 0,
            action_marks: 0,
            mark_cap: config.mark_caps.for_category(self.category),
            flags: UnitFlags::empty(),
            conditions: ConditionLedger::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_pools() {
        let template = UnitTemplate::new("ogre", UnitCategory::Champion, Attributes {
            combat: 6,
            speed: 2,
            focus: 3,
            resistance: 4,
            will: 1,
            vitality: 6,
        })
        .with_size(2);
        let unit = template.spawn(UnitId::new(5), OwnerId::new(2), Cell::new(1, 1), &EngineConfig::default());
        assert_eq!(unit.hp, Pool::full(40));
        assert_eq!(unit.physical, Pool::full(8));
        assert_eq!(unit.magical, Pool::full(2));
        assert_eq!(unit.vision, 5);
        assert_eq!(unit.mark_cap, 4);
        assert_eq!(unit.size, 2);
        assert!(unit.is_alive());
    }

    #[test]
    fn huge_attributes_cap_their_pools() {
        let template = UnitTemplate::new("titan", UnitCategory::Champion, Attributes {
            combat: u32::MAX,
            speed: u32::MAX,
            focus: u32::MAX,
            resistance: u32::MAX,
            will: u32::MAX / 2 + 1,
            vitality: u32::MAX / 5,
        });
        let unit = template.spawn(UnitId::new(1), OwnerId::new(1), Cell::new(0, 0), &EngineConfig::default());
        assert_eq!(unit.hp, Pool::full(u32::MAX));
        assert_eq!(unit.physical, Pool::full(u32::MAX));
        assert_eq!(unit.magical, Pool::full(u32::MAX));
        assert_eq!(unit.vision, EngineConfig::default().base_vision + u32::MAX / 2);
    }

    #[test]
    fn template_parses_without_size() {
        let toml = r#"
            name = "scout"
            category = "minion"
            [attributes]
            combat = 2
            speed = 6
            focus = 4
            resistance = 0
            will = 0
            vitality = 1
        "#;
        let template: UnitTemplate = toml::from_str(toml).unwrap();
        assert_eq!(template.size, 1);
        assert_eq!(template.category, UnitCategory::Minion);
    }
}
