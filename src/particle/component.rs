//! Particle components: the units a composition counts.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Carbon,
    Aluminum,
    Alumina,
    Titania,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Carbon => "carbon",
            ComponentKind::Aluminum => "aluminum",
            ComponentKind::Alumina => "alumina",
            ComponentKind::Titania => "titania",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "carbon" => Some(ComponentKind::Carbon),
            "aluminum" => Some(ComponentKind::Aluminum),
            "alumina" => Some(ComponentKind::Alumina),
            "titania" => Some(ComponentKind::Titania),
            _ => None,
        }
    }
}

/// One particle constituent. A composition entry counts molecules (or atoms)
/// of it, so one unit weighs `molar_mass / N_A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub molar_mass_kg_per_mol: f64,
    pub density_kg_m3: f64,
}

impl Component {
    pub fn new(name: &str, molar_mass_kg_per_mol: f64, density_kg_m3: f64) -> Self {
        Self {
            name: name.to_string(),
            molar_mass_kg_per_mol,
            density_kg_m3,
        }
    }

    pub fn unit_mass_kg(&self, avogadro: f64) -> f64 {
        self.molar_mass_kg_per_mol / avogadro
    }

    pub fn unit_volume_m3(&self, avogadro: f64) -> f64 {
        self.unit_mass_kg(avogadro) / self.density_kg_m3
    }
}

pub static COMPONENT_PROFILES: Lazy<HashMap<ComponentKind, Component>> = Lazy::new(|| {
    use ComponentKind::*;
    let mut m = HashMap::new();

    m.insert(Carbon, Component::new("carbon", 0.012011, 1800.0));
    // liquid aluminium and alpha alumina
    m.insert(Aluminum, Component::new("aluminum", 0.026982, 2377.0));
    m.insert(Alumina, Component::new("alumina", 0.101961, 3900.0));
    m.insert(Titania, Component::new("titania", 0.079866, 4230.0));

    m
});

pub fn builtin_component(kind: ComponentKind) -> Option<&'static Component> {
    COMPONENT_PROFILES.get(&kind)
}
