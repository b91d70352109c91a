//! Ground surface classification

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Collider name used as the fallback entry of the collider table
pub const DEFAULT_COLLIDER: &str = "default";

/// What the wheel is rolling on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Vessel,
    Concrete,
    Dirt,
    /// Unclassified; gates nothing
    #[default]
    Default,
}

impl SurfaceKind {
    /// Tag matched against a layer's data string
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            SurfaceKind::Vessel => Some("vessel"),
            SurfaceKind::Concrete => Some("concrete"),
            SurfaceKind::Dirt => Some("dirt"),
            SurfaceKind::Default => None,
        }
    }

    /// Whether a layer tagged `data` may sound on this surface.
    ///
    /// Untagged layers always sound.
    pub fn admits(&self, data: &str) -> bool {
        if data.is_empty() {
            return true;
        }
        match self.tag() {
            Some(tag) => data.contains(tag),
            None => true,
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or("default"))
    }
}

/// Maps the collider under a wheel to a [`SurfaceKind`]
#[derive(Debug, Clone, Default)]
pub struct SurfaceClassifier {
    colliders: HashMap<String, SurfaceKind>,
}

impl SurfaceClassifier {
    pub fn new(colliders: HashMap<String, SurfaceKind>) -> Self {
        Self { colliders }
    }

    /// Classify the collider hit by the ground probe.
    ///
    /// Lookup order is the exact name, then the `default` entry, then
    /// [`SurfaceKind::Default`]. No hit at all is treated as dirt.
    pub fn classify(&self, collider: Option<&str>) -> SurfaceKind {
        let Some(name) = collider else {
            return SurfaceKind::Dirt;
        };
        self.colliders
            .get(name)
            .or_else(|| self.colliders.get(DEFAULT_COLLIDER))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> SurfaceClassifier {
        SurfaceClassifier::new(HashMap::from([
            ("runway".to_string(), SurfaceKind::Concrete),
            ("Part".to_string(), SurfaceKind::Vessel),
            (DEFAULT_COLLIDER.to_string(), SurfaceKind::Dirt),
        ]))
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(classifier().classify(Some("runway")), SurfaceKind::Concrete);
        assert_eq!(classifier().classify(Some("Part")), SurfaceKind::Vessel);
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(classifier().classify(Some("crater_rim")), SurfaceKind::Dirt);

        let bare = SurfaceClassifier::new(HashMap::new());
        assert_eq!(bare.classify(Some("crater_rim")), SurfaceKind::Default);
    }

    #[test]
    fn test_no_hit_is_dirt() {
        let bare = SurfaceClassifier::default();
        assert_eq!(bare.classify(None), SurfaceKind::Dirt);
    }

    #[test]
    fn test_admits() {
        assert!(SurfaceKind::Dirt.admits("dirt"));
        assert!(SurfaceKind::Dirt.admits("dirt,concrete"));
        assert!(!SurfaceKind::Concrete.admits("dirt"));
        assert!(SurfaceKind::Concrete.admits(""));
        assert!(SurfaceKind::Default.admits("vessel"));
    }

    #[test]
    fn test_yaml_names() {
        let kind: SurfaceKind = serde_yaml::from_str("concrete").unwrap();
        assert_eq!(kind, SurfaceKind::Concrete);
        assert_eq!(SurfaceKind::Vessel.to_string(), "vessel");
    }
}
