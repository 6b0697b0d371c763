//! Read-only view of the game board.
//!
//! The adjudication engine owns the real board. The negotiator only needs the
//! queries in [`Board`]; [`MapBoard`] is a plain snapshot implementation that
//! can be loaded from JSON or assembled with [`crate::testing::BoardBuilder`].

use crate::state::{PowerName, ProvinceName, RegionName, Turn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Queries the negotiator runs against the live game state.
///
/// All list-returning methods must enumerate in a stable order for a given
/// board state; the observation encoder and the power index map rely on it.
pub trait Board {
    fn turn(&self) -> Turn;

    /// Living powers in board enumeration order.
    fn powers(&self) -> Vec<PowerName>;

    /// All provinces in board enumeration order.
    fn provinces(&self) -> Vec<ProvinceName>;

    fn is_supply_center(&self, province: &str) -> bool;

    /// Regions (unit locations) that belong to a province.
    fn regions_of(&self, province: &str) -> Vec<RegionName>;

    fn province_of(&self, region: &str) -> Option<ProvinceName>;

    fn adjacent_regions(&self, region: &str) -> Vec<RegionName>;

    /// Power with a unit in `region`, if any.
    fn controller(&self, region: &str) -> Option<PowerName>;

    /// Regions holding a unit of `power`.
    fn controlled_regions(&self, power: &str) -> Vec<RegionName>;

    fn owned_supply_centers(&self, power: &str) -> Vec<ProvinceName>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoardError {
    #[error("Region '{region}' references unknown province '{province}'")]
    UnknownProvince { region: String, province: String },
    #[error("Unknown region '{0}'")]
    UnknownRegion(String),
    #[error("Unknown power '{0}'")]
    UnknownPower(String),
    #[error("Region '{0}' holds more than one unit")]
    DuplicateUnit(String),
    #[error("Failed to parse board snapshot: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvinceDef {
    pub name: ProvinceName,
    #[serde(default)]
    pub supply_center: bool,
    /// Power owning the supply center (meaningless for non-SC provinces).
    #[serde(default)]
    pub owner: Option<PowerName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDef {
    pub name: RegionName,
    pub province: ProvinceName,
    #[serde(default)]
    pub adjacent: Vec<RegionName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub power: PowerName,
    pub region: RegionName,
}

/// Serializable board snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapBoard {
    #[serde(default)]
    pub turn: Turn,
    pub powers: Vec<PowerName>,
    pub provinces: Vec<ProvinceDef>,
    pub regions: Vec<RegionDef>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl MapBoard {
    /// Parse a JSON snapshot and check its references.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let board: MapBoard =
            serde_json::from_str(json).map_err(|e| BoardError::Parse(e.to_string()))?;
        board.validate()?;
        Ok(board)
    }

    /// Check that every region, adjacency and unit refers to something that exists.
    pub fn validate(&self) -> Result<(), BoardError> {
        let provinces: HashSet<&str> = self.provinces.iter().map(|p| p.name.as_str()).collect();
        let regions: HashSet<&str> = self.regions.iter().map(|r| r.name.as_str()).collect();
        let powers: HashSet<&str> = self.powers.iter().map(String::as_str).collect();

        for region in &self.regions {
            if !provinces.contains(region.province.as_str()) {
                return Err(BoardError::UnknownProvince {
                    region: region.name.clone(),
                    province: region.province.clone(),
                });
            }
            if let Some(bad) = region
                .adjacent
                .iter()
                .find(|adj| !regions.contains(adj.as_str()))
            {
                return Err(BoardError::UnknownRegion(bad.clone()));
            }
        }

        for province in &self.provinces {
            if let Some(owner) = &province.owner {
                if !powers.contains(owner.as_str()) {
                    return Err(BoardError::UnknownPower(owner.clone()));
                }
            }
        }

        let mut occupied = HashSet::new();
        for unit in &self.units {
            if !powers.contains(unit.power.as_str()) {
                return Err(BoardError::UnknownPower(unit.power.clone()));
            }
            if !regions.contains(unit.region.as_str()) {
                return Err(BoardError::UnknownRegion(unit.region.clone()));
            }
            if !occupied.insert(unit.region.as_str()) {
                return Err(BoardError::DuplicateUnit(unit.region.clone()));
            }
        }

        Ok(())
    }

    fn region(&self, name: &str) -> Option<&RegionDef> {
        self.regions.iter().find(|r| r.name == name)
    }
}

impl Board for MapBoard {
    fn turn(&self) -> Turn {
        self.turn
    }

    fn powers(&self) -> Vec<PowerName> {
        self.powers.clone()
    }

    fn provinces(&self) -> Vec<ProvinceName> {
        self.provinces.iter().map(|p| p.name.clone()).collect()
    }

    fn is_supply_center(&self, province: &str) -> bool {
        self.provinces
            .iter()
            .any(|p| p.name == province && p.supply_center)
    }

    fn regions_of(&self, province: &str) -> Vec<RegionName> {
        self.regions
            .iter()
            .filter(|r| r.province == province)
            .map(|r| r.name.clone())
            .collect()
    }

    fn province_of(&self, region: &str) -> Option<ProvinceName> {
        self.region(region).map(|r| r.province.clone())
    }

    fn adjacent_regions(&self, region: &str) -> Vec<RegionName> {
        self.region(region)
            .map(|r| r.adjacent.clone())
            .unwrap_or_default()
    }

    fn controller(&self, region: &str) -> Option<PowerName> {
        self.units
            .iter()
            .find(|u| u.region == region)
            .map(|u| u.power.clone())
    }

    fn controlled_regions(&self, power: &str) -> Vec<RegionName> {
        self.units
            .iter()
            .filter(|u| u.power == power)
            .map(|u| u.region.clone())
            .collect()
    }

    fn owned_supply_centers(&self, power: &str) -> Vec<ProvinceName> {
        self.provinces
            .iter()
            .filter(|p| p.supply_center && p.owner.as_deref() == Some(power))
            .map(|p| p.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BoardBuilder;

    #[test]
    fn test_queries() {
        let board = BoardBuilder::new()
            .power("ENG")
            .power("FRA")
            .supply_center("LON", Some("ENG"))
            .supply_center("PAR", Some("FRA"))
            .province("PIC")
            .adjacent("LON", "PIC")
            .adjacent("PIC", "PAR")
            .unit("ENG", "LON")
            .unit("FRA", "PAR")
            .build();

        assert_eq!(board.powers(), vec!["ENG", "FRA"]);
        assert_eq!(board.provinces(), vec!["LON", "PAR", "PIC"]);
        assert!(board.is_supply_center("LON"));
        assert!(!board.is_supply_center("PIC"));
        assert_eq!(board.controller("PAR").as_deref(), Some("FRA"));
        assert!(board.controller("PIC").is_none());
        assert_eq!(board.controlled_regions("ENG"), vec!["LON"]);
        assert_eq!(board.owned_supply_centers("FRA"), vec!["PAR"]);
        assert_eq!(board.adjacent_regions("PIC"), vec!["LON", "PAR"]);
        assert_eq!(board.province_of("PIC").as_deref(), Some("PIC"));
        assert_eq!(board.regions_of("LON"), vec!["LON"]);
    }

    #[test]
    fn test_json_round_trip() {
        let board = BoardBuilder::new()
            .power("ENG")
            .supply_center("LON", Some("ENG"))
            .unit("ENG", "LON")
            .build();

        let json = serde_json::to_string(&board).unwrap();
        let parsed = MapBoard::from_json(&json).unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn test_validate_rejects_unknown_unit_region() {
        let json = r#"{
            "powers": ["ENG"],
            "provinces": [{"name": "LON", "supply_center": true}],
            "regions": [{"name": "LON", "province": "LON"}],
            "units": [{"power": "ENG", "region": "WAL"}]
        }"#;

        assert_eq!(
            MapBoard::from_json(json),
            Err(BoardError::UnknownRegion("WAL".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_bad_json() {
        assert!(matches!(
            MapBoard::from_json("{ not json"),
            Err(BoardError::Parse(_))
        ));
    }
}
