//! Plate maps: which component sits in which well, at one transfer volume.
//!
//! Maps are built from a mix's recipe lines. Buffer lines, tube lines and
//! components without a plate are skipped; a component with a plate but no
//! well is skipped with a debug log.

use std::collections::BTreeMap;

use crate::error::{MixError, Result};
use crate::mixline::MixLine;
use crate::quantity::Volume;
use crate::well::{PlateType, WellPos};

/// Well assignments on one plate, all transferred at the same volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateMap {
    plate_name: String,
    plate_type: PlateType,
    wells: BTreeMap<WellPos, String>,
    volume_each: Volume,
}

impl PlateMap {
    /// Create an empty map.
    pub fn new(plate_name: impl Into<String>, plate_type: PlateType, volume_each: Volume) -> Self {
        Self {
            plate_name: plate_name.into(),
            plate_type,
            wells: BTreeMap::new(),
            volume_each,
        }
    }

    /// Put `name` in `well`.
    ///
    /// Re-assigning the same name is a no-op. A different name in an occupied
    /// well is [`MixError::DuplicateWell`]; a well off the plate is
    /// [`MixError::WellOutOfRange`].
    pub fn assign(&mut self, well: WellPos, name: impl Into<String>) -> Result<()> {
        if !self.plate_type.contains(well) {
            return Err(MixError::WellOutOfRange {
                well,
                rows: self.plate_type.rows(),
                cols: self.plate_type.cols(),
            });
        }
        let name = name.into();
        match self.wells.get(&well) {
            Some(existing) if *existing != name => Err(MixError::DuplicateWell {
                plate: self.plate_name.clone(),
                well,
                existing: existing.clone(),
                incoming: name,
            }),
            Some(_) => Ok(()),
            None => {
                self.wells.insert(well, name);
                Ok(())
            }
        }
    }

    /// Plate name.
    pub fn plate_name(&self) -> &str {
        &self.plate_name
    }

    /// Plate geometry.
    pub fn plate_type(&self) -> PlateType {
        self.plate_type
    }

    /// Volume transferred from every well.
    pub fn volume_each(&self) -> Volume {
        self.volume_each
    }

    /// Component in `well`, if any.
    pub fn get(&self, well: WellPos) -> Option<&str> {
        self.wells.get(&well).map(String::as_str)
    }

    /// Assigned wells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (WellPos, &str)> {
        self.wells.iter().map(|(w, n)| (*w, n.as_str()))
    }

    /// Number of assigned wells.
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    /// Returns `true` if no well is assigned.
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Full plate as rows of optional names.
    pub fn grid(&self) -> Vec<Vec<Option<&str>>> {
        (0..self.plate_type.rows())
            .map(|row| {
                (0..self.plate_type.cols())
                    .map(|col| self.get(WellPos::new(row, col)))
                    .collect()
            })
            .collect()
    }
}

/// Build plate maps from recipe lines.
///
/// With `combine`, lines sharing a plate and per-component volume land on one
/// map (in first-seen order); otherwise each line gets its own map.
pub(crate) fn from_lines(lines: &[MixLine], plate_type: PlateType, combine: bool) -> Result<Vec<PlateMap>> {
    let mut maps: Vec<PlateMap> = Vec::new();

    for line in lines {
        if line.is_buffer || line.is_tube() || line.plate.is_empty() {
            continue;
        }
        if line.names.iter().any(|n| n.eq_ignore_ascii_case("buffer")) {
            continue;
        }

        let existing = if combine {
            maps.iter()
                .position(|m| m.plate_name == line.plate && m.volume_each == line.each_volume)
        } else {
            None
        };
        let index = match existing {
            Some(i) => i,
            None => {
                maps.push(PlateMap::new(&line.plate, plate_type, line.each_volume));
                maps.len() - 1
            }
        };

        for (name, well) in line.names.iter().zip(&line.wells) {
            match well {
                Some(well) => maps[index].assign(*well, name)?,
                None => tracing::debug!("plate map: {name} on plate {} has no well", line.plate),
            }
        }
    }

    maps.retain(|m| !m.is_empty());
    Ok(maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Concentration;

    fn line(name: &str, plate: &str, well: Option<&str>, ul: i64) -> MixLine {
        MixLine::new(
            name,
            Concentration::nanomolar(100),
            Concentration::nanomolar(10),
            Volume::microliters(ul),
            plate,
            well.map(|w| w.parse().unwrap()),
        )
    }

    #[test]
    fn combines_by_plate_and_volume() {
        let lines = vec![
            line("a", "P1", Some("A1"), 2),
            line("b", "P1", Some("B1"), 2),
            line("c", "P1", Some("C1"), 3),
            line("d", "P2", Some("A1"), 2),
            line("t", "tube", None, 2),
            MixLine::buffer("Buffer", Volume::microliters(5)),
        ];
        let maps = from_lines(&lines, PlateType::Wells96, true).unwrap();
        assert_eq!(maps.len(), 3);
        assert_eq!(maps[0].len(), 2);
        assert_eq!(maps[0].get("B1".parse().unwrap()), Some("b"));
        assert_eq!(maps[1].volume_each(), Volume::microliters(3));
        assert_eq!(maps[2].plate_name(), "P2");

        let separate = from_lines(&lines, PlateType::Wells96, false).unwrap();
        assert_eq!(separate.len(), 4);
    }

    #[test]
    fn duplicate_well_with_different_names_fails() {
        let lines = vec![line("a", "P1", Some("A1"), 2), line("b", "P1", Some("A1"), 2)];
        let err = from_lines(&lines, PlateType::Wells96, true).unwrap_err();
        assert!(matches!(err, MixError::DuplicateWell { ref existing, .. } if existing == "a"));

        let same = vec![line("a", "P1", Some("A1"), 2), line("a", "P1", Some("A1"), 2)];
        assert_eq!(from_lines(&same, PlateType::Wells96, true).unwrap()[0].len(), 1);
    }

    #[test]
    fn well_off_the_plate() {
        let lines = vec![line("a", "P1", Some("M1"), 2)];
        assert!(matches!(
            from_lines(&lines, PlateType::Wells96, true),
            Err(MixError::WellOutOfRange { rows: 8, cols: 12, .. })
        ));
        assert_eq!(from_lines(&lines, PlateType::Wells384, true).unwrap().len(), 1);
    }

    #[test]
    fn grid_has_plate_shape() {
        let mut map = PlateMap::new("P", PlateType::Wells96, Volume::microliters(1));
        map.assign("H12".parse().unwrap(), "x").unwrap();
        let grid = map.grid();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid[7].len(), 12);
        assert_eq!(grid[7][11], Some("x"));
        assert_eq!(grid[0][0], None);
    }

    #[test]
    fn unplated_and_wellless_lines_are_skipped() {
        let lines = vec![line("a", "", None, 2), line("b", "P1", None, 2)];
        assert!(from_lines(&lines, PlateType::Wells96, true).unwrap().is_empty());
    }
}
