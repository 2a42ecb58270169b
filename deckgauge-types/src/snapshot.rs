//! Snapshot - one decoded batch of measurements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Measurement;

/// All measurements carried by one inbound payload, in producer order.
///
/// Consumers look measurements up by type name. When the producer repeats a
/// name within one snapshot, the first occurrence wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<Measurement>);

impl Snapshot {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self(measurements)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.0.iter()
    }

    /// First measurement of the named type, if any.
    pub fn find(&self, name: &str) -> Option<&Measurement> {
        self.0.iter().find(|m| m.name() == name)
    }

    /// Index of the snapshot by type name, keeping the first occurrence of
    /// each name.
    pub fn index_by_name(&self) -> HashMap<&str, &Measurement> {
        let mut index = HashMap::with_capacity(self.0.len());
        for measurement in &self.0 {
            index.entry(measurement.name()).or_insert(measurement);
        }
        index
    }
}

impl From<Vec<Measurement>> for Snapshot {
    fn from(measurements: Vec<Measurement>) -> Self {
        Self(measurements)
    }
}

impl FromIterator<Measurement> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Snapshot {
    type Item = Measurement;
    type IntoIter = std::vec::IntoIter<Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeasurementType;

    fn reading(name: &str, value: f64) -> Measurement {
        Measurement::new(MeasurementType::new(name, "%", 0.0, 100.0), value)
    }

    #[test]
    fn find_returns_first_match() {
        let snapshot = Snapshot::new(vec![
            reading("CPU usage", 10.0),
            reading("GPU usage", 20.0),
            reading("CPU usage", 30.0),
        ]);

        assert_eq!(snapshot.find("CPU usage").unwrap().value, 10.0);
        assert!(snapshot.find("Fan speed").is_none());
    }

    #[test]
    fn index_keeps_first_occurrence() {
        let snapshot: Snapshot = vec![reading("Power", 1.0), reading("Power", 2.0)].into();
        let index = snapshot.index_by_name();

        assert_eq!(index.len(), 1);
        assert_eq!(index["Power"].value, 1.0);
    }

    #[test]
    fn deserialize_bare_array() {
        let json = r#"[
            {"Type":{"Name":"GPU usage","Unit":"%","Min":0,"Max":100},"Value":55},
            {"Type":{"Name":"GPU temperature","Unit":"C","Min":0,"Max":100},"Value":61}
        ]"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.iter().next().unwrap().name(), "GPU usage");
    }

    #[test]
    fn empty_array_is_empty_snapshot() {
        let snapshot: Snapshot = serde_json::from_str("[]").unwrap();
        assert!(snapshot.is_empty());
    }
}
