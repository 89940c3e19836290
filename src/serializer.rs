//! Dashboard JSON projection of a [`Snapshot`].
//!
//! ```json
//! { "type": "leds",
//!   "rows": [ { "label": "1 Line Northbound", "count": 42, "start": 0,
//!               "descending": false,
//!               "leds": [ { "index": 21, "trainIds": ["40_101"] } ] } ] }
//! ```
//!
//! Only occupied LEDs are listed; everything else is off. Colors are not
//! included, the client derives them from the line of each train id.

use std::sync::Arc;

use serde::Serialize;

use crate::snapshot::Snapshot;
use crate::topology::Topology;

/// One occupied LED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedEntry {
    /// LED index.
    pub index: usize,
    /// Occupying vehicle ids, in insertion order.
    pub train_ids: Vec<String>,
}

/// One physical row and its occupied LEDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowState {
    /// Row label.
    pub label: String,
    /// LEDs in the row.
    pub count: usize,
    /// First LED index.
    pub start: usize,
    /// Index walking direction for the client.
    pub descending: bool,
    /// Occupied LEDs, ascending by index.
    pub leds: Vec<LedEntry>,
}

/// The full dashboard message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedStateMessage {
    /// Always `"leds"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Rows in topology order.
    pub rows: Vec<RowState>,
}

/// Projects snapshots onto the topology's rows.
#[derive(Debug, Clone)]
pub struct LedStateSerializer {
    topology: Arc<Topology>,
}

impl LedStateSerializer {
    /// Creates a serializer for `topology`.
    pub fn new(topology: Arc<Topology>) -> Self {
        Self { topology }
    }

    /// Build the message for a snapshot.
    pub fn message(&self, snapshot: &Snapshot) -> LedStateMessage {
        let rows = self
            .topology
            .rows()
            .iter()
            .map(|row| RowState {
                label: row.label.clone(),
                count: row.count,
                start: row.start,
                descending: row.descending,
                leds: row
                    .indices()
                    .filter_map(|index| {
                        let occupants = snapshot.aggregator.vehicles_at(index);
                        if occupants.is_empty() {
                            return None;
                        }
                        Some(LedEntry {
                            index,
                            train_ids: occupants
                                .iter()
                                .map(|o| o.vehicle_id.clone())
                                .collect(),
                        })
                    })
                    .collect(),
            })
            .collect();

        LedStateMessage { kind: "leds", rows }
    }

    /// Serialize a snapshot to the dashboard JSON string.
    pub fn to_json(&self, snapshot: &Snapshot) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.message(snapshot))
    }
}
