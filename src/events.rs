//! Catalogue of known gravitational-wave events and the browser that plots
//! a toy sinusoid for the selected one.

use crate::error::Result;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::path::Path;

const BUNDLED_CATALOG: &str = include_str!("../assets/events.json");

const PLOT_SAMPLES: usize = 400;
const PLOT_CYCLES: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub date: String,
    #[serde(rename = "freq", alias = "frequency")]
    pub frequency: f64,
    pub amplitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, alias = "desc")]
    pub description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<EventRecord>),
    Wrapped { events: Vec<EventRecord> },
}

/// Read-only list of events, loaded once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    events: Vec<EventRecord>,
}

impl EventCatalog {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    /// Accepts a top-level array, or an object with an `events` array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let events = match serde_json::from_str(json)? {
            CatalogDocument::List(events) => events,
            CatalogDocument::Wrapped { events } => events,
        };
        Ok(Self { events })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The catalogue compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    pub fn get(&self, id: &str) -> Option<&EventRecord> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventPlot {
    pub event_id: String,
    pub times: Vec<f64>,
    pub strain: Vec<f64>,
}

impl EventPlot {
    /// `amplitude · sin(2π · freq · t)` over a fixed number of cycles.
    pub fn for_event(event: &EventRecord) -> Self {
        let span = if event.frequency > 0.0 {
            PLOT_CYCLES / event.frequency
        } else {
            1.0
        };
        let step = span / PLOT_SAMPLES as f64;
        let times: Vec<f64> = (0..PLOT_SAMPLES).map(|k| k as f64 * step).collect();
        let strain = times
            .iter()
            .map(|&t| event.amplitude * (TAU * event.frequency * t).sin())
            .collect();

        Self {
            event_id: event.id.clone(),
            times,
            strain,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct EventBrowser {
    catalog: EventCatalog,
    selected: Option<String>,
    plot: Option<EventPlot>,
}

impl EventBrowser {
    pub fn new(catalog: EventCatalog) -> Self {
        Self {
            catalog,
            selected: None,
            plot: None,
        }
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn selected(&self) -> Option<&EventRecord> {
        self.selected.as_deref().and_then(|id| self.catalog.get(id))
    }

    pub fn plot(&self) -> Option<&EventPlot> {
        self.plot.as_ref()
    }

    /// Shows `id` if the catalogue has it. Unknown ids change nothing.
    pub fn select(&mut self, id: &str) -> bool {
        let Some(event) = self.catalog.get(id) else {
            tracing::debug!(id, "ignoring selection of unknown event");
            return false;
        };
        self.plot = Some(EventPlot::for_event(event));
        self.selected = Some(event.id.clone());
        true
    }
}
