use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{resource::ResourceClass, stage::Stage};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TraceEvent {
    TaskAdmitted {
        time: f64,
        task_id: usize,
        job: String,
        summary: String,
    },
    StageStarted {
        time: f64,
        task_id: usize,
        stage: Stage,
        resource: ResourceClass,
    },
    TaskCompleted {
        time: f64,
        task_id: usize,
        time_left: f64,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }
}
