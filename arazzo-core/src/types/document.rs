use std::path::PathBuf;

use crate::types::{Components, Extensions, Info, SourceDescription, Step, Workflow};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArazzoDocument {
    /// The Arazzo Specification version (e.g. "1.0.1").
    pub arazzo: String,

    pub info: Info,

    #[serde(rename = "sourceDescriptions")]
    pub source_descriptions: Vec<SourceDescription>,

    pub workflows: Vec<Workflow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(flatten)]
    pub extensions: Extensions,

    /// Where the document was loaded from; relative source description urls resolve against it.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ArazzoDocument {
    pub fn workflow(&self, workflow_id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.workflow_id == workflow_id)
    }

    pub fn source_description(&self, name: &str) -> Option<&SourceDescription> {
        self.source_descriptions.iter().find(|s| s.name == name)
    }

    /// Searches every workflow of the document for a step id.
    pub fn find_step(&self, step_id: &str) -> Option<(&Workflow, &Step)> {
        self.workflows.iter().find_map(|w| w.step(step_id).map(|s| (w, s)))
    }
}
