//! View plans: the JSON description of which views a story needs.
//!
//! Generators list a view's components either as plain names or as objects
//! keyed by `"component"`. Both shapes are accepted and resolved into plain
//! names while deserializing.

use serde::{Deserialize, Deserializer};

/// The views planned for one story.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewPlan {
    story_id: String,
    views: Vec<ViewLayout>,
    #[serde(default)]
    reasoning: Option<String>,
}

impl ViewPlan {
    pub fn story_id(&self) -> &str {
        &self.story_id
    }

    pub fn views(&self) -> &[ViewLayout] {
        &self.views
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }
}

/// One planned view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewLayout {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "component_names")]
    components: Vec<String>,
}

impl ViewLayout {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the view type, such as `"page"` or `"modal"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

/// A component list entry in either accepted shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ComponentEntry {
    Name(String),
    Keyed { component: Option<String> },
}

impl ComponentEntry {
    fn into_name(self) -> Option<String> {
        match self {
            ComponentEntry::Name(name) => Some(name),
            ComponentEntry::Keyed { component } => component,
        }
    }
}

fn component_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<ComponentEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(ComponentEntry::into_name)
        .collect())
}
