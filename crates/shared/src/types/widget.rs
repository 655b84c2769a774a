//! Widget identity: the embedding context that owns sessions and credentials.

use serde::{Deserialize, Serialize};

/// Composite key identifying one embedded widget.
///
/// A site can host several copies of the widget, so the instance id alone is
/// not enough; the component id tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetIdentity {
    /// Site-level instance id issued by the hosting platform.
    pub instance_id: String,
    /// Component id of this widget on the page.
    pub component_id: String,
}

impl WidgetIdentity {
    /// Creates a widget identity.
    #[must_use]
    pub fn new(instance_id: impl Into<String>, component_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            component_id: component_id.into(),
        }
    }
}

impl std::fmt::Display for WidgetIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.instance_id, self.component_id)
    }
}
