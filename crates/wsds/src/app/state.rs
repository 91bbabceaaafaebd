/// Which connections the association modal offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalMode {
    /// Direct OpenSearch connections; children follow on commit.
    OpenSearch,
    /// Direct-query connections only.
    DirectQuery,
}

impl ModalMode {
    pub fn title(&self) -> &'static str {
        match self {
            ModalMode::OpenSearch => " Associate OpenSearch data sources ",
            ModalMode::DirectQuery => " Associate direct query data sources ",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModalMode::OpenSearch => {
                "Add data sources that will be available in the workspace. If a selected data source has related Direct Query data sources, they will also be available in the workspace."
            }
            ModalMode::DirectQuery => {
                "Add direct query data sources that will be available in the workspace."
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoadStatus::Idle => "IDLE",
            LoadStatus::Loading => "LOADING",
            LoadStatus::Ready => "READY",
            LoadStatus::Failed => "FAILED",
        }
    }
}

/// Interaction points addressable by automation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelTrigger {
    /// Header "Associate data sources" button.
    Assign,
    /// Assign button inside the empty prompt.
    EmptyPromptAssign,
    /// Direct-query assign button inside the empty prompt.
    EmptyPromptDirectQueryAssign,
    /// Removal checkbox of one assigned row.
    RowCheckbox(String),
    /// Commit the modal selection.
    Associate,
    /// Remove the marked rows.
    RemoveSelected,
    /// Close the modal without committing.
    Close,
}

const ROW_CHECKBOX_PREFIX: &str = "checkboxSelectRow-";

impl PanelTrigger {
    pub fn test_id(&self) -> String {
        match self {
            PanelTrigger::Assign => "workspace-creator-dataSources-assign-button".to_string(),
            PanelTrigger::EmptyPromptAssign => {
                "workspace-creator-emptyPrompt-dataSources-assign-button".to_string()
            }
            PanelTrigger::EmptyPromptDirectQueryAssign => {
                "workspace-creator-emptyPrompt-dqc-assign-button".to_string()
            }
            PanelTrigger::RowCheckbox(id) => format!("{}{}", ROW_CHECKBOX_PREFIX, id),
            PanelTrigger::Associate => "workspace-creator-dataSources-associate-button".to_string(),
            PanelTrigger::RemoveSelected => {
                "workspace-creator-dataSources-remove-selected-button".to_string()
            }
            PanelTrigger::Close => "workspace-creator-dataSources-close-button".to_string(),
        }
    }

    pub fn from_test_id(test_id: &str) -> Option<Self> {
        if let Some(id) = test_id.strip_prefix(ROW_CHECKBOX_PREFIX) {
            return Some(PanelTrigger::RowCheckbox(id.to_string()));
        }
        [
            PanelTrigger::Assign,
            PanelTrigger::EmptyPromptAssign,
            PanelTrigger::EmptyPromptDirectQueryAssign,
            PanelTrigger::Associate,
            PanelTrigger::RemoveSelected,
            PanelTrigger::Close,
        ]
        .into_iter()
        .find(|t| t.test_id() == test_id)
    }

    /// Button caption for action triggers.
    pub fn label(&self) -> &'static str {
        match self {
            PanelTrigger::Assign | PanelTrigger::EmptyPromptAssign => "Associate OpenSearch data sources",
            PanelTrigger::EmptyPromptDirectQueryAssign => "Associate direct query data sources",
            PanelTrigger::RowCheckbox(_) => "Select row",
            PanelTrigger::Associate => "Associate data sources",
            PanelTrigger::RemoveSelected => "Remove selected",
            PanelTrigger::Close => "Close",
        }
    }
}
