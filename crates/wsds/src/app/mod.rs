#[allow(clippy::module_inception)]
mod app;
mod loading;
mod panel;
mod state;

pub use app::App;
pub use loading::{spawn_catalog_load, CatalogEvent};
pub use panel::DataSourcePanel;
pub use state::{LoadStatus, ModalMode, PanelTrigger};
