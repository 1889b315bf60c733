pub mod export;
pub mod state;
pub mod store;

pub use export::ExportDocument;
pub use state::{AdditionalData, AppState, ClientInfo, PersonnelAssignment, WizardStep};
pub use store::{StateStore, DEFAULT_STATE_KEY};
