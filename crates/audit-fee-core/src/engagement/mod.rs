pub mod history;
pub mod profile;

pub use history::{
    FinancialData, FinancialField, ServiceKey, ServiceLine, Services, YearRecord, YearlyHistory,
    DEFAULT_YEAR_COUNT,
};
pub use profile::{ClientProfile, ClientType};
