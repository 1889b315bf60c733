pub mod calculators;
pub mod directory;
pub mod fees;
pub mod growth;
pub mod wizard;
