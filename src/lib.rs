pub mod aggregate;
pub mod coerce;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod portal;
pub mod report;
pub mod run;
pub mod table;
