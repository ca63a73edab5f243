pub mod banner;
pub mod report;
