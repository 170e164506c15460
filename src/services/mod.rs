pub mod excel;
pub mod merge;
pub mod projects;
