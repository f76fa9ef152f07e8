// hitormiss runner library

pub mod report;
pub mod settings;
