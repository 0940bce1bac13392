pub mod case_types;
pub mod courts;
pub mod districts;
pub mod history;
pub mod search;
pub mod states;
