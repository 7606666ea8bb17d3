pub mod cost;
pub mod explorer;
