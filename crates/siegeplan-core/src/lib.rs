// Core data model and state for siegeplan: stats normalization, the team
// roster, scenario selection, and generated strategies.

pub mod plan;
pub mod scenario;
pub mod stats;
pub mod strategy;
pub mod team;
