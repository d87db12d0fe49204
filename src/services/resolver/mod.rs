pub mod coordinate_resolver;
pub mod grid;
pub mod plan;

pub use coordinate_resolver::{CoordinateResolver, Resolution, GRID_OPEN_KEY};
pub use grid::grid_layout;
pub use plan::{default_plan, default_required_keys, PlanEntry, ResolutionPlan, Source};
