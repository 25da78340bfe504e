pub mod ids;
pub mod params;
pub mod positions;
pub mod task;
pub mod validation;

pub use ids::TaskId;
pub use params::{Field, TaskParams};
pub use positions::{Placement, PositionShift};
pub use task::{NewTask, Task, TaskPatch, TaskStatus};
pub use validation::ValidationErrors;
