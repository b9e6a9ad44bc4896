pub mod parameter;
pub mod wander;

pub use parameter::{trigger, NumericParameter, Parameter, Trigger};
pub use wander::WanderingParameter;
