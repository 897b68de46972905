pub mod block;
pub mod icon_button;

// Re-export component symbols so callers can `use crate::components::ui::BlockCard` etc.
pub use block::*;
pub use icon_button::*;
