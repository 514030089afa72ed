mod context;
mod settler;

pub use context::SettleEvent;
pub use settler::Settler;
