mod directive;
mod equality;

pub use directive::*;
pub use equality::*;
