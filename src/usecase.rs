mod input;

pub use input::forward_lines;
