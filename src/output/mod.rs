mod style;

pub use style::{configure, error, highlight, ok, warn};
