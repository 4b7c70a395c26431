pub mod evaluate;
pub mod util;
