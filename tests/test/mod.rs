pub mod fakes;
pub mod fixtures;
pub mod prelude;
