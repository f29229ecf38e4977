//! Wire models for the benchmark API.

mod challenge;
mod forecast;
mod ids;
mod model_detail;
mod ranking;
mod round;
pub mod timestamp;

pub use challenge::*;
pub use forecast::*;
pub use ids::*;
pub use model_detail::*;
pub use ranking::*;
pub use round::*;
