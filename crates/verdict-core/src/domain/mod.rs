//! 도메인 모델.

pub mod batch;
pub mod candidate;
pub mod indicator;
pub mod market;
pub mod quality;
pub mod result;
pub mod signal;

pub use batch::*;
pub use candidate::*;
pub use indicator::*;
pub use market::*;
pub use quality::*;
pub use result::*;
pub use signal::*;
