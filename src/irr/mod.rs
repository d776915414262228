//! IRR solving and result records

mod result;
mod solver;

pub use result::{IrrResult, IrrStatus, RateRecord};
pub use solver::{npv, solve, Solution};
