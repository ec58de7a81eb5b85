pub mod check;
pub mod engines;
pub mod run;
