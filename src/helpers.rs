pub mod average;
pub mod periodic;
