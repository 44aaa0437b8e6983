#[cfg(test)]
pub mod fake;
pub mod geometry;
pub mod host;
