//! Label format implementations.

pub mod yolo;

#[cfg(test)]
mod tests;
