pub mod service;

#[cfg(test)]
pub mod fakes;

pub use service::FaceSuite;
