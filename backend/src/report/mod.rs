pub mod presenter;

pub use presenter::{DeepfakeReport, ResultPresenter};
