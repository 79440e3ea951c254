//! Client for the hosted object-detection service.
//!
//! Screenshots are sent to a Roboflow hosted model and the number of
//! returned predictions is the subject count used for classification.

pub mod client;
pub mod error;
pub mod types;

pub use client::{Detector, DetectorConfig, RoboflowClient};
pub use error::{DetectError, DetectResult};
pub use types::{DetectionResponse, Prediction};
