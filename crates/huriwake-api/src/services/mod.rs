//! Business logic services.

pub mod filing;
pub mod review;
pub mod youtube;

pub use filing::ScreenshotFiler;
pub use review::ReviewService;
pub use youtube::{YouTubeClient, YouTubeConfig};
