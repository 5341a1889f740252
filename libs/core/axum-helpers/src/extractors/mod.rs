//! Extractors whose rejections use the crate's JSON error bodies.

pub mod cancellation;
pub mod id_path;
pub mod json_body;

pub use cancellation::RequestCancellation;
pub use id_path::IdPath;
pub use json_body::JsonBody;
