pub mod image_client;
pub mod transport;

pub use image_client::GenerationClient;
pub use transport::{HttpTransport, RawResponse, Transport};
