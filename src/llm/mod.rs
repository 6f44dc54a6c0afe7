pub mod gemini;

use thiserror::Error;

use crate::media::EncodedImage;

#[derive(Debug, Clone, Error)]
#[error("Image generation failed: {0}")]
pub struct GenerationFailed(pub String);

#[derive(Debug, Clone, Error)]
#[error("Image edit failed: {0}")]
pub struct EditFailed(pub String);

/// The provider boundary: brief + image in, image out. Single-shot, stateless
/// across calls; retries are a user action at the lifecycle controller, never
/// an adapter concern. Provider failures of any shape (transport, timeout,
/// policy rejection, imageless response) collapse into one error kind per
/// operation, because the provider does not reliably signal which occurred.
#[allow(async_fn_in_trait)]
pub trait ImageModel {
    async fn generate(
        &self,
        brief: &str,
        source: &EncodedImage,
    ) -> Result<EncodedImage, GenerationFailed>;

    async fn edit(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage, EditFailed>;
}

pub use gemini::GeminiImageClient;
