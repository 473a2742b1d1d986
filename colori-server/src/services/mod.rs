//! External collaborators and request preprocessing
//!
//! Every remote service sits behind a trait so handlers can be exercised
//! against fakes.

pub mod gemini_client;
pub mod identity;
pub mod image_generator;
pub mod prompt;
pub mod selfie;
pub mod uploader;

#[cfg(test)]
pub(crate) mod test_upstream;

pub use gemini_client::{AnalyzerError, ColorAnalyzer, GeminiClient};
pub use identity::{ClerkClient, IdentityError, IdentityProvider, IdentityUser};
pub use image_generator::{
    GeneratedImage, ImageGenError, OpenAiImageGenerator, OutfitImageGenerator,
    PlaceholderImageGenerator,
};
pub use selfie::{SelfieError, SelfieImage};
pub use uploader::{CloudinaryUploader, ImageUploader, PassthroughUploader, UploadError};
