// HireFlow Infrastructure - Local System Adapters
// Implements: TextExtractor, UploadStore

pub mod pdf_extractor;
pub mod upload_store;

pub use pdf_extractor::PdfTextExtractor;
pub use upload_store::LocalUploadStore;
