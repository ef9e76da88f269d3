pub mod preprocess;
pub mod recognizer;
pub mod vision;

pub use preprocess::{prepare_for_recognition, PreprocessError};
pub use recognizer::{MockRecognizer, RecognizeError, RecognizedText, TextRecognizer};
pub use vision::GoogleVisionRecognizer;
