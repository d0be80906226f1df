//! External capability adapters
//!
//! Every noisy or remote stage of the pipeline sits behind a narrow trait:
//! OCR, translation, entity-recognition model, document classification.
//! Production implementations are HTTP clients; offline implementations and
//! test fakes satisfy the same contracts, so the engine code is identical in
//! both paths.

pub mod classifier;
pub mod ner;
pub mod ocr;
pub mod translator;

pub use classifier::{DocumentClassifier, HttpClassifierClient, KeywordClassifier};
pub use ner::{HttpNerClient, NerModel, NoopNerModel};
pub use ocr::{HttpOcrClient, TextExtractor};
pub use translator::{CachingTranslator, HttpTranslatorClient, PassthroughTranslator, Translator};
