// Transflow Infrastructure - Remote Adapters
// Implements: TranslationProvider, TransformStage, SecondaryTranslationStage, LogSink

mod log_sink;
mod secondary;
mod transform;
mod translator;

pub use log_sink::{HttpLogSink, TracingLogSink};
pub use secondary::RpcSecondaryTranslator;
pub use transform::{decode_envelope, encode_envelope, XmlTransformClient};
pub use translator::AzureTranslator;
