// Information-theoretic side analyses: per-text profiles and cross-corpus
// static-model cross-entropy.

pub mod cross_entropy;
pub mod entropy;

pub use cross_entropy::{BatchCrossEntropy, CrossEntropyAnalyzer, CrossEntropyReport};
pub use entropy::{average_word_length, compressor_bits_per_symbol, shannon_entropy, TextProfile};
