pub mod batch_extraction; // cascade engine, organ modules, aggregator
pub mod structuring; // LLM-backed Extractor
