mod llrb;

pub use llrb::LlrbMap;
