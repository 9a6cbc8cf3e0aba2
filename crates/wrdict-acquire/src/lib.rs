pub mod collect;
pub mod fetch;
pub mod normalize;
pub mod progress;
pub mod wordlist;
pub mod wordreference;

pub use collect::{collect, lookup_one, CollectOptions, CollectOutcome, CollectSummary};
pub use fetch::{HttpFetcher, PageFetcher};
pub use reqwest::Url;
