pub mod config;
pub mod display;
pub mod error;
pub mod labs;
pub mod listenbrainz;
pub mod logging;
pub mod matcher;
pub mod musicbrainz;
pub mod normalize;
pub mod pipeline;
pub mod plan;
pub mod rate_limiter;
pub mod search;
pub mod translate;
pub mod translation_cache;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use display::{display_result, Summary};
pub use error::{MapperError, Result};
pub use labs::{search_batch_item, BatchItem, BatchResult, LabsClient, LabsRecording, RecordingSearch};
pub use listenbrainz::{Listen, ListenBrainzClient, ListenScan, ListenService};
pub use matcher::{default_strategies, MatchSelector, MatchSettings, MatchStrategy, Selection};
pub use musicbrainz::MusicBrainzSearch;
pub use pipeline::{MappingOutcome, MappingResult, Pipeline};
pub use plan::{apply_plan, Plan, PlanReport};
pub use rate_limiter::{Clock, RateLimiter, SystemClock};
pub use search::{CandidateMatch, CatalogSearch, SearchQuery};
pub use translate::{CachingTranslator, CommandTranslator, IdentityTranslator, Translator};
pub use translation_cache::TranslationCache;
