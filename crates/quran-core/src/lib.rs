pub mod annotations;
pub mod auxiliary;
pub mod backup;
pub mod corpus;
pub mod error;
pub mod navigation;
pub mod position;
pub mod preferences;
pub mod recitation;
pub mod reference;
pub mod search;
pub mod state;
pub mod store;

pub use corpus::{load_corpus, Corpus};
pub use error::{CoreError, Result};
pub use position::Position;
pub use search::{search, SearchMode, SearchResult};
pub use state::{Reader, ReadingState};
pub use store::{FileStore, KeyValueStore, MemoryStore};
