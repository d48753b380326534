//! Paper cache: the paginated search session plus the library, notes, and
//! graph collections fetched alongside it.

mod cache;
mod session;

pub use cache::{LoadMoreOutcome, PaperCacheStore, SearchOutcome, StoreSnapshot};
pub use session::SearchSession;
