pub mod backends;
pub mod codec;
pub mod error;
pub mod models;
pub mod poller;
pub mod region;
pub mod render;
pub mod session;
pub mod traits;

pub use backends::HttpSearchBackend;
pub use codec::{decode_payload, encode_payload};
pub use error::{PollError, PollStage};
pub use models::{
    submitted_query, DecodedResult, Endpoints, PollConfig, RawSearchResult, ResultStatus,
    SearchOutcome, NOT_DONE_STATUS,
};
pub use poller::{SearchPoller, SearchTask};
pub use region::MemoryRegion;
pub use render::StatusMessage;
pub use session::SearchSession;
pub use traits::{ContentRegion, SearchBackend};
