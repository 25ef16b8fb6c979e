#![forbid(unsafe_code)]

mod error;
pub mod handle;
pub mod key;
pub mod manager;
pub mod pipeline;
pub mod request;
pub mod service;
pub mod status;
pub mod task;

pub use config::{ABSOLUTE_MAX_SLOTS, DEFAULT_MAX_SLOTS, DEFAULT_TTL_SECS};
pub use error::{Error, FetchError, RequestError};
pub use handle::PrefetchHandle;
pub use key::SlotKey;
pub use manager::PrefetchSlotManager;
pub use pipeline::{PrefetchPipeline, StartFailure};
pub use request::{PrefetchParams, PrefetchRequest};
pub use service::PrefetchManager;
pub use status::{PrefetchEvent, PrefetchEventKind, PrefetchStatus, StatusNotifier};
pub use task::{Fetcher, HandleState, TaskHandle, TaskPipeline};
