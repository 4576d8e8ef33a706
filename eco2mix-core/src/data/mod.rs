//! Data ingestion: decoding, the two source normalizers, ground truth, and
//! frame helpers.

pub mod actuals;
pub mod canonicalize;
pub mod encoding;
pub mod frame;
pub mod remote;
pub mod timestamps;
pub mod upload;

pub use actuals::{parse_actuals, read_actuals, ActualsLayout};
pub use canonicalize::canonicalize;
pub use encoding::SourceEncoding;
pub use frame::Window;
pub use remote::{
    fetch_and_normalize, normalize_remote, OdreClient, RemoteRecord, RemoteSource,
    DEFAULT_ENDPOINT,
};
pub use upload::normalize_upload;
