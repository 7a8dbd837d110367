// bmclink-api: async HTTP transport and vendor detection for BMC endpoints

pub mod descriptor;
pub mod detect;
pub mod error;
pub mod transport;
pub mod vendor;

pub use descriptor::{ConnectionDescriptor, RetryPolicy, TlsMode};
pub use detect::{detect_vendor, identify_vendor, DetectorConfig, Identification, VendorDetector};
pub use error::{ConnectionKind, Error};
pub use transport::{RequestOptions, Response, Transport, TransportConfig};
pub use vendor::{match_alias, normalize_vendor, VendorKey};

// Re-exported so adapters can name methods and headers without a direct
// reqwest dependency.
pub use reqwest::header;
pub use reqwest::Method;
