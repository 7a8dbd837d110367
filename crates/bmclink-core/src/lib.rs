//! Vendor-neutral BMC client built on `bmclink-api`.
//!
//! - **[`Client`]**: binds one connection to one vendor [`Adapter`].
//!   [`ClientBuilder::build`] detects the vendor (unless given), resolves
//!   the adapter from an [`AdapterRegistry`] and forwards every domain
//!   operation to it. Operations the adapter does not offer fail with
//!   [`CoreError::NotImplemented`].
//!
//! - **Adapter contract** ([`adapter`]): one trait per capability
//!   category ([`PowerOps`], [`SystemOps`], [`StorageOps`], ...). An
//!   adapter declares a category by returning it from the matching
//!   accessor; [`Client::supported_features`] reads those declarations.
//!
//! - **[`AdapterRegistry`]**: process-wide vendor key to factory map,
//!   populated at start-up, with an optional [`AdapterLoader`] hook.
//!
//! - **Facades** ([`SystemInfo`], [`PowerInfo`], [`BmcInfo`],
//!   [`ThermalInfo`], [`PciInfo`]): memoizing views that reconcile vendor
//!   field names into one key set.
//!
//! - **[`Controller`] / [`Volume`]**: normalized storage values that carry
//!   the raw adapter payload.

pub mod adapter;
pub mod client;
pub mod error;
pub mod facade;
pub mod fields;
pub mod model;
pub mod registry;
pub mod storage;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::{
    Adapter, BootOps, JobOps, NetworkOps, PowerOps, StorageOps, SystemOps, UtilityOps,
    VirtualMediaOps,
};
pub use client::{Client, ClientBuilder, ClientInfo};
pub use error::{CoreError, TaskError, VirtualMediaError};
pub use facade::{BmcInfo, PciInfo, PowerInfo, SystemInfo, ThermalInfo};
pub use model::{BmcNetworkSettings, BootMode, BootOverride, BootPersistence, Capability, Record};
pub use registry::{AdapterFactory, AdapterLoader, AdapterRegistry};
pub use storage::{Controller, Volume};

// Adapters need these to talk to the BMC.
pub use bmclink_api::{
    detect_vendor, ConnectionDescriptor, DetectorConfig, RetryPolicy, TlsMode, Transport,
    TransportConfig, VendorKey,
};
