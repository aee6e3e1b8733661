//! Paginated collection of Compute Engine inventory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Pager<S, T>                        │
//! │  - one batch per page, warning scopes skipped        │
//! │  - has_more_pages() / drain()                        │
//! └──────────────────────────┬───────────────────────────┘
//!                            │
//!                     ┌──────▼──────┐
//!                     │ PageSource  │ (trait)
//!                     └──────┬──────┘
//!                ┌───────────┴───────────┐
//!         ┌──────▼──────┐         ┌──────▼──────┐
//!         │  GceClient  │         │  MockPages  │
//!         │  (HTTPS)    │         │  (Testing)  │
//!         └─────────────┘         └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use gcegraph_core::collector::{MockPages, Pager, ResourceKind};
//! use gcegraph_core::collector::resources::Instance;
//!
//! let pages = MockPages::two_region_project();
//! let mut pager: Pager<_, Instance> = Pager::new(&pages, ResourceKind::Instances, "demo");
//! let instances = pager.drain().unwrap();
//! assert_eq!(instances.len(), 2);
//! ```

#[cfg(feature = "gce")]
mod gce;
pub mod mock;
mod pager;
pub mod resources;
pub mod traits;

#[cfg(feature = "gce")]
pub use gce::GceClient;
pub use mock::MockPages;
pub use pager::Pager;
pub use traits::{AggregatedPage, CollectError, PageSource, ResourceKind, ScopedList};
