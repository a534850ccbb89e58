//! kubeheal Manifest
//!
//! The boundary between descriptor text and the engine's structural edits.
//!
//! # Core Operations
//!
//! - **Parse**: descriptor text → [`Descriptor`] (fails fast on invalid YAML)
//! - **Heal**: [`Descriptor`] → healed [`Descriptor`] + modifications
//! - **Serialize**: [`Descriptor`] → descriptor text
//!
//! ```text
//! text → Descriptor::parse → heal_* (private clone) → Descriptor::to_yaml → text
//! ```

#![warn(unreachable_pub)]

pub mod descriptor;
pub mod error;
pub mod healer;
pub mod quantity;

pub use descriptor::{Descriptor, CONTAINERS_PATH, FIRST_CONTAINER_RESOURCES_PATH};
pub use error::{HealError, ManifestError, ManifestResult, ParseError, SerializeError};
pub use healer::{
    heal, heal_crash_loop, heal_identity, heal_image_pull, heal_oom, heal_pending,
    heal_probe_failure, strategy_fn, HealFn, HealOptions, HealOutcome,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
