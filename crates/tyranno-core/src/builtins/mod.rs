//! Built-in functions
//!
//! - `semver_max`, `semver_min`, `semver_major`, `semver_minor`, `semver_patch`
//!   and the `*_list` forms of the component extractors
//! - `now_utc`, `now_local`, `format_datetime`, `year`, `date`
//! - `spdx_license`, `pypi_data` (network, `http` feature)

use crate::function::FunctionRegistry;

mod time;
mod versions;

#[cfg(feature = "http")]
mod pypi;
#[cfg(feature = "http")]
mod spdx;

/// Register every built-in function
pub(crate) fn register_all(registry: &mut FunctionRegistry) {
    versions::register(registry);
    time::register(registry);

    #[cfg(feature = "http")]
    {
        spdx::register(registry);
        pypi::register(registry);
    }
}
