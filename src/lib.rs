//! Interactive 2D water surface: a 1D mass-spring chain drives the vertical
//! displacement of the top edge of a plane mesh. Impulses come from
//! "effect points" that enter a strip around the water line; they spread to
//! chain neighbors with wall reflection at the ends, then damped springs
//! pull the surface back to rest over an ambient turbulence ripple.

pub mod config;
pub mod water;
