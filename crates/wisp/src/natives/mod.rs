//! Native function registration (spec §4.8, SPEC_FULL §C.5).
//!
//! Each submodule owns one chapter of the registry and a `register` function;
//! `install` wires them all into a single [`DeclarationsBuilder`] so the
//! crate root only has to call one thing before `build`.

pub mod arithmetic;
pub mod control;
pub mod dicts;
pub mod lists;
pub mod strings;

use crate::declarations::DeclarationsBuilder;

pub fn install(builder: &mut DeclarationsBuilder) {
    arithmetic::register(builder);
    lists::register(builder);
    strings::register(builder);
    dicts::register(builder);
    control::register(builder);
}
