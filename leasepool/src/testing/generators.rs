//! Property test generators.
//!
//! Each generator respects the validation rules of the type it produces.

use proptest::prelude::*;

use crate::handle::Termination;
use crate::types::ResourceLocation;

/// Generates valid `host:port` style `ResourceLocation` values.
pub fn arb_resource_location() -> impl Strategy<Value = ResourceLocation> {
    ("[a-z][a-z0-9-]{0,30}(\\.[a-z][a-z0-9-]{0,20}){0,3}", 1u16..)
        .prop_filter_map("Invalid ResourceLocation", |(host, port)| {
            ResourceLocation::try_new(format!("{host}:{port}")).ok()
        })
}

/// Generates a terminal path.
pub fn arb_termination() -> impl Strategy<Value = Termination> {
    prop_oneof![Just(Termination::Released), Just(Termination::Discarded)]
}

/// Generates a non-empty sequence of terminal calls to make on one handle.
pub fn arb_terminal_ops() -> impl Strategy<Value = Vec<Termination>> {
    prop::collection::vec(arb_termination(), 1..12)
}
