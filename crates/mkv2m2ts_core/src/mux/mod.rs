//! Muxing: tsMuxeR descriptor, tsMuxeR itself and the mkvmerge rebuild
//! fallback.

mod meta;
mod rebuild;
mod tsmuxer;

pub use meta::{MetaBuilder, MUX_OPTIONS};
pub use rebuild::{build_rebuild_invocation, rebuild_container};
pub use tsmuxer::{
    build_tsmuxer_invocation, classify, is_frame_rate_failure, mux_failed, run_tsmuxer,
    MuxOutcome,
};
