//! Output module: checkpoint artifacts and operator statistics

mod checkpoint;
pub mod stats;

pub use checkpoint::{
    load_checkpoint, load_plain_list, CheckpointEntry, CheckpointFile, CheckpointWriter,
    CHECKPOINT_VERSION,
};
pub use stats::{print_statistics, render_statistics, HarvestStats, StatsSnapshot};
