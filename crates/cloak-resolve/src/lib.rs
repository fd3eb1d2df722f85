//! Cloak Resolve — turns raw detector output into logical entities.
//!
//! Stages, in order: [`MergeEngine`] resolves overlapping spans into a
//! non-overlapping sequence, [`group_entities`] folds repeated mentions
//! into [`EntityGroup`]s, and [`expand_coreferences`] attaches coreferent
//! mentions (from the external resolver) to their groups.

pub mod coref;
pub mod group;
pub mod merge;

pub use coref::{expand_coreferences, CorefCluster, CoreferenceResolver, PronounCoref};
pub use group::{group_entities, EntityGroup};
pub use merge::{MergeEngine, MergePolicy};
