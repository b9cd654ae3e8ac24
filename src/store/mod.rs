//! Persistence layer: candidate items, operator actions, analytics.

pub mod libsql_backend;
pub mod migrations;
pub mod model;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use model::{
    ActionType, AnalyticsReport, CandidateItem, Classification, InsertOutcome, ItemAction,
    ItemStatus, MediaKind, NewItem, TransitionExtra,
};
pub use traits::ItemStore;
