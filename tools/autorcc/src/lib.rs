//! Incremental rcc driver.
//!
//! Decides whether a Qt resource compiler (rcc) output is stale and
//! regenerates it if so. Besides file timestamps, a digest of every rcc
//! setting is kept in a settings file so that option changes also trigger
//! rebuilds. Concurrent jobs for the same output serialize on a lock file.
//!
//! Pipeline: load info file → lock + read settings → evaluate staleness →
//!           run rcc / touch output → publish multi-config wrapper →
//!           write settings + unlock.

pub mod error;
pub mod evaluate;
pub mod generate;
pub mod info;
pub mod job;
pub mod lister;
pub mod lock;
pub mod settings;
pub mod timestamp;
pub mod verbose;
pub mod wrapper;

pub use error::{RccError, Result};
pub use evaluate::{BuildDecision, RebuildReason};
pub use info::RccInfo;
pub use job::{process, run};
