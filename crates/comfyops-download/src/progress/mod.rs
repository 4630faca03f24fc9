//! Transfer progress reporting.
//!
//! Strategies report `(destination, downloaded_bytes, total_bytes)` through a
//! caller-supplied callback; `total_bytes` is 0 when the server sent no
//! length. Updates are rate-limited with [`ProgressThrottle`].

use std::path::Path;
use std::sync::Arc;

mod throttle;

pub use throttle::ProgressThrottle;

/// Callback for transfer progress: (`destination`, `downloaded_bytes`, `total_bytes`)
pub type ProgressCallback = Arc<dyn Fn(&Path, u64, u64) + Send + Sync>;
