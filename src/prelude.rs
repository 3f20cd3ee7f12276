pub use std::result::Result as StdResult;
pub use std::time::Duration as StdDuration;
pub use std::time::Instant;

pub use anyhow::{anyhow, bail, Context, Error};
pub use itertools::Itertools;
pub use tracing::{debug, info, instrument, trace, warn};

pub type AHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

pub type Result<T = (), E = Error> = StdResult<T, E>;
