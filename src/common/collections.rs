pub use std::collections::{BTreeMap, BTreeSet, VecDeque, btree_map};

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
pub use std::collections::hash_map;
