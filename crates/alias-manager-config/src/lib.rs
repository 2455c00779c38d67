pub mod config;
pub mod paths;

pub use config::{
    AppConfig, ListSettings, SortColumn, DEFAULT_HISTORY_CAPACITY, DEFAULT_MARKER,
    DEFAULT_SUB_ITEM_PREFIX,
};
pub use paths::{expand_home, resolve_data_dir, DATA_DIR_ENV};
