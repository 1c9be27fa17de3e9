mod host;
mod memory;
mod storage;

pub use host::HostBridge;
pub use memory::MemoryStorage;
pub use storage::{
    Key, StorageBackend, StorageBridge, StorageChange, Subscription, PRESENCE_ENABLED,
    PRESENCE_KEY_PREFIX, SHOW_BUTTON, SHOW_ON_PAUSE,
};
