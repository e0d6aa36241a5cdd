pub mod interface;
pub mod factory;
pub mod memory_store;
pub mod noop_store;
pub mod redis_store;

pub use interface::*;
pub use factory::StoreFactory;
pub use memory_store::MemoryStore;
pub use noop_store::NoopStore;
pub use redis_store::RedisStore;
