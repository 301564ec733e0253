/// Session document stores (remote backends and the in-process cache).
pub mod game_store;
/// Storage abstraction layer shared by every backend.
pub mod storage;
