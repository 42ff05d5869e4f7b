pub mod engine;
pub mod input;
pub mod locator;
pub mod logger;
pub mod lua_rt;
pub mod pasteboard;
pub mod platform;
pub mod settings;
pub mod sleep;
pub mod types;
pub mod walker;
