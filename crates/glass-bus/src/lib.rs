// ABOUTME: Publish/subscribe hub decoupling background producers from effect consumers.
// ABOUTME: Single-threaded synchronous delivery with namespaced event names.

mod bus;
mod event;
mod topic;

pub use bus::{PixelBus, SubscriptionId};
pub use event::{topics, BusEvent};
