//! # Hub Test Utilities
//!
//! Shared test utilities for the signaling hub.
//!
//! ## Modules
//!
//! - `mock_writer` - Channel-backed and failing `Writer` implementations
//! - `fixtures` - Test clients and canned messages
//! - `assertions` - Task and subscription leak checks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hub_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let baseline = TaskBaseline::capture();
//!     let (client, mut written) = TestClient::new().with_metadata("alice").build();
//!
//!     let adapter = MemoryAdapter::new("room");
//!     adapter.add(Arc::clone(&client)).await.unwrap();
//!
//!     assert_eq!(written.next().await, room_join("room", &client));
//!     assert_no_task_leak(baseline).await;
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_writer;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use mock_writer::*;
