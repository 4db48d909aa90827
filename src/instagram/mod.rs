//! Everything needed to get a user's posts out of Instagram: resolving their
//! access token, listing their media through the Graph API, and narrowing the
//! list down with a [`FeedFilter`].

pub mod filter;
mod graph;
mod media;
mod session;

pub use graph::*;
pub use media::*;
pub use session::*;
