//! Specialist agents served over A2A
//!
//! Two specialists back the switchboard: the results agent answers
//! score questions with web search, the news agent pulls headlines from
//! a league feed over MCP. Each one is a [`TaskExecutor`] plus the
//! agent card it publishes.
//!
//! [`TaskExecutor`]: switchboard_a2a::TaskExecutor

pub mod feed;
pub mod news;
pub mod results;
pub mod search;

pub use feed::FeedClient;
pub use news::NewsAgent;
pub use results::ResultsAgent;
pub use search::SearchClient;
