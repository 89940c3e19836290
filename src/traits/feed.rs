//! Transit feed input trait.

use core::future::Future;

use crate::feed::FetchError;
use crate::vehicle::Line;

/// Source of raw trips-for-route documents.
///
/// One call fetches one line. The fetcher applies its own timeout around
/// [`fetch_line`](Self::fetch_line), so implementations need not.
pub trait FeedSource: Send + Sync {
    /// Lines this source can serve, in fetch order.
    fn lines(&self) -> &[Line] {
        &Line::ALL
    }

    /// Short description for logs (e.g. "live feed").
    fn describe(&self) -> &str;

    /// Fetch the raw document for `line`.
    fn fetch_line(&self, line: Line)
        -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}
