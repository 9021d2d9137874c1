//! Session-backed models.

/// Keys under which storefront data is stored in the session.
///
/// The session scopes the order in progress to one visitor and survives
/// page navigation within that visit.
pub mod session_keys {
    /// The cart (a serialized [`burger_smoke_core::Cart`]).
    pub const CART: &str = "cart";

    /// A composed but not yet confirmed hand-off
    /// (a serialized [`burger_smoke_core::Handoff`]).
    ///
    /// Present only between order submission and hand-off confirmation; the
    /// cart must stay intact while this is set.
    pub const HANDOFF: &str = "handoff";

    /// A submission is in flight for this session (a `bool`).
    ///
    /// Set before the receipt upload starts and removed when the submission
    /// reaches any terminal outcome. A second submit that finds it set is
    /// rejected without uploading anything.
    pub const SUBMITTING: &str = "submitting";
}
