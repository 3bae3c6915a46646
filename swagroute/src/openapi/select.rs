//! Decides which routes belong to a requested api

use swagroute_core::identifier::IdentifierSet;
use swagroute_core::router::EndpointData;
use swagroute_core::router::RouteEntry;

/// Checks whether `route` belongs to one of the `requested` apis
///
/// A route belongs to every api any of its endpoints declares.
/// Endpoints without declaration belong to the default api.
pub fn is_selected(route: &RouteEntry, requested: &IdentifierSet) -> bool {
    route.api_ids().intersects(requested)
}

/// Checks whether a single endpoint belongs to one of the `requested` apis
pub fn is_endpoint_selected(endpoint: &EndpointData, requested: &IdentifierSet) -> bool {
    endpoint.api_ids().intersects(requested)
}
